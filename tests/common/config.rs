//! Test configuration builders

use msil_extract::{
    Backoff, Config, ContourGroup, ContourLayer, Dataset, ExtractionPlan, Extractor, PagingConfig,
    RetryConfig,
};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Key every mock expects
pub const TEST_API_KEY: &str = "test-key";

/// Retry step small enough to keep tests fast but large enough to measure
pub const TEST_BACKOFF_STEP: Duration = Duration::from_millis(50);

/// A configuration with no page delay, fast linear backoff and an empty plan
///
/// The output directory lives inside `temp_dir`.
pub fn test_config(temp_dir: &TempDir, page_size: u32) -> Config {
    Config {
        api_key: Some(TEST_API_KEY.to_string()),
        output_dir: temp_dir.path().join("geojson"),
        paging: PagingConfig {
            page_size,
            page_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(10),
        },
        retry: RetryConfig {
            max_attempts: 5,
            backoff: Backoff::Linear {
                step: TEST_BACKOFF_STEP,
            },
            jitter: false,
        },
        plan: ExtractionPlan {
            datasets: Vec::new(),
            contours: None,
        },
        ..Default::default()
    }
}

/// Service base URL for a service path on the mock server
pub fn service_base(server_uri: &str, service: &str) -> String {
    format!("{server_uri}/{service}/MapServer")
}

/// A single data set on the mock server
pub fn dataset(server_uri: &str, service: &str, layer: u32, output: &str) -> Dataset {
    Dataset::new(
        format!("{service} layer {layer}"),
        service_base(server_uri, service),
        layer,
        output,
    )
}

/// The standard five-layer contour group (layers 10..=14 -> 20/50/100/150/200 m)
pub fn contour_group(server_uri: &str, service: &str) -> ContourGroup {
    ContourGroup {
        service_base: service_base(server_uri, service),
        layers: CONTOUR_LAYERS
            .iter()
            .map(|&(layer, interval_m)| ContourLayer { layer, interval_m })
            .collect(),
        merged_output: PathBuf::from("depth_contours_all.geojson"),
    }
}

/// `(layer, interval_m)` pairs of the depth-contour service
pub const CONTOUR_LAYERS: [(u32, u32); 5] = [(10, 20), (11, 50), (12, 100), (13, 150), (14, 200)];

/// Build an extractor, panicking on configuration errors
pub fn extractor(config: Config) -> Extractor {
    Extractor::new(config).expect("test configuration should be valid")
}
