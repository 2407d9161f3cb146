//! Extraction plan: which layers to fetch and where to write them
//!
//! The default plan reproduces the MSIL (Maritime Safety Information Layer)
//! extraction: islands, undersea feature names, submarine cables and five
//! depth-contour intervals merged into one combined file.

use crate::error::{Error, Result};
use crate::types::LayerRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Root of the MSIL feature services
pub const MSIL_API_ROOT: &str = "https://api.msil.go.jp";

/// Property injected into every merged depth-contour feature
pub const INTERVAL_PROPERTY: &str = "interval_m";

/// One named data set written to its own file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Human-readable name used in logs and events
    pub name: String,
    /// Layer to query
    #[serde(flatten)]
    pub layer: LayerRef,
    /// Output file, relative to the configured output directory
    pub output: PathBuf,
}

impl Dataset {
    /// Create a new data set definition
    pub fn new(
        name: impl Into<String>,
        service_base: impl Into<String>,
        layer: u32,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            layer: LayerRef::new(service_base, layer),
            output: output.into(),
        }
    }
}

/// A depth-contour layer and the interval (in meters) it represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourLayer {
    /// Layer index on the contour service
    pub layer: u32,
    /// Contour interval in meters
    pub interval_m: u32,
}

/// Depth-contour layers sharing one service, merged into a combined output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourGroup {
    /// Contour service base URL
    pub service_base: String,
    /// Layers to fetch, in order
    pub layers: Vec<ContourLayer>,
    /// Merged output file, relative to the configured output directory
    pub merged_output: PathBuf,
}

impl ContourGroup {
    /// Per-layer data set definitions paired with their interval
    pub fn datasets(&self) -> Vec<(Dataset, u32)> {
        self.layers
            .iter()
            .map(|c| {
                let dataset = Dataset::new(
                    format!("depth-contour {}m (polyline)", c.interval_m),
                    self.service_base.clone(),
                    c.layer,
                    format!("depth_contour_{}m.geojson", c.interval_m),
                );
                (dataset, c.interval_m)
            })
            .collect()
    }
}

/// Ordered list of everything one run fetches
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionPlan {
    /// Stand-alone data sets, fetched in order
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    /// Depth-contour group, fetched after the data sets
    #[serde(default)]
    pub contours: Option<ContourGroup>,
}

impl ExtractionPlan {
    /// The MSIL plan rooted at the given API root
    pub fn msil(api_root: &str) -> Self {
        let root = api_root.trim_end_matches('/');
        Self {
            datasets: vec![
                Dataset::new(
                    "island (point)",
                    format!("{root}/island/v2/MapServer"),
                    1,
                    "islands.geojson",
                ),
                Dataset::new(
                    "undersea-features (point)",
                    format!("{root}/undersea-features/v2/MapServer"),
                    1,
                    "undersea_features.geojson",
                ),
                Dataset::new(
                    "submarine-cable-line (polyline)",
                    format!("{root}/submarine-cable-line/v2/MapServer"),
                    2,
                    "submarine_cables.geojson",
                ),
            ],
            contours: Some(ContourGroup {
                service_base: format!("{root}/depth-contour/v2/MapServer"),
                layers: [(10, 20), (11, 50), (12, 100), (13, 150), (14, 200)]
                    .into_iter()
                    .map(|(layer, interval_m)| ContourLayer { layer, interval_m })
                    .collect(),
                merged_output: PathBuf::from("depth_contours_all.geojson"),
            }),
        }
    }

    /// Every data set in run order, contour layers last
    pub fn all_datasets(&self) -> Vec<Dataset> {
        let mut all = self.datasets.clone();
        if let Some(group) = &self.contours {
            all.extend(group.datasets().into_iter().map(|(d, _)| d));
        }
        all
    }

    /// Check URLs, names and output paths
    pub fn validate(&self) -> Result<()> {
        let mut outputs = HashSet::new();

        for dataset in self.all_datasets() {
            if dataset.name.trim().is_empty() {
                return Err(Error::config("data set name is empty", "plan.datasets.name"));
            }
            validate_service_base(&dataset.layer.service_base)?;
            if dataset.output.as_os_str().is_empty() {
                return Err(Error::config(
                    format!("data set '{}' has no output file", dataset.name),
                    "plan.datasets.output",
                ));
            }
            if !outputs.insert(dataset.output.clone()) {
                return Err(Error::config(
                    format!("output {} is used by more than one data set", dataset.output.display()),
                    "plan.datasets.output",
                ));
            }
        }

        if let Some(group) = &self.contours {
            if group.layers.is_empty() {
                return Err(Error::config(
                    "contour group has no layers",
                    "plan.contours.layers",
                ));
            }
            if !outputs.insert(group.merged_output.clone()) {
                return Err(Error::config(
                    format!(
                        "merged output {} collides with a data set output",
                        group.merged_output.display()
                    ),
                    "plan.contours.merged_output",
                ));
            }
        }

        Ok(())
    }
}

impl Default for ExtractionPlan {
    fn default() -> Self {
        Self::msil(MSIL_API_ROOT)
    }
}

fn validate_service_base(service_base: &str) -> Result<()> {
    let url = url::Url::parse(service_base).map_err(|e| {
        Error::config(
            format!("invalid service URL '{service_base}': {e}"),
            "plan.service_base",
        )
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::config(
            format!("unsupported URL scheme '{other}' in '{service_base}'"),
            "plan.service_base",
        )),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_matches_msil_layout() {
        let plan = ExtractionPlan::default();
        assert_eq!(plan.datasets.len(), 3);
        assert_eq!(
            plan.datasets[2].layer.query_url(),
            "https://api.msil.go.jp/submarine-cable-line/v2/MapServer/2/query"
        );

        let contours = plan.contours.as_ref().unwrap();
        let intervals: Vec<u32> = contours.layers.iter().map(|c| c.interval_m).collect();
        assert_eq!(intervals, vec![20, 50, 100, 150, 200]);
        assert_eq!(plan.all_datasets().len(), 8);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn contour_datasets_are_named_by_interval() {
        let plan = ExtractionPlan::msil("http://localhost:9000/");
        let datasets = plan.contours.unwrap().datasets();
        let (first, interval) = &datasets[0];
        assert_eq!(*interval, 20);
        assert_eq!(first.name, "depth-contour 20m (polyline)");
        assert_eq!(first.output, PathBuf::from("depth_contour_20m.geojson"));
        assert_eq!(
            first.layer.query_url(),
            "http://localhost:9000/depth-contour/v2/MapServer/10/query"
        );
    }

    #[test]
    fn rejects_duplicate_outputs() {
        let mut plan = ExtractionPlan::default();
        plan.datasets[1].output = plan.datasets[0].output.clone();
        let err = plan.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(k), .. } if k == "plan.datasets.output"));
    }

    #[test]
    fn rejects_non_http_urls() {
        let plan = ExtractionPlan {
            datasets: vec![Dataset::new("x", "ftp://example.com/MapServer", 1, "x.geojson")],
            contours: None,
        };
        assert!(plan.validate().is_err());

        let plan = ExtractionPlan {
            datasets: vec![Dataset::new("x", "not a url", 1, "x.geojson")],
            contours: None,
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn rejects_empty_contour_group() {
        let mut plan = ExtractionPlan::default();
        plan.contours.as_mut().unwrap().layers.clear();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn dataset_deserializes_flat_layer_fields() {
        let dataset: Dataset = serde_json::from_str(
            r#"{"name": "islands", "service_base": "http://h/MapServer", "layer": 1, "output": "i.geojson"}"#,
        )
        .unwrap();
        assert_eq!(dataset.layer, LayerRef::new("http://h/MapServer", 1));
    }
}
