//! # msil-extract
//!
//! Count-verified GeoJSON extraction from ArcGIS-style feature services,
//! with the MSIL (Maritime Safety Information Layer) services as the
//! default plan.
//!
//! ## How a data set is fetched
//!
//! 1. A count-only query reports how many features intersect the envelope.
//! 2. Pages of `page_size` records are requested from offset 0 until a page
//!    comes back short. 429/503 and transport failures are retried with
//!    backoff; other failures abort.
//! 3. The collection is written to disk as GeoJSON with non-ASCII text kept
//!    verbatim.
//! 4. Fetched and expected counts are compared; a mismatch is reported as a
//!    warning event, never an error.
//!
//! Depth-contour layers are additionally tagged with `interval_m` and merged
//! into one combined file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use msil_extract::{Config, Event, Extractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         api_key: Some("your-subscription-key".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let extractor = Extractor::new(config)?;
//!
//!     let mut events = extractor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Verified { name, matched: false, .. } = event {
//!                 eprintln!("count mismatch in {name}");
//!             }
//!         }
//!     });
//!
//!     let summary = extractor.run().await?;
//!     println!("{} data sets written", summary.datasets.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Extraction orchestration
pub mod extractor;
/// Data sets and the default MSIL plan
pub mod plan;
/// Query parameter construction
pub mod query;
/// Retry logic with backoff
pub mod retry;
/// Authenticated HTTP transport
pub mod transport;
/// Core types and events
pub mod types;
/// GeoJSON collection persistence
pub mod writer;

// Re-export commonly used types
pub use config::{Backoff, Config, PagingConfig, RetryConfig};
pub use error::{Error, Result};
pub use extractor::{ContourReport, Extractor};
pub use plan::{ContourGroup, ContourLayer, Dataset, ExtractionPlan};
pub use transport::Transport;
pub use types::{
    DatasetReport, Envelope, Event, Feature, FeatureCollection, LayerRef, MergedOutput,
    RunSummary, VerificationOutcome,
};
