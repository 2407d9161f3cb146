//! Count-verified fetch of one data set.

use crate::error::Result;
use crate::plan::Dataset;
use crate::types::{DatasetReport, Event, FeatureCollection, VerificationOutcome};
use crate::writer::save_collection;

use super::Extractor;

impl Extractor {
    /// Count, paginate, save, then compare counts for one data set
    ///
    /// The collection is written before verification, so a mismatch never
    /// loses data. A mismatch is logged as a warning and reported through
    /// [`Event::Verified`]; it is not an error.
    pub async fn fetch_and_verify(
        &self,
        dataset: &Dataset,
    ) -> Result<(FeatureCollection, DatasetReport)> {
        tracing::info!(dataset = %dataset.name, layer = %dataset.layer, "Fetching data set");
        self.emit_event(Event::DatasetStarted {
            name: dataset.name.clone(),
            layer: dataset.layer.clone(),
        });

        let expected = self.expected_count(&dataset.layer).await?;
        tracing::info!(dataset = %dataset.name, expected, "Expected count");
        self.emit_event(Event::ExpectedCount {
            name: dataset.name.clone(),
            expected,
        });

        let collection = self.fetch_layer(&dataset.name, &dataset.layer).await?;
        let actual = collection.len() as u64;
        tracing::info!(dataset = %dataset.name, actual, "Fetched features");

        let output = self.config.output_path(&dataset.output);
        save_collection(&output, &collection).await?;
        self.emit_event(Event::Saved {
            path: output.clone(),
            features: actual,
        });

        let verification = VerificationOutcome { expected, actual };
        if verification.is_match() {
            tracing::info!(dataset = %dataset.name, count = actual, "Counts match");
        } else {
            tracing::warn!(
                dataset = %dataset.name,
                expected,
                actual,
                shortfall = verification.shortfall(),
                "Count mismatch, features may be missing"
            );
        }
        self.emit_event(Event::Verified {
            name: dataset.name.clone(),
            expected,
            actual,
            matched: verification.is_match(),
        });

        let report = DatasetReport {
            name: dataset.name.clone(),
            output,
            verification,
        };
        Ok((collection, report))
    }
}
