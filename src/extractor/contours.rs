//! Depth-contour group: one verified fetch per interval, then a merged file.

use crate::error::Result;
use crate::plan::{ContourGroup, INTERVAL_PROPERTY};
use crate::types::{DatasetReport, Event, FeatureCollection, MergedOutput};
use crate::writer::save_collection;

use super::Extractor;

/// Outcome of [`Extractor::fetch_contours`]
#[derive(Clone, Debug, PartialEq)]
pub struct ContourReport {
    /// One report per contour layer, in fetch order
    pub datasets: Vec<DatasetReport>,
    /// The merged collection's location and size
    pub merged: MergedOutput,
}

impl Extractor {
    /// Fetch every contour layer and write the merged collection
    ///
    /// Per-layer files hold the features exactly as fetched. Features in the
    /// merged file additionally carry `interval_m` set to their layer's
    /// interval.
    pub async fn fetch_contours(&self, group: &ContourGroup) -> Result<ContourReport> {
        let mut merged = FeatureCollection::new();
        let mut datasets = Vec::with_capacity(group.layers.len());

        for (dataset, interval_m) in group.datasets() {
            let (collection, report) = self.fetch_and_verify(&dataset).await?;
            merged.extend(collection.features.into_iter().map(|mut feature| {
                feature.set_property(INTERVAL_PROPERTY, interval_m);
                feature
            }));
            datasets.push(report);
        }

        let path = self.config.output_path(&group.merged_output);
        save_collection(&path, &merged).await?;

        let features = merged.len() as u64;
        tracing::info!(
            path = %path.display(),
            features,
            layers = datasets.len(),
            "Saved merged contours"
        );
        self.emit_event(Event::Saved {
            path: path.clone(),
            features,
        });

        Ok(ContourReport {
            datasets,
            merged: MergedOutput { path, features },
        })
    }
}
