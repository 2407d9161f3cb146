//! Offset-based page loop for one layer.

use crate::error::Result;
use crate::query::LayerQuery;
use crate::retry::with_retry;
use crate::types::{Event, Feature, FeatureCollection, LayerRef};
use serde::Deserialize;

use super::Extractor;

/// The parts of a GeoJSON page response the loop looks at
#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    features: Option<Vec<Feature>>,
    #[serde(default, rename = "exceededTransferLimit")]
    exceeded_transfer_limit: Option<bool>,
    #[serde(default)]
    properties: Option<PageProperties>,
}

// Some servers report the flag under the collection's `properties` instead
#[derive(Debug, Deserialize)]
struct PageProperties {
    #[serde(default, rename = "exceededTransferLimit")]
    exceeded_transfer_limit: Option<bool>,
}

impl QueryPage {
    fn exceeded_transfer_limit(&self) -> Option<bool> {
        self.exceeded_transfer_limit.or_else(|| {
            self.properties
                .as_ref()
                .and_then(|p| p.exceeded_transfer_limit)
        })
    }
}

impl Extractor {
    /// Fetch every feature of `layer` within the envelope
    ///
    /// Pages of `paging.page_size` records are requested from offset 0 until a
    /// page comes back with fewer records than requested. Features keep the
    /// order they arrived in. A page that fails after retries aborts the whole
    /// layer and the partial accumulator is dropped.
    pub async fn fetch_layer(&self, name: &str, layer: &LayerRef) -> Result<FeatureCollection> {
        let page_size = self.config.paging.page_size;
        let page_delay = self.config.paging.page_delay;
        let url = layer.query_url();

        let mut collection = FeatureCollection::new();
        let mut offset: u64 = 0;

        loop {
            let params =
                LayerQuery::page(&self.config.envelope, offset, page_size).params()?;

            let page: QueryPage = with_retry(&self.config.retry, || {
                self.transport.get_json::<QueryPage>(&url, &params)
            })
            .await?;

            let exceeded_transfer_limit = page.exceeded_transfer_limit();
            let features = page.features.unwrap_or_default();
            let fetched = features.len() as u64;
            collection.extend(features);

            tracing::debug!(
                dataset = name,
                layer = %layer,
                fetched,
                total = collection.len(),
                offset,
                exceeded_transfer_limit = ?exceeded_transfer_limit,
                "Fetched page"
            );
            self.emit_event(Event::PageFetched {
                name: name.to_string(),
                layer: layer.clone(),
                offset,
                fetched,
                total: collection.len() as u64,
                exceeded_transfer_limit,
            });

            if fetched < u64::from(page_size) {
                break;
            }

            offset += u64::from(page_size);
            if !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }
        }

        Ok(collection)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transfer_limit_read_from_top_level() {
        let page: QueryPage = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [],
            "exceededTransferLimit": true
        }))
        .unwrap();
        assert_eq!(page.exceeded_transfer_limit(), Some(true));
    }

    #[test]
    fn transfer_limit_read_from_properties() {
        let page: QueryPage = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [],
            "properties": {"exceededTransferLimit": false}
        }))
        .unwrap();
        assert_eq!(page.exceeded_transfer_limit(), Some(false));
    }

    #[test]
    fn missing_or_null_features_mean_empty_page() {
        let page: QueryPage = serde_json::from_value(json!({"type": "FeatureCollection"})).unwrap();
        assert!(page.features.unwrap_or_default().is_empty());

        let page: QueryPage = serde_json::from_value(json!({"features": null})).unwrap();
        assert!(page.features.unwrap_or_default().is_empty());
        assert_eq!(page.exceeded_transfer_limit, None);
    }
}
