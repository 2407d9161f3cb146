//! Count-only queries.

use crate::error::Result;
use crate::query::LayerQuery;
use crate::retry::with_retry;
use crate::types::LayerRef;
use serde::Deserialize;

use super::Extractor;

#[derive(Debug, Deserialize)]
struct CountResponse {
    #[serde(default)]
    count: Option<u64>,
}

impl Extractor {
    /// Number of features the service reports for `layer` within the envelope
    ///
    /// A response without a `count` field counts as zero. The request goes
    /// through the same retry policy as page requests.
    pub async fn expected_count(&self, layer: &LayerRef) -> Result<u64> {
        let url = layer.query_url();
        let params = LayerQuery::count(&self.config.envelope).params()?;

        let response: CountResponse = with_retry(&self.config.retry, || {
            self.transport.get_json::<CountResponse>(&url, &params)
        })
        .await?;

        let count = response.count.unwrap_or(0);
        tracing::debug!(layer = %layer, count, "Expected count");
        Ok(count)
    }
}
