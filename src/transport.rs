//! Authenticated HTTP transport shared by every request of a run
//!
//! The subscription key is sent as the `Ocp-Apim-Subscription-Key` header and
//! repeated as the `subscription-key` query parameter, since gateway
//! deployments differ in which one they honour.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the subscription key
pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Query parameter duplicating the subscription key
pub const API_KEY_PARAM: &str = "subscription-key";

/// Error object ArcGIS services embed in otherwise successful responses
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// HTTP client owned by the extractor and reused for every request
#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Build a transport with the given credential and per-request timeout
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();

        let mut key_header = HeaderValue::from_str(&api_key).map_err(|e| {
            Error::config(format!("API key is not a valid header value: {e}"), "api_key")
        })?;
        key_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("msil-extract/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, api_key })
    }

    /// GET `url` with `params` and decode the JSON body
    ///
    /// Non-success statuses become [`Error::Http`]; an `error` object in a 200
    /// response becomes [`Error::Service`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[(API_KEY_PARAM, self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::http(status.as_u16(), url, &body));
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        if let Some(err) = value.get("error") {
            let err: ServiceErrorBody = serde_json::from_value(err.clone())?;
            return Err(Error::Service {
                code: err.code,
                message: err.message,
            });
        }

        Ok(serde_json::from_value(value)?)
    }
}
