use crate::api::LifelogQuery;
use crate::config::ApiSettings;
use crate::error::{LifelogError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

pub const LIFELOGS_PATH: &str = "/v1/lifelogs";

const API_KEY_HEADER: &str = "x-api-key";

/// Gateway to the remote lifelogs API. One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct LimitlessClient {
    http: reqwest::Client,
    base_url: String,
}

impl LimitlessClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(&settings.api_key)
            .map_err(|e| LifelogError::Config(format!("Invalid API key header: {}", e)))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `base_url + path`, returning the parsed JSON body on a 2xx status.
    ///
    /// Non-success statuses become [`LifelogError::Request`] with the body verbatim;
    /// send or read failures become [`LifelogError::Network`].
    pub async fn fetch_resource(&self, path: &str, query: Option<&LifelogQuery>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let pairs = query.map(LifelogQuery::to_query_pairs).unwrap_or_default();

        debug!(url = %url, params = pairs.len(), "GET");

        let mut request = self.http.get(&url);
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "remote API returned an error status");
            return Err(LifelogError::Request {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    pub async fn list_lifelogs(&self, query: &LifelogQuery) -> Result<Value> {
        self.fetch_resource(LIFELOGS_PATH, Some(query)).await
    }
}
