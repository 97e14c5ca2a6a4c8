//! Where readings and statistics come from.
//!
//! [`HttpTemperatureSource`] talks to the temperature server over HTTP using [`reqwest`].

use std::sync::Arc;

use async_trait::async_trait;
use thermo_dash_model::{StatsPayload, StatsRange, TemperatureReading};

/// Errors from a single fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request itself failed (connection refused, DNS, TLS, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body is not the JSON the endpoint is expected to return.
    #[error("invalid JSON from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Provides the data shown by the dashboard.
#[async_trait]
pub trait TemperatureSource {
    /// Fetches the latest temperature reading.
    async fn fetch_current(&self) -> Result<TemperatureReading, FetchError>;

    /// Fetches the statistics for `range`.
    async fn fetch_stats(&self, range: &StatsRange) -> Result<StatsPayload, FetchError>;
}

pub type TemperatureSourcePointer = Arc<dyn TemperatureSource + Send + Sync>;

/// HTTP client for the temperature server.
pub struct HttpTemperatureSource {
    client: reqwest::Client,
    server_url: String,
}

impl HttpTemperatureSource {
    const CURRENT_ENDPOINT: &'static str = "/current";
    const STATS_ENDPOINT: &'static str = "/stats";

    /// * `server_url` - Base URL, e.g. `http://localhost:8080`.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), server_url)
    }

    pub fn with_client(client: reqwest::Client, server_url: impl Into<String>) -> Self {
        Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.server_url, endpoint)
    }

    /// Read the body and decode it as JSON.
    ///
    /// The status code is not checked: an error page that happens to be valid JSON of the
    /// right shape is rendered like any other response.
    async fn decode<T: serde::de::DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        let status = response.status();
        log::debug!("<- {status} {endpoint}");

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode { endpoint, source })
    }
}

#[async_trait]
impl TemperatureSource for HttpTemperatureSource {
    async fn fetch_current(&self) -> Result<TemperatureReading, FetchError> {
        let url = self.url(Self::CURRENT_ENDPOINT);
        log::debug!("-> GET {url}");

        let response = self.client.get(url).send().await?;
        Self::decode(Self::CURRENT_ENDPOINT, response).await
    }

    async fn fetch_stats(&self, range: &StatsRange) -> Result<StatsPayload, FetchError> {
        let url = self.url(Self::STATS_ENDPOINT);
        log::debug!("-> GET {url}?{}", range.query_string());

        let response = self
            .client
            .get(url)
            .query(&range.query()[..])
            .send()
            .await?;
        Self::decode(Self::STATS_ENDPOINT, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_current_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"temperature": 21.5, "unit": "Celsius"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpTemperatureSource::new(server.uri());
        let reading = source.fetch_current().await.unwrap();

        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.unit.as_deref(), Some("Celsius"));
    }

    #[tokio::test]
    async fn sends_stats_range_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .and(query_param("start", "2023-10-01"))
            .and(query_param("end", "2023-10-31"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"days":3}"#))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpTemperatureSource::new(format!("{}/", server.uri()));
        let payload = source.fetch_stats(&StatsRange::default()).await.unwrap();

        assert_eq!(payload.0, serde_json::json!({ "days": 3 }));
    }

    #[tokio::test]
    async fn error_status_with_json_body_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"temperature": 0}"#))
            .mount(&server)
            .await;

        let source = HttpTemperatureSource::new(server.uri());
        assert_eq!(source.fetch_current().await.unwrap().temperature, 0.0);
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let source = HttpTemperatureSource::new(server.uri());
        let err = source.fetch_current().await.unwrap_err();

        assert!(matches!(err, FetchError::Decode { endpoint: "/current", .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let source = HttpTemperatureSource::new(format!("http://{addr}"));
        let err = source.fetch_stats(&StatsRange::default()).await.unwrap_err();

        assert!(matches!(err, FetchError::Request(_)));
    }
}
