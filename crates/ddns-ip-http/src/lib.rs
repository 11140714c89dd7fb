// # HTTP IP Source
//
// This crate provides an HTTP-based public IP lookup for the DDNS reconciler.
//
// ## Architecture
//
// Fetches the current public IPv4 address from an external lookup service
// that answers with a JSON object carrying a single `ip` field, e.g.
// `https://api.ipify.org?format=json` → `{"ip":"203.0.113.7"}`.
//
// One request per call. No caching and no retry: the reconciler asks for a
// fresh observation every cycle, and the next cycle is the retry.

use async_trait::async_trait;
use ddns_core::{Error, IpSource, Result};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Default HTTP timeout for lookups
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned by the lookup service
#[derive(Debug, Deserialize)]
struct LookupResponse {
    ip: String,
}

/// HTTP-based public IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: Lookup URL (e.g., "https://api.ipify.org?format=json")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(Error::config("IP lookup URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// Fetch the current IP from the lookup service
    async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::ip_lookup(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_lookup(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_lookup(format!("Failed to read response: {}", e)))?;

        parse_lookup_body(&body)
    }
}

/// Decode a lookup body into an IPv4 address
fn parse_lookup_body(body: &str) -> Result<Ipv4Addr> {
    let parsed: LookupResponse = serde_json::from_str(body)
        .map_err(|e| Error::ip_lookup(format!("Failed to decode response: {}", e)))?;

    let ip_text = parsed.ip.trim();
    ip_text
        .parse::<Ipv4Addr>()
        .map_err(|_| Error::ip_lookup(format!("Expected an IPv4 address, got: {}", ip_text)))
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let ip = self.fetch_ip().await?;
        tracing::debug!("Lookup at {} returned {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> HttpIpSource {
        HttpIpSource::new(format!("{}/ip", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn returns_ip_from_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ip": "203.0.113.7" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ip = source_for(&server).await.current().await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(203, 0, 113, 7));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source_for(&server).await.current().await.unwrap_err();
        assert!(matches!(err, Error::IpLookup(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn non_json_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7"))
            .mount(&server)
            .await;

        let err = source_for(&server).await.current().await.unwrap_err();
        assert!(matches!(err, Error::IpLookup(_)));
    }

    #[test]
    fn ipv6_answers_are_rejected() {
        let err = parse_lookup_body(r#"{"ip":"2001:db8::1"}"#).unwrap_err();
        assert!(err.to_string().contains("IPv4"));
    }

    #[test]
    fn missing_ip_field_is_rejected() {
        assert!(parse_lookup_body(r#"{"address":"203.0.113.7"}"#).is_err());
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(HttpIpSource::new("").is_err());
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let server = MockServer::start().await;
        let url = format!("{}/ip", server.uri());
        drop(server);

        let source = HttpIpSource::with_timeout(url, Duration::from_secs(2)).unwrap();
        let err = source.current().await.unwrap_err();
        assert!(matches!(err, Error::IpLookup(_)));
    }
}
