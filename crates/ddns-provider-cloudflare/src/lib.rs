// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the DDNS
// reconciler.
//
// The provider is stateless and single-shot: every trait method is exactly
// one API request. Whether a record needs updating, and what to do when a
// request fails, is decided by the reconciler.
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - API token MUST be provided via environment variables only
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Verify Token: GET `/user/tokens/verify`
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=...`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::{DnsProvider, DnsRecord, Error, RecordType, Result, TokenStatus};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider name used in errors and logs
const PROVIDER: &str = "cloudflare";

/// Records requested per page when listing
const RECORDS_PER_PAGE: u32 = 100;

/// Envelope around every Cloudflare API v4 response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

/// Pagination block attached to list responses
#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenVerification {
    status: String,
}

/// Cloudflare DNS provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for testing)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider against the public API
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    ///
    /// # Security
    ///
    /// The API token will NEVER be logged or displayed in error messages.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_token, CLOUDFLARE_API_BASE)
    }

    /// Create a provider talking to a different API base URL
    pub fn with_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("Cloudflare API base URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }

    /// Send a request and unwrap the API envelope
    ///
    /// `context` names the operation in error messages.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let (result, _) = self.send_paged(request, context).await?;
        Ok(result)
    }

    /// Like [`send`](Self::send), also returning the pagination block
    async fn send_paged<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<(T, Option<ResultInfo>)> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", context, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{}: failed to read response: {}", context, e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body, context));
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{} failed: {}", context, describe(&envelope.errors)),
            ));
        }

        let result = envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("{}: response carried no result", context))
        })?;

        Ok((result, envelope.result_info))
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions. Status: {}",
            context, status
        )),
        404 => Error::not_found(format!("{}: {}", context, status)),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded. Status: {}",
            context, status
        )),
        500..=599 => Error::provider(
            PROVIDER,
            format!("{}: Cloudflare server error (transient): {} - {}", context, status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{}: {} - {}", context, status, body)),
    }
}

fn describe(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "unknown error".to_string();
    }
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn verify_token(&self) -> Result<TokenStatus> {
        let url = format!("{}/user/tokens/verify", self.base_url);
        let verification: TokenVerification =
            self.send(self.client.get(&url), "token verification").await?;

        Ok(TokenStatus {
            status: verification.status,
        })
    }

    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);

        let url = format!("{}/zones", self.base_url);
        let zones: Vec<Zone> = self
            .send(
                self.client.get(&url).query(&[("name", zone_name)]),
                "zone lookup",
            )
            .await?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    async fn list_records(&self, zone_id: &str, record_type: RecordType) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let per_page = RECORDS_PER_PAGE.to_string();

        let mut records = Vec::new();
        let mut page: u32 = 1;
        loop {
            let page_param = page.to_string();
            let request = self.client.get(&url).query(&[
                ("type", record_type.as_str()),
                ("page", page_param.as_str()),
                ("per_page", per_page.as_str()),
            ]);

            let (batch, info): (Vec<DnsRecord>, _) =
                self.send_paged(request, "record listing").await?;
            let fetched = batch.len();
            records.extend(batch);

            let total_pages = info.map_or(1, |info| info.total_pages);
            if fetched == 0 || page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Listed {} {} record(s) in {} page(s)",
            records.len(),
            record_type,
            page
        );
        Ok(records)
    }

    async fn update_record_content(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
    ) -> Result<DnsRecord> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);
        let payload = serde_json::json!({ "content": content });

        let record: DnsRecord = self
            .send(self.client.patch(&url).json(&payload), "record update")
            .await?;

        tracing::debug!("Cloudflare stored {} -> {}", record.name, record.content);
        Ok(record)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
