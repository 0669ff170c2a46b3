//! TableCRM commerce API client.
//!
//! Provides HTTP communication with the remote TableCRM service, used for
//! token validation, sales-history reads, customer search, and order
//! submission. Every request carries the bearer token as a `token` query
//! parameter, which is how the remote service expects it.

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::reference::SalesDocument;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout used specifically for the lightweight token-validation probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URL of the hosted TableCRM API. Overridable per client, see
/// [`crate::app::CashierApp::new`].
pub const DEFAULT_BASE_URL: &str = "https://app.tablecrm.com/api/v1";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure modes of a single API round trip.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot reach the TableCRM API at {url}")]
    Unreachable { url: String },

    #[error("connection to {url} timed out")]
    Timeout { url: String },

    #[error("invalid TableCRM API URL: {url}")]
    InvalidUrl { url: String },

    #[error("network error communicating with {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("invalid JSON from the TableCRM API: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

/// Convert a `reqwest::Error` into the matching [`ApiError`] variant.
fn friendly_error(url: &str, err: reqwest::Error) -> ApiError {
    if err.is_connect() {
        return ApiError::Unreachable {
            url: url.to_string(),
        };
    }
    if err.is_timeout() {
        return ApiError::Timeout {
            url: url.to_string(),
        };
    }
    if err.is_builder() {
        return ApiError::InvalidUrl {
            url: url.to_string(),
        };
    }
    ApiError::Network {
        url: url.to_string(),
        source: err,
    }
}

/// Convert an HTTP status code into an operator-friendly message.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        401 | 403 => "API token is invalid or expired".to_string(),
        404 => "TableCRM endpoint not found".to_string(),
        s if s >= 500 => format!("TableCRM server error (HTTP {s})"),
        s => format!("Unexpected response from TableCRM (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// URL handling
// ---------------------------------------------------------------------------

/// Normalise the API base URL:
/// - strip trailing slashes
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    url
}

/// Build a full endpoint URL with query parameters (the token among them).
fn endpoint(base_url: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
    let full = format!("{}{path}", normalize_base_url(base_url));
    let mut url = Url::parse(&full).map_err(|_| ApiError::InvalidUrl { url: full })?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn build_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ApiError::Client)
}

/// URL with the query (and therefore the token) stripped, safe for error
/// messages and logs.
fn display_url(url: &Url) -> String {
    let mut u = url.clone();
    u.set_query(None);
    u.to_string()
}

/// Read the response body as JSON, mapping non-2xx statuses to
/// [`ApiError::Status`] with any remote detail preserved.
async fn read_json_response(resp: reqwest::Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let body_text = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        // The remote reports validation problems as {"detail": ...}; keep
        // that text visible instead of a bare status code.
        let message = serde_json::from_str::<Value>(&body_text)
            .ok()
            .and_then(|json| {
                json.get("detail")
                    .or_else(|| json.get("message"))
                    .and_then(Value::as_str)
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| status_message(status));
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    if body_text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body_text)?)
}

async fn get_json(url: Url, timeout: Duration) -> Result<Value, ApiError> {
    let shown = display_url(&url);
    let client = build_client(timeout)?;
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| friendly_error(&shown, e))?;
    read_json_response(resp).await
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// `GET /docs_sales/` — the sales-history listing. Doubles as the token
/// validity probe and as the sole source for derived reference data.
///
/// The response shape is `{ "result": [SalesDocument, ...] }`; a missing
/// `result` field is treated as an empty listing.
pub async fn fetch_sales_documents(
    base_url: &str,
    token: &str,
) -> Result<Vec<SalesDocument>, ApiError> {
    let url = endpoint(base_url, "/docs_sales/", &[("token", token)])?;
    let body = get_json(url, DEFAULT_TIMEOUT).await?;
    let result = body.get("result").cloned().unwrap_or(Value::Array(vec![]));
    let docs: Vec<SalesDocument> = serde_json::from_value(result)?;
    debug!(count = docs.len(), "fetched sales documents");
    Ok(docs)
}

/// Lightweight token-validation probe against the sales listing.
///
/// Only reachability and an accepted token matter here; the body is
/// discarded. Uses a shorter timeout so a dead backend fails login fast.
pub async fn probe_sales_listing(base_url: &str, token: &str) -> Result<(), ApiError> {
    let url = endpoint(base_url, "/docs_sales/", &[("token", token)])?;
    get_json(url, PROBE_TIMEOUT).await?;
    Ok(())
}

/// `GET /contragents/` — customer search by phone prefix.
///
/// The response is an array of customer-like objects whose exact field set
/// varies; callers extract what they need tolerantly.
pub async fn search_contragents(
    base_url: &str,
    token: &str,
    phone: &str,
) -> Result<Vec<Value>, ApiError> {
    let url = endpoint(
        base_url,
        "/contragents/",
        &[("token", token), ("phone", phone)],
    )?;
    let body = get_json(url, DEFAULT_TIMEOUT).await?;
    Ok(body.as_array().cloned().unwrap_or_default())
}

/// `POST /docs_sales/` — submit a composed sales document.
pub async fn post_sales_document(
    base_url: &str,
    token: &str,
    document: &Value,
) -> Result<Value, ApiError> {
    let url = endpoint(base_url, "/docs_sales/", &[("token", token)])?;
    let shown = display_url(&url);
    let client = build_client(DEFAULT_TIMEOUT)?;
    let resp = client
        .post(url)
        .json(document)
        .send()
        .await
        .map_err(|e| friendly_error(&shown, e))?;
    read_json_response(resp).await
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_https_scheme() {
        assert_eq!(
            normalize_base_url("app.tablecrm.com/api/v1"),
            "https://app.tablecrm.com/api/v1"
        );
    }

    #[test]
    fn normalize_uses_http_for_localhost() {
        assert_eq!(
            normalize_base_url("localhost:8000/api/v1"),
            "http://localhost:8000/api/v1"
        );
        assert_eq!(normalize_base_url("127.0.0.1:8000"), "http://127.0.0.1:8000");
    }

    #[test]
    fn normalize_strips_trailing_slashes() {
        assert_eq!(
            normalize_base_url("https://app.tablecrm.com/api/v1///"),
            "https://app.tablecrm.com/api/v1"
        );
    }

    #[test]
    fn endpoint_encodes_token_as_query_parameter() {
        let url = endpoint(
            "https://app.tablecrm.com/api/v1",
            "/docs_sales/",
            &[("token", "abc 123")],
        )
        .unwrap();
        assert_eq!(url.path(), "/api/v1/docs_sales/");
        assert_eq!(url.query(), Some("token=abc+123"));
    }

    #[test]
    fn display_url_hides_the_token() {
        let url = endpoint(
            "https://app.tablecrm.com/api/v1",
            "/docs_sales/",
            &[("token", "secret")],
        )
        .unwrap();
        assert!(!display_url(&url).contains("secret"));
    }

    #[test]
    fn status_message_maps_auth_failures() {
        assert_eq!(
            status_message(StatusCode::UNAUTHORIZED),
            "API token is invalid or expired"
        );
        assert_eq!(
            status_message(StatusCode::FORBIDDEN),
            "API token is invalid or expired"
        );
        assert!(status_message(StatusCode::INTERNAL_SERVER_ERROR).contains("500"));
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_transport_error() {
        // Port 9 (discard) is not listening locally; the connection is
        // refused immediately without touching the network.
        let err = probe_sales_listing("http://127.0.0.1:9", "t")
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Unreachable { .. } | ApiError::Network { .. }),
            "unexpected error: {err}"
        );
    }
}
