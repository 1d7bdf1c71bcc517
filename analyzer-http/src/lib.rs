//! Minimal page-fetching HTTP client with safe logging.
//!
//! - One `GET` per call, no retries, redirects per `reqwest` defaults
//! - 4xx/5xx responses are reported as [`HttpError::Status`]
//! - Request/response `tracing` events tagged with a per-request id
//! - Optional *raw* request/response logging via `PAGE_ANALYZER_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), analyzer_http::HttpError> {
//! let client = analyzer_http::HttpClient::new()?;
//! let page = client
//!     .get_text("https://example.com", analyzer_http::RequestOpts::default())
//!     .await?;
//! assert!(page.status.is_success());
//! # Ok(()) }
//! ```
//!
//! Observability: structured events are emitted for request start, response
//! headers, body snippets (trace level), and final errors. Raw lines go to
//! target `http.raw` when `PAGE_ANALYZER_HTTP_RAW` is set.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub use reqwest::{StatusCode, Url};

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "PAGE_ANALYZER_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

pub const DEFAULT_USER_AGENT: &str = concat!("page-analyzer/", env!("CARGO_PKG_VERSION"));

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a curl command for repro/debug, with sensitive headers redacted.
fn make_curl(url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), "-XGET".to_string(), "-L".to_string()];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if matches!(
                key.to_ascii_lowercase().as_str(),
                "authorization" | "cookie" | "set-cookie" | "proxy-authorization"
            ) {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}, body_snippet: {body_snippet}")]
    Status {
        status: StatusCode,
        body_snippet: String,
    },
}

// ==============================
// Settings & Request Options
// ==============================

/// Client-wide transport settings, fixed when the client is built.
#[derive(Clone, Debug)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use analyzer_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
}

/// A successfully fetched page.
#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// Status of the final response after redirects.
    pub status: StatusCode,
    /// URL of the final response after redirects.
    pub final_url: Url,
    pub body: String,
}

// ==============================
// Client
// ==============================

/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    user_agent: HeaderValue,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Build a client with [`ClientSettings::default`].
    ///
    /// ```no_run
    /// use analyzer_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::with_settings(ClientSettings::default())
    }

    pub fn with_settings(settings: ClientSettings) -> Result<Self, HttpError> {
        let user_agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?;
        let inner = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            user_agent,
            default_timeout: settings.timeout,
        })
    }

    /// Override the total request timeout.
    ///
    /// ```no_run
    /// use analyzer_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?.with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET `url` and decode the body as text (charset from `Content-Type`,
    /// UTF-8 otherwise).
    ///
    /// Transport failures map to [`HttpError::Network`], 4xx/5xx to
    /// [`HttpError::Status`]. Nothing is retried.
    pub async fn get_text(&self, url: &str, opts: RequestOpts) -> Result<FetchedPage, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());

        let req_id = uuid::Uuid::new_v4().simple().to_string();

        tracing::debug!(
            req_id=%req_id,
            method="GET",
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&url, &headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = self
            .inner
            .get(url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| {
                let message = err.to_string();
                tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
                HttpError::Network(message)
            })?;

        let status = resp.status();
        let final_url = resp.url().clone();
        let resp_headers = resp.headers().clone();
        let body = resp.text().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, %status, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            final_url=%final_url,
            duration_ms=dur_ms,
            body_len=body.len(),
            content_type=?resp_headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&resp_headers);
            let (text, truncated) = truncate_at_char(&body, RAW_MAX_BODY);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&body);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(req_id=%req_id, %status, body_snippet=%snippet, "http.error");
            return Err(HttpError::Status {
                status,
                body_snippet: snippet,
            });
        }

        Ok(FetchedPage {
            status,
            final_url,
            body,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn truncate_at_char(s: &str, max: usize) -> (&str, bool) {
    if s.len() <= max {
        return (s, false);
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    (&s[..end], true)
}

fn snip_body(body: &str) -> String {
    let (head, truncated) = truncate_at_char(body, 500);
    if truncated {
        format!("{head}...")
    } else {
        head.to_string()
    }
}
