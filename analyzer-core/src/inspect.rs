use analyzer_http::{ClientSettings, FetchedPage, HttpClient, HttpError, RequestOpts};
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::extract::{PageCheck, parse_page};

/// Anything that can GET an address and hand back status + body.
///
/// [`HttpClient`] is the production implementation.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<FetchedPage, HttpError>;
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch(&self, address: &str) -> Result<FetchedPage, HttpError> {
        self.get_text(address, RequestOpts::default()).await
    }
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("page could not be fetched: {0}")]
    Fetch(#[from] HttpError),
}

/// Outcome of [`PageInspector::check`]. `Failure` deliberately carries no
/// detail; use [`PageInspector::try_check`] when the cause matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum InspectionResult {
    Success(PageCheck),
    Failure,
}

impl InspectionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_option(self) -> Option<PageCheck> {
        match self {
            Self::Success(check) => Some(check),
            Self::Failure => None,
        }
    }
}

impl From<InspectionResult> for Option<PageCheck> {
    fn from(result: InspectionResult) -> Self {
        result.into_option()
    }
}

/// Fetches one page per call and extracts its SEO metadata.
///
/// Stateless apart from the source's connection pool, so one inspector can
/// serve concurrent checks.
pub struct PageInspector<S = HttpClient> {
    source: S,
}

impl PageInspector<HttpClient> {
    /// Inspector backed by an [`HttpClient`] with default settings.
    pub fn new() -> Result<Self, HttpError> {
        Ok(Self::with_source(HttpClient::new()?))
    }

    pub fn with_settings(settings: ClientSettings) -> Result<Self, HttpError> {
        Ok(Self::with_source(HttpClient::with_settings(settings)?))
    }
}

impl<S: PageSource> PageInspector<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Fetch and parse `address`, keeping the failure cause.
    pub async fn try_check(&self, address: &Address) -> Result<PageCheck, InspectError> {
        let page = self.source.fetch(address.as_str()).await?;
        let check = parse_page(
            &page.body,
            page.status.as_u16(),
            Local::now().date_naive(),
        );
        tracing::debug!(
            %address,
            final_url = %page.final_url,
            status = check.status_code,
            has_title = check.title.is_some(),
            has_heading = check.heading.is_some(),
            has_description = check.description.is_some(),
            "inspect.success"
        );
        Ok(check)
    }

    /// Fetch and parse `address`. Every fetch failure, including 4xx/5xx
    /// responses, collapses into [`InspectionResult::Failure`].
    pub async fn check(&self, address: &Address) -> InspectionResult {
        match self.try_check(address).await {
            Ok(check) => InspectionResult::Success(check),
            Err(err) => {
                tracing::warn!(%address, error = %err, "inspect.failure");
                InspectionResult::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::normalize;
    use analyzer_http::{StatusCode, Url};
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FULL_PAGE: &str = r#"<html><head><title>T</title><meta name="description" content="D"></head><body><h1>H</h1></body></html>"#;

    /// Canned responses keyed by nothing: returns the same thing every time
    /// and remembers which addresses were asked for.
    struct StubSource {
        reply: fn() -> Result<FetchedPage, HttpError>,
        seen: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(reply: fn() -> Result<FetchedPage, HttpError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn fetch(&self, address: &str) -> Result<FetchedPage, HttpError> {
            self.seen.lock().unwrap().push(address.to_string());
            (self.reply)()
        }
    }

    fn ok_page() -> Result<FetchedPage, HttpError> {
        Ok(FetchedPage {
            status: StatusCode::OK,
            final_url: Url::parse("https://example.com/").unwrap(),
            body: FULL_PAGE.to_string(),
        })
    }

    fn refused() -> Result<FetchedPage, HttpError> {
        Err(HttpError::Network("connection refused".into()))
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn dead_address() -> Address {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        normalize(&format!("http://{addr}/"))
    }

    #[tokio::test]
    async fn stub_success_produces_full_record() {
        let inspector = PageInspector::with_source(StubSource::new(ok_page));
        let address = normalize("https://Example.com/about");

        let result = inspector.check(&address).await;
        let check = result.into_option().expect("success");
        assert_eq!(check.status_code, 200);
        assert_eq!(check.title.as_deref(), Some("T"));
        assert_eq!(check.heading.as_deref(), Some("H"));
        assert_eq!(check.description.as_deref(), Some("D"));
        assert_eq!(check.observed_at, today());
        assert_eq!(
            *inspector.source.seen.lock().unwrap(),
            vec!["https://example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn stub_failure_is_collapsed() {
        let inspector = PageInspector::with_source(StubSource::new(refused));
        let address = normalize("https://example.com");

        assert_eq!(inspector.check(&address).await, InspectionResult::Failure);
        let err = inspector.try_check(&address).await.unwrap_err();
        assert!(matches!(err, InspectError::Fetch(HttpError::Network(_))));
    }

    #[tokio::test]
    async fn fetches_and_parses_live_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string(FULL_PAGE),
            )
            .expect(1)
            .mount(&server)
            .await;

        let inspector = PageInspector::new().unwrap();
        let address = normalize(&format!("{}/some/path?x=1", server.uri()));
        let result = inspector.check(&address).await;

        assert_eq!(
            result,
            InspectionResult::Success(PageCheck {
                status_code: 200,
                title: Some("T".into()),
                heading: Some("H".into()),
                description: Some("D".into()),
                observed_at: today(),
            })
        );
    }

    #[tokio::test]
    async fn bare_page_has_no_optional_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>plain</body></html>"))
            .mount(&server)
            .await;

        let inspector = PageInspector::new().unwrap();
        let check = inspector
            .check(&Address::from_stored(server.uri()))
            .await
            .into_option()
            .expect("success");
        assert_eq!(check.status_code, 200);
        assert_eq!(check.title, None);
        assert_eq!(check.heading, None);
        assert_eq!(check.description, None);
    }

    #[tokio::test]
    async fn not_found_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not Found</title>"))
            .expect(1)
            .mount(&server)
            .await;

        let inspector = PageInspector::new().unwrap();
        let result = inspector.check(&Address::from_stored(server.uri())).await;
        assert_eq!(result, InspectionResult::Failure);
    }

    #[tokio::test]
    async fn server_error_is_failure_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let inspector = PageInspector::new().unwrap();
        let result = inspector.check(&Address::from_stored(server.uri())).await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn refused_connection_is_failure() {
        let inspector = PageInspector::new().unwrap();
        assert_eq!(
            inspector.check(&dead_address()).await,
            InspectionResult::Failure
        );
    }

    #[tokio::test]
    async fn garbage_address_is_failure() {
        let inspector = PageInspector::new().unwrap();
        let address = normalize("not a url");
        assert_eq!(inspector.check(&address).await, InspectionResult::Failure);
    }

    #[tokio::test]
    async fn redirect_reports_final_status() {
        let server = MockServer::start().await;
        Mock::given(path("/"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/home", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(path("/home"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Home</h1>"))
            .mount(&server)
            .await;

        let inspector = PageInspector::new().unwrap();
        let check = inspector
            .check(&Address::from_stored(server.uri()))
            .await
            .into_option()
            .expect("success");
        assert_eq!(check.status_code, 200);
        assert_eq!(check.heading.as_deref(), Some("Home"));
    }

    #[tokio::test]
    async fn concurrent_checks_are_independent() {
        let ok = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>ok</title>"))
            .mount(&ok)
            .await;
        let gone = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&gone)
            .await;

        let inspector = PageInspector::new().unwrap();
        let ok_addr = Address::from_stored(ok.uri());
        let gone_addr = Address::from_stored(gone.uri());
        let (a, b, c) = tokio::join!(
            inspector.check(&ok_addr),
            inspector.check(&gone_addr),
            inspector.check(&ok_addr),
        );
        assert!(a.is_success());
        assert_eq!(b, InspectionResult::Failure);
        assert_eq!(a, c);
    }

    #[test]
    fn result_serializes_with_outcome_tag() {
        let success = InspectionResult::Success(PageCheck {
            status_code: 200,
            title: None,
            heading: Some("H".into()),
            description: None,
            observed_at: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        });
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "outcome": "success",
                "status_code": 200,
                "title": null,
                "heading": "H",
                "description": null,
                "observed_at": "2025-01-31"
            })
        );
        let back: InspectionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, success);

        let failure = serde_json::to_value(InspectionResult::Failure).unwrap();
        assert_eq!(failure, serde_json::json!({ "outcome": "failure" }));
    }
}
