mod common;

use analyzer_core::{
    InspectionResult, PageInspector, ValidationError, ValidationOutcome, normalize, validate,
};
use chrono::Local;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// validate -> normalize -> check, the way a caller drives the core.
async fn analyze(inspector: &PageInspector, raw: &str) -> Result<InspectionResult, ValidationError> {
    validate(raw).into_result()?;
    let address = normalize(raw);
    Ok(inspector.check(&address).await)
}

#[tokio::test]
async fn pipeline_reports_page_metadata() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<!doctype html><html><head><title>Shop</title>
            <meta name="description" content="Best shop"></head>
            <body><h1>Welcome</h1></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    // wiremock listens on 127.0.0.1, which validates as an IPv4 host
    let raw = format!("{}/catalog/item?id=3#top", server.uri());
    assert_eq!(validate(&raw), ValidationOutcome::Valid);
    assert_eq!(normalize(&raw).as_str(), server.uri());

    let inspector = PageInspector::new().unwrap();
    let result = analyze(&inspector, &raw).await.unwrap();
    let check = result.into_option().expect("success");
    assert_eq!(check.status_code, 200);
    assert_eq!(check.title.as_deref(), Some("Shop"));
    assert_eq!(check.heading.as_deref(), Some("Welcome"));
    assert_eq!(check.description.as_deref(), Some("Best shop"));
    assert_eq!(check.observed_at, Local::now().date_naive());
}

#[tokio::test]
async fn pipeline_stops_at_validation() {
    common::init_test_tracing();
    let inspector = PageInspector::new().unwrap();

    let err = analyze(&inspector, "not a url").await.unwrap_err();
    assert_eq!(err.to_string(), "Некорректный URL");

    let long = format!("http://{}.com", "a".repeat(260));
    let err = analyze(&inspector, &long).await.unwrap_err();
    assert_eq!(err, ValidationError::TooLong);
}

#[tokio::test]
async fn pipeline_surfaces_unreachable_pages_as_failure() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let inspector = PageInspector::new().unwrap();
    let result = analyze(&inspector, &server.uri()).await.unwrap();
    assert_eq!(result, InspectionResult::Failure);
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"outcome":"failure"}"#
    );
}
