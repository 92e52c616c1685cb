//! Flow tests against local stub servers.
//!
//! Web pages and the completion provider are served by axum on
//! `127.0.0.1:0`; PDFs are generated with lopdf.

mod common;

use axum::http::StatusCode;
use common::*;
use docsift::prompts::DEFAULT_SUMMARY_PREFIX;
use docsift::{AnalysisConfig, AnalysisStatus, BadRequestError, DocumentUpload, ScrapeOutput};
use std::time::Duration;

// ── Scrape ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scrape_returns_title_and_body_separately() {
    let base = spawn_page("<title>Ex</title><body>Hello world</body>").await;
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("unused")).await;
    let a = analyzer(&config(&api_url));

    let out = a.scrape(&format!("{base}/page")).await;

    assert_eq!(
        out,
        ScrapeOutput::Success {
            title: "Ex".into(),
            content: "Hello world".into(),
        }
    );
    assert_eq!(provider.hits(), 0, "scrape must not call the provider");
}

#[tokio::test]
async fn scrape_reports_http_status_failures() {
    let base = spawn_page("<body>never served</body>").await;
    let a = analyzer(&config("http://127.0.0.1:9/v1/chat/completions"));

    match a.scrape(&format!("{base}/missing")).await {
        ScrapeOutput::Error { message } => assert!(message.contains("404"), "got: {message}"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn scrape_reports_connection_failures() {
    let a = analyzer(&config("http://127.0.0.1:9/v1/chat/completions"));
    let out = a.scrape(&dead_url().await).await;
    assert!(!out.is_success());
}

#[tokio::test]
async fn scrape_rejects_invalid_urls() {
    let a = analyzer(&config("http://127.0.0.1:9/v1/chat/completions"));
    match a.scrape("not a url").await {
        ScrapeOutput::Error { message } => assert!(message.contains("Invalid URL")),
        other => panic!("expected error, got {other:?}"),
    }
}

// ── Text analysis ────────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_text_is_rejected_without_provider_call() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("x")).await;
    let a = analyzer(&config(&api_url));

    for blank in ["", "   ", "\n\t"] {
        assert_eq!(
            a.analyze_text(blank).await.unwrap_err(),
            BadRequestError::EmptyInput
        );
    }
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn short_text_reaches_provider() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("Hello!")).await;
    let a = analyzer(&config(&api_url));

    let result = a.analyze_text("hi").await.unwrap();

    assert_eq!(result.status, AnalysisStatus::Success);
    assert_eq!(result.completion.as_deref(), Some("Hello!"));
    assert_eq!(provider.hits(), 1);
    assert_eq!(provider.prompt(), "hi");
}

#[tokio::test]
async fn request_carries_bearer_credential_and_fixed_parameters() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("ok")).await;
    let a = analyzer(&config(&api_url));

    a.analyze_text("hi").await.unwrap();

    assert_eq!(provider.authorization(), Some(format!("Bearer {TEST_KEY}")));
    let body = provider.body();
    assert_eq!(body["model"], docsift::config::DEFAULT_MODEL);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["max_tokens"], 1024);
    assert_eq!(body["stream"], false);
    assert!(body["stop"].is_null());
}

#[tokio::test]
async fn malformed_provider_answer_is_partial() {
    let (api_url, _provider) = spawn_provider(StatusCode::OK, r#"{"unexpected":true}"#).await;
    let a = analyzer(&config(&api_url));

    let result = a.analyze_text("hi").await.unwrap();

    assert_eq!(result.status, AnalysisStatus::Partial);
    assert_eq!(result.error_kind.as_deref(), Some("malformed_response"));
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

fn one_second_timeouts(api_url: &str) -> AnalysisConfig {
    AnalysisConfig::builder()
        .api_key(TEST_KEY)
        .api_url(api_url)
        .fetch_timeout_secs(1)
        .api_timeout_secs(1)
        .build()
        .unwrap()
}

#[tokio::test]
async fn slow_page_is_a_fetch_timeout() {
    let base = spawn_slow(Duration::from_secs(3)).await;
    let a = analyzer(&one_second_timeouts(&format!("{base}/v1/chat/completions")));

    match a.scrape(&format!("{base}/page")).await {
        ScrapeOutput::Error { message } => {
            assert!(message.contains("timed out after 1s"), "got: {message}")
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_provider_is_a_transport_failure() {
    let base = spawn_slow(Duration::from_secs(3)).await;
    let a = analyzer(&one_second_timeouts(&format!("{base}/v1/chat/completions")));

    let result = a.analyze_text("hi").await.unwrap();

    assert_eq!(result.status, AnalysisStatus::Partial);
    assert_eq!(result.error_kind.as_deref(), Some("transport"));
    assert!(result.error.unwrap().contains("timed out"));
}

// ── Document analysis ────────────────────────────────────────────────────────

#[tokio::test]
async fn document_summary_uses_prefix_and_extracted_text() {
    let (api_url, provider) =
        spawn_provider(StatusCode::OK, completion_body("A greeting.")).await;
    let a = analyzer(&config(&api_url));
    let upload = DocumentUpload::new(pdf_with_pages(&["Hello World"])).with_filename("hello.pdf");

    let result = a.analyze_document(upload).await;

    assert_eq!(result.status, AnalysisStatus::Success, "{result:?}");
    assert_eq!(result.completion.as_deref(), Some("A greeting."));
    assert_eq!(result.page_count, Some(1));
    assert!(result.extracted_text.as_deref().unwrap().contains("Hello World"));
    assert!(result.diagnostics.is_none());

    let prompt = provider.prompt();
    assert!(prompt.starts_with(&format!("{DEFAULT_SUMMARY_PREFIX}\n\n")));
    assert!(prompt.contains("Hello World"));
}

#[tokio::test]
async fn provider_rate_limit_keeps_extracted_text() {
    let (api_url, _provider) = spawn_provider(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"Rate limit reached"}}"#,
    )
    .await;
    let a = analyzer(&config(&api_url));

    let result = a
        .analyze_document(DocumentUpload::new(pdf_with_pages(&["Hello World"])))
        .await;

    assert_eq!(result.status, AnalysisStatus::Partial);
    assert!(result.extracted_text.as_deref().unwrap().contains("Hello World"));
    assert_eq!(result.error.as_deref(), Some("Error: 429 - Too Many Requests"));
    assert_eq!(result.http_status, Some(429));
    assert_eq!(result.location.as_deref(), Some("completing"));
    assert!(result.warning.is_some());
}

#[tokio::test]
async fn document_text_is_truncated_to_budget() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("ok")).await;
    let config = AnalysisConfig::builder()
        .api_key(TEST_KEY)
        .api_url(api_url)
        .truncation_budget(5)
        .build()
        .unwrap();
    let a = analyzer(&config);

    let result = a
        .analyze_document(DocumentUpload::new(pdf_with_pages(&["Hello World"])))
        .await;

    assert_eq!(result.status, AnalysisStatus::Success);
    assert_eq!(provider.prompt(), format!("{DEFAULT_SUMMARY_PREFIX}\n\nHello"));
    // The merged result keeps the full extraction.
    assert!(result.extracted_text.as_deref().unwrap().contains("Hello World"));
}

#[tokio::test]
async fn pages_are_concatenated_in_order() {
    let (api_url, _provider) = spawn_provider(StatusCode::OK, completion_body("ok")).await;
    let a = analyzer(&config(&api_url));

    let result = a
        .analyze_document(DocumentUpload::new(pdf_with_pages(&["First", "Second", "Third"])))
        .await;

    let text = result.extracted_text.unwrap();
    let first = text.find("First").unwrap();
    let second = text.find("Second").unwrap();
    let third = text.find("Third").unwrap();
    assert!(first < second && second < third, "got: {text:?}");
    assert_eq!(result.page_count, Some(3));
}

#[tokio::test]
async fn non_pdf_upload_is_invalid_format_with_diagnostics() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("x")).await;
    let a = analyzer(&config(&api_url));
    let upload = DocumentUpload::new(b"<html>nope</html>".to_vec())
        .with_filename("page.html")
        .with_content_type("text/html");

    let result = a.analyze_document(upload).await;

    assert_eq!(result.status, AnalysisStatus::Error);
    assert_eq!(result.error_kind.as_deref(), Some("invalid_format"));
    assert!(result.error.unwrap().starts_with("Failed to process PDF:"));
    let diagnostics = result.diagnostics.unwrap();
    assert_eq!(diagnostics.filename.as_deref(), Some("page.html"));
    assert_eq!(diagnostics.size, 17);
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn encrypted_pdf_is_reported_as_encrypted() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("x")).await;
    let a = analyzer(&config(&api_url));

    let result = a.analyze_document(DocumentUpload::new(encrypted_pdf())).await;

    assert_eq!(result.status, AnalysisStatus::Error);
    assert_eq!(result.error_kind.as_deref(), Some("encrypted"));
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn pdf_without_pages_is_empty_document() {
    let (api_url, _provider) = spawn_provider(StatusCode::OK, completion_body("x")).await;
    let a = analyzer(&config(&api_url));

    let result = a.analyze_document(DocumentUpload::new(pdf_with_pages(&[]))).await;

    assert_eq!(result.status, AnalysisStatus::Error);
    assert_eq!(result.error_kind.as_deref(), Some("empty_document"));
}

#[tokio::test]
async fn pdf_without_text_is_not_sent() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("x")).await;
    let a = analyzer(&config(&api_url));

    let result = a.analyze_document(DocumentUpload::new(pdf_with_pages(&[""]))).await;

    assert_eq!(result.status, AnalysisStatus::Error);
    assert_eq!(result.error_kind.as_deref(), Some("no_extractable_text"));
    assert_eq!(result.page_count, Some(1));
    assert!(result.diagnostics.is_some());
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn missing_credential_is_partial_without_provider_call() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("x")).await;
    let config = AnalysisConfig::builder().api_url(api_url).build().unwrap();
    let a = analyzer(&config);

    let result = a
        .analyze_document(DocumentUpload::new(pdf_with_pages(&["Hello World"])))
        .await;

    assert_eq!(result.status, AnalysisStatus::Partial);
    assert_eq!(result.error_kind.as_deref(), Some("configuration"));
    assert!(result.extracted_text.is_some());
    assert_eq!(provider.hits(), 0);
}

#[tokio::test]
async fn unreachable_provider_is_partial() {
    let api_url = format!("{}v1/chat/completions", dead_url().await);
    let a = analyzer(&config(&api_url));

    let result = a
        .analyze_document(DocumentUpload::new(pdf_with_pages(&["Hello World"])))
        .await;

    assert_eq!(result.status, AnalysisStatus::Partial);
    assert_eq!(result.error_kind.as_deref(), Some("transport"));
}

#[tokio::test]
async fn identical_requests_send_identical_bodies() {
    let (api_url, provider) = spawn_provider(StatusCode::OK, completion_body("ok")).await;
    let a = analyzer(&config(&api_url));
    let pdf = pdf_with_pages(&["Same input"]);

    a.analyze_document(DocumentUpload::new(pdf.clone())).await;
    let first = provider.body();
    a.analyze_document(DocumentUpload::new(pdf)).await;

    assert_eq!(provider.hits(), 2);
    assert_eq!(first, provider.body());
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_reports_structure() {
    let a = analyzer(&config("http://127.0.0.1:9/v1/chat/completions"));
    let pdf = pdf_with_pages(&["a", "b"]);
    let size = pdf.len();

    let info = a.inspect_document(pdf).await.unwrap();

    assert_eq!(info.page_count, 2);
    assert_eq!(info.pdf_version, "1.5");
    assert!(!info.encrypted);
    assert_eq!(info.size, size);
}

#[tokio::test]
async fn inspect_flags_encryption_instead_of_failing() {
    let a = analyzer(&config("http://127.0.0.1:9/v1/chat/completions"));
    let info = a.inspect_document(encrypted_pdf()).await.unwrap();
    assert!(info.encrypted);
}
