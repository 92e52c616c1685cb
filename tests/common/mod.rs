//! Shared fixtures: local stub servers and generated PDFs.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use docsift::{AnalysisConfig, Analyzer};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const TEST_KEY: &str = "gsk_test_key_WXYZ";

/// Serve `app` on a random local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serve `/page` and `/v1/chat/completions`, each answering only after `delay`.
///
/// Returns the base URL.
pub async fn spawn_slow(delay: Duration) -> String {
    let app = Router::new()
        .route(
            "/page",
            get(move || async move {
                tokio::time::sleep(delay).await;
                ([(header::CONTENT_TYPE, "text/html")], "<body>late</body>")
            }),
        )
        .route(
            "/v1/chat/completions",
            post(move || async move {
                tokio::time::sleep(delay).await;
                (
                    [(header::CONTENT_TYPE, "application/json")],
                    completion_body("late"),
                )
            }),
        );
    spawn(app).await
}

/// A local URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Serve `html` at `/page`; every other path is a 404.
pub async fn spawn_page(html: &'static str) -> String {
    let app = Router::new().route(
        "/page",
        get(move || async move { ([(header::CONTENT_TYPE, "text/html")], html) }),
    );
    spawn(app).await
}

/// What the stub provider saw.
#[derive(Clone, Default)]
pub struct Recorder {
    hits: Arc<AtomicUsize>,
    authorization: Arc<Mutex<Option<String>>>,
    body: Arc<Mutex<Option<serde_json::Value>>>,
}

impl Recorder {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn authorization(&self) -> Option<String> {
        self.authorization.lock().unwrap().clone()
    }

    pub fn body(&self) -> serde_json::Value {
        self.body.lock().unwrap().clone().expect("provider was called")
    }

    /// `messages[0].content` of the last request.
    pub fn prompt(&self) -> String {
        self.body()["messages"][0]["content"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

/// Chat-completions stub answering every call with `status` and `body`.
///
/// Returns the full endpoint URL.
pub async fn spawn_provider(status: StatusCode, body: &'static str) -> (String, Recorder) {
    let recorder = Recorder::default();
    let rec = recorder.clone();
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, request: Bytes| {
            let rec = rec.clone();
            async move {
                rec.hits.fetch_add(1, Ordering::SeqCst);
                *rec.authorization.lock().unwrap() = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                *rec.body.lock().unwrap() = serde_json::from_slice(&request).ok();
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        }),
    );
    let base = spawn(app).await;
    (format!("{base}/v1/chat/completions"), recorder)
}

/// A provider answer carrying `content` as the first choice.
pub fn completion_body(content: &str) -> &'static str {
    let body = serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    });
    Box::leak(body.to_string().into_boxed_str())
}

pub fn config(api_url: &str) -> AnalysisConfig {
    AnalysisConfig::builder()
        .api_key(TEST_KEY)
        .api_url(api_url)
        .fetch_timeout_secs(5)
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

pub fn analyzer(config: &AnalysisConfig) -> Analyzer {
    Analyzer::from_config(config).unwrap()
}

// ── PDF fixtures ─────────────────────────────────────────────────────────────

/// A PDF with one page per entry, each showing that string.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    save(&mut doc)
}

/// A structurally valid PDF whose trailer declares standard encryption.
pub fn encrypted_pdf() -> Vec<u8> {
    let mut doc = Document::load_mem(&pdf_with_pages(&["secret"])).unwrap();
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    save(&mut doc)
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
