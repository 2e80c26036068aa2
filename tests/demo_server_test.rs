#![cfg(feature = "demo-server")]

use std::sync::{Arc, Mutex};

use foodsense::models::{AnalysisRequest, AnalysisResult, ClientConfiguration};
use foodsense::server::{create_router, ModeBody};
use foodsense::services::fallback::canned_result;
use foodsense::services::{ConnectivityProbe, MealAnalyzer};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

/// Records what the server handed to the analyzer.
#[derive(Default)]
struct RecordingAnalyzer {
    calls: Mutex<Vec<(String, String, ClientConfiguration)>>,
}

#[async_trait::async_trait]
impl MealAnalyzer for RecordingAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest, config: &ClientConfiguration) -> AnalysisResult {
        self.calls.lock().unwrap().push((
            request.file_name().to_string(),
            request.media_type().to_string(),
            *config,
        ));
        canned_result()
    }
}

async fn spawn_server(analyzer: Arc<RecordingAnalyzer>) -> String {
    let probe = Arc::new(ConnectivityProbe::new(Vec::new(), reqwest::Client::new()));
    let app = create_router(analyzer, probe, ClientConfiguration::live());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn image_form(name: &str, mime: &str) -> Form {
    let part = Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap();
    Form::new().part("image", part)
}

#[tokio::test]
async fn test_analyze_upload_uses_toggle_state() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let base = spawn_server(analyzer.clone()).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/analyze", base))
        .multipart(image_form("lunch.png", "image/png"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sample_data"], false);
    assert_eq!(body["food"].as_array().unwrap().len(), 3);

    let mode: ModeBody = http
        .post(format!("{}/api/mode", base))
        .json(&ModeBody { offline: true })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(mode.offline);

    let body: Value = http
        .post(format!("{}/api/analyze", base))
        .multipart(image_form("lunch.png", "image/png"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["sample_data"], true);

    let calls = analyzer.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "lunch.png");
    assert_eq!(calls[0].1, "image/png");
    assert!(!calls[0].2.use_offline_fallback);
    assert!(calls[1].2.use_offline_fallback);
}

#[tokio::test]
async fn test_non_image_upload_rejected() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let base = spawn_server(analyzer.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/analyze", base))
        .multipart(image_form("notes.txt", "text/plain"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 415);
    assert!(analyzer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_content_type_needs_image_extension() {
    let analyzer = Arc::new(RecordingAnalyzer::default());
    let base = spawn_server(analyzer.clone()).await;
    let http = reqwest::Client::new();

    let untyped = |name: &str| {
        Form::new().part("image", Part::bytes(b"hello".to_vec()).file_name(name.to_string()))
    };

    let response = http
        .post(format!("{}/api/analyze", base))
        .multipart(untyped("notes.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 415);
    assert!(analyzer.calls.lock().unwrap().is_empty());

    let response = http
        .post(format!("{}/api/analyze", base))
        .multipart(untyped("dinner.jpg"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let calls = analyzer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, "image/jpeg");
}

#[tokio::test]
async fn test_health_and_mode() {
    let base = spawn_server(Arc::new(RecordingAnalyzer::default())).await;
    let http = reqwest::Client::new();

    let health = http.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "OK");

    let mode: ModeBody = http
        .get(format!("{}/api/mode", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!mode.offline);
}
