//! Router-level tests with scripted transcript and completion backends.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use konspekt_core::{
    Completion, CompletionBackend, NotesPipeline, TranscriptSegment, TranscriptSource,
};
use konspekt_server::{
    quota::QuotaLedger, routes::router, settings::parse_admin_ips, state::AppState,
    store::NoteStore,
};
use tower::util::ServiceExt;

struct StaticTranscripts;

#[async_trait]
impl TranscriptSource for StaticTranscripts {
    async fn fetch(&self, video_id: &str) -> konspekt_core::Result<Vec<TranscriptSegment>> {
        Ok(vec![TranscriptSegment {
            text: format!("transcript for {video_id}"),
            start: 0.0,
            duration: 5.0,
        }])
    }
}

struct CountingBackend {
    calls: AtomicUsize,
}

impl CountingBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for CountingBackend {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_content: &str,
    ) -> konspekt_core::Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Completion {
            text: "## Generated notes".to_string(),
            input_tokens: 100,
            output_tokens: 50,
        })
    }
}

fn test_app(admin_ips: &str) -> (Router, Arc<CountingBackend>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(CountingBackend::new());
    let state = AppState {
        pipeline: Arc::new(NotesPipeline::new(backend.clone())),
        transcripts: Arc::new(StaticTranscripts),
        store: NoteStore::new(dir.path()),
        quota: Arc::new(QuotaLedger::new(2, parse_admin_ips(admin_ips))),
    };
    (router(state), backend, dir)
}

fn post_note(url: &str, force_refresh: bool, ip: &str) -> Request<Body> {
    let body = serde_json::json!({ "url": url, "force_refresh": force_refresh });
    Request::builder()
        .method("POST")
        .uri("/notes")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (app, _backend, _dir) = test_app("");
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "konspekt API is running");
}

#[tokio::test]
async fn created_note_can_be_fetched_back() {
    let (app, _backend, _dir) = test_app("");

    let response = app
        .clone()
        .oneshot(post_note(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            false,
            "1.2.3.4",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["video_id"], "dQw4w9WgXcQ");
    assert_eq!(created["markdown"], "## Generated notes");
    // One map call and one reduce call at 100/50 tokens each.
    assert_eq!(created["stats"]["input_tokens"], 200);
    assert_eq!(created["stats"]["output_tokens"], 100);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/notes/dQw4w9WgXcQ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = json_body(response).await;
    assert_eq!(fetched["id"], created["id"]);
}

#[tokio::test]
async fn repeated_url_returns_cached_note_without_new_calls() {
    let (app, backend, _dir) = test_app("");
    let url = "https://youtu.be/dQw4w9WgXcQ";

    let first = json_body(
        app.clone()
            .oneshot(post_note(url, false, "1.2.3.4"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(backend.call_count(), 2);

    let second = json_body(
        app.clone()
            .oneshot(post_note(url, false, "1.2.3.4"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(backend.call_count(), 2, "cached hit must not call the model");
    assert_eq!(second["id"], first["id"]);

    let refreshed = json_body(
        app.oneshot(post_note(url, true, "1.2.3.4")).await.unwrap(),
    )
    .await;
    assert_eq!(backend.call_count(), 4, "force_refresh regenerates");
    assert_ne!(refreshed["id"], first["id"]);
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let (app, backend, _dir) = test_app("");
    let response = app
        .oneshot(post_note("https://google.com", false, "1.2.3.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn third_note_from_one_ip_is_rejected() {
    let (app, _backend, _dir) = test_app("");
    let ip = "1.2.3.4";

    let urls = [
        "https://youtu.be/aaaaaaaaaaa",
        "https://youtu.be/bbbbbbbbbbb",
        "https://youtu.be/ccccccccccc",
    ];

    for url in &urls[..2] {
        let response = app.clone().oneshot(post_note(url, false, ip)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(post_note(urls[2], false, ip)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert_eq!(
        body["error"]["message"],
        "You've reached the limit of 2 videos."
    );
}

#[tokio::test]
async fn admin_ip_bypasses_the_quota() {
    let (app, _backend, _dir) = test_app("10.0.0.1");

    let urls = [
        "https://youtu.be/aaaaaaaaaaa",
        "https://youtu.be/bbbbbbbbbbb",
        "https://youtu.be/ccccccccccc",
    ];
    for url in urls {
        let response = app
            .clone()
            .oneshot(post_note(url, false, "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn unknown_note_is_a_404() {
    let (app, _backend, _dir) = test_app("");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/notes/aaaaaaaaaaa")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
