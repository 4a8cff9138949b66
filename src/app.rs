use axum::Router;
use crate::state::AppState;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for the JSON envelope around a maximum-size script.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_script_bytes.saturating_mul(2) + BODY_OVERHEAD_BYTES;

    crate::routes::configure_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::backend::client::RemoteBackend;
    use crate::infrastructure::storage::artifacts::ArtifactKind;
    use crate::testing::{FakeLedger, TestHarness};
    use axum::body::Body;
    use axum::extract::Path;
    use axum::http::{Request, StatusCode, header};
    use axum::response::IntoResponse;
    use serde_json::{Value, json};
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;
    use url::Url;

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn paid_request(signature: &str) -> Value {
        json!({
            "script": "console.log('hi')",
            "title": "Demo",
            "paymentSignature": signature,
            "walletAddress": "Wallet1"
        })
    }

    #[tokio::test]
    async fn generate_then_poll_then_download() {
        let harness = TestHarness::new().await;
        let app = create_app(harness.state.clone());

        let response = app
            .clone()
            .oneshot(post_json("/api/videos/generate", paid_request("abc123")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["contentId"], "abc123");
        assert_eq!(body["outputType"], "video");
        assert_eq!(body["status"], "processing");
        assert_eq!(body["contentUrl"], "/api/videos/abc123.mp4");

        let response = app.clone().oneshot(get("/api/videos/status/abc123")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "processing");
        assert_eq!(body["ready"], false);

        harness
            .state
            .storage
            .put("abc123", ArtifactKind::Video, &[7u8; 2048])
            .await
            .unwrap();

        let response = app.clone().oneshot(get("/api/videos/status/abc123")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["ready"], true);
        assert_eq!(body["contentUrl"], "/api/videos/abc123.mp4");

        let response = app.oneshot(get("/api/videos/abc123.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(headers[header::CONTENT_LENGTH], "2048");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 2048);
    }

    #[tokio::test]
    async fn empty_script_is_a_400_before_payment_lookup() {
        let harness = TestHarness::new().await;
        let app = create_app(harness.state.clone());

        let mut request = paid_request("abc123");
        request["script"] = json!("");
        let response = app.oneshot(post_json("/api/videos/generate", request)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Missing or empty script"}));
        assert_eq!(harness.ledger.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unconfirmed_payment_is_a_400() {
        let harness = TestHarness::with_ledger(FakeLedger::rejecting()).await;
        let app = create_app(harness.state.clone());

        let response = app
            .clone()
            .oneshot(post_json("/api/videos/generate", paid_request("unpaid")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Payment verification failed");

        let response = app.oneshot(get("/api/videos/unpaid.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_artifact_lists_every_searched_path() {
        let harness = TestHarness::new().await;
        let app = create_app(harness.state.clone());

        let response = app.oneshot(get("/api/videos/nothing.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Content not found");
        assert_eq!(body["contentId"], "nothing");
        let searched: Vec<String> = body["searchedPaths"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_str().unwrap().to_string())
            .collect();
        assert_eq!(searched.len(), 3);
        assert!(searched[0].ends_with("public/generated/nothing.mp4"));
        assert!(searched[1].ends_with("src/output/nothing.mp4"));
        assert!(searched[2].ends_with("backend/output/nothing.mp4"));
    }

    #[tokio::test]
    async fn legacy_location_is_served() {
        let harness = TestHarness::new().await;
        let legacy = harness.dir.path().join("backend/output");
        std::fs::create_dir_all(&legacy).unwrap();
        std::fs::write(legacy.join("old1.mp4"), vec![1u8; 1500]).unwrap();

        let app = create_app(harness.state.clone());
        let response = app.oneshot(get("/api/videos/old1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1500");
    }

    #[tokio::test]
    async fn audio_is_served_without_range_support() {
        let harness = TestHarness::new().await;
        harness
            .state
            .storage
            .put("tune", ArtifactKind::Audio, b"ID3 narration bytes")
            .await
            .unwrap();

        let response = create_app(harness.state.clone())
            .oneshot(get("/api/videos/tune.mp3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "19");
        assert!(response.headers().get(header::ACCEPT_RANGES).is_none());
    }

    async fn mirror_file(Path(file): Path<String>) -> axum::response::Response {
        if file == "m1.mp4" {
            ([(header::CONTENT_TYPE, "video/mp4")], vec![9u8; 3000]).into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        }
    }

    async fn spawn_mirror() -> Url {
        let mirror = Router::new().route("/api/videos/{file}", axum::routing::get(mirror_file));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, mirror).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    #[tokio::test]
    async fn missing_local_artifact_is_proxied_from_mirror() {
        let mut harness = TestHarness::new().await;
        harness.state.mirror = Some(RemoteBackend::new(reqwest::Client::new(), spawn_mirror().await));
        let app = create_app(harness.state.clone());

        let response = app.clone().oneshot(get("/api/videos/m1.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=3600");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 3000);
        assert!(bytes.iter().all(|b| *b == 9));

        let response = app.oneshot(get("/api/videos/gone.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["contentId"], "gone");
        assert_eq!(body["searchedPaths"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_status_is_processing() {
        let harness = TestHarness::new().await;
        let app = create_app(harness.state.clone());

        let response = app.oneshot(get("/api/videos/status/never-seen")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "processing");
        assert!(body.get("contentUrl").is_none());
    }

    #[tokio::test]
    async fn traversal_in_file_name_is_rejected() {
        let harness = TestHarness::new().await;
        let app = create_app(harness.state.clone());

        let response = app.oneshot(get("/api/videos/..%2F..%2Fsecret.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_answers() {
        let harness = TestHarness::new().await;
        let response = create_app(harness.state.clone())
            .oneshot(get("/api/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
