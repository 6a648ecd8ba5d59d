#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgba, RgbaImage};
use kana_core::error::CoreError;
use kana_core::generation::{
    ContentGenerator, DataUrlFetcher, GeneratedContent, GeneratedImage, Language, Platform,
    VideoIdea, VisualStyle,
};
use kana_core::settings::EnhanceSettings;
use kana_core::types::SourceFile;
use kana_genai::GenAiConfig;
use kana_store::MemoryBlobStore;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use kana_api::config::ServerConfig;
use kana_api::routes;
use kana_api::state::AppState;

// ---------------------------------------------------------------------------
// Mock generator
// ---------------------------------------------------------------------------

/// Deterministic stand-in for the remote capability.
///
/// Enhancement echoes the input image back, failing for files whose name
/// starts with `fail`. Captions echo their context. Visuals are a small
/// PNG, failing when the context is `fail`.
pub struct MockGenerator;

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate_caption(
        &self,
        _: &SourceFile,
        context: &str,
        platform: Platform,
        _: Language,
    ) -> Result<GeneratedContent, CoreError> {
        Ok(GeneratedContent {
            headline: format!("{} headline", platform.label()),
            hook: "Stop scrolling".into(),
            caption: format!("Generated: {context}"),
            call_to_action: "Shop now".into(),
            video_ideas: (1..=3)
                .map(|i| VideoIdea {
                    title: format!("Idea {i}"),
                    script: "Script".into(),
                    storyboard: "Storyboard".into(),
                })
                .collect(),
        })
    }

    async fn generate_visual(
        &self,
        _: &[Arc<SourceFile>],
        context: &str,
        _: VisualStyle,
        _: Language,
    ) -> Result<GeneratedImage, CoreError> {
        if context == "fail" {
            return Err(CoreError::Remote("model overloaded".into()));
        }
        Ok(GeneratedImage {
            mime_type: "image/png".into(),
            bytes: png([9, 9, 9, 255]),
        })
    }

    async fn enhance_image(
        &self,
        image: &SourceFile,
        _: &EnhanceSettings,
    ) -> Result<GeneratedImage, CoreError> {
        if image.name.starts_with("fail") {
            return Err(CoreError::Remote("quota exceeded".into()));
        }
        Ok(GeneratedImage {
            mime_type: "image/png".into(),
            bytes: image.bytes.clone(),
        })
    }
}

/// A small solid-color PNG.
pub fn png(color: [u8; 4]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbaImage::from_pixel(6, 4, Rgba(color))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage_root: None,
        blob_url_prefix: kana_store::blob::DEFAULT_URL_PREFIX.to_string(),
        genai: GenAiConfig::default(),
    }
}

/// Build the full application router with all middleware layers and
/// return it together with its state.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app_with_state() -> (Router, AppState) {
    let state = AppState::new(
        test_config(),
        Arc::new(MockGenerator),
        Arc::new(DataUrlFetcher),
        Arc::new(MemoryBlobStore::default()),
    );

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state.clone());

    (router, state)
}

pub fn build_test_app() -> Router {
    build_test_app_with_state().0
}

/// Wait until no job is processing and no batch is running.
pub async fn wait_until_settled(state: &AppState) {
    for _ in 0..500 {
        if state.jobs.status_counts().await.processing == 0 && !state.processor.is_batch_running()
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("jobs did not settle");
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::delete(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::post(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

pub enum Part<'a> {
    File {
        field: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: Vec<u8>,
    },
    Text {
        field: &'a str,
        value: &'a str,
    },
}

/// A PNG file part.
pub fn png_part<'a>(field: &'a str, file_name: &'a str, color: [u8; 4]) -> Part<'a> {
    Part::File {
        field,
        file_name,
        content_type: "image/png",
        bytes: png(color),
    }
}

const BOUNDARY: &str = "kana-test-boundary";

pub async fn multipart(app: Router, method: Method, uri: &str, parts: Vec<Part<'_>>) -> Response<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                field,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
