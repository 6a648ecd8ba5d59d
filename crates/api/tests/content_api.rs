//! Integration tests for the `/api/v1/content` generators.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, multipart, png_part, Part};

#[tokio::test]
async fn caption_is_generated_from_image_and_context() {
    let app = common::build_test_app();

    let response = multipart(
        app,
        Method::POST,
        "/api/v1/content/captions",
        vec![
            png_part("image", "product.png", [10, 10, 10, 255]),
            Part::Text {
                field: "context",
                value: "new sneakers",
            },
            Part::Text {
                field: "platform",
                value: "TikTok",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["caption"], "Generated: new sneakers");
    assert_eq!(json["data"]["headline"], "TikTok headline");
    assert_eq!(json["data"]["videoIdeas"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn caption_requires_an_image() {
    let app = common::build_test_app();

    let response = multipart(
        app,
        Method::POST,
        "/api/v1/content/captions",
        vec![Part::Text {
            field: "context",
            value: "no image",
        }],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_platform_is_rejected() {
    let app = common::build_test_app();

    let response = multipart(
        app,
        Method::POST,
        "/api/v1/content/captions",
        vec![
            png_part("image", "product.png", [10, 10, 10, 255]),
            Part::Text {
                field: "platform",
                value: "MySpace",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Visuals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn visual_is_returned_inline() {
    let app = common::build_test_app();

    let response = multipart(
        app,
        Method::POST,
        "/api/v1/content/visuals",
        vec![
            png_part("images", "a.png", [1, 1, 1, 255]),
            png_part("images", "b.png", [2, 2, 2, 255]),
            Part::Text {
                field: "style",
                value: "Meme",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["mime_type"], "image/png");
    assert!(json["data"]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn visual_without_images_is_rejected() {
    let app = common::build_test_app();

    let response = multipart(
        app,
        Method::POST,
        "/api/v1/content/visuals",
        vec![Part::Text {
            field: "context",
            value: "anything",
        }],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn remote_failure_is_bad_gateway() {
    let app = common::build_test_app();

    let response = multipart(
        app,
        Method::POST,
        "/api/v1/content/visuals",
        vec![
            png_part("images", "a.png", [1, 1, 1, 255]),
            Part::Text {
                field: "context",
                value: "fail",
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "REMOTE_ERROR");
    assert_eq!(json["error"], "Generation failed");
}
