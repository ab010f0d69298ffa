#![cfg(feature = "db-sqlite")]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use backend::web_server::{create_router, AppState};
use http_body_util::BodyExt; // for .collect()
use serde_json::Value;
use tower::ServiceExt; // for .oneshot()

mod helpers;

async fn app() -> axum::Router {
    let app_state = AppState {
        db_pool: helpers::test_pool().await,
        app_config: helpers::test_config(0),
    };
    create_router(app_state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/v1/leads/{id}"]["patch"].is_object());
    assert!(doc["components"]["schemas"]["LeadDto"].is_object());
}

#[tokio::test]
async fn test_missing_token_gets_json_401() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .uri("/api/v1/leads")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_register_without_json_content_type_is_400() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/register")
                .body(Body::from("username=alice"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/leads")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
}
