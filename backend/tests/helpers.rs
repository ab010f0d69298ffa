// backend/tests/helpers.rs
#![allow(dead_code)]

use backend::config::{AppConfig, DatabaseConfig, JwtConfig, WebConfig};
use backend::web_server::AppState;
use common::{RegisterPayload, RegisterResponse};
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tokio::net::TcpListener;

pub const TEST_JWT_SECRET: &str = "test-secret";

static TRACING: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init()
        .ok();
});

pub fn test_config(port: u16) -> AppConfig {
    AppConfig {
        web: WebConfig {
            addr: "127.0.0.1".to_string(),
            port,
            cors_origin: "http://localhost:3000".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expires_minutes: 5,
            refresh_token_expires_days: 1,
        },
    }
}

/// Fresh in-memory database with migrations applied. A single connection,
/// since every `sqlite::memory:` connection is its own database.
pub async fn test_pool() -> SqlitePool {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create in-memory database pool.");

    backend::db::migrate(&db_pool)
        .await
        .expect("Failed to run migrations on test database.");

    db_pool
}

/// Spawn a test server and return its address, a reqwest client and the pool
/// for inspecting the store directly.
pub async fn spawn_app() -> (SocketAddr, reqwest::Client, SqlitePool) {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let db_pool = test_pool().await;
    let app_state = AppState {
        db_pool: db_pool.clone(),
        app_config: test_config(addr.port()),
    };
    let app = backend::web_server::create_router(app_state);

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    (addr, client, db_pool)
}

pub fn api(addr: &SocketAddr, path: &str) -> String {
    format!("http://{addr}/api/v1{path}")
}

pub fn registration(username: &str) -> RegisterPayload {
    RegisterPayload {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "password123".to_string(),
        password2: Some("password123".to_string()),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

/// Registers `username` and returns the session the server handed back.
pub async fn register_user(
    addr: &SocketAddr,
    client: &reqwest::Client,
    username: &str,
) -> RegisterResponse {
    let response = client
        .post(api(addr, "/auth/register"))
        .json(&registration(username))
        .send()
        .await
        .expect("Failed to register user");

    assert_eq!(response.status(), StatusCode::CREATED, "Registration failed");
    response
        .json()
        .await
        .expect("Failed to parse registration response")
}

pub async fn user_count(db_pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db_pool)
        .await
        .unwrap()
}

/// Messages reported for `field` in a 400 body.
pub fn field_errors(body: &Value, field: &str) -> Vec<String> {
    body[field]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
