#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use newsreel_db::DbPool;
use tower::ServiceExt;

use newsreel_api::config::ServerConfig;
use newsreel_api::router::build_app_router;
use newsreel_api::state::AppState;

/// Build a test `ServerConfig` serving static files from `static_dir`.
pub fn test_config(static_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        static_dir: static_dir.to_path_buf(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Fresh in-memory database with the schema applied.
pub async fn test_pool() -> DbPool {
    let pool = newsreel_db::create_pool("sqlite::memory:").await.unwrap();
    newsreel_db::run_migrations(&pool).await.unwrap();
    pool
}

/// Build the full application router, mirroring `main.rs`.
pub fn build_test_app(pool: DbPool) -> Router {
    build_test_app_with_static(pool, Path::new("static"))
}

pub fn build_test_app_with_static(pool: DbPool, static_dir: &Path) -> Router {
    build_app_router(AppState::new(pool, test_config(static_dir)))
}

pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
