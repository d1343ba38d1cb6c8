//! Tests for files served under `/static`.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, get};

#[tokio::test]
async fn serves_files_from_static_root() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("videos")).unwrap();
    std::fs::write(root.path().join("videos/clip.mp4"), b"not really a video").unwrap();

    let app = common::build_test_app_with_static(common::test_pool().await, root.path());
    let response = get(app, "/static/videos/clip.mp4").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "video/mp4"
    );
    assert_eq!(body_bytes(response).await, b"not really a video");
}

#[tokio::test]
async fn missing_static_file_returns_404() {
    let root = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_static(common::test_pool().await, root.path());

    let response = get(app, "/static/videos/missing.mp4").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn parent_directory_traversal_is_not_served() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("static");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();

    let app = common::build_test_app_with_static(common::test_pool().await, &root);
    let response = get(app, "/static/../secret.txt").await;

    assert_ne!(response.status(), StatusCode::OK);
}
