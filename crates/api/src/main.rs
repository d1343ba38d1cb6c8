use std::net::SocketAddr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use newsreel_api::config::ServerConfig;
use newsreel_api::router::build_app_router;
use newsreel_api::state::AppState;
use newsreel_db::DbPool;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );

    // The worker may not have run yet; serve an empty tree instead of 404ing the mount.
    std::fs::create_dir_all(&config.static_dir).expect("Failed to create STATIC_DIR");

    let pool = open_database(&config.database_url).await;
    let app = build_app_router(AppState::new(pool.clone(), config.clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!(
        %addr,
        static_dir = %config.static_dir.display(),
        "Serving entries",
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    pool.close().await;
    tracing::info!("Shutdown complete");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newsreel_api=debug,newsreel_db=debug,tower_http=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, check, and migrate the entry database. Panics on failure.
async fn open_database(url: &str) -> DbPool {
    let pool = newsreel_db::create_pool(url)
        .await
        .expect("Failed to open database");
    newsreel_db::health_check(&pool)
        .await
        .expect("Database did not answer");
    newsreel_db::run_migrations(&pool)
        .await
        .expect("Failed to apply migrations");
    tracing::info!("Database ready");
    pool
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to listen for SIGTERM");
        sigterm.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Draining connections");
}
