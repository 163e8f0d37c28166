// Blockpress server - page/block/field CMS backend

use std::path::Path;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use blockpress::{app_state::AppState, cms_interface::create_cms_router, config::Config};

/// Make sure the directory holding a file-backed SQLite database exists
fn ensure_database_dir(url: &str) -> std::io::Result<()> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blockpress=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    ensure_database_dir(&config.database.url)?;

    // Initialize application state
    let app_state = AppState::new(&config).await?;

    let app = create_cms_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Blockpress listening on http://{}", addr);
    info!("  GET  /pages/{{slug}}            - public page");
    info!("  *    /admin/pages, /blocks, /fields, /documents, /media - admin API");

    axum::serve(listener, app).await?;

    Ok(())
}
