//! Honeypot Scanner API Server
//!
//! REST API for contract risk analysis
//!
//! Usage:
//!   cargo run --bin honeypot_api
//!
//! Environment:
//!   PORT / HDP_PORT   - Server port (default: 8080)
//!   HDP_HOST          - Server host (default: 0.0.0.0)
//!   HDP_API_KEYS      - Comma-separated accepted X-API-Key values (unset: open API)
//!   HDP_RATE_LIMIT    - Requests per minute per key/IP (default: 60)
//!   HDP_FLAG_WEIGHTS  - Weight overrides, e.g. "minting=3,proxy_pattern=1"
//!   RUST_LOG          - Log filter (default: info)

use honeypot_scanner::api::{create_router, start_cleanup_task, AppState};
use honeypot_scanner::utils::constants::{APP_NAME, APP_VERSION, DEFAULT_PORT};
use honeypot_scanner::{ScanTelemetry, ScannerConfig, ScoringConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    let default_level = if std::env::var("HDP_DEBUG").is_ok_and(|v| v == "1") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase())),
        )
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let scanner = ScannerConfig::from_env();
    let scoring = ScoringConfig::from_env()?;
    let telemetry = Arc::new(ScanTelemetry::new());
    let telemetry_for_shutdown = telemetry.clone();

    let state = Arc::new(AppState::new(scanner, scoring, telemetry));

    // Start background cleanup task for rate limiter
    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    // PORT wins (container platforms), HDP_PORT for local dev
    let host = std::env::var("HDP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("HDP_PORT"))
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    if std::env::var("HDP_API_KEYS").map_or(true, |k| k.trim().is_empty()) {
        warn!("🔓 HDP_API_KEYS not set, API is open (rate limited only)");
    }

    info!("🚀 {} API v{} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!("Endpoints:");
    info!("  POST /analyze             - Analyze one contract (plain report)");
    info!("  POST /v1/analyze          - Same, versioned");
    info!("  POST /v1/analyze/batch    - Batch analysis (up to 50 contracts)");
    info!("  GET  /v1/stats            - Scan statistics");
    info!("  GET  /v1/health           - Health check");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    info!("{}", telemetry_for_shutdown.snapshot().summary());
    info!("👋 {} API shutdown complete", APP_NAME);

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════╗
    ║                                                  ║
    ║        🍯  H O N E Y P O T   S C A N N E R       ║
    ║                                                  ║
    ║          Lexical contract risk analysis          ║
    ║                   v{:<10}                    ║
    ║                                                  ║
    ╚══════════════════════════════════════════════════╝
    "#,
        APP_VERSION
    );
}
