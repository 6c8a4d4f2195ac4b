//! Policy Graph Kernel Service Binary
//!
//! Runs the policy-attachment engine as a REST API for manual exploration:
//! - Structured JSON logging
//! - Request tracing
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables (see [`policy_graph_kernel::RuntimeConfig`]):
//! - `POLICY_GRAPH_LISTEN_ADDR`: listen address (default: `0.0.0.0:8080`)
//! - `POLICY_GRAPH_REJECT_CYCLES`, `POLICY_GRAPH_STRICT_TOPOLOGY`,
//!   `POLICY_GRAPH_STRICT_BACKEND_REFS`, `POLICY_GRAPH_SYNC_TIMEOUT_SECS`
//! - `RUST_LOG`: log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development
//!   (default: json)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin policy_graph_service --features service
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use clap::Parser;
use policy_graph_kernel::{create_router, RuntimeConfig, ServiceState};

#[derive(Parser, Debug)]
#[command(name = "policy_graph_service")]
struct Cli {
    /// Optional JSON/YAML file layering configuration under the
    /// `POLICY_GRAPH_*` environment variables.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "policy_graph_service=info,tower_http=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();
    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "policy_graph_service::access",
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, "Starting Policy Graph Kernel Service");

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::from_env(),
    };
    let state = ServiceState::new(config.clone());

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = create_router(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!(address = %addr, version = version, "Policy Graph Kernel Service listening");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received Ctrl+C, initiating graceful shutdown"),
            _ = terminate => info!("received SIGTERM, initiating graceful shutdown"),
        }
    };

    info!("ready to accept connections");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await?;

    info!("Policy Graph Kernel Service shutdown complete");

    Ok(())
}
