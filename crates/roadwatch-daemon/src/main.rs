use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use roadwatch_core::default_labels;
use roadwatch_daemon::{
    api, config::DaemonConfig, db::Db, oracle::GeminiClient, pipeline::PipelineDeps,
    resolver::FsObjectStore, watcher,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "roadwatch-daemon", version, about = "Road hazard verification daemon")]
struct Cli {
    /// Where the HTTP API will listen, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// SurrealKV directory for the embedded record store.
    #[arg(long, default_value = ".roadwatch/db")]
    db_dir: PathBuf,

    /// Root directory of the local object store for hazard images.
    #[arg(long, default_value = ".roadwatch/media")]
    media_root: PathBuf,

    /// Base URL of the oracle endpoint.
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    oracle_url: String,

    /// Oracle model name.
    #[arg(long, default_value = "gemini-1.5-flash")]
    oracle_model: String,

    /// Environment variable holding the oracle API key.
    #[arg(long, default_value = "GEMINI_API_KEY")]
    api_key_env: String,

    /// Per-invocation oracle timeout in seconds.
    #[arg(long, default_value_t = 45)]
    oracle_timeout_seconds: u64,

    /// Minimum oracle confidence required to confirm a hazard, on top of
    /// the boolean verdict.
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f64,

    /// Label vocabulary the oracle verifies against.
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    /// Watcher tick interval in seconds.
    #[arg(long, default_value_t = 30)]
    watcher_interval_seconds: u64,

    /// Age a pending record must reach before the watcher re-triggers it.
    #[arg(long, default_value_t = 60)]
    watcher_grace_seconds: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let api_key = std::env::var(&cli.api_key_env)
        .with_context(|| format!("reading oracle api key from ${}", cli.api_key_env))?;

    let config = DaemonConfig {
        db_dir: cli.db_dir,
        media_root: cli.media_root,
        oracle_base_url: cli.oracle_url,
        oracle_model: cli.oracle_model,
        oracle_api_key: api_key,
        oracle_timeout_seconds: cli.oracle_timeout_seconds,
        min_confidence: cli.min_confidence,
        labels: if cli.labels.is_empty() {
            default_labels()
        } else {
            cli.labels
        },
        watcher_interval_seconds: cli.watcher_interval_seconds,
        watcher_grace_seconds: cli.watcher_grace_seconds,
    };

    info!("starting daemon; model={}", config.oracle_model);

    let db = Db::connect(&config.db_dir).await?;
    db.bootstrap_schema().await?;

    let deps = PipelineDeps {
        db: db.clone(),
        store: Arc::new(FsObjectStore::new(&config.media_root)),
        oracle: Arc::new(GeminiClient::new(
            &config.oracle_base_url,
            &config.oracle_model,
            &config.oracle_api_key,
        )),
        http: reqwest::Client::new(),
        labels: Arc::new(config.labels.clone()),
        min_confidence: config.min_confidence,
        oracle_timeout: Duration::from_secs(config.oracle_timeout_seconds),
    };

    watcher::spawn_watcher(
        deps.clone(),
        config.watcher_interval_seconds,
        config.watcher_grace_seconds,
    );

    let state = api::AppState::new(deps);

    let app = Router::new()
        .route("/v1/reports", post(api::submit_report))
        .route("/v1/reports/{id}", get(api::get_report))
        .route("/v1/reports/{id}/retry", post(api::retry_verification))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = cli.listen.parse()?;
    info!("listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}
