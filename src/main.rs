use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use dentalnote::api::router::api_router;
use dentalnote::api::types::ApiContext;
use dentalnote::config::{self, ServiceConfig};
use dentalnote::db::sqlite::open_database;
use dentalnote::pipeline::backend::{GenerationParams, OpenAiBackend};

fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cfg = ServiceConfig::from_env();
    tracing::info!(
        version = config::APP_VERSION,
        db = %cfg.db_path.display(),
        model = %cfg.model,
        "dentalnote starting"
    );

    // Open once at startup so migrations run before the first request.
    open_database(&cfg.db_path).context("database initialization failed")?;

    // The blocking HTTP client is built (and ultimately dropped) outside
    // the async runtime; handlers only use it from spawn_blocking.
    let backend = OpenAiBackend::new(
        &cfg.backend_base_url,
        &cfg.backend_api_key,
        cfg.generation_timeout_secs,
    );

    let ctx = ApiContext::new(
        cfg.db_path.clone(),
        Arc::new(backend),
        cfg.model.clone(),
        GenerationParams {
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        },
    );

    let runtime = tokio::runtime::Runtime::new().context("cannot start runtime")?;
    runtime.block_on(serve(cfg.bind_addr, ctx))
}

async fn serve(bind_addr: String, ctx: ApiContext) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, api_router(ctx))
        .await
        .context("server error")?;

    Ok(())
}
