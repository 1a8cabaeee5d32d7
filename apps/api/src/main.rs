mod agent;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod output;
mod routes;
mod runs;
mod state;
mod tools;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::{LanguageModel, LlmClient, LlmSettings};
use crate::routes::build_router;
use crate::runs::runner::RunContext;
use crate::runs::sink::{MemoryResultSink, PgResultSink, ResultSink};
use crate::state::AppState;
use crate::tools::resume::RESUME_ANALYSIS_TEMPERATURE;
use crate::tools::search_client::ApifyClient;
use crate::tools::ToolSet;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobScout API v{}", env!("CARGO_PKG_VERSION"));

    // Result sink: PostgreSQL when configured, otherwise in-process
    let sink: Arc<dyn ResultSink> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Arc::new(PgResultSink::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, keeping run results in memory");
            Arc::new(MemoryResultSink::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(LlmSettings {
        api_key: config.anthropic_api_key.clone(),
        model: config.llm_model.clone(),
        temperature: config.llm_temperature,
        max_tokens: config.llm_max_tokens,
    })?;
    info!("LLM client initialized (model: {})", llm.model());
    let extraction_model: Arc<dyn LanguageModel> =
        Arc::new(llm.with_temperature(RESUME_ANALYSIS_TEMPERATURE));
    let model: Arc<dyn LanguageModel> = Arc::new(llm);

    // Job search service and the fixed tool set
    let search = ApifyClient::new(config.apify_base_url.clone(), config.apify_token.clone())?;
    info!("Job search client initialized ({})", config.apify_base_url);
    let tools = Arc::new(ToolSet::new(
        Arc::new(search),
        extraction_model,
        config.search_result_limit,
    ));

    let state = AppState {
        runs: RunContext {
            model,
            tools,
            sink,
            max_iterations: config.agent_max_iterations,
        },
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once a web client exists

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
