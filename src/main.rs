//! Portfolio Assistant - chat backend for a personal portfolio site
//!
//! Serves the conversational widget: one session per page view, one
//! Gemini call per visitor message, updates pushed over SSE.

mod api;
mod gateway;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;

use api::{create_router, AppState};
use gateway::LlmGateway;
use llm::LlmConfig;
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use system_prompt::{build_system_prompt, Profile};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_assistant=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("PORTFOLIO_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let idle_secs: u64 = std::env::var("PORTFOLIO_SESSION_IDLE_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600);

    // Portfolio profile and the persona built from it
    let profile = Profile::from_env()?;
    tracing::info!(owner = %profile.owner, "Profile loaded");
    let system_instruction = build_system_prompt(&profile);

    // LLM service
    let llm_config = LlmConfig::from_env();
    if llm_config.gemini_api_key.is_none() && llm_config.gateway.is_none() {
        tracing::warn!(
            "No Gemini API key configured. Set GEMINI_API_KEY or LLM_GATEWAY; \
             every reply will be the fallback text."
        );
    }
    let llm = llm_config.build_service()?;
    tracing::info!(model = %llm_config.model_id(), "LLM service initialized");

    let gateway = LlmGateway::new(llm, system_instruction)
        .with_max_tokens(llm_config.max_output_tokens);
    let sessions = Arc::new(SessionManager::new(Arc::new(gateway), profile.greeting()));

    // Drop sessions whose page went away without saying so
    let max_idle = Duration::from_secs(idle_secs);
    let pruner = sessions.clone();
    tokio::spawn(async move {
        let period = max_idle.clamp(Duration::from_secs(1), Duration::from_secs(60));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let pruned = pruner.prune_idle(max_idle).await;
            if pruned > 0 {
                let remaining = pruner.session_count().await;
                tracing::info!(pruned, remaining, "Pruned idle sessions");
            }
        }
    });

    let state = AppState::new(sessions, llm_config.model_id());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Portfolio assistant listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
