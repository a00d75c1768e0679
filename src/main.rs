use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use agentswarm_api::api;
use agentswarm_api::app_state::AppState;
use agentswarm_api::config::AppConfig;
use agentswarm_api::infrastructure::llm::OpenAiProvider;
use agentswarm_api::infrastructure::repositories::{
    PostgresPromptRepository, PostgresSwarmRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected successfully");

    let provider = OpenAiProvider::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    );

    let state = AppState::new(
        &config,
        Arc::new(PostgresSwarmRepository::new(pool.clone())),
        Arc::new(PostgresPromptRepository::new(pool)),
        Arc::new(provider),
    );

    let app = api::router(state);

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
