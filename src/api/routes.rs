use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{autogen, health_check, swarms};
use crate::app_state::AppState;

/// Builds the full HTTP router over `state`
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Swarm routes
        .route(
            "/api/swarms",
            post(swarms::create_swarm).get(swarms::list_swarms),
        )
        .route("/api/swarms/:id", get(swarms::get_swarm))
        .route("/api/swarms/:id/start", post(swarms::start_swarm))
        .route("/api/swarms/:id/status", get(swarms::get_status))
        .route("/api/swarms/:id/agents/:role", put(swarms::update_agent))
        .route(
            "/api/swarms/:id/agents/:role/functions/:function",
            post(swarms::execute_function),
        )
        .route(
            "/api/swarms/:id/agents/:role/collaborate",
            post(swarms::collaborate),
        )
        // Conversational agent routes
        .route("/api/autogen/agents", post(autogen::create_agent))
        .route("/api/autogen/agents/default", get(autogen::get_default_agents))
        .route("/api/autogen/agents/status", get(autogen::get_agent_status))
        .route("/api/autogen/teams", post(autogen::create_team))
        .route("/api/autogen/teams/:id/run", post(autogen::run_team))
        .route("/api/autogen/tasks/execute", post(autogen::execute_task))
        .route("/api/autogen/tasks/templates", get(autogen::get_task_templates))
        .route("/api/autogen/groups/execute", post(autogen::execute_group_task))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
