use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agents::{NewSwarm, StatusProjection, SwarmSummary};
use crate::api::errors::ApiError;
use crate::api::middleware::JwtAuth;
use crate::app_state::AppState;
use crate::domain::swarm::value_objects::{AgentRole, Artifact, SwarmStatus};
use crate::domain::swarm::{AgentSlot, AgentUpdate, FunctionParams, LogEntry, Project, Swarm, SwarmOutput};

/// Full view of a swarm
#[derive(Debug, Serialize)]
pub struct SwarmResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: SwarmStatus,
    pub owner_id: Uuid,
    pub project: Project,
    pub agents: Vec<AgentSlot>,
    pub output: SwarmOutput,
    pub logs: Vec<LogEntry>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Swarm> for SwarmResponse {
    fn from(swarm: &Swarm) -> Self {
        Self {
            id: swarm.id(),
            name: swarm.name().to_string(),
            description: swarm.description().to_string(),
            status: swarm.status(),
            owner_id: swarm.owner_id(),
            project: swarm.project().clone(),
            agents: swarm.agents().to_vec(),
            output: swarm.output().clone(),
            logs: swarm.logs().to_vec(),
            version: swarm.version(),
            created_at: swarm.created_at(),
            updated_at: swarm.updated_at(),
        }
    }
}

/// Mutation result with a confirmation message
#[derive(Debug, Serialize)]
pub struct SwarmEnvelope {
    pub message: &'static str,
    pub swarm: SwarmResponse,
}

impl SwarmEnvelope {
    fn new(message: &'static str, swarm: &Swarm) -> Json<Self> {
        Json(Self {
            message,
            swarm: SwarmResponse::from(swarm),
        })
    }
}

/// Artifact produced by an agent function
#[derive(Debug, Serialize)]
pub struct FunctionResponse {
    pub artifact: Artifact,
    pub output: Value,
}

/// Request body for a collaboration call; the path role is the target
#[derive(Debug, Deserialize)]
pub struct CollaborateRequest {
    pub source: AgentRole,
    pub function: String,
    #[serde(default)]
    pub params: FunctionParams,
}

fn parse_role(raw: &str) -> Result<AgentRole, ApiError> {
    raw.parse().map_err(ApiError::bad_request)
}

/// Create a swarm owned by the caller
///
/// POST /api/swarms
pub async fn create_swarm(
    State(state): State<AppState>,
    JwtAuth(owner_id): JwtAuth,
    payload: Result<Json<NewSwarm>, JsonRejection>,
) -> Result<(StatusCode, Json<SwarmEnvelope>), ApiError> {
    let Json(req) = payload?;
    let swarm = state.swarms.initialize_swarm(owner_id, req).await?;

    Ok((
        StatusCode::CREATED,
        SwarmEnvelope::new("Swarm created successfully", &swarm),
    ))
}

/// List the caller's swarms, newest first
///
/// GET /api/swarms
pub async fn list_swarms(
    State(state): State<AppState>,
    JwtAuth(owner_id): JwtAuth,
) -> Result<Json<Vec<SwarmSummary>>, ApiError> {
    let swarms = state.swarms.list_swarms(owner_id).await?;
    Ok(Json(swarms))
}

/// GET /api/swarms/:id
pub async fn get_swarm(
    State(state): State<AppState>,
    JwtAuth(owner_id): JwtAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<SwarmResponse>, ApiError> {
    let swarm = state.swarms.get_swarm_details(id, owner_id).await?;
    Ok(Json(SwarmResponse::from(&swarm)))
}

/// POST /api/swarms/:id/start
pub async fn start_swarm(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<SwarmEnvelope>, ApiError> {
    let swarm = state.swarms.start_swarm(id).await?;
    Ok(SwarmEnvelope::new("Swarm started successfully", &swarm))
}

/// GET /api/swarms/:id/status
pub async fn get_status(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusProjection>, ApiError> {
    let status = state.swarms.get_swarm_status(id).await?;
    Ok(Json(status))
}

/// Merge a partial update into one agent slot
///
/// PUT /api/swarms/:id/agents/:role
pub async fn update_agent(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    Path((id, role)): Path<(Uuid, String)>,
    payload: Result<Json<AgentUpdate>, JsonRejection>,
) -> Result<Json<SwarmEnvelope>, ApiError> {
    let role = parse_role(&role)?;
    let Json(update) = payload?;

    let swarm = state.swarms.update_agent_status(id, role, update).await?;
    Ok(SwarmEnvelope::new("Agent updated successfully", &swarm))
}

/// Run one of the role's declared functions
///
/// POST /api/swarms/:id/agents/:role/functions/:function
pub async fn execute_function(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    Path((id, role, function)): Path<(Uuid, String, String)>,
    payload: Result<Json<FunctionParams>, JsonRejection>,
) -> Result<Json<FunctionResponse>, ApiError> {
    let role = parse_role(&role)?;
    let Json(params) = payload?;

    let output = state
        .swarms
        .execute_agent_function(id, role, &function, &params)
        .await?;

    Ok(Json(FunctionResponse {
        artifact: output.artifact,
        output: output.value,
    }))
}

/// Run the path role's function on behalf of a dependent role
///
/// POST /api/swarms/:id/agents/:role/collaborate
pub async fn collaborate(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    Path((id, role)): Path<(Uuid, String)>,
    payload: Result<Json<CollaborateRequest>, JsonRejection>,
) -> Result<Json<FunctionResponse>, ApiError> {
    let target = parse_role(&role)?;
    let Json(req) = payload?;

    let output = state
        .swarms
        .collaborate_agents(id, req.source, target, &req.function, &req.params)
        .await?;

    Ok(Json(FunctionResponse {
        artifact: output.artifact,
        output: output.value,
    }))
}
