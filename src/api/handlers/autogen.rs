use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::team::{AgentSummary, GroupExecution, Team};
use crate::agents::templates::{default_agents, task_templates};
use crate::agents::{AgentConfig, ConversationAgent, GroupConfig, Task, TeamConfig, Transcript};
use crate::api::errors::ApiError;
use crate::api::middleware::JwtAuth;
use crate::app_state::AppState;

/// Request body for a one-off team task
#[derive(Debug, Deserialize)]
pub struct ExecuteTaskRequest {
    #[serde(alias = "teamConfig")]
    pub team_config: TeamConfig,
    pub task: Task,
}

/// Request body for a group task
#[derive(Debug, Deserialize)]
pub struct GroupTaskRequest {
    pub group: GroupConfig,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct ResultEnvelope<T> {
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct AgentStatusResponse {
    pub agents: Vec<AgentSummary>,
}

/// Register a conversational agent
///
/// POST /api/autogen/agents
pub async fn create_agent(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    payload: Result<Json<AgentConfig>, JsonRejection>,
) -> Result<(StatusCode, Json<ConversationAgent>), ApiError> {
    let Json(config) = payload?;
    let agent = state.teams.create_agent(config).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// GET /api/autogen/agents/default
pub async fn get_default_agents(JwtAuth(_): JwtAuth) -> Json<BTreeMap<String, AgentConfig>> {
    Json(default_agents())
}

/// GET /api/autogen/agents/status
pub async fn get_agent_status(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
) -> Json<AgentStatusResponse> {
    Json(AgentStatusResponse {
        agents: state.teams.agent_status().await,
    })
}

/// Create a team and keep it for later runs
///
/// POST /api/autogen/teams
pub async fn create_team(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    payload: Result<Json<TeamConfig>, JsonRejection>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let Json(config) = payload?;
    let team = state.teams.create_team(config).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Run every task of a stored team
///
/// POST /api/autogen/teams/:id/run
pub async fn run_team(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultEnvelope<Vec<Transcript>>>, ApiError> {
    let result = state.teams.run_team(id).await?;
    Ok(Json(ResultEnvelope { result }))
}

/// Build a throwaway team and run one task with it
///
/// POST /api/autogen/tasks/execute
pub async fn execute_task(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    payload: Result<Json<ExecuteTaskRequest>, JsonRejection>,
) -> Result<Json<ResultEnvelope<Transcript>>, ApiError> {
    let Json(req) = payload?;
    let result = state.teams.execute_task(req.team_config, req.task).await?;
    Ok(Json(ResultEnvelope { result }))
}

/// GET /api/autogen/tasks/templates
pub async fn get_task_templates(JwtAuth(_): JwtAuth) -> Json<BTreeMap<String, Task>> {
    Json(task_templates())
}

/// Send one task to every agent of a group
///
/// POST /api/autogen/groups/execute
pub async fn execute_group_task(
    State(state): State<AppState>,
    JwtAuth(_): JwtAuth,
    payload: Result<Json<GroupTaskRequest>, JsonRejection>,
) -> Result<Json<GroupExecution>, ApiError> {
    let Json(req) = payload?;
    let execution = state.teams.execute_group_task(req.group, req.task).await?;
    Ok(Json(execution))
}
