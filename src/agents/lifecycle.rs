use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use super::registry::{AgentSlotRegistry, FunctionOutput};
use crate::domain::prompt::PromptSummary;
use crate::domain::repositories::{PromptRepository, SwarmRepository};
use crate::domain::swarm::events::SwarmEvent;
use crate::domain::swarm::value_objects::{AgentRole, AgentStatus, LogLevel, ProjectPhase, SwarmStatus};
use crate::domain::swarm::{AgentSlot, AgentUpdate, FunctionParams, LogEntry, Project, Swarm, SwarmOutput};
use crate::errors::{Operation, OrchestrationError, OrchestrationResult, ServiceError, ServiceResult};

/// Input for creating a swarm
#[derive(Debug, Clone, Deserialize)]
pub struct NewSwarm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub project_name: String,
    pub requirements: String,
}

/// Per-agent part of [`StatusProjection`]
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatusView {
    pub role: AgentRole,
    pub status: AgentStatus,
    pub current_task: String,
    pub prompts: Vec<PromptSummary>,
}

/// Read view of a running swarm with a bounded log tail
#[derive(Debug, Clone, Serialize)]
pub struct StatusProjection {
    pub status: SwarmStatus,
    pub project: Project,
    pub agents: Vec<AgentStatusView>,
    pub output: SwarmOutput,
    pub logs: Vec<LogEntry>,
}

/// Listing row for an owner's swarms
#[derive(Debug, Clone, Serialize)]
pub struct SwarmSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: SwarmStatus,
    pub current_phase: ProjectPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Swarm> for SwarmSummary {
    fn from(swarm: &Swarm) -> Self {
        Self {
            id: swarm.id(),
            name: swarm.name().to_string(),
            description: swarm.description().to_string(),
            status: swarm.status(),
            current_phase: swarm.current_phase(),
            created_at: swarm.created_at(),
            updated_at: swarm.updated_at(),
        }
    }
}

/// Owns every state change of a swarm
///
/// Operations on the same swarm id are serialised in-process; the
/// repository's version check covers writers in other processes.
/// Every public operation logs its specific failure and returns the
/// generic [`ServiceError`] for that operation.
pub struct SwarmLifecycleManager {
    swarms: Arc<dyn SwarmRepository>,
    prompts: Arc<dyn PromptRepository>,
    registry: AgentSlotRegistry,
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
    status_log_tail: usize,
}

impl SwarmLifecycleManager {
    pub fn new(
        swarms: Arc<dyn SwarmRepository>,
        prompts: Arc<dyn PromptRepository>,
        registry: AgentSlotRegistry,
        status_log_tail: usize,
    ) -> Self {
        Self {
            swarms,
            prompts,
            registry,
            locks: Mutex::new(HashMap::new()),
            status_log_tail,
        }
    }

    /// Creates a swarm with one slot per pipeline role
    ///
    /// Prompt binding failures only produce warning log entries; the
    /// operation fails only when the swarm cannot be saved.
    pub async fn initialize_swarm(&self, owner_id: Uuid, request: NewSwarm) -> ServiceResult<Swarm> {
        self.initialize(owner_id, request)
            .await
            .map_err(|e| ServiceError::capture(Operation::CreateSwarm, e))
    }

    /// Puts the first pipeline role to work
    pub async fn start_swarm(&self, id: Uuid) -> ServiceResult<Swarm> {
        self.mutate(id, |swarm| swarm.start())
            .await
            .map_err(|e| ServiceError::capture(Operation::StartSwarm, e))
    }

    /// Merges an update into a slot; completing the working slot advances the pipeline
    pub async fn update_agent_status(
        &self,
        id: Uuid,
        role: AgentRole,
        update: AgentUpdate,
    ) -> ServiceResult<Swarm> {
        self.mutate(id, |swarm| swarm.update_agent(role, update))
            .await
            .map_err(|e| ServiceError::capture(Operation::UpdateAgent, e))
    }

    pub async fn get_swarm_status(&self, id: Uuid) -> ServiceResult<StatusProjection> {
        self.status(id)
            .await
            .map_err(|e| ServiceError::capture(Operation::GetSwarmStatus, e))
    }

    /// Summaries of the owner's swarms, newest first
    pub async fn list_swarms(&self, owner_id: Uuid) -> ServiceResult<Vec<SwarmSummary>> {
        self.swarms
            .find_by_owner(owner_id)
            .await
            .map(|swarms| swarms.iter().map(SwarmSummary::from).collect())
            .map_err(|e| ServiceError::capture(Operation::ListSwarms, e.into()))
    }

    /// The full swarm, visible to its owner only
    pub async fn get_swarm_details(&self, id: Uuid, owner_id: Uuid) -> ServiceResult<Swarm> {
        self.owned(id, owner_id)
            .await
            .map_err(|e| ServiceError::capture(Operation::GetSwarmDetails, e))
    }

    /// Runs one of `role`'s declared functions and stores its artifact
    pub async fn execute_agent_function(
        &self,
        id: Uuid,
        role: AgentRole,
        function: &str,
        params: &FunctionParams,
    ) -> ServiceResult<FunctionOutput> {
        self.dispatch(id, role, None, function, params)
            .await
            .map_err(|e| ServiceError::capture(Operation::ExecuteFunction, e))
    }

    /// Runs `target`'s function on behalf of `source`, which must depend on it
    pub async fn collaborate_agents(
        &self,
        id: Uuid,
        source: AgentRole,
        target: AgentRole,
        function: &str,
        params: &FunctionParams,
    ) -> ServiceResult<FunctionOutput> {
        self.dispatch(id, target, Some(source), function, params)
            .await
            .map_err(|e| ServiceError::capture(Operation::Collaborate, e))
    }

    async fn initialize(&self, owner_id: Uuid, request: NewSwarm) -> OrchestrationResult<Swarm> {
        let built = self.registry.build_slots(owner_id).await;

        let (mut swarm, events) = Swarm::new(
            request.name,
            request.description,
            owner_id,
            request.project_name,
            request.requirements,
            built.slots,
        )?;
        for warning in built.warnings {
            swarm.append_log(warning.level, warning.message, warning.agent);
        }
        swarm.append_log(LogLevel::Info, "Swarm initialized", None);

        self.persist(&mut swarm, &events).await?;
        Ok(swarm)
    }

    async fn owned(&self, id: Uuid, owner_id: Uuid) -> OrchestrationResult<Swarm> {
        let swarm = self.load(id).await?;
        if swarm.owner_id() != owner_id {
            return Err(OrchestrationError::SwarmNotFound(id));
        }
        Ok(swarm)
    }

    async fn status(&self, id: Uuid) -> OrchestrationResult<StatusProjection> {
        let swarm = self.load(id).await?;

        let prompt_ids: Vec<Uuid> = swarm
            .agents()
            .iter()
            .flat_map(|slot| slot.prompts.iter().copied())
            .collect();
        let summaries = self.prompts.find_summaries(&prompt_ids).await?;

        let agents = swarm
            .agents()
            .iter()
            .map(|slot| AgentStatusView {
                role: slot.role,
                status: slot.status,
                current_task: slot.current_task.clone(),
                prompts: summaries
                    .iter()
                    .filter(|summary| slot.prompts.contains(&summary.id))
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(StatusProjection {
            status: swarm.status(),
            project: swarm.project().clone(),
            agents,
            output: swarm.output().clone(),
            logs: swarm.recent_logs(self.status_log_tail).to_vec(),
        })
    }

    /// Shared path of function execution and collaboration
    ///
    /// Validation failures leave the swarm untouched. A handler failure is
    /// recorded on the swarm and saved before the error is returned.
    async fn dispatch(
        &self,
        id: Uuid,
        role: AgentRole,
        on_behalf_of: Option<AgentRole>,
        function: &str,
        params: &FunctionParams,
    ) -> OrchestrationResult<FunctionOutput> {
        let _guard = self.lock(id).await;
        let mut swarm = self.load(id).await?;

        let mut target = slot_of(&swarm, role)?;
        let result = match on_behalf_of {
            Some(source) => {
                let source = slot_of(&swarm, source)?;
                self.registry.collaborate(&source, &mut target, function, params)
            }
            None => self.registry.execute_function(&mut target, function, params),
        };

        match result {
            Ok(output) => {
                swarm.record_function_output(role, output.artifact, output.value.clone())?;
                swarm.append_log(
                    LogLevel::Info,
                    format!("{}: Executed {}", role, function),
                    Some(role),
                );
                self.persist(&mut swarm, &[]).await?;
                Ok(output)
            }
            Err(OrchestrationError::HandlerFailed { function, reason }) => {
                let events = swarm.record_function_failure(role, &reason);
                self.persist(&mut swarm, &events).await?;
                Err(OrchestrationError::HandlerFailed { function, reason })
            }
            Err(err) => Err(err),
        }
    }

    /// Load, apply `change`, save; all under the swarm's lock
    async fn mutate<F>(&self, id: Uuid, change: F) -> OrchestrationResult<Swarm>
    where
        F: FnOnce(&mut Swarm) -> OrchestrationResult<Vec<SwarmEvent>>,
    {
        let _guard = self.lock(id).await;
        let mut swarm = self.load(id).await?;
        let events = change(&mut swarm)?;
        self.persist(&mut swarm, &events).await?;
        Ok(swarm)
    }

    async fn load(&self, id: Uuid) -> OrchestrationResult<Swarm> {
        self.swarms
            .find_by_id(id)
            .await?
            .ok_or(OrchestrationError::SwarmNotFound(id))
    }

    async fn persist(&self, swarm: &mut Swarm, events: &[SwarmEvent]) -> OrchestrationResult<()> {
        self.swarms.save(swarm).await?;
        swarm.mark_persisted();

        for event in events {
            tracing::info!(swarm_id = %event.swarm_id(), event = ?event, "swarm event");
        }
        Ok(())
    }

    async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop locks nobody is holding or waiting on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

fn slot_of(swarm: &Swarm, role: AgentRole) -> OrchestrationResult<AgentSlot> {
    swarm
        .agent(role)
        .cloned()
        .ok_or_else(|| OrchestrationError::AgentNotFound(role.to_string()))
}
