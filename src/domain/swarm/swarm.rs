use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::agent_slot::{AgentSlot, AgentUpdate};
use super::events::SwarmEvent;
use super::value_objects::{AgentRole, AgentStatus, Artifact, LogLevel, ProjectPhase, SwarmStatus};
use crate::errors::{OrchestrationError, OrchestrationResult};

const OPENING_TASK: &str = "Creating PRD";

/// Project a swarm drives through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub requirements: String,
    pub current_phase: ProjectPhase,
}

/// Per-phase artifacts, opaque to the core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwarmOutput {
    pub prd: Option<Value>,
    pub design: Option<Value>,
    pub implementation: Option<Value>,
    #[serde(rename = "testReport")]
    pub test_report: Option<Value>,
}

impl SwarmOutput {
    pub fn set(&mut self, artifact: Artifact, value: Value) {
        let slot = match artifact {
            Artifact::Prd => &mut self.prd,
            Artifact::Design => &mut self.design,
            Artifact::Implementation => &mut self.implementation,
            Artifact::TestReport => &mut self.test_report,
        };
        *slot = Some(value);
    }

    pub fn get(&self, artifact: Artifact) -> Option<&Value> {
        match artifact {
            Artifact::Prd => self.prd.as_ref(),
            Artifact::Design => self.design.as_ref(),
            Artifact::Implementation => self.implementation.as_ref(),
            Artifact::TestReport => self.test_report.as_ref(),
        }
    }
}

/// Append-only swarm log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub agent: Option<AgentRole>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, agent: Option<AgentRole>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            agent,
        }
    }
}

/// Swarm aggregate root
///
/// A fixed pipeline of role agents driving one project from planning to
/// testing. All state changes go through the methods below.
///
/// # Invariants
/// - Name cannot be empty
/// - Agent slots are unique per role and kept in pipeline order
/// - At most one slot is `working`; every predecessor of it is `completed`
/// - `project.current_phase` never decreases
/// - Logs are append-only
///
/// # Example
/// ```
/// use agentswarm_api::domain::swarm::{AgentSlot, Swarm};
/// use agentswarm_api::domain::swarm::value_objects::{AgentRole, SwarmStatus};
/// use uuid::Uuid;
///
/// let agents = AgentRole::PIPELINE
///     .iter()
///     .map(|role| AgentSlot::new(*role, vec![], vec![], vec![]))
///     .collect();
/// let (swarm, events) = Swarm::new(
///     "Todo app".to_string(),
///     String::new(),
///     Uuid::new_v4(),
///     "todo".to_string(),
///     "A todo list".to_string(),
///     agents,
/// )
/// .expect("valid swarm");
///
/// assert_eq!(swarm.status(), SwarmStatus::Initializing);
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Swarm {
    id: Uuid,
    name: String,
    description: String,
    status: SwarmStatus,
    owner_id: Uuid,
    project: Project,
    agents: Vec<AgentSlot>,
    output: SwarmOutput,
    logs: Vec<LogEntry>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Swarm {
    /// Creates a new Swarm aggregate in the `initializing` state
    ///
    /// # Business Rules Enforced
    /// - Name must not be empty
    /// - At least one agent slot, no duplicated roles, pipeline order
    /// - Initial phase is planning
    pub fn new(
        name: String,
        description: String,
        owner_id: Uuid,
        project_name: String,
        requirements: String,
        mut agents: Vec<AgentSlot>,
    ) -> OrchestrationResult<(Self, Vec<SwarmEvent>)> {
        if name.trim().is_empty() {
            return Err(OrchestrationError::Validation(
                "Swarm name cannot be empty".to_string(),
            ));
        }
        if agents.is_empty() {
            return Err(OrchestrationError::Validation(
                "Swarm needs at least one agent".to_string(),
            ));
        }

        agents.sort_by_key(|slot| pipeline_position(slot.role));
        if agents.windows(2).any(|w| w[0].role == w[1].role) {
            return Err(OrchestrationError::Validation(
                "Each role may only appear once".to_string(),
            ));
        }

        let now = Utc::now();
        let swarm = Self {
            id: Uuid::new_v4(),
            name,
            description,
            status: SwarmStatus::Initializing,
            owner_id,
            project: Project {
                name: project_name,
                requirements,
                current_phase: ProjectPhase::Planning,
            },
            agents,
            output: SwarmOutput::default(),
            logs: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let events = vec![SwarmEvent::Created {
            swarm_id: swarm.id,
            owner_id: swarm.owner_id,
            agent_count: swarm.agents.len(),
        }];

        Ok((swarm, events))
    }

    /// Starts the pipeline by putting the first role to work
    ///
    /// # Business Rules
    /// - Swarm must be `initializing`
    /// - The first pipeline role must have a slot
    pub fn start(&mut self) -> OrchestrationResult<Vec<SwarmEvent>> {
        self.ensure_status_transition(SwarmStatus::Running)?;

        let first = AgentRole::first();
        let idx = self
            .slot_index(first)
            .ok_or(OrchestrationError::RoleNotFound(first))?;

        let slot = &mut self.agents[idx];
        slot.transition_to(AgentStatus::Working)?;
        slot.current_task = OPENING_TASK.to_string();

        self.status = SwarmStatus::Running;
        self.project.current_phase = first.phase();
        self.append_log(LogLevel::Info, "Swarm started", Some(first));

        Ok(vec![
            SwarmEvent::Started { swarm_id: self.id },
            SwarmEvent::AgentActivated {
                swarm_id: self.id,
                role: first,
            },
        ])
    }

    /// Merges `update` into the slot for `role`
    ///
    /// Completing the working slot is the only way to advance the phase:
    /// the next role is activated, or the swarm completes if `role` is
    /// terminal. Every accepted update appends an info log entry.
    ///
    /// # Business Rules
    /// - `working` can only be set by activation, never by an update
    /// - Only the working slot of a running swarm can complete
    /// - Nothing is mutated when a rule is violated
    pub fn update_agent(
        &mut self,
        role: AgentRole,
        update: AgentUpdate,
    ) -> OrchestrationResult<Vec<SwarmEvent>> {
        let idx = self
            .slot_index(role)
            .ok_or_else(|| OrchestrationError::AgentNotFound(role.to_string()))?;
        let previous = self.agents[idx].status;

        if let Some(next) = update.status {
            let rejected = !previous.can_transition_to(next)
                || (next == AgentStatus::Working && previous != AgentStatus::Working)
                || (next == AgentStatus::Completed
                    && previous != AgentStatus::Completed
                    && self.status != SwarmStatus::Running);
            if rejected {
                return Err(OrchestrationError::InvalidStateTransition {
                    from: format!("{} {}", role, previous),
                    to: next.to_string(),
                });
            }
        }

        let completes = update.status == Some(AgentStatus::Completed)
            && previous != AgentStatus::Completed;
        let successor = if completes {
            self.successor_index(role)?
        } else {
            None
        };

        let log_message = format!(
            "{}: {}",
            role,
            update.current_task.as_deref().unwrap_or("Status updated")
        );

        let slot = &mut self.agents[idx];
        if let Some(status) = update.status {
            slot.status = status;
        }
        if let Some(task) = update.current_task {
            slot.current_task = task;
        }
        if let Some(output) = update.output {
            slot.output = Some(output);
        }
        let status = slot.status;

        let mut events = vec![SwarmEvent::AgentUpdated {
            swarm_id: self.id,
            role,
            status,
        }];

        if completes {
            events.extend(self.advance_after(role, successor)?);
        } else if status == AgentStatus::Error && previous == AgentStatus::Working {
            events.extend(self.fail(format!("{} reported an error", role)));
        }

        self.append_log(LogLevel::Info, log_message, Some(role));
        Ok(events)
    }

    /// Stores a function result on the slot and in the swarm's artifacts
    pub fn record_function_output(
        &mut self,
        role: AgentRole,
        artifact: Artifact,
        output: Value,
    ) -> OrchestrationResult<()> {
        let idx = self
            .slot_index(role)
            .ok_or_else(|| OrchestrationError::AgentNotFound(role.to_string()))?;
        self.agents[idx].output = Some(output.clone());
        self.output.set(artifact, output);
        self.touch();
        Ok(())
    }

    /// Marks the slot failed after a function error
    ///
    /// A working or idle slot in `error` can never complete, so the pipeline
    /// cannot reach the end and the swarm itself fails. A completed slot has
    /// already handed over its phase and leaves the swarm as it is.
    pub fn record_function_failure(&mut self, role: AgentRole, reason: &str) -> Vec<SwarmEvent> {
        let Some(idx) = self.slot_index(role) else {
            return Vec::new();
        };
        let blocks_pipeline = matches!(
            self.agents[idx].status,
            AgentStatus::Working | AgentStatus::Idle
        );
        self.agents[idx].mark_error();
        self.append_log(LogLevel::Error, format!("{}: {}", role, reason), Some(role));

        let mut events = vec![SwarmEvent::AgentUpdated {
            swarm_id: self.id,
            role,
            status: AgentStatus::Error,
        }];
        if blocks_pipeline {
            events.extend(self.fail(format!("{} failed: {}", role, reason)));
        }
        events
    }

    /// Moves the swarm to `error`; no-op when already failed
    pub fn fail(&mut self, reason: String) -> Option<SwarmEvent> {
        if !self.status.can_transition_to(SwarmStatus::Error) {
            return None;
        }
        self.status = SwarmStatus::Error;
        self.append_log(LogLevel::Error, reason.clone(), None);
        Some(SwarmEvent::Failed {
            swarm_id: self.id,
            reason,
        })
    }

    pub fn append_log(&mut self, level: LogLevel, message: impl Into<String>, agent: Option<AgentRole>) {
        self.logs.push(LogEntry::new(level, message, agent));
        self.touch();
    }

    /// The most recent `limit` log entries, oldest first
    pub fn recent_logs(&self, limit: usize) -> &[LogEntry] {
        let start = self.logs.len().saturating_sub(limit);
        &self.logs[start..]
    }

    pub fn agent(&self, role: AgentRole) -> Option<&AgentSlot> {
        self.agents.iter().find(|a| a.role == role)
    }

    /// Number of slots currently `working`
    pub fn working_count(&self) -> usize {
        self.agents
            .iter()
            .filter(|a| a.status == AgentStatus::Working)
            .count()
    }

    /// Called by repositories after a successful save
    pub fn mark_persisted(&mut self) {
        self.version += 1;
    }

    fn advance_after(
        &mut self,
        role: AgentRole,
        successor: Option<usize>,
    ) -> OrchestrationResult<Vec<SwarmEvent>> {
        let mut events = Vec::new();
        match (role.next(), successor) {
            (Some(next), Some(next_idx)) => {
                let from = self.project.current_phase;
                let to = next.phase().max(from);
                self.project.current_phase = to;

                let next_slot = &mut self.agents[next_idx];
                next_slot.transition_to(AgentStatus::Working)?;
                next_slot.current_task = format!("Working on {} phase", to);

                if to != from {
                    events.push(SwarmEvent::PhaseAdvanced {
                        swarm_id: self.id,
                        from,
                        to,
                    });
                }
                events.push(SwarmEvent::AgentActivated {
                    swarm_id: self.id,
                    role: next,
                });
            }
            (Some(next), None) => {
                // Successor role has no slot in this swarm: the pipeline ends here.
                tracing::warn!(swarm_id = %self.id, role = %next, "successor role missing");
                self.status = SwarmStatus::Completed;
                events.push(SwarmEvent::Completed { swarm_id: self.id });
            }
            (None, _) => {
                self.ensure_status_transition(SwarmStatus::Completed)?;
                self.status = SwarmStatus::Completed;
                events.push(SwarmEvent::Completed { swarm_id: self.id });
            }
        }
        Ok(events)
    }

    /// Validates the successor slot before anything is mutated
    fn successor_index(&self, role: AgentRole) -> OrchestrationResult<Option<usize>> {
        let Some(next) = role.next() else {
            return Ok(None);
        };
        match self.slot_index(next) {
            Some(idx) if self.agents[idx].status != AgentStatus::Idle => {
                Err(OrchestrationError::InvalidStateTransition {
                    from: format!("{} {}", next, self.agents[idx].status),
                    to: AgentStatus::Working.to_string(),
                })
            }
            found => Ok(found),
        }
    }

    fn ensure_status_transition(&self, next: SwarmStatus) -> OrchestrationResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(OrchestrationError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        Ok(())
    }

    fn slot_index(&self, role: AgentRole) -> Option<usize> {
        self.agents.iter().position(|a| a.role == role)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> SwarmStatus {
        self.status
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn current_phase(&self) -> ProjectPhase {
        self.project.current_phase
    }

    pub fn agents(&self) -> &[AgentSlot] {
        &self.agents
    }

    pub fn output(&self) -> &SwarmOutput {
        &self.output
    }

    /// Full log history
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Version the stored copy had when this value was loaded
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Swarm from persistence layer data
    ///
    /// Bypasses business rule validation since stored data was already
    /// validated. Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        name: String,
        description: String,
        status: SwarmStatus,
        owner_id: Uuid,
        project: Project,
        agents: Vec<AgentSlot>,
        output: SwarmOutput,
        logs: Vec<LogEntry>,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            status,
            owner_id,
            project,
            agents,
            output,
            logs,
            version,
            created_at,
            updated_at,
        }
    }
}

fn pipeline_position(role: AgentRole) -> usize {
    AgentRole::PIPELINE
        .iter()
        .position(|r| *r == role)
        .unwrap_or(AgentRole::PIPELINE.len())
}
