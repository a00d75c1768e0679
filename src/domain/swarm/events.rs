use uuid::Uuid;

use super::value_objects::{AgentRole, AgentStatus, ProjectPhase};

/// Domain events that occur within the Swarm aggregate
///
/// Returned by every state-changing method on [`Swarm`](super::Swarm) so the
/// caller can trace what a single operation did to the pipeline.
///
/// # Example
/// ```
/// use agentswarm_api::domain::swarm::events::SwarmEvent;
/// use uuid::Uuid;
///
/// let event = SwarmEvent::Started { swarm_id: Uuid::new_v4() };
/// assert!(matches!(event, SwarmEvent::Started { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwarmEvent {
    /// Fired when a swarm is created
    Created {
        swarm_id: Uuid,
        owner_id: Uuid,
        agent_count: usize,
    },
    /// Fired when the first role is activated
    Started { swarm_id: Uuid },
    /// Fired for every accepted agent update
    AgentUpdated {
        swarm_id: Uuid,
        role: AgentRole,
        status: AgentStatus,
    },
    /// Fired when a role becomes the working phase owner
    AgentActivated { swarm_id: Uuid, role: AgentRole },
    /// Fired when the project moves to the next phase
    PhaseAdvanced {
        swarm_id: Uuid,
        from: ProjectPhase,
        to: ProjectPhase,
    },
    /// Fired when the terminal role completes
    Completed { swarm_id: Uuid },
    /// Fired when the swarm enters the error state
    Failed { swarm_id: Uuid, reason: String },
}

impl SwarmEvent {
    /// Returns the swarm_id for this event
    pub fn swarm_id(&self) -> Uuid {
        match self {
            SwarmEvent::Created { swarm_id, .. }
            | SwarmEvent::Started { swarm_id }
            | SwarmEvent::AgentUpdated { swarm_id, .. }
            | SwarmEvent::AgentActivated { swarm_id, .. }
            | SwarmEvent::PhaseAdvanced { swarm_id, .. }
            | SwarmEvent::Completed { swarm_id }
            | SwarmEvent::Failed { swarm_id, .. } => *swarm_id,
        }
    }
}
