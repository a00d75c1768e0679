// Swarm domain module
// Contains the swarm aggregate root, agent slots, value objects, and domain events

#![allow(clippy::module_inception)]

pub mod agent_slot;
pub mod events;
pub mod swarm;
pub mod value_objects;

// Re-export main types for convenience
pub use agent_slot::{AgentSlot, AgentUpdate, Dependency, FunctionDeclaration, FunctionParams};
pub use swarm::{LogEntry, Project, Swarm, SwarmOutput};
pub use value_objects::{AgentRole, AgentStatus, ProjectPhase, SwarmStatus};
