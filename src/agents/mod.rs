// Multi-agent orchestration core
//
// The fixed-role swarm pipeline (registry + lifecycle) and the generic
// conversation executor used by teams.

pub mod capabilities;
pub mod executor;
pub mod gather;
pub mod lifecycle;
pub mod messages;
pub mod prompts;
pub mod registry;
pub mod team;
pub mod templates;
pub mod testing;
pub mod types;

// Re-export main types
pub use executor::{CompletionProvider, CompletionRequest, ConversationAgent, ConversationExecutor};
pub use gather::IsolationPolicy;
pub use lifecycle::{NewSwarm, StatusProjection, SwarmLifecycleManager, SwarmSummary};
pub use messages::Transcript;
pub use registry::AgentSlotRegistry;
pub use team::TeamCoordinator;
pub use types::{AgentConfig, GroupConfig, Task, TeamConfig};
