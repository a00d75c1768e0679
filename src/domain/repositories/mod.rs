// Repository ports
// Implemented by adapters in infrastructure::repositories

pub mod prompt_repository;
pub mod swarm_repository;

pub use prompt_repository::PromptRepository;
pub use swarm_repository::SwarmRepository;

use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a repository adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The stored record changed since it was loaded
    #[error("Record {0} was modified by another writer")]
    Conflict(Uuid),

    #[error("{0}")]
    Backend(String),
}
