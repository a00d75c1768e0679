use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::swarm::Swarm;

/// Repository trait for the Swarm aggregate
///
/// Implementations treat the swarm as one document: a save replaces the
/// whole record atomically.
#[async_trait]
pub trait SwarmRepository: Send + Sync {
    /// Insert or update a swarm
    ///
    /// Fails with [`RepositoryError::Conflict`] when the stored version differs
    /// from `swarm.version()`. On success the stored version is
    /// `swarm.version() + 1`.
    async fn save(&self, swarm: &Swarm) -> Result<(), RepositoryError>;

    /// Find a swarm by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Swarm>, RepositoryError>;

    /// Find all swarms of an owner, newest first
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Swarm>, RepositoryError>;
}
