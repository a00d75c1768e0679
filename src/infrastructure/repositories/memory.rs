// In-memory repository adapters
// Used by unit tests and the router integration tests

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::prompt::{Prompt, PromptBody, PromptGroup, PromptSummary};
use crate::domain::repositories::{PromptRepository, RepositoryError, SwarmRepository};
use crate::domain::swarm::Swarm;

fn poisoned<E: std::fmt::Display>(err: E) -> RepositoryError {
    RepositoryError::Backend(format!("lock poisoned: {}", err))
}

#[derive(Debug, Default)]
struct SwarmState {
    swarms: HashMap<Uuid, StoredSwarm>,
    next_seq: u64,
}

#[derive(Debug)]
struct StoredSwarm {
    seq: u64,
    swarm: Swarm,
}

/// Thread-safe in-memory swarm repository with the same version check as Postgres
#[derive(Debug, Clone, Default)]
pub struct InMemorySwarmRepository {
    state: Arc<RwLock<SwarmState>>,
}

impl InMemorySwarmRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SwarmRepository for InMemorySwarmRepository {
    async fn save(&self, swarm: &Swarm) -> Result<(), RepositoryError> {
        let mut state = self.state.write().map_err(poisoned)?;

        let stored_version = state.swarms.get(&swarm.id()).map(|s| s.swarm.version());
        if stored_version.unwrap_or(0) != swarm.version() {
            return Err(RepositoryError::Conflict(swarm.id()));
        }

        let mut stored = swarm.clone();
        stored.mark_persisted();

        let seq = match state.swarms.get(&swarm.id()) {
            Some(existing) => existing.seq,
            None => {
                state.next_seq += 1;
                state.next_seq
            }
        };
        state.swarms.insert(swarm.id(), StoredSwarm { seq, swarm: stored });
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Swarm>, RepositoryError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.swarms.get(&id).map(|s| s.swarm.clone()))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Swarm>, RepositoryError> {
        let state = self.state.read().map_err(poisoned)?;
        let mut owned: Vec<&StoredSwarm> = state
            .swarms
            .values()
            .filter(|s| s.swarm.owner_id() == owner_id)
            .collect();
        owned.sort_by(|a, b| {
            (b.swarm.created_at(), b.seq).cmp(&(a.swarm.created_at(), a.seq))
        });
        Ok(owned.into_iter().map(|s| s.swarm.clone()).collect())
    }
}

#[derive(Debug, Default)]
struct PromptState {
    groups: HashMap<(String, String), PromptGroup>,
    prompts: HashMap<Uuid, Prompt>,
}

/// Thread-safe in-memory prompt library
#[derive(Debug, Clone, Default)]
pub struct InMemoryPromptRepository {
    state: Arc<RwLock<PromptState>>,
}

impl InMemoryPromptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored groups
    pub fn group_count(&self) -> usize {
        self.state
            .read()
            .map(|state| state.groups.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PromptRepository for InMemoryPromptRepository {
    async fn find_or_create_group(
        &self,
        category: &str,
        name: &str,
        author_id: Uuid,
        default_body: PromptBody,
    ) -> Result<Uuid, RepositoryError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let key = (category.to_string(), name.to_string());
        if let Some(group) = state.groups.get(&key) {
            return Ok(group.id);
        }

        let (group, prompt) = PromptGroup::with_default_prompt(category, name, author_id, default_body);
        let id = group.id;
        state.prompts.insert(prompt.id, prompt);
        state.groups.insert(key, group);
        Ok(id)
    }

    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<PromptSummary>, RepositoryError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(ids
            .iter()
            .filter_map(|id| state.groups.values().find(|g| g.id == *id))
            .map(PromptGroup::summary)
            .collect())
    }
}
