use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::prompt::{PromptBody, PromptSummary};

/// Repository trait for prompt groups and their canonical prompts
#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// Returns the id of the group keyed by `(category, name)`, creating it
    /// with `default_body` and a linked production prompt when absent
    ///
    /// Repeated calls with the same key return the same id.
    async fn find_or_create_group(
        &self,
        category: &str,
        name: &str,
        author_id: Uuid,
        default_body: PromptBody,
    ) -> Result<Uuid, RepositoryError>;

    /// Summaries of the given groups; unknown ids are skipped
    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<PromptSummary>, RepositoryError>;
}
