// Test doubles for the completion provider and the prompt store.
// Used by unit and integration tests to run the core without network or database.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::executor::{CompletionProvider, CompletionRequest};
use super::messages::MessageRole;
use crate::domain::prompt::{PromptBody, PromptSummary};
use crate::domain::repositories::{PromptRepository, RepositoryError};
use crate::errors::{OrchestrationError, OrchestrationResult};
use crate::infrastructure::repositories::InMemoryPromptRepository;

/// A completion provider with scripted behaviour
///
/// By default it echoes the last user message back. Queued replies are
/// returned first, in order. Every request is recorded, including the ones
/// that fail.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fail_on_call: Option<usize>,
    fail_when_system_contains: Option<String>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Replies with the content of the last user message
    pub fn echo() -> Self {
        Self::default()
    }

    /// Replies with `replies` in order, then falls back to echoing
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Fails the `n`th call (zero based)
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Fails every call whose system instruction contains `needle`
    pub fn fail_when_system_contains(mut self, needle: &str) -> Self {
        self.fail_when_system_contains = Some(needle.to_string());
        self
    }

    /// Waits `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> OrchestrationResult<String> {
        let call = {
            let mut requests = self
                .requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            requests.push(request.clone());
            requests.len() - 1
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let system_fails = self
            .fail_when_system_contains
            .as_deref()
            .is_some_and(|needle| request.system.contains(needle));
        if self.fail_on_call == Some(call) || system_fails {
            return Err(OrchestrationError::Completion(format!(
                "scripted failure on call {}",
                call
            )));
        }

        let queued = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        Ok(queued.unwrap_or_else(|| {
            request
                .messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .map(|m| m.content.clone())
                .unwrap_or_default()
        }))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// Prompt store that refuses to bind one category
#[derive(Debug)]
pub struct FailingPromptRepository {
    inner: InMemoryPromptRepository,
    failing_category: String,
}

impl FailingPromptRepository {
    pub fn for_category(category: &str) -> Self {
        Self {
            inner: InMemoryPromptRepository::new(),
            failing_category: category.to_string(),
        }
    }
}

#[async_trait]
impl PromptRepository for FailingPromptRepository {
    async fn find_or_create_group(
        &self,
        category: &str,
        name: &str,
        author_id: Uuid,
        default_body: PromptBody,
    ) -> Result<Uuid, RepositoryError> {
        if category == self.failing_category {
            return Err(RepositoryError::Backend(format!(
                "prompt store unavailable for {}",
                category
            )));
        }
        self.inner
            .find_or_create_group(category, name, author_id, default_body)
            .await
    }

    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<PromptSummary>, RepositoryError> {
        self.inner.find_summaries(ids).await
    }
}
