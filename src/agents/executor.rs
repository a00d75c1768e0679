// Conversation executor
//
// Runs a named agent through ordered prompt steps against a completion
// provider. The provider call is the only place the pipeline waits on I/O.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::messages::{ChatMessage, Transcript};
use super::prompts::render_placeholders;
use super::types::{AgentConfig, LlmOptions, Task};
use crate::errors::{OrchestrationError, OrchestrationResult};

/// Everything a provider needs for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub options: LlmOptions,
}

/// Port to an external chat-completion service
///
/// Implementations must not retry; retry policy belongs to the caller.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> OrchestrationResult<String>;

    fn provider_name(&self) -> &str;
}

/// A validated agent the executor can talk to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationAgent {
    pub name: String,
    pub role: String,
    #[serde(skip)]
    system_message: String,
    #[serde(skip)]
    options: LlmOptions,
}

impl ConversationAgent {
    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    pub fn options(&self) -> &LlmOptions {
        &self.options
    }
}

impl TryFrom<AgentConfig> for ConversationAgent {
    type Error = OrchestrationError;

    fn try_from(config: AgentConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self {
            name: config.name,
            role: config.role,
            system_message: config.system_message,
            options: config.llm_config,
        })
    }
}

/// A task that stopped part way
///
/// `partial` holds every exchange that finished before `step` failed. It is
/// kept for diagnostics and is not a successful result.
#[derive(Debug, Error)]
#[error("step {step} failed: {error}")]
pub struct TaskFailure {
    pub step: usize,
    pub partial: Transcript,
    pub error: OrchestrationError,
}

#[derive(Clone)]
pub struct ConversationExecutor {
    provider: Arc<dyn CompletionProvider>,
    step_timeout: Duration,
}

impl ConversationExecutor {
    pub fn new(provider: Arc<dyn CompletionProvider>, step_timeout: Duration) -> Self {
        Self {
            provider,
            step_timeout,
        }
    }

    /// Sends `transcript` plus `prompt` and returns the reply
    ///
    /// `transcript` is not modified. Exceeding the step timeout is an error.
    pub async fn send_message(
        &self,
        agent: &ConversationAgent,
        transcript: &Transcript,
        prompt: &str,
    ) -> OrchestrationResult<String> {
        let request = CompletionRequest {
            system: agent.system_message.clone(),
            messages: transcript.with_prompt(prompt),
            options: agent.options.clone(),
        };

        tracing::debug!(
            agent = %agent.name,
            provider = self.provider.provider_name(),
            messages = request.messages.len(),
            "sending completion request"
        );

        tokio::time::timeout(self.step_timeout, self.provider.complete(&request))
            .await
            .map_err(|_| OrchestrationError::Timeout(self.step_timeout))?
    }

    /// Runs every step of `task` in order, each seeing all earlier replies
    pub async fn execute_task(
        &self,
        agent: &ConversationAgent,
        task: &Task,
    ) -> Result<Transcript, TaskFailure> {
        let mut transcript = Transcript::new();

        for (step, item) in task.steps.iter().enumerate() {
            let prompt = render_placeholders(&item.prompt, &task.variables);
            match self.send_message(agent, &transcript, &prompt).await {
                Ok(reply) => transcript.push_exchange(prompt, reply),
                Err(error) => {
                    tracing::warn!(agent = %agent.name, step, error = %error, "task step failed");
                    return Err(TaskFailure {
                        step,
                        partial: transcript,
                        error,
                    });
                }
            }
        }

        tracing::info!(agent = %agent.name, steps = task.steps.len(), "task completed");
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::messages::MessageRole;
    use crate::agents::testing::ScriptedProvider;

    fn agent() -> ConversationAgent {
        ConversationAgent::try_from(AgentConfig {
            name: "coder".to_string(),
            role: "Software Engineer".to_string(),
            system_message: "You write code.".to_string(),
            llm_config: LlmOptions::default(),
        })
        .unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = ConversationAgent::try_from(AgentConfig {
            name: String::new(),
            role: "r".to_string(),
            system_message: "s".to_string(),
            llm_config: LlmOptions::default(),
        })
        .unwrap_err();

        assert!(matches!(err, OrchestrationError::InvalidAgentConfig(_)));
    }

    #[tokio::test]
    async fn three_steps_yield_six_alternating_messages() {
        let provider = Arc::new(ScriptedProvider::echo());
        let executor = ConversationExecutor::new(provider.clone(), Duration::from_secs(1));
        let task = Task::new("coder", &["one", "two", "three"]);

        let transcript = executor.execute_task(&agent(), &task).await.unwrap();

        assert_eq!(transcript.len(), 6);
        for (i, message) in transcript.messages().iter().enumerate() {
            let expected = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            assert_eq!(message.role, expected);
        }
        assert_eq!(transcript.messages()[4].content, "three");
    }

    #[tokio::test]
    async fn each_step_sees_previous_replies() {
        let provider = Arc::new(ScriptedProvider::echo());
        let executor = ConversationExecutor::new(provider.clone(), Duration::from_secs(1));
        let task = Task::new("coder", &["one", "two", "three"]);

        executor.execute_task(&agent(), &task).await.unwrap();

        let sizes: Vec<_> = provider
            .requests()
            .iter()
            .map(|r| r.messages.len())
            .collect();
        assert_eq!(sizes, vec![1, 3, 5]);
        assert_eq!(provider.requests()[0].system, "You write code.");
    }

    #[tokio::test]
    async fn variables_are_rendered_into_prompts() {
        let provider = Arc::new(ScriptedProvider::echo());
        let executor = ConversationExecutor::new(provider, Duration::from_secs(1));
        let mut task = Task::new("coder", &["Review:\n{code}"]);
        task.variables.insert("code".to_string(), "fn main() {}".to_string());

        let transcript = executor.execute_task(&agent(), &task).await.unwrap();

        assert_eq!(transcript.messages()[0].content, "Review:\nfn main() {}");
    }

    #[tokio::test]
    async fn failing_step_aborts_with_partial_transcript() {
        let provider = Arc::new(ScriptedProvider::echo().fail_on_call(1));
        let executor = ConversationExecutor::new(provider.clone(), Duration::from_secs(1));
        let task = Task::new("coder", &["one", "two", "three"]);

        let failure = executor.execute_task(&agent(), &task).await.unwrap_err();

        assert_eq!(failure.step, 1);
        assert_eq!(failure.partial.len(), 2);
        assert!(matches!(failure.error, OrchestrationError::Completion(_)));
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let provider = Arc::new(ScriptedProvider::echo().with_delay(Duration::from_millis(200)));
        let executor = ConversationExecutor::new(provider, Duration::from_millis(20));

        let err = executor
            .send_message(&agent(), &Transcript::new(), "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestrationError::Timeout(_)));
    }
}
