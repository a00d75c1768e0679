use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::gather::IsolationPolicy;
use crate::errors::{OrchestrationError, OrchestrationResult};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Completion settings for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmOptions {
    /// Falls back to the provider's configured model when unset
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Configuration of a conversational agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub role: String,
    pub system_message: String,
    #[serde(default)]
    pub llm_config: LlmOptions,
}

impl AgentConfig {
    pub fn validate(&self) -> OrchestrationResult<()> {
        let required = [
            ("name", &self.name),
            ("role", &self.role),
            ("system_message", &self.system_message),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(OrchestrationError::InvalidAgentConfig(format!(
                "Agent {} is required",
                field
            )));
        }
        if !(0.0..=2.0).contains(&self.llm_config.temperature) {
            return Err(OrchestrationError::InvalidAgentConfig(
                "temperature must be between 0 and 2".to_string(),
            ));
        }
        if self.llm_config.max_tokens == 0 {
            return Err(OrchestrationError::InvalidAgentConfig(
                "max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One prompt of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub prompt: String,
}

/// Ordered steps run by the initiating agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub initiator: String,
    pub steps: Vec<Step>,
    /// Values substituted for `{name}` placeholders in step prompts
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, String>,
}

impl Task {
    pub fn new(initiator: &str, prompts: &[&str]) -> Self {
        Self {
            initiator: initiator.to_string(),
            steps: prompts
                .iter()
                .map(|p| Step {
                    prompt: p.to_string(),
                })
                .collect(),
            variables: HashMap::new(),
        }
    }
}

/// Agents plus the tasks a team runs in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Registered agents that each receive the same task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub agents: Vec<String>,
    #[serde(default)]
    pub isolation: IsolationPolicy,
}
