use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::value_objects::{AgentRole, AgentStatus};
use crate::errors::{OrchestrationError, OrchestrationResult};

/// Named arguments passed to an agent function
pub type FunctionParams = Map<String, Value>;

/// One parameter of a declared agent function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
}

/// A callable operation an agent slot declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub parameters: Vec<FunctionParameter>,
    pub description: String,
}

impl FunctionDeclaration {
    /// Returns the first required parameter absent from `params`
    pub fn missing_parameter(&self, params: &FunctionParams) -> Option<&FunctionParameter> {
        self.parameters
            .iter()
            .find(|p| p.required && !params.contains_key(&p.name))
    }
}

/// Predecessor role whose output this slot consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub role: AgentRole,
    pub required_output: Vec<String>,
}

/// Per-swarm mutable state of a pipeline role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSlot {
    pub role: AgentRole,
    pub status: AgentStatus,
    pub current_task: String,
    /// Bound prompt groups; empty when binding failed
    pub prompts: Vec<Uuid>,
    pub functions: Vec<FunctionDeclaration>,
    pub output: Option<Value>,
    pub dependencies: Vec<Dependency>,
}

impl AgentSlot {
    pub fn new(
        role: AgentRole,
        functions: Vec<FunctionDeclaration>,
        dependencies: Vec<Dependency>,
        prompts: Vec<Uuid>,
    ) -> Self {
        Self {
            role,
            status: AgentStatus::Idle,
            current_task: String::new(),
            prompts,
            functions,
            output: None,
            dependencies,
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDeclaration> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn depends_on(&self, role: AgentRole) -> bool {
        self.dependencies.iter().any(|d| d.role == role)
    }

    /// Moves the slot to `next`, enforcing the agent status table
    pub fn transition_to(&mut self, next: AgentStatus) -> OrchestrationResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(OrchestrationError::InvalidStateTransition {
                from: format!("{} {}", self.role, self.status),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Records a function failure; always permitted
    pub fn mark_error(&mut self) {
        self.status = AgentStatus::Error;
    }
}

/// Partial update applied to an agent slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentUpdate {
    pub status: Option<AgentStatus>,
    pub current_task: Option<String>,
    pub output: Option<Value>,
}
