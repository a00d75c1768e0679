use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::repositories::RepositoryError;
use crate::domain::swarm::value_objects::AgentRole;

/// Errors that can occur anywhere in the orchestration core
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Swarm not found: {0}")]
    SwarmNotFound(Uuid),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Role {0} has no slot in this swarm")]
    RoleNotFound(AgentRole),

    #[error("Team not found: {0}")]
    TeamNotFound(Uuid),

    #[error("Required parameter {parameter} missing for function {function}")]
    MissingParameter { function: String, parameter: String },

    #[error("Function {function} is not declared for role {role}")]
    UnknownFunction { role: AgentRole, function: String },

    #[error("Invalid agent config: {0}")]
    InvalidAgentConfig(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No dependency defined for collaboration from {source_role} with {target_role}")]
    NoDependency {
        source_role: AgentRole,
        target_role: AgentRole,
    },

    #[error("Function {function} failed: {reason}")]
    HandlerFailed { function: String, reason: String },

    #[error("Completion provider error: {0}")]
    Completion(String),

    #[error("Completion provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Swarm {0} was modified concurrently")]
    VersionConflict(Uuid),
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

impl From<RepositoryError> for OrchestrationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(id) => OrchestrationError::VersionConflict(id),
            RepositoryError::Backend(msg) => OrchestrationError::Persistence(msg),
        }
    }
}

/// Coarse failure category exposed at the service boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Dependency,
    Upstream,
}

impl OrchestrationError {
    pub fn kind(&self) -> ErrorKind {
        use OrchestrationError::*;
        match self {
            SwarmNotFound(_) | AgentNotFound(_) | RoleNotFound(_) | TeamNotFound(_) => {
                ErrorKind::NotFound
            }
            MissingParameter { .. }
            | UnknownFunction { .. }
            | InvalidAgentConfig(_)
            | InvalidStateTransition { .. }
            | Validation(_) => ErrorKind::Validation,
            NoDependency { .. } => ErrorKind::Dependency,
            HandlerFailed { .. }
            | Completion(_)
            | Timeout(_)
            | Persistence(_)
            | VersionConflict(_) => ErrorKind::Upstream,
        }
    }
}

/// Public operations of the core, each with a fixed failure message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateSwarm,
    StartSwarm,
    UpdateAgent,
    GetSwarmStatus,
    ListSwarms,
    GetSwarmDetails,
    ExecuteFunction,
    Collaborate,
    CreateAgent,
    CreateTeam,
    RunTeam,
    ExecuteTask,
    ExecuteGroupTask,
}

impl Operation {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::CreateSwarm => "Failed to create swarm",
            Operation::StartSwarm => "Failed to start swarm",
            Operation::UpdateAgent => "Failed to update agent status",
            Operation::GetSwarmStatus => "Failed to get swarm status",
            Operation::ListSwarms => "Failed to list swarms",
            Operation::GetSwarmDetails => "Failed to get swarm details",
            Operation::ExecuteFunction => "Failed to execute agent function",
            Operation::Collaborate => "Failed to collaborate",
            Operation::CreateAgent => "Failed to create agent",
            Operation::CreateTeam => "Failed to create team",
            Operation::RunTeam => "Failed to run team",
            Operation::ExecuteTask => "Failed to execute task",
            Operation::ExecuteGroupTask => "Failed to execute group task",
        }
    }
}

/// Error surfaced by the service layer.
///
/// The message only ever names the failed operation. The underlying
/// [`OrchestrationError`] is logged where the failure is caught and
/// only its [`ErrorKind`] survives the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", .operation.failure_message())]
pub struct ServiceError {
    pub operation: Operation,
    pub kind: ErrorKind,
}

impl ServiceError {
    /// Logs the cause and collapses it into the boundary error for `operation`
    pub fn capture(operation: Operation, cause: OrchestrationError) -> Self {
        tracing::error!(
            operation = ?operation,
            kind = ?cause.kind(),
            error = %cause,
            "{}",
            operation.failure_message()
        );
        Self {
            operation,
            kind: cause.kind(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_share_a_kind() {
        assert_eq!(
            OrchestrationError::SwarmNotFound(Uuid::new_v4()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            OrchestrationError::RoleNotFound(AgentRole::ProductManager).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn missing_parameter_names_the_parameter() {
        let err = OrchestrationError::MissingParameter {
            function: "createPRD".to_string(),
            parameter: "requirements".to_string(),
        };

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("requirements"));
    }

    #[test]
    fn no_dependency_is_a_dependency_error() {
        let err = OrchestrationError::NoDependency {
            source_role: AgentRole::ProductManager,
            target_role: AgentRole::QAEngineer,
        };
        assert_eq!(err.kind(), ErrorKind::Dependency);
    }

    #[test]
    fn failing_handler_is_an_upstream_error() {
        let err = OrchestrationError::HandlerFailed {
            function: "deploy".to_string(),
            reason: "cluster unreachable".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[test]
    fn service_error_hides_cause() {
        let err = ServiceError::capture(
            Operation::StartSwarm,
            OrchestrationError::Persistence("connection reset by peer".to_string()),
        );

        assert_eq!(err.to_string(), "Failed to start swarm");
        assert_eq!(err.kind, ErrorKind::Upstream);
    }
}
