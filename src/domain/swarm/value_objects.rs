use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents the lifecycle status of a swarm
///
/// # Status Transitions
/// ```text
/// Initializing -> Running -> Completed
///      └-------------┴----------------> Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwarmStatus {
    /// Agents are bound but no phase has started
    Initializing,
    /// A phase owner is working
    Running,
    /// The terminal role completed
    Completed,
    /// Unrecoverable failure
    Error,
}

impl SwarmStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use agentswarm_api::domain::swarm::value_objects::SwarmStatus;
    ///
    /// assert!(SwarmStatus::Initializing.can_transition_to(SwarmStatus::Running));
    /// assert!(!SwarmStatus::Completed.can_transition_to(SwarmStatus::Running));
    /// ```
    pub fn can_transition_to(&self, next: SwarmStatus) -> bool {
        use SwarmStatus::*;
        matches!(
            (self, next),
            (Initializing, Running)
                | (Running, Completed)
                | (Initializing, Error)
                | (Running, Error)
                | (Completed, Error)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwarmStatus::Initializing => "initializing",
            SwarmStatus::Running => "running",
            SwarmStatus::Completed => "completed",
            SwarmStatus::Error => "error",
        }
    }
}

impl fmt::Display for SwarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwarmStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initializing" => Ok(SwarmStatus::Initializing),
            "running" => Ok(SwarmStatus::Running),
            "completed" => Ok(SwarmStatus::Completed),
            "error" => Ok(SwarmStatus::Error),
            other => Err(format!("Unknown swarm status: {}", other)),
        }
    }
}

/// Status of a single agent slot
///
/// ```text
/// Idle -> Working -> Completed
///   └--------┴-----> Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Working,
    Completed,
    Error,
}

impl AgentStatus {
    pub fn can_transition_to(&self, next: AgentStatus) -> bool {
        use AgentStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Idle, Working) | (Working, Completed) | (Working, Error) | (Idle, Error)
            )
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Working => write!(f, "working"),
            AgentStatus::Completed => write!(f, "completed"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// Project-wide stage, strictly ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectPhase {
    Planning,
    Design,
    Implementation,
    Testing,
}

impl fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectPhase::Planning => write!(f, "planning"),
            ProjectPhase::Design => write!(f, "design"),
            ProjectPhase::Implementation => write!(f, "implementation"),
            ProjectPhase::Testing => write!(f, "testing"),
        }
    }
}

/// Output artifact a role produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Artifact {
    Prd,
    Design,
    Implementation,
    TestReport,
}

impl Artifact {
    pub fn key(&self) -> &'static str {
        match self {
            Artifact::Prd => "prd",
            Artifact::Design => "design",
            Artifact::Implementation => "implementation",
            Artifact::TestReport => "testReport",
        }
    }
}

/// Fixed pipeline roles, declared in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    ProductManager,
    Architect,
    Engineer,
    QAEngineer,
}

impl AgentRole {
    /// Every role in pipeline order
    pub const PIPELINE: [AgentRole; 4] = [
        AgentRole::ProductManager,
        AgentRole::Architect,
        AgentRole::Engineer,
        AgentRole::QAEngineer,
    ];

    pub fn first() -> AgentRole {
        AgentRole::ProductManager
    }

    /// The role activated when this one completes, `None` for the terminal role
    pub fn next(&self) -> Option<AgentRole> {
        match self {
            AgentRole::ProductManager => Some(AgentRole::Architect),
            AgentRole::Architect => Some(AgentRole::Engineer),
            AgentRole::Engineer => Some(AgentRole::QAEngineer),
            AgentRole::QAEngineer => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// The phase this role owns
    pub fn phase(&self) -> ProjectPhase {
        match self {
            AgentRole::ProductManager => ProjectPhase::Planning,
            AgentRole::Architect => ProjectPhase::Design,
            AgentRole::Engineer => ProjectPhase::Implementation,
            AgentRole::QAEngineer => ProjectPhase::Testing,
        }
    }

    pub fn artifact(&self) -> Artifact {
        match self {
            AgentRole::ProductManager => Artifact::Prd,
            AgentRole::Architect => Artifact::Design,
            AgentRole::Engineer => Artifact::Implementation,
            AgentRole::QAEngineer => Artifact::TestReport,
        }
    }

    /// Prompt library category holding this role's instructions
    pub fn prompt_category(&self) -> &'static str {
        match self {
            AgentRole::ProductManager => "Product Management",
            AgentRole::Architect => "Architecture",
            AgentRole::Engineer => "Development",
            AgentRole::QAEngineer => "Testing",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::ProductManager => "ProductManager",
            AgentRole::Architect => "Architect",
            AgentRole::Engineer => "Engineer",
            AgentRole::QAEngineer => "QAEngineer",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::PIPELINE
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown agent role: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_swarm_transitions() {
        assert!(SwarmStatus::Initializing.can_transition_to(SwarmStatus::Running));
        assert!(SwarmStatus::Running.can_transition_to(SwarmStatus::Completed));
        assert!(SwarmStatus::Running.can_transition_to(SwarmStatus::Error));
        assert!(SwarmStatus::Initializing.can_transition_to(SwarmStatus::Error));
    }

    #[test]
    fn invalid_swarm_transitions() {
        assert!(!SwarmStatus::Initializing.can_transition_to(SwarmStatus::Completed));
        assert!(!SwarmStatus::Running.can_transition_to(SwarmStatus::Running));
        assert!(!SwarmStatus::Completed.can_transition_to(SwarmStatus::Running));
        assert!(!SwarmStatus::Error.can_transition_to(SwarmStatus::Running));
    }

    #[test]
    fn agent_status_table() {
        assert!(AgentStatus::Idle.can_transition_to(AgentStatus::Working));
        assert!(AgentStatus::Working.can_transition_to(AgentStatus::Completed));
        assert!(AgentStatus::Working.can_transition_to(AgentStatus::Working));
        assert!(!AgentStatus::Idle.can_transition_to(AgentStatus::Completed));
        assert!(!AgentStatus::Completed.can_transition_to(AgentStatus::Working));
    }

    #[test]
    fn pipeline_is_linear() {
        let mut role = AgentRole::first();
        let mut phases = vec![role.phase()];
        while let Some(next) = role.next() {
            role = next;
            phases.push(role.phase());
        }

        assert_eq!(role, AgentRole::QAEngineer);
        assert!(role.is_terminal());
        assert!(phases.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(phases.len(), AgentRole::PIPELINE.len());
    }

    #[test]
    fn phases_are_ordered() {
        assert!(ProjectPhase::Planning < ProjectPhase::Design);
        assert!(ProjectPhase::Design < ProjectPhase::Implementation);
        assert!(ProjectPhase::Implementation < ProjectPhase::Testing);
    }

    #[test]
    fn role_parses_from_its_name() {
        for role in AgentRole::PIPELINE {
            assert_eq!(role.to_string().parse::<AgentRole>(), Ok(role));
        }
        assert!("Designer".parse::<AgentRole>().is_err());
    }

    #[test]
    fn status_display() {
        assert_eq!(SwarmStatus::Initializing.to_string(), "initializing");
        assert_eq!(SwarmStatus::Running.to_string(), "running");
        assert_eq!(AgentStatus::Working.to_string(), "working");
        assert_eq!(ProjectPhase::Implementation.to_string(), "implementation");
        assert_eq!(Artifact::TestReport.key(), "testReport");
    }
}
