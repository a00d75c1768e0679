use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::executor::{ConversationAgent, ConversationExecutor};
use super::gather::{gather, IsolationPolicy};
use super::messages::Transcript;
use super::types::{AgentConfig, GroupConfig, Task, TeamConfig};
use crate::errors::{Operation, OrchestrationError, OrchestrationResult, ServiceError, ServiceResult};

/// Agents plus the tasks they run, in order
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub id: Uuid,
    pub agents: Vec<ConversationAgent>,
    pub tasks: Vec<Task>,
}

impl Team {
    fn member(&self, name: &str) -> OrchestrationResult<&ConversationAgent> {
        self.agents
            .iter()
            .find(|agent| agent.name == name)
            .ok_or_else(|| OrchestrationError::AgentNotFound(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Completed,
    Error,
}

/// One agent's answer in a group task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentResponse {
    pub agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupExecution {
    pub group: String,
    pub status: GroupStatus,
    pub responses: Vec<AgentResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub role: String,
}

/// Registry of conversational agents and the teams built from them
///
/// Every created agent is kept by name; creating an agent with an existing
/// name replaces it.
pub struct TeamCoordinator {
    executor: ConversationExecutor,
    agents: RwLock<HashMap<String, ConversationAgent>>,
    teams: RwLock<HashMap<Uuid, Team>>,
    fanout_limit: usize,
}

impl TeamCoordinator {
    pub fn new(executor: ConversationExecutor, fanout_limit: usize) -> Self {
        Self {
            executor,
            agents: RwLock::new(HashMap::new()),
            teams: RwLock::new(HashMap::new()),
            fanout_limit,
        }
    }

    pub async fn create_agent(&self, config: AgentConfig) -> ServiceResult<ConversationAgent> {
        self.register(config)
            .await
            .map_err(|e| ServiceError::capture(Operation::CreateAgent, e))
    }

    /// Creates every agent of `config` and stores the team
    ///
    /// Agents are created concurrently; one invalid config fails the team.
    pub async fn create_team(&self, config: TeamConfig) -> ServiceResult<Team> {
        self.build_team(config)
            .await
            .map_err(|e| ServiceError::capture(Operation::CreateTeam, e))
    }

    /// Runs the team's tasks one after another, one transcript per task
    pub async fn run_team(&self, team_id: Uuid) -> ServiceResult<Vec<Transcript>> {
        self.run(team_id)
            .await
            .map_err(|e| ServiceError::capture(Operation::RunTeam, e))
    }

    /// Builds a team from `config` and runs a single task with it
    pub async fn execute_task(&self, config: TeamConfig, task: Task) -> ServiceResult<Transcript> {
        self.run_once(config, task)
            .await
            .map_err(|e| ServiceError::capture(Operation::ExecuteTask, e))
    }

    /// Sends the same task to every agent of `group`, each with its own transcript
    ///
    /// Agents are resolved from the registry. The group is `error` when any
    /// agent fails; under [`IsolationPolicy::AbortOnError`] the remaining
    /// dispatches are dropped and only the failure is reported.
    pub async fn execute_group_task(
        &self,
        group: GroupConfig,
        task: Task,
    ) -> ServiceResult<GroupExecution> {
        self.fan_out(group, task)
            .await
            .map_err(|e| ServiceError::capture(Operation::ExecuteGroupTask, e))
    }

    /// Name and role of every registered agent, sorted by name
    pub async fn agent_status(&self) -> Vec<AgentSummary> {
        let agents = self.agents.read().await;
        let mut summaries: Vec<_> = agents
            .values()
            .map(|agent| AgentSummary {
                name: agent.name.clone(),
                role: agent.role.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    async fn register(&self, config: AgentConfig) -> OrchestrationResult<ConversationAgent> {
        let agent = ConversationAgent::try_from(config)?;
        self.agents
            .write()
            .await
            .insert(agent.name.clone(), agent.clone());
        tracing::info!(agent = %agent.name, role = %agent.role, "agent created");
        Ok(agent)
    }

    async fn build_team(&self, config: TeamConfig) -> OrchestrationResult<Team> {
        if config.agents.is_empty() {
            return Err(OrchestrationError::Validation(
                "Team needs at least one agent".to_string(),
            ));
        }

        let created = gather(
            config.agents.into_iter().map(|cfg| self.register(cfg)),
            self.fanout_limit,
            IsolationPolicy::AbortOnError,
        )
        .await?;
        let agents = created.into_iter().collect::<OrchestrationResult<Vec<_>>>()?;

        let team = Team {
            id: Uuid::new_v4(),
            agents,
            tasks: config.tasks,
        };
        self.teams.write().await.insert(team.id, team.clone());
        tracing::info!(team_id = %team.id, agents = team.agents.len(), "team created");
        Ok(team)
    }

    async fn run(&self, team_id: Uuid) -> OrchestrationResult<Vec<Transcript>> {
        let team = self
            .teams
            .read()
            .await
            .get(&team_id)
            .cloned()
            .ok_or(OrchestrationError::TeamNotFound(team_id))?;

        let mut transcripts = Vec::with_capacity(team.tasks.len());
        for task in &team.tasks {
            transcripts.push(self.run_task(&team, task).await?);
        }
        Ok(transcripts)
    }

    async fn run_once(&self, config: TeamConfig, task: Task) -> OrchestrationResult<Transcript> {
        let team = self.build_team(config).await?;
        self.run_task(&team, &task).await
    }

    async fn run_task(&self, team: &Team, task: &Task) -> OrchestrationResult<Transcript> {
        let agent = team.member(&task.initiator)?;
        self.executor
            .execute_task(agent, task)
            .await
            .map_err(|failure| {
                tracing::warn!(
                    agent = %agent.name,
                    step = failure.step,
                    completed_messages = failure.partial.len(),
                    "task aborted"
                );
                failure.error
            })
    }

    async fn fan_out(&self, group: GroupConfig, task: Task) -> OrchestrationResult<GroupExecution> {
        if group.agents.is_empty() {
            return Err(OrchestrationError::Validation(
                "Group needs at least one agent".to_string(),
            ));
        }

        let members = {
            let registry = self.agents.read().await;
            group
                .agents
                .iter()
                .map(|name| {
                    registry
                        .get(name)
                        .cloned()
                        .ok_or_else(|| OrchestrationError::AgentNotFound(name.clone()))
                })
                .collect::<OrchestrationResult<Vec<_>>>()?
        };

        // Dispatches own their agent and task; borrowed inputs make the handler future non-Send
        let dispatches: Vec<_> = members
            .into_iter()
            .map(|agent| {
                let executor = self.executor.clone();
                let task = task.clone();
                Box::pin(async move {
                    match executor.execute_task(&agent, &task).await {
                        Ok(transcript) => Ok(AgentResponse {
                            agent: agent.name.clone(),
                            reply: transcript.last_reply().map(str::to_string),
                            error: None,
                        }),
                        Err(failure) => Err(AgentResponse {
                            agent: agent.name.clone(),
                            reply: None,
                            error: Some(failure.error.to_string()),
                        }),
                    }
                })
            })
            .collect();

        let responses = match gather(dispatches, self.fanout_limit, group.isolation).await {
            Ok(results) => results
                .into_iter()
                .map(|result| result.unwrap_or_else(|failed| failed))
                .collect(),
            Err(failed) => vec![failed],
        };

        let status = if responses.iter().any(|r| r.error.is_some()) {
            tracing::warn!(group = %group.name, "group task failed");
            GroupStatus::Error
        } else {
            GroupStatus::Completed
        };

        Ok(GroupExecution {
            group: group.name,
            status,
            responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::executor::CompletionProvider;
    use crate::agents::templates::default_agents;
    use crate::agents::testing::ScriptedProvider;
    use crate::agents::types::LlmOptions;
    use crate::errors::ErrorKind;
    use std::sync::Arc;
    use std::time::Duration;

    fn coordinator(provider: ScriptedProvider) -> TeamCoordinator {
        let provider: Arc<dyn CompletionProvider> = Arc::new(provider);
        TeamCoordinator::new(
            ConversationExecutor::new(provider, Duration::from_secs(1)),
            4,
        )
    }

    fn team_config(tasks: Vec<Task>) -> TeamConfig {
        let agents = default_agents();
        TeamConfig {
            agents: vec![agents["coder"].clone(), agents["reviewer"].clone()],
            tasks,
        }
    }

    async fn register_defaults(coordinator: &TeamCoordinator) {
        for config in default_agents().into_values() {
            coordinator.create_agent(config).await.unwrap();
        }
    }

    #[tokio::test]
    async fn created_agents_are_listed() {
        let coordinator = coordinator(ScriptedProvider::echo());
        register_defaults(&coordinator).await;

        let status = coordinator.agent_status().await;

        let names: Vec<_> = status.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["architect", "coder", "reviewer", "tester"]);
        assert_eq!(status[1].role, "Software Engineer");
    }

    #[tokio::test]
    async fn invalid_agent_is_a_validation_error() {
        let coordinator = coordinator(ScriptedProvider::echo());

        let err = coordinator
            .create_agent(AgentConfig {
                name: "ghost".to_string(),
                role: "Nobody".to_string(),
                system_message: String::new(),
                llm_config: LlmOptions::default(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to create agent");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn run_team_executes_tasks_in_order() {
        let coordinator = coordinator(ScriptedProvider::echo());
        let team = coordinator
            .create_team(team_config(vec![
                Task::new("coder", &["write it", "explain it"]),
                Task::new("reviewer", &["review it"]),
            ]))
            .await
            .unwrap();

        let transcripts = coordinator.run_team(team.id).await.unwrap();

        assert_eq!(transcripts.len(), 2);
        assert_eq!(transcripts[0].len(), 4);
        assert_eq!(transcripts[1].len(), 2);
        assert_eq!(transcripts[1].last_reply(), Some("review it"));
    }

    #[tokio::test]
    async fn unknown_team_is_not_found() {
        let coordinator = coordinator(ScriptedProvider::echo());

        let err = coordinator.run_team(Uuid::new_v4()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn execute_task_requires_initiator_in_team() {
        let coordinator = coordinator(ScriptedProvider::echo());

        let err = coordinator
            .execute_task(team_config(vec![]), Task::new("architect", &["design it"]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to execute task");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn provider_failure_fails_the_task() {
        let coordinator = coordinator(ScriptedProvider::echo().fail_on_call(0));

        let err = coordinator
            .execute_task(team_config(vec![]), Task::new("coder", &["write it"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn group_task_collects_one_reply_per_agent() {
        let coordinator = coordinator(ScriptedProvider::echo());
        register_defaults(&coordinator).await;
        let group = GroupConfig {
            name: "review board".to_string(),
            agents: vec!["coder".to_string(), "reviewer".to_string(), "tester".to_string()],
            isolation: IsolationPolicy::AbortOnError,
        };

        let execution = coordinator
            .execute_group_task(group, Task::new("coder", &["look at this"]))
            .await
            .unwrap();

        assert_eq!(execution.status, GroupStatus::Completed);
        assert_eq!(execution.responses.len(), 3);
        assert!(execution
            .responses
            .iter()
            .all(|r| r.reply.as_deref() == Some("look at this")));
    }

    #[tokio::test]
    async fn one_failing_agent_fails_the_group() {
        let coordinator = coordinator(ScriptedProvider::echo().fail_when_system_contains("code reviewer"));
        register_defaults(&coordinator).await;
        let group = GroupConfig {
            name: "review board".to_string(),
            agents: vec!["coder".to_string(), "reviewer".to_string()],
            isolation: IsolationPolicy::AbortOnError,
        };

        let execution = coordinator
            .execute_group_task(group, Task::new("coder", &["look at this"]))
            .await
            .unwrap();

        assert_eq!(execution.status, GroupStatus::Error);
        assert_eq!(execution.responses.len(), 1);
        assert_eq!(execution.responses[0].agent, "reviewer");
    }

    #[tokio::test]
    async fn continue_on_error_keeps_successful_replies() {
        let coordinator = coordinator(ScriptedProvider::echo().fail_when_system_contains("code reviewer"));
        register_defaults(&coordinator).await;
        let group = GroupConfig {
            name: "review board".to_string(),
            agents: vec!["coder".to_string(), "reviewer".to_string()],
            isolation: IsolationPolicy::ContinueOnError,
        };

        let execution = coordinator
            .execute_group_task(group, Task::new("coder", &["look at this"]))
            .await
            .unwrap();

        assert_eq!(execution.status, GroupStatus::Error);
        assert_eq!(execution.responses.len(), 2);
        assert!(execution.responses[0].error.is_none());
        assert!(execution.responses[1].error.is_some());
    }

    #[test]
    fn group_task_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let coordinator = coordinator(ScriptedProvider::echo());
        let group = GroupConfig {
            name: "pair".to_string(),
            agents: vec!["coder".to_string()],
            isolation: IsolationPolicy::default(),
        };
        let future = coordinator.execute_group_task(group, Task::new("coder", &["hi"]));

        assert_send(&future);
    }

    #[tokio::test]
    async fn group_with_unregistered_agent_is_not_found() {
        let coordinator = coordinator(ScriptedProvider::echo());
        let group = GroupConfig {
            name: "empty".to_string(),
            agents: vec!["nobody".to_string()],
            isolation: IsolationPolicy::default(),
        };

        let err = coordinator
            .execute_group_task(group, Task::new("nobody", &["hi"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
