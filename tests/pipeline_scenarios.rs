//! Orchestration scenarios driven through the service layer
//!
//! No HTTP and no database: the lifecycle manager and the team coordinator
//! run over in-memory repositories and a scripted completion provider.

use std::sync::Arc;
use std::time::Duration;

use agentswarm_api::agents::capabilities::CapabilityTable;
use agentswarm_api::agents::messages::MessageRole;
use agentswarm_api::agents::prompts::PromptBinder;
use agentswarm_api::agents::team::GroupStatus;
use agentswarm_api::agents::testing::{FailingPromptRepository, ScriptedProvider};
use agentswarm_api::agents::{
    AgentConfig, AgentSlotRegistry, CompletionProvider, ConversationExecutor, GroupConfig,
    IsolationPolicy, NewSwarm, SwarmLifecycleManager, Task, TeamConfig, TeamCoordinator,
};
use agentswarm_api::domain::repositories::PromptRepository;
use agentswarm_api::domain::swarm::value_objects::LogLevel;
use agentswarm_api::domain::swarm::{AgentRole, AgentStatus, AgentUpdate, ProjectPhase, SwarmStatus};
use agentswarm_api::errors::ErrorKind;
use agentswarm_api::infrastructure::repositories::{
    InMemoryPromptRepository, InMemorySwarmRepository,
};
use uuid::Uuid;

fn manager_with(prompts: Arc<dyn PromptRepository>) -> SwarmLifecycleManager {
    let registry = AgentSlotRegistry::new(
        PromptBinder::new(prompts.clone()),
        Arc::new(CapabilityTable::standard()),
        4,
    );
    SwarmLifecycleManager::new(Arc::new(InMemorySwarmRepository::new()), prompts, registry, 10)
}

fn manager() -> SwarmLifecycleManager {
    manager_with(Arc::new(InMemoryPromptRepository::new()))
}

fn coordinator(provider: ScriptedProvider) -> TeamCoordinator {
    let provider: Arc<dyn CompletionProvider> = Arc::new(provider);
    TeamCoordinator::new(ConversationExecutor::new(provider, Duration::from_secs(1)), 4)
}

fn new_swarm() -> NewSwarm {
    NewSwarm {
        name: "Scenario".to_string(),
        description: String::new(),
        project_name: "todo".to_string(),
        requirements: "A todo list".to_string(),
    }
}

fn completed() -> AgentUpdate {
    AgentUpdate {
        status: Some(AgentStatus::Completed),
        ..Default::default()
    }
}

fn agent(name: &str, system: &str) -> AgentConfig {
    AgentConfig {
        name: name.to_string(),
        role: "Helper".to_string(),
        system_message: system.to_string(),
        llm_config: Default::default(),
    }
}

#[tokio::test]
async fn pipeline_advances_one_role_at_a_time() {
    let manager = manager();
    let swarm = manager
        .initialize_swarm(Uuid::new_v4(), new_swarm())
        .await
        .unwrap();
    let id = swarm.id();

    let swarm = manager.start_swarm(id).await.unwrap();
    assert_eq!(swarm.working_count(), 1);

    let expected = [
        (AgentRole::ProductManager, Some(AgentRole::Architect), ProjectPhase::Design),
        (AgentRole::Architect, Some(AgentRole::Engineer), ProjectPhase::Implementation),
        (AgentRole::Engineer, Some(AgentRole::QAEngineer), ProjectPhase::Testing),
    ];
    let mut last_phase = swarm.current_phase();
    for (role, next, phase) in expected {
        let swarm = manager.update_agent_status(id, role, completed()).await.unwrap();

        assert_eq!(swarm.working_count(), 1);
        assert_eq!(swarm.agent(next.unwrap()).unwrap().status, AgentStatus::Working);
        assert_eq!(swarm.current_phase(), phase);
        assert!(swarm.current_phase() > last_phase);
        last_phase = swarm.current_phase();
    }

    let swarm = manager
        .update_agent_status(id, AgentRole::QAEngineer, completed())
        .await
        .unwrap();
    assert_eq!(swarm.status(), SwarmStatus::Completed);
    assert_eq!(swarm.working_count(), 0);
    assert_eq!(swarm.current_phase(), ProjectPhase::Testing);
}

#[tokio::test]
async fn binding_failure_still_yields_every_slot() {
    let manager = manager_with(Arc::new(FailingPromptRepository::for_category("Development")));

    let swarm = manager
        .initialize_swarm(Uuid::new_v4(), new_swarm())
        .await
        .unwrap();

    assert_eq!(swarm.agents().len(), 4);
    for slot in swarm.agents() {
        assert_eq!(slot.prompts.is_empty(), slot.role == AgentRole::Engineer);
    }

    let warnings: Vec<_> = swarm
        .logs()
        .iter()
        .filter(|entry| entry.level == LogLevel::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].agent, Some(AgentRole::Engineer));
}

#[tokio::test]
async fn prompt_binding_is_idempotent_per_owner() {
    let prompts = Arc::new(InMemoryPromptRepository::new());
    let manager = manager_with(prompts.clone());
    let owner = Uuid::new_v4();

    let first = manager.initialize_swarm(owner, new_swarm()).await.unwrap();
    let second = manager.initialize_swarm(owner, new_swarm()).await.unwrap();

    for role in AgentRole::PIPELINE {
        assert_eq!(
            first.agent(role).unwrap().prompts,
            second.agent(role).unwrap().prompts
        );
    }
    assert_eq!(prompts.group_count(), 4);
}

#[tokio::test]
async fn three_step_task_produces_six_alternating_messages() {
    let coordinator = coordinator(ScriptedProvider::with_replies(&["a", "b", "c"]));
    let config = TeamConfig {
        agents: vec![agent("coder", "You write code.")],
        tasks: vec![],
    };

    let transcript = coordinator
        .execute_task(config, Task::new("coder", &["one", "two", "three"]))
        .await
        .unwrap();

    assert_eq!(transcript.len(), 6);
    let roles: Vec<_> = transcript.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant,
        ]
    );
    assert_eq!(transcript.last_reply(), Some("c"));
}

#[tokio::test]
async fn task_with_unknown_initiator_is_not_found() {
    let coordinator = coordinator(ScriptedProvider::echo());
    let config = TeamConfig {
        agents: vec![agent("coder", "You write code.")],
        tasks: vec![],
    };

    let err = coordinator
        .execute_task(config, Task::new("nobody", &["hi"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn aborting_group_reports_only_the_failure() {
    let coordinator = coordinator(ScriptedProvider::echo().fail_when_system_contains("You break."));
    coordinator.create_agent(agent("alpha", "You help.")).await.unwrap();
    coordinator.create_agent(agent("beta", "You break.")).await.unwrap();

    let execution = coordinator
        .execute_group_task(
            GroupConfig {
                name: "pair".to_string(),
                agents: vec!["alpha".to_string(), "beta".to_string()],
                isolation: IsolationPolicy::AbortOnError,
            },
            Task::new("alpha", &["hello"]),
        )
        .await
        .unwrap();

    assert_eq!(execution.status, GroupStatus::Error);
    assert_eq!(execution.responses.len(), 1);
    assert_eq!(execution.responses[0].agent, "beta");
}
