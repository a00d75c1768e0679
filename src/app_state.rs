use std::sync::Arc;

use crate::agents::capabilities::CapabilityTable;
use crate::agents::prompts::PromptBinder;
use crate::agents::{
    AgentSlotRegistry, CompletionProvider, ConversationExecutor, SwarmLifecycleManager,
    TeamCoordinator,
};
use crate::config::AppConfig;
use crate::domain::repositories::{PromptRepository, SwarmRepository};

/// Services shared by every request handler
///
/// Built once at startup from the configuration and the chosen adapters.
#[derive(Clone)]
pub struct AppState {
    pub swarms: Arc<SwarmLifecycleManager>,
    pub teams: Arc<TeamCoordinator>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        swarm_repository: Arc<dyn SwarmRepository>,
        prompt_repository: Arc<dyn PromptRepository>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        let registry = AgentSlotRegistry::new(
            PromptBinder::new(prompt_repository.clone()),
            Arc::new(CapabilityTable::standard()),
            config.fanout_concurrency,
        );
        let swarms = SwarmLifecycleManager::new(
            swarm_repository,
            prompt_repository,
            registry,
            config.status_log_tail,
        );

        let executor = ConversationExecutor::new(provider, config.completion_timeout);
        let teams = TeamCoordinator::new(executor, config.fanout_concurrency);

        Self {
            swarms: Arc::new(swarms),
            teams: Arc::new(teams),
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
        }
    }
}
