// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod memory;
pub mod postgres_prompt_repository;
pub mod postgres_swarm_repository;

pub use memory::{InMemoryPromptRepository, InMemorySwarmRepository};
pub use postgres_prompt_repository::PostgresPromptRepository;
pub use postgres_swarm_repository::PostgresSwarmRepository;
