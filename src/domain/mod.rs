// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod prompt;
pub mod repositories;
pub mod swarm;
