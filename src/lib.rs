//! Agent Swarm API Library
//!
//! Multi-agent orchestration service: a fixed-role swarm pipeline driving a
//! project from planning to testing, and a generic conversation executor
//! for ad-hoc agent teams, behind an authenticated HTTP API.

pub mod agents;
pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;
