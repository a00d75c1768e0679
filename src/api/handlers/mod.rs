// HTTP handlers, one module per resource

pub mod autogen;
pub mod swarms;

/// Liveness probe, unauthenticated
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
