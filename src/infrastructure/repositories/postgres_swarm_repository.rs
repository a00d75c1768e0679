use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::repositories::{RepositoryError, SwarmRepository};
use crate::domain::swarm::value_objects::SwarmStatus;
use crate::domain::swarm::{AgentSlot, LogEntry, Project, Swarm, SwarmOutput};

const SWARM_COLUMNS: &str = "id, owner_id, name, description, status, project, agents, output, \
                             logs, version, created_at, updated_at";

/// PostgreSQL implementation of SwarmRepository
///
/// A swarm is one row; project, agents, output and logs are JSONB columns
/// so every save replaces the whole document in a single statement.
pub struct PostgresSwarmRepository {
    pool: PgPool,
}

impl PostgresSwarmRepository {
    /// Creates a new PostgresSwarmRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(context: &str) -> impl Fn(sqlx::Error) -> RepositoryError + '_ {
    move |e| RepositoryError::Backend(format!("{}: {}", context, e))
}

fn swarm_from_row(row: &PgRow) -> Result<Swarm, RepositoryError> {
    let decode = backend("Failed to decode swarm");

    let status: String = row.try_get("status").map_err(&decode)?;
    let status = status.parse::<SwarmStatus>().map_err(RepositoryError::Backend)?;
    let Json(project): Json<Project> = row.try_get("project").map_err(&decode)?;
    let Json(agents): Json<Vec<AgentSlot>> = row.try_get("agents").map_err(&decode)?;
    let Json(output): Json<SwarmOutput> = row.try_get("output").map_err(&decode)?;
    let Json(logs): Json<Vec<LogEntry>> = row.try_get("logs").map_err(&decode)?;

    Ok(Swarm::from_persistence(
        row.try_get("id").map_err(&decode)?,
        row.try_get("name").map_err(&decode)?,
        row.try_get("description").map_err(&decode)?,
        status,
        row.try_get("owner_id").map_err(&decode)?,
        project,
        agents,
        output,
        logs,
        row.try_get("version").map_err(&decode)?,
        row.try_get("created_at").map_err(&decode)?,
        row.try_get("updated_at").map_err(&decode)?,
    ))
}

#[async_trait]
impl SwarmRepository for PostgresSwarmRepository {
    async fn save(&self, swarm: &Swarm) -> Result<(), RepositoryError> {
        // Version 0 means the swarm has never been stored
        let statement = if swarm.version() == 0 {
            r#"
            INSERT INTO swarms (
                id, owner_id, name, description, status, project, agents,
                output, logs, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10 + 1, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#
        } else {
            r#"
            UPDATE swarms SET
                owner_id = $2,
                name = $3,
                description = $4,
                status = $5,
                project = $6,
                agents = $7,
                output = $8,
                logs = $9,
                version = $10 + 1,
                created_at = $11,
                updated_at = $12
            WHERE id = $1 AND version = $10
            "#
        };

        let result = sqlx::query(statement)
            .bind(swarm.id())
            .bind(swarm.owner_id())
            .bind(swarm.name())
            .bind(swarm.description())
            .bind(swarm.status().as_str())
            .bind(Json(swarm.project()))
            .bind(Json(swarm.agents()))
            .bind(Json(swarm.output()))
            .bind(Json(swarm.logs()))
            .bind(swarm.version())
            .bind(swarm.created_at())
            .bind(swarm.updated_at())
            .execute(&self.pool)
            .await
            .map_err(backend("Failed to save swarm"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(swarm.id()));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Swarm>, RepositoryError> {
        let query = format!("SELECT {} FROM swarms WHERE id = $1", SWARM_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend("Failed to find swarm by id"))?;

        row.as_ref().map(swarm_from_row).transpose()
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Swarm>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM swarms WHERE owner_id = $1 ORDER BY created_at DESC",
            SWARM_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(backend("Failed to find swarms by owner"))?;

        rows.iter().map(swarm_from_row).collect()
    }
}
