use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::prompt::{PromptBody, PromptGroup, PromptSummary};
use crate::domain::repositories::{PromptRepository, RepositoryError};

/// PostgreSQL implementation of PromptRepository
///
/// Group creation relies on the `(category, name)` unique constraint, so
/// concurrent binders of the same role all end up with one group.
pub struct PostgresPromptRepository {
    pool: PgPool,
}

impl PostgresPromptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(context: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |e| RepositoryError::Backend(format!("{}: {}", context, e))
}

#[async_trait]
impl PromptRepository for PostgresPromptRepository {
    async fn find_or_create_group(
        &self,
        category: &str,
        name: &str,
        author_id: Uuid,
        default_body: PromptBody,
    ) -> Result<Uuid, RepositoryError> {
        let (group, prompt) = PromptGroup::with_default_prompt(category, name, author_id, default_body);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(backend("Failed to begin prompt transaction"))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO prompt_groups (
                id, name, category, prompts, author_id, author_name, production_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (category, name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.category)
        .bind(Json(&group.prompts))
        .bind(group.author_id)
        .bind(&group.author_name)
        .bind(group.production_id)
        .bind(group.created_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend("Failed to insert prompt group"))?;

        let id = match inserted {
            Some(_) => {
                sqlx::query(
                    r#"
                    INSERT INTO prompts (id, group_id, text, author_id, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(prompt.id)
                .bind(prompt.group_id)
                .bind(&prompt.text)
                .bind(prompt.author_id)
                .bind(prompt.created_at)
                .execute(&mut *tx)
                .await
                .map_err(backend("Failed to insert default prompt"))?;
                group.id
            }
            None => sqlx::query("SELECT id FROM prompt_groups WHERE category = $1 AND name = $2")
                .bind(category)
                .bind(name)
                .fetch_one(&mut *tx)
                .await
                .map_err(backend("Failed to find prompt group"))?
                .try_get("id")
                .map_err(backend("Failed to decode prompt group"))?,
        };

        tx.commit()
            .await
            .map_err(backend("Failed to commit prompt transaction"))?;
        Ok(id)
    }

    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<PromptSummary>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, name, category
            FROM prompt_groups
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend("Failed to load prompt summaries"))?;

        rows.iter()
            .map(|row| {
                Ok(PromptSummary {
                    id: row.try_get("id").map_err(backend("Failed to decode summary"))?,
                    name: row.try_get("name").map_err(backend("Failed to decode summary"))?,
                    category: row
                        .try_get("category")
                        .map_err(backend("Failed to decode summary"))?,
                })
            })
            .collect()
    }
}
