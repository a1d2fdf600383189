//! SQLite custom persona repository implementation.
//!
//! Example turns are stored as a JSON text column; rows are soft-deleted by
//! flipping `is_active`. Name matching is case-insensitive via `LOWER()`.

use chrono::Utc;
use sqlx::Row;

use kindred_core::repository::persona::PersonaRepository;
use kindred_types::error::RepositoryError;
use kindred_types::persona::{CreatePersonaRequest, CustomPersona, ExampleTurn};

use super::message::{format_datetime, map_sqlx_err, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `PersonaRepository`.
pub struct SqlitePersonaRepository {
    pool: DatabasePool,
}

impl SqlitePersonaRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain CustomPersona.
struct PersonaRow {
    id: i64,
    owner_id: i64,
    name: String,
    system_prompt: String,
    examples: String,
    description: Option<String>,
    avatar_url: Option<String>,
    is_active: i64,
    created_at: String,
    updated_at: String,
}

impl PersonaRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            system_prompt: row.try_get("system_prompt")?,
            examples: row.try_get("examples")?,
            description: row.try_get("description")?,
            avatar_url: row.try_get("avatar_url")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_persona(self) -> Result<CustomPersona, RepositoryError> {
        let examples: Vec<ExampleTurn> = serde_json::from_str(&self.examples)
            .map_err(|e| RepositoryError::Query(format!("invalid examples JSON: {e}")))?;

        Ok(CustomPersona {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            system_prompt: self.system_prompt,
            examples,
            description: self.description,
            avatar_url: self.avatar_url,
            is_active: self.is_active != 0,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn examples_json(examples: &[ExampleTurn]) -> Result<String, RepositoryError> {
    serde_json::to_string(examples)
        .map_err(|e| RepositoryError::Query(format!("failed to encode examples: {e}")))
}

impl PersonaRepository for SqlitePersonaRepository {
    async fn create(
        &self,
        owner_id: i64,
        request: &CreatePersonaRequest,
    ) -> Result<CustomPersona, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO personas (owner_id, name, system_prompt, examples, description, avatar_url, is_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)"#,
        )
        .bind(owner_id)
        .bind(&request.name)
        .bind(&request.system_prompt)
        .bind(examples_json(&request.examples)?)
        .bind(&request.description)
        .bind(&request.avatar_url)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_err)?;

        Ok(CustomPersona {
            id: result.last_insert_rowid(),
            owner_id,
            name: request.name.clone(),
            system_prompt: request.system_prompt.clone(),
            examples: request.examples.clone(),
            description: request.description.clone(),
            avatar_url: request.avatar_url.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, id: i64, owner_id: i64) -> Result<Option<CustomPersona>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM personas WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let persona_row = PersonaRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(persona_row.into_persona()?))
            }
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        owner_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<CustomPersona>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM personas WHERE owner_id = ?");
        if !include_inactive {
            sql.push_str(" AND is_active = 1");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut personas = Vec::with_capacity(rows.len());
        for row in &rows {
            let persona_row =
                PersonaRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            personas.push(persona_row.into_persona()?);
        }

        Ok(personas)
    }

    async fn find_active_by_name(
        &self,
        owner_id: i64,
        name: &str,
    ) -> Result<Option<CustomPersona>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM personas WHERE owner_id = ? AND is_active = 1 AND LOWER(name) = LOWER(?)",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let persona_row = PersonaRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(persona_row.into_persona()?))
            }
            None => Ok(None),
        }
    }

    async fn count_active(&self, owner_id: i64) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as cnt FROM personas WHERE owner_id = ? AND is_active = 1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }

    async fn update(&self, persona: &CustomPersona) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE personas
               SET name = ?, system_prompt = ?, examples = ?, description = ?, avatar_url = ?, updated_at = ?
               WHERE id = ? AND owner_id = ?"#,
        )
        .bind(&persona.name)
        .bind(&persona.system_prompt)
        .bind(examples_json(&persona.examples)?)
        .bind(&persona.description)
        .bind(&persona.avatar_url)
        .bind(format_datetime(&persona.updated_at))
        .bind(persona.id)
        .bind(persona.owner_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_active(
        &self,
        id: i64,
        owner_id: i64,
        active: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE personas SET is_active = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(active as i64)
        .bind(format_datetime(&Utc::now()))
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
