//! PersonaService: resolution and custom persona lifecycle.
//!
//! Resolution turns a `PersonaRef` into a typed [`Persona`] value object with
//! the `#USERNAME` placeholder already substituted. Custom persona management
//! enforces the per-owner active limit and case-insensitive active-name
//! uniqueness, with soft deletion.

use tracing::info;

use kindred_types::error::PersonaError;
use kindred_types::persona::{
    CreatePersonaRequest, CustomPersona, Persona, PersonaRef, UpdatePersonaRequest,
    USERNAME_PLACEHOLDER,
};

use crate::repository::persona::PersonaRepository;

use super::registry;

/// Maximum active custom personas per owner.
pub const MAX_ACTIVE_PERSONAS: usize = 10;

/// Resolves personas and manages custom persona rows.
///
/// Generic over `PersonaRepository` so tests can substitute an in-memory
/// implementation.
pub struct PersonaService<P: PersonaRepository> {
    repo: P,
}

impl<P: PersonaRepository> PersonaService<P> {
    /// Create a new persona service over the given repository.
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    /// Resolve a persona reference for a user.
    ///
    /// Built-ins resolve against the static registry; custom personas must
    /// exist, belong to `owner_id`, and be active. The returned system prompt
    /// has `#USERNAME` replaced with the caller's username.
    pub async fn resolve(
        &self,
        persona: &PersonaRef,
        owner_id: i64,
        username: &str,
    ) -> Result<Persona, PersonaError> {
        let resolved = match persona {
            PersonaRef::BuiltIn(name) => registry::find(name).ok_or(PersonaError::NotFound)?,
            PersonaRef::Custom(id) => {
                let row = self
                    .repo
                    .get(*id, owner_id)
                    .await?
                    .filter(|p| p.is_active)
                    .ok_or(PersonaError::NotFound)?;
                Persona {
                    name: row.name,
                    system_prompt: row.system_prompt,
                    examples: row.examples,
                    description: row.description,
                    avatar_url: row.avatar_url,
                }
            }
        };

        Ok(Persona {
            system_prompt: resolved.system_prompt.replace(USERNAME_PLACEHOLDER, username),
            ..resolved
        })
    }

    /// Create a custom persona for an owner.
    ///
    /// Fails with `LimitReached` past the per-owner cap and `NameConflict`
    /// when an active persona with the same name (case-insensitive) exists.
    pub async fn create(
        &self,
        owner_id: i64,
        request: CreatePersonaRequest,
    ) -> Result<CustomPersona, PersonaError> {
        if request.name.trim().is_empty() {
            return Err(PersonaError::InvalidDefinition(
                "persona name must not be empty".to_string(),
            ));
        }
        if request.system_prompt.trim().is_empty() {
            return Err(PersonaError::InvalidDefinition(
                "system prompt must not be empty".to_string(),
            ));
        }

        if self.repo.count_active(owner_id).await? as usize >= MAX_ACTIVE_PERSONAS {
            return Err(PersonaError::LimitReached(MAX_ACTIVE_PERSONAS));
        }

        if let Some(existing) = self.repo.find_active_by_name(owner_id, &request.name).await? {
            return Err(PersonaError::NameConflict(existing.name));
        }

        let created = self.repo.create(owner_id, &request).await?;
        info!(persona_id = created.id, owner_id, name = %created.name, "custom persona created");
        Ok(created)
    }

    /// List an owner's custom personas, newest first.
    pub async fn list(
        &self,
        owner_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<CustomPersona>, PersonaError> {
        Ok(self.repo.list(owner_id, include_inactive).await?)
    }

    /// Get one custom persona, scoped to its owner.
    pub async fn get(&self, id: i64, owner_id: i64) -> Result<CustomPersona, PersonaError> {
        self.repo.get(id, owner_id).await?.ok_or(PersonaError::NotFound)
    }

    /// Update a custom persona. Renames re-check the active-name conflict.
    pub async fn update(
        &self,
        id: i64,
        owner_id: i64,
        request: UpdatePersonaRequest,
    ) -> Result<CustomPersona, PersonaError> {
        let mut persona = self.get(id, owner_id).await?;

        if let Some(ref new_name) = request.name {
            if !new_name.eq_ignore_ascii_case(&persona.name) {
                if let Some(existing) =
                    self.repo.find_active_by_name(owner_id, new_name).await?
                {
                    if existing.id != id {
                        return Err(PersonaError::NameConflict(existing.name));
                    }
                }
            }
            persona.name = new_name.clone();
        }
        if let Some(system_prompt) = request.system_prompt {
            persona.system_prompt = system_prompt;
        }
        if let Some(examples) = request.examples {
            persona.examples = examples;
        }
        if request.description.is_some() {
            persona.description = request.description;
        }
        if request.avatar_url.is_some() {
            persona.avatar_url = request.avatar_url;
        }
        persona.updated_at = chrono::Utc::now();

        self.repo.update(&persona).await?;
        Ok(persona)
    }

    /// Soft-delete a custom persona (sets `is_active = false`).
    pub async fn deactivate(&self, id: i64, owner_id: i64) -> Result<CustomPersona, PersonaError> {
        let persona = self.get(id, owner_id).await?;
        self.repo.set_active(id, owner_id, false).await?;
        info!(persona_id = id, owner_id, "custom persona deactivated");
        Ok(CustomPersona {
            is_active: false,
            ..persona
        })
    }

    /// Reactivate a soft-deleted persona, re-checking name and limit rules.
    pub async fn reactivate(&self, id: i64, owner_id: i64) -> Result<CustomPersona, PersonaError> {
        let persona = self.get(id, owner_id).await?;
        if persona.is_active {
            return Err(PersonaError::AlreadyActive);
        }

        if self.repo.count_active(owner_id).await? as usize >= MAX_ACTIVE_PERSONAS {
            return Err(PersonaError::LimitReached(MAX_ACTIVE_PERSONAS));
        }
        if let Some(existing) = self.repo.find_active_by_name(owner_id, &persona.name).await? {
            if existing.id != id {
                return Err(PersonaError::NameConflict(existing.name));
            }
        }

        self.repo.set_active(id, owner_id, true).await?;
        Ok(CustomPersona {
            is_active: true,
            ..persona
        })
    }
}
