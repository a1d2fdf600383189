//! PersonaRepository trait definition.
//!
//! Custom personas are user-owned rows with soft deletion. Active-name
//! uniqueness and the per-owner limit are enforced by `PersonaService`, not
//! here; the repository only provides the primitives.

use kindred_types::error::RepositoryError;
use kindred_types::persona::{CreatePersonaRequest, CustomPersona};

/// Repository trait for custom persona persistence.
///
/// Implementations live in kindred-infra. Uses native async fn in traits
/// (RPITIT, Rust 2024 edition).
pub trait PersonaRepository: Send + Sync {
    /// Insert a new custom persona for an owner, assigning its id.
    fn create(
        &self,
        owner_id: i64,
        request: &CreatePersonaRequest,
    ) -> impl std::future::Future<Output = Result<CustomPersona, RepositoryError>> + Send;

    /// Get a persona by id, scoped to its owner. Returns `None` for other
    /// owners' personas.
    fn get(
        &self,
        id: i64,
        owner_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<CustomPersona>, RepositoryError>> + Send;

    /// List an owner's personas, newest first.
    fn list(
        &self,
        owner_id: i64,
        include_inactive: bool,
    ) -> impl std::future::Future<Output = Result<Vec<CustomPersona>, RepositoryError>> + Send;

    /// Find an owner's active persona by name, case-insensitively.
    fn find_active_by_name(
        &self,
        owner_id: i64,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<CustomPersona>, RepositoryError>> + Send;

    /// Count an owner's active personas.
    fn count_active(
        &self,
        owner_id: i64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Persist field changes to an existing persona.
    fn update(
        &self,
        persona: &CustomPersona,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Flip the active flag (soft delete / reactivate).
    fn set_active(
        &self,
        id: i64,
        owner_id: i64,
        active: bool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
