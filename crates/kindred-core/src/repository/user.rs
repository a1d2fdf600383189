//! UserRepository trait definition.

use kindred_types::error::RepositoryError;
use kindred_types::identity::{NewUser, User};

/// Repository trait for user rows.
///
/// Implementations live in kindred-infra. Uses native async fn in traits
/// (RPITIT, Rust 2024 edition).
pub trait UserRepository: Send + Sync {
    /// Create a user, assigning its id. A duplicate username surfaces as
    /// `RepositoryError::Conflict`.
    fn create(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by id.
    fn get(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by exact username.
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
