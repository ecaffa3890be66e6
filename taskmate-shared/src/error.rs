/// Error taxonomy for the data layer
///
/// Every store and façade operation returns [`StoreResult`]. The variants map
/// one-to-one onto the failure classes the HTTP layer distinguishes:
///
/// | Variant              | Meaning                                                 |
/// |----------------------|---------------------------------------------------------|
/// | `NotFound`           | entity absent within the caller's tenant scope          |
/// | `Forbidden`          | entity exists but the caller is not its author          |
/// | `TenantMismatch`     | cross-tenant write attempt (integrity violation)        |
/// | `Validation`         | missing or malformed input                              |
/// | `Conflict`           | uniqueness violation (username, tenant name)            |
/// | `InvalidCredentials` | login failed; never says which half was wrong           |
///
/// `TenantMismatch` is not a user error. It means a scoped lookup returned a
/// row from another tenant, which should be impossible; callers log it at
/// error level and hide the details.

use crate::auth::password::PasswordError;

/// Result type for data layer operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Kind of entity referenced by [`StoreError::NotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Tenant,
    User,
    Task,
    Comment,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Tenant => "tenant",
            Entity::User => "user",
            Entity::Task => "task",
            Entity::Comment => "comment",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified data layer error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Entity does not exist for the given tenant scope
    #[error("{entity} id {id} doesn't exist")]
    NotFound { entity: Entity, id: i64 },

    /// Entity exists but belongs to another author
    #[error("not the author of {entity} {id}")]
    Forbidden { entity: Entity, id: i64 },

    /// A write reached a row owned by a different tenant
    #[error("tenant mismatch on {entity} {id}: caller tenant {caller_tenant}, row tenant {row_tenant}")]
    TenantMismatch {
        entity: Entity,
        id: i64,
        caller_tenant: i64,
        row_tenant: i64,
    },

    /// Missing or invalid required field
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// Authentication failed
    #[error("Incorrect username or password.")]
    InvalidCredentials,

    /// Password hashing failure
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Maps a unique-constraint violation to [`StoreError::Conflict`]
    ///
    /// Any other database error is passed through unchanged.
    pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(message.into())
            }
            _ => StoreError::Database(err),
        }
    }

    /// Whether the error describes a caller mistake rather than a system fault
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. }
                | StoreError::Forbidden { .. }
                | StoreError::Validation { .. }
                | StoreError::Conflict(_)
                | StoreError::InvalidCredentials
        )
    }
}
