/// User model and database operations
///
/// Every user belongs to exactly one tenant. Usernames are unique across the
/// whole system, not per tenant, because login only takes a username.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE "user" (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     tenant_id INTEGER NOT NULL REFERENCES tenant(id),
///     username TEXT NOT NULL UNIQUE,
///     password TEXT NOT NULL
/// );
/// ```
///
/// `password` holds an Argon2id PHC string, never the plaintext.

use serde::Serialize;
use sqlx::{Executor, Sqlite};
use tracing::{debug, error, info, warn};

use crate::auth::password::verify_password;
use crate::error::{Entity, StoreError, StoreResult};

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub tenant_id: i64,
    pub username: String,

    /// Argon2id hash
    #[serde(skip_serializing)]
    pub password: String,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub tenant_id: i64,
    pub username: String,
    pub password_hash: String,
}

impl User {
    /// Inserts a user into an existing tenant
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username is taken in any tenant
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> StoreResult<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO "user" (tenant_id, username, password)
            VALUES (?, ?, ?)
            RETURNING id, tenant_id, username, password
            "#,
        )
        .bind(data.tenant_id)
        .bind(&data.username)
        .bind(&data.password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            StoreError::conflict_on_unique(
                e,
                format!("User {} is already registered.", data.username),
            )
        })?;

        info!(user_id = user.id, tenant_id = user.tenant_id, "User created");
        Ok(user)
    }

    pub async fn find_by_username<'e, E>(executor: E, username: &str) -> StoreResult<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, tenant_id, username, password FROM "user" WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Loads a user, scoped by both id and tenant
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` unless a user with this id exists in
    /// this tenant
    pub async fn find_by_id<'e, E>(executor: E, id: i64, tenant_id: i64) -> StoreResult<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, username, password
            FROM "user"
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        user.ok_or_else(|| StoreError::not_found(Entity::User, id))
    }

    /// Checks a username/password pair
    ///
    /// An unknown username, a wrong password, and a corrupt stored hash all
    /// come back as `StoreError::InvalidCredentials`; only the log tells
    /// them apart.
    pub async fn authenticate<'e, E>(executor: E, username: &str, password: &str) -> StoreResult<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let Some(user) = Self::find_by_username(executor, username).await? else {
            warn!(username, "Login failed: unknown username");
            return Err(StoreError::InvalidCredentials);
        };

        match verify_password(password, &user.password) {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = user.id, "Login failed: wrong password");
                return Err(StoreError::InvalidCredentials);
            }
            Err(e) => {
                error!(user_id = user.id, error = %e, "Login failed: stored password hash is unusable");
                return Err(StoreError::InvalidCredentials);
            }
        }

        debug!(user_id = user.id, tenant_id = user.tenant_id, "Credentials accepted");
        Ok(user)
    }
}
