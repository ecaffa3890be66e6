/// Tenant model and database operations
///
/// A tenant is the isolation boundary: every user, task and comment row
/// carries a `tenant_id`, and no query in this crate reads across it.
/// Registration creates exactly one tenant per user, named
/// `"<username>_trial"`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tenant (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     name TEXT NOT NULL UNIQUE,
///     timezone TEXT NOT NULL DEFAULT 'UTC'
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskmate_shared::models::tenant::{CreateTenant, Tenant};
/// use taskmate_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let tenant = Tenant::create(&pool, CreateTenant {
///     name: "alice_trial".to_string(),
///     timezone: None,
/// }).await?;
///
/// Tenant::set_timezone(&pool, tenant.id, "Europe/Paris").await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite};
use tracing::{debug, info};

use crate::error::{Entity, StoreError, StoreResult};
use crate::timezone::{SupportedTimezone, DEFAULT_TIMEZONE};

/// Tenant (organization) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: i64,

    /// Unique display name
    pub name: String,

    /// IANA zone name; `"UTC"` until the tenant picks one from the table
    pub timezone: String,
}

/// Input for creating a new tenant
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub name: String,

    /// Defaults to [`DEFAULT_TIMEZONE`]
    pub timezone: Option<String>,
}

impl Tenant {
    /// Creates a new tenant
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the name is already taken
    pub async fn create<'e, E>(executor: E, data: CreateTenant) -> StoreResult<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let timezone = data
            .timezone
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenant (name, timezone)
            VALUES (?, ?)
            RETURNING id, name, timezone
            "#,
        )
        .bind(&data.name)
        .bind(&timezone)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            StoreError::conflict_on_unique(e, format!("Tenant {} already exists.", data.name))
        })?;

        info!(tenant_id = tenant.id, name = %tenant.name, "Tenant created");
        Ok(tenant)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> StoreResult<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, timezone FROM tenant WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(tenant)
    }

    pub async fn find_by_name<'e, E>(executor: E, name: &str) -> StoreResult<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, timezone FROM tenant WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(tenant)
    }

    /// Lists every tenant, oldest first
    pub async fn list_all<'e, E>(executor: E) -> StoreResult<Vec<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, timezone FROM tenant ORDER BY id ASC",
        )
        .fetch_all(executor)
        .await?;

        Ok(tenants)
    }

    /// Reads the tenant's timezone
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no tenant has this id
    pub async fn get_timezone<'e, E>(executor: E, id: i64) -> StoreResult<String>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let timezone: Option<String> =
            sqlx::query_scalar("SELECT timezone FROM tenant WHERE id = ?")
                .bind(id)
                .fetch_optional(executor)
                .await?;

        timezone.ok_or_else(|| StoreError::not_found(Entity::Tenant, id))
    }

    /// Stores a new timezone for the tenant
    ///
    /// Only names from the supported table are accepted; anything else is
    /// rejected before the row is touched. Setting the current value again
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if the name is not in the table
    /// - `StoreError::NotFound` if no tenant has this id
    pub async fn set_timezone<'e, E>(executor: E, id: i64, timezone: &str) -> StoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let Some(entry) = SupportedTimezone::lookup(timezone) else {
            debug!(tenant_id = id, timezone, "Rejected unsupported timezone");
            return Err(StoreError::validation(
                "timezone",
                format!("{timezone} is not a supported timezone."),
            ));
        };

        let result = sqlx::query("UPDATE tenant SET timezone = ? WHERE id = ?")
            .bind(entry.name)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(Entity::Tenant, id));
        }

        info!(tenant_id = id, timezone = entry.name, "Tenant timezone updated");
        Ok(())
    }
}
