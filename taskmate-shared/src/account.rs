/// Registration and login
///
/// Registering creates a private tenant named `"<username>_trial"` and the
/// user inside it, in one transaction. Logging in checks the password,
/// resolves the caller's [`TenantContext`] and, when the tenant's timezone
/// resolves, runs the overdue sweep before handing the context back.

use sqlx::SqlitePool;
use tracing::info;

use crate::auth::password::hash_password;
use crate::clock::Clock;
use crate::error::{StoreError, StoreResult};
use crate::lifecycle::{refresh_overdue_status, SweepReport};
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::user::{CreateUser, User};
use crate::scope::TenantContext;
use crate::timezone::SupportedTimezone;

/// Suffix of the tenant created for each new user
pub const TRIAL_TENANT_SUFFIX: &str = "_trial";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub context: TenantContext,

    /// `None` if the sweep was skipped because the timezone did not resolve
    pub sweep: Option<SweepReport>,
}

impl LoginOutcome {
    /// Tasks the login sweep moved to OVERDUE in the caller's own tenant
    ///
    /// `None` if the sweep was skipped.
    pub fn overdue_in_tenant(&self) -> Option<usize> {
        self.sweep
            .as_ref()
            .map(|report| report.transitioned_in(self.context.tenant_id))
    }
}

/// Creates a user and their tenant
///
/// # Errors
///
/// - `StoreError::Validation` for a blank username or password, or a
///   timezone outside the supported table
/// - `StoreError::Conflict` if the username (or its trial tenant) exists
pub async fn register_account(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    timezone: &str,
) -> StoreResult<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(StoreError::validation("username", "Username is required."));
    }
    if password.is_empty() {
        return Err(StoreError::validation("password", "Password is required."));
    }
    let Some(timezone) = SupportedTimezone::lookup(timezone) else {
        return Err(StoreError::validation(
            "timezone",
            format!("{timezone} is not a supported timezone."),
        ));
    };

    if User::find_by_username(pool, username).await?.is_some() {
        return Err(StoreError::Conflict(format!(
            "User {username} is already registered."
        )));
    }

    let password_hash = hash_password(password)?;

    let mut tx = pool.begin().await?;

    let tenant = Tenant::create(
        &mut *tx,
        CreateTenant {
            name: format!("{username}{TRIAL_TENANT_SUFFIX}"),
            timezone: Some(timezone.name.to_string()),
        },
    )
    .await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            tenant_id: tenant.id,
            username: username.to_string(),
            password_hash,
        },
    )
    .await?;

    tx.commit().await?;

    info!(user_id = user.id, tenant_id = tenant.id, "Account registered");
    Ok(user)
}

/// Authenticates and opens a session
///
/// # Errors
///
/// `StoreError::InvalidCredentials` for an unknown username or a wrong
/// password, without saying which
pub async fn login<C>(
    pool: &SqlitePool,
    clock: &C,
    username: &str,
    password: &str,
) -> StoreResult<LoginOutcome>
where
    C: Clock + Sync + ?Sized,
{
    let user = User::authenticate(pool, username.trim(), password).await?;
    let context = TenantContext::resolve(pool, user.id, user.tenant_id).await?;

    let sweep = if context.has_timezone() {
        Some(refresh_overdue_status(pool, clock.utc()).await)
    } else {
        None
    };

    info!(
        user_id = context.user_id,
        tenant_id = context.tenant_id,
        swept = sweep.is_some(),
        "User logged in"
    );
    Ok(LoginOutcome { context, sweep })
}
