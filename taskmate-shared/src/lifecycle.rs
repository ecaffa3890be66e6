/// Task lifecycle rules and the overdue sweep
///
/// ```text
/// ACTIVE --(due_date <= today)--> OVERDUE --(mark done)--> DONE
/// ```
///
/// Two places decide ACTIVE vs OVERDUE:
///
/// - [`initial_status`] when a task is created or edited, against the UTC
///   calendar date.
/// - [`refresh_overdue_status`], the sweep, which walks every tenant and
///   moves every due task that is not already OVERDUE (DONE ones included)
///   to OVERDUE, using that tenant's local date.
///
/// The sweep never fails its caller. It only ever sets OVERDUE, so running
/// it twice in a row, or concurrently, changes nothing further.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::task::{Task, TaskStatus};
use crate::models::tenant::Tenant;
use crate::timezone::{local_date, resolve_offset, utc_offset};

/// Accepted due date format
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Status for a task with the given due date, as of `today`
///
/// A task due today is already overdue. Without a due date it stays ACTIVE.
pub fn initial_status(due_date: Option<NaiveDate>, today: NaiveDate) -> TaskStatus {
    match due_date {
        Some(due) if due <= today => TaskStatus::Overdue,
        _ => TaskStatus::Active,
    }
}

/// Parses user input for a due date
///
/// Missing or blank input means "no due date".
///
/// # Errors
///
/// Returns `StoreError::Validation` if the input is not `YYYY-MM-DD`
pub fn parse_due_date(raw: Option<&str>) -> StoreResult<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| {
            StoreError::validation("due_date", "Due date must be a date in YYYY-MM-DD format.")
        })
}

/// Outcome of one sweep
///
/// The totals cover every tenant and are meant for logs. Anything shown to
/// a caller should go through [`SweepReport::transitioned_in`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tenants_scanned: usize,
    pub tasks_transitioned: usize,
    pub tenants_failed: usize,

    /// Transitions per tenant id; tenants with none are absent
    pub transitioned_by_tenant: BTreeMap<i64, usize>,
}

impl SweepReport {
    /// Tasks moved to OVERDUE in one tenant
    pub fn transitioned_in(&self, tenant_id: i64) -> usize {
        self.transitioned_by_tenant.get(&tenant_id).copied().unwrap_or(0)
    }
}

/// Moves every due task that is not yet OVERDUE to OVERDUE, across all
/// tenants
///
/// Each tenant is processed in its own transaction against its own local
/// date (`now` shifted by the tenant's offset). If any of a tenant's updates
/// fails, that tenant is rolled back, logged, and counted in
/// `tenants_failed`; the sweep moves on to the next tenant.
pub async fn refresh_overdue_status(pool: &SqlitePool, now: DateTime<Utc>) -> SweepReport {
    let mut report = SweepReport::default();

    let tenants = match Tenant::list_all(pool).await {
        Ok(tenants) => tenants,
        Err(e) => {
            error!(error = %e, "Overdue sweep could not list tenants");
            return report;
        }
    };

    for tenant in &tenants {
        report.tenants_scanned += 1;

        match sweep_tenant(pool, tenant, now).await {
            Ok(0) => {}
            Ok(count) => {
                report.tasks_transitioned += count;
                report.transitioned_by_tenant.insert(tenant.id, count);
            }
            Err(e) => {
                report.tenants_failed += 1;
                error!(tenant_id = tenant.id, error = %e, "Overdue sweep failed for tenant");
            }
        }
    }

    debug!(
        tenants_scanned = report.tenants_scanned,
        tasks_transitioned = report.tasks_transitioned,
        tenants_failed = report.tenants_failed,
        "Overdue sweep finished"
    );
    report
}

async fn sweep_tenant(pool: &SqlitePool, tenant: &Tenant, now: DateTime<Utc>) -> StoreResult<usize> {
    let offset = match resolve_offset(&tenant.timezone) {
        Some(offset) => offset,
        None => {
            warn!(
                tenant_id = tenant.id,
                timezone = %tenant.timezone,
                "Unknown tenant timezone, sweeping with UTC"
            );
            utc_offset()
        }
    };
    let today = local_date(now, offset);

    let mut tx = pool.begin().await?;
    match mark_due_tasks(&mut *tx, tenant.id, today).await {
        Ok(transitioned) => {
            tx.commit().await?;
            Ok(transitioned)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

/// Flags the tenant's due tasks inside its sweep transaction
///
/// The first task that fails to update stops the tenant, so either all of
/// its transitions land or none do.
async fn mark_due_tasks(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    today: NaiveDate,
) -> StoreResult<usize> {
    let due = Task::newly_due_ids(&mut *conn, tenant_id, today).await?;

    let mut transitioned = 0;
    for task_id in due {
        match Task::mark_overdue(&mut *conn, task_id, tenant_id).await {
            Ok(true) => {
                transitioned += 1;
                info!(tenant_id, task_id, %today, "Task is now overdue");
            }
            Ok(false) => {}
            Err(e) => {
                warn!(tenant_id, task_id, error = %e, "Task failed in overdue sweep");
                return Err(e);
            }
        }
    }

    Ok(transitioned)
}
