/// Tenant-scoped access to tasks and comments
///
/// [`ScopedStore`] is the only public way to read or write tasks and
/// comments. It is built from a [`TenantContext`], the authenticated
/// `(user, tenant)` pair, and every query it issues is filtered by that
/// tenant. Author-only operations also check the context's user.
///
/// Failure order for a single task is fixed:
///
/// 1. no task with that id in the caller's tenant: `NotFound`
/// 2. row came back with another tenant id: `TenantMismatch`
/// 3. caller is not the author (when required): `Forbidden`
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskmate_shared::clock::DefaultClock;
/// use taskmate_shared::scope::{ScopedStore, TenantContext};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = TenantContext::resolve(&pool, 1, 1).await?;
/// let store = ScopedStore::new(pool, ctx, Arc::new(DefaultClock));
///
/// let task = store.create_task("Ship it", Some("2030-01-01"), None).await?;
/// store.add_comment(task.id, "Halfway there").await?;
/// store.mark_done(task.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use crate::clock::{today, SharedClock};
use crate::error::{Entity, StoreError, StoreResult};
use crate::lifecycle::{initial_status, parse_due_date};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter, TaskStatus};
use crate::models::task_comment::{NewComment, TaskComment};
use crate::models::tenant::Tenant;
use crate::models::user::User;
use crate::timezone::{resolve_offset, to_local, utc_offset};

/// Authenticated caller identity
///
/// Built once per request (or at login) from ids carried in the session,
/// after checking that the user really belongs to the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantContext {
    pub user_id: i64,
    pub tenant_id: i64,
    pub username: String,

    /// Tenant timezone at the time the context was resolved
    pub timezone: String,
}

impl TenantContext {
    /// Reloads the caller from the database
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user does not exist in that
    /// tenant (deleted, or a forged tenant id)
    pub async fn resolve(pool: &SqlitePool, user_id: i64, tenant_id: i64) -> StoreResult<Self> {
        let user = User::find_by_id(pool, user_id, tenant_id).await?;
        let timezone = Tenant::get_timezone(pool, user.tenant_id).await?;

        Ok(Self {
            user_id: user.id,
            tenant_id: user.tenant_id,
            username: user.username,
            timezone,
        })
    }

    /// Whether the stored timezone maps to a known offset
    pub fn has_timezone(&self) -> bool {
        resolve_offset(&self.timezone).is_some()
    }

    /// Tenant offset, UTC if the stored zone is unknown
    pub fn offset(&self) -> FixedOffset {
        resolve_offset(&self.timezone).unwrap_or_else(utc_offset)
    }

    /// Wall-clock time in the tenant's zone, for display
    pub fn to_tenant_local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        to_local(instant, self.offset())
    }
}

/// Task and comment operations bound to one [`TenantContext`]
#[derive(Clone)]
pub struct ScopedStore {
    pool: SqlitePool,
    ctx: TenantContext,
    clock: SharedClock,
}

impl ScopedStore {
    pub fn new(pool: SqlitePool, ctx: TenantContext, clock: SharedClock) -> Self {
        Self { pool, ctx, clock }
    }

    pub fn context(&self) -> &TenantContext {
        &self.ctx
    }

    // Tasks

    /// Creates a task authored by the caller
    ///
    /// Status is OVERDUE if the due date is today (UTC) or earlier.
    ///
    /// # Errors
    ///
    /// `StoreError::Validation` for a blank title or a malformed due date
    pub async fn create_task(
        &self,
        title: &str,
        due_date: Option<&str>,
        body: Option<&str>,
    ) -> StoreResult<Task> {
        let title = required(title, "title", "Title is required.")?;
        let due_date = parse_due_date(due_date)?;
        let status = initial_status(due_date, today(self.clock.as_ref()));

        let task = Task::create(
            &self.pool,
            NewTask {
                tenant_id: self.ctx.tenant_id,
                author_id: self.ctx.user_id,
                created: self.clock.utc(),
                due_date,
                title,
                body: optional(body),
                status,
            },
        )
        .await?;

        info!(
            tenant_id = task.tenant_id,
            user_id = task.author_id,
            task_id = task.id,
            status = %task.status,
            "Task created"
        );
        Ok(task)
    }

    /// ACTIVE and OVERDUE tasks, newest first
    pub async fn list_active(&self) -> StoreResult<Vec<Task>> {
        self.list(TaskFilter::Open).await
    }

    pub async fn list_overdue(&self) -> StoreResult<Vec<Task>> {
        self.list(TaskFilter::Overdue).await
    }

    pub async fn list_done(&self) -> StoreResult<Vec<Task>> {
        self.list(TaskFilter::Done).await
    }

    /// Most recently created open task
    pub async fn latest_active(&self) -> StoreResult<Option<Task>> {
        Ok(self.list_active().await?.into_iter().next())
    }

    /// Most recently created DONE task
    pub async fn latest_done(&self) -> StoreResult<Option<Task>> {
        Ok(self.list_done().await?.into_iter().next())
    }

    async fn list(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        Task::list_for_author(&self.pool, self.ctx.tenant_id, self.ctx.user_id, filter).await
    }

    /// Loads a task from the caller's tenant
    ///
    /// With `require_author`, a task written by someone else in the same
    /// tenant is `Forbidden`.
    pub async fn get_task(&self, task_id: i64, require_author: bool) -> StoreResult<Task> {
        let task = Task::find_in_tenant(&self.pool, task_id, self.ctx.tenant_id)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Task, task_id))?;

        self.ensure_same_tenant(Entity::Task, task.id, task.tenant_id)?;

        if require_author {
            self.ensure_author(&task)?;
        }

        Ok(task)
    }

    /// Like [`get_task`](Self::get_task) with the author check, but only
    /// DONE tasks count as found
    ///
    /// Status is checked before authorship, so an open task is `NotFound`
    /// whoever wrote it.
    pub async fn get_done_task(&self, task_id: i64) -> StoreResult<Task> {
        let task = self.get_task(task_id, false).await?;
        if task.status != TaskStatus::Done {
            return Err(StoreError::not_found(Entity::Task, task_id));
        }
        self.ensure_author(&task)?;
        Ok(task)
    }

    fn ensure_author(&self, task: &Task) -> StoreResult<()> {
        if task.author_id == self.ctx.user_id {
            return Ok(());
        }

        debug!(
            tenant_id = self.ctx.tenant_id,
            user_id = self.ctx.user_id,
            task_id = task.id,
            "Caller is not the task author"
        );
        Err(StoreError::Forbidden {
            entity: Entity::Task,
            id: task.id,
        })
    }

    /// Replaces title and due date, and the body when one is given
    ///
    /// Status is recomputed from the new due date (ACTIVE without one), so
    /// editing a DONE task reopens it.
    pub async fn update_task(
        &self,
        task_id: i64,
        title: &str,
        due_date: Option<&str>,
        body: Option<&str>,
    ) -> StoreResult<Task> {
        let task = self.get_task(task_id, true).await?;

        let title = required(title, "title", "Title is required.")?;
        let due_date = parse_due_date(due_date)?;
        let status = initial_status(due_date, today(self.clock.as_ref()));

        let updated = Task::update(
            &self.pool,
            task.id,
            self.ctx.tenant_id,
            TaskChanges {
                title,
                due_date,
                body: optional(body),
                status,
            },
        )
        .await?
        .ok_or_else(|| StoreError::not_found(Entity::Task, task_id))?;

        info!(
            tenant_id = updated.tenant_id,
            task_id = updated.id,
            status = %updated.status,
            "Task updated"
        );
        Ok(updated)
    }

    /// Marks a task DONE regardless of its current status
    pub async fn mark_done(&self, task_id: i64) -> StoreResult<Task> {
        let task = self.get_task(task_id, true).await?;

        let done = Task::set_status(&self.pool, task.id, self.ctx.tenant_id, TaskStatus::Done)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Task, task_id))?;

        info!(tenant_id = done.tenant_id, task_id = done.id, "Task marked done");
        Ok(done)
    }

    /// Deletes a task in any status, together with its comments
    pub async fn delete_task(&self, task_id: i64) -> StoreResult<()> {
        let task = self.get_task(task_id, true).await?;

        let mut tx = self.pool.begin().await?;
        let removed = Task::delete(&mut *tx, task.id, self.ctx.tenant_id).await?;
        tx.commit().await?;

        match removed {
            Some(comments) => {
                info!(
                    tenant_id = self.ctx.tenant_id,
                    task_id,
                    comments_removed = comments,
                    "Task deleted"
                );
                Ok(())
            }
            None => Err(StoreError::not_found(Entity::Task, task_id)),
        }
    }

    // Comments

    /// Adds a comment to one of the caller's tasks
    ///
    /// The comment takes its tenant from the parent task.
    pub async fn add_comment(&self, task_id: i64, content: &str) -> StoreResult<TaskComment> {
        let content = required(content, "content", "Comment is required.")?;
        let task = self.get_task(task_id, true).await?;

        let comment = TaskComment::create(
            &self.pool,
            NewComment {
                tenant_id: task.tenant_id,
                task_id: task.id,
                created: self.clock.utc(),
                content,
            },
        )
        .await?;

        info!(
            tenant_id = comment.tenant_id,
            task_id = comment.task_id,
            comment_id = comment.id,
            "Comment added"
        );
        Ok(comment)
    }

    /// Comments on one task in the caller's tenant, oldest first
    pub async fn list_comments(&self, task_id: i64) -> StoreResult<Vec<TaskComment>> {
        TaskComment::list_for_task(&self.pool, task_id, self.ctx.tenant_id).await
    }

    /// Comments on the caller's ACTIVE and OVERDUE tasks
    pub async fn list_open_comments(&self) -> StoreResult<Vec<TaskComment>> {
        TaskComment::list_for_author(&self.pool, self.ctx.tenant_id, self.ctx.user_id, false).await
    }

    /// Comments on the caller's DONE tasks
    pub async fn list_done_comments(&self) -> StoreResult<Vec<TaskComment>> {
        TaskComment::list_for_author(&self.pool, self.ctx.tenant_id, self.ctx.user_id, true).await
    }

    /// Deletes one comment from one of the caller's tasks
    ///
    /// The task is checked first (`NotFound` task, `Forbidden`), then the
    /// comment must exist on that task (`NotFound` comment). A comment id
    /// that belongs to another task counts as not found.
    pub async fn delete_comment(&self, task_id: i64, comment_id: i64) -> StoreResult<()> {
        let task = self.get_task(task_id, true).await?;

        let comment = TaskComment::find_on_task(&self.pool, comment_id, task.id, self.ctx.tenant_id)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Comment, comment_id))?;

        self.ensure_same_tenant(Entity::Comment, comment.id, comment.tenant_id)?;

        if !TaskComment::delete(&self.pool, comment.id, task.id, self.ctx.tenant_id).await? {
            return Err(StoreError::not_found(Entity::Comment, comment_id));
        }

        info!(
            tenant_id = self.ctx.tenant_id,
            task_id,
            comment_id,
            "Comment deleted"
        );
        Ok(())
    }

    // Settings

    pub async fn get_timezone(&self) -> StoreResult<String> {
        Tenant::get_timezone(&self.pool, self.ctx.tenant_id).await
    }

    /// Changes the tenant timezone and the context's copy of it
    pub async fn set_timezone(&mut self, timezone: &str) -> StoreResult<()> {
        Tenant::set_timezone(&self.pool, self.ctx.tenant_id, timezone).await?;
        self.ctx.timezone = timezone.to_string();
        Ok(())
    }

    fn ensure_same_tenant(&self, entity: Entity, id: i64, row_tenant: i64) -> StoreResult<()> {
        if row_tenant == self.ctx.tenant_id {
            return Ok(());
        }

        error!(
            entity = %entity,
            id,
            caller_tenant = self.ctx.tenant_id,
            row_tenant,
            "Scoped lookup returned a row from another tenant"
        );
        Err(StoreError::TenantMismatch {
            entity,
            id,
            caller_tenant: self.ctx.tenant_id,
            row_tenant,
        })
    }
}

fn required(value: &str, field: &'static str, message: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(field, message));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
