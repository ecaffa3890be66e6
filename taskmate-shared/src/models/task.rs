/// Task model and database operations
///
/// Tasks belong to one author inside one tenant. The queries here always
/// take the tenant id, and the list queries also take the author, but they
/// do not decide who may call them: that is the job of
/// [`ScopedStore`](crate::scope::ScopedStore), the only public path to them.
///
/// # State Machine
///
/// ```text
/// ACTIVE --(due_date <= today)--> OVERDUE --(mark done)--> DONE
/// any state --(delete)--> row removed
/// ```
///
/// Editing a task recomputes ACTIVE/OVERDUE from its due date, which also
/// reopens a DONE task.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     tenant_id INTEGER NOT NULL REFERENCES tenant(id),
///     author_id INTEGER NOT NULL REFERENCES "user"(id),
///     created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
///     due_date DATE,
///     title TEXT NOT NULL,
///     body TEXT,
///     status TEXT NOT NULL DEFAULT 'ACTIVE'
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::error::StoreResult;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Open, not yet due
    Active,

    /// Open, due date reached
    Overdue,

    /// Completed
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "ACTIVE",
            TaskStatus::Overdue => "OVERDUE",
            TaskStatus::Done => "DONE",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Done)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub tenant_id: i64,
    pub author_id: i64,

    /// Creation instant (UTC)
    pub created: DateTime<Utc>,

    /// Calendar date the task is due, if any
    pub due_date: Option<NaiveDate>,

    pub title: String,
    pub body: Option<String>,
    pub status: TaskStatus,
}

/// Which slice of an author's tasks to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    /// Everything not DONE (ACTIVE and OVERDUE)
    Open,
    Overdue,
    Done,
}

impl TaskFilter {
    fn predicate(&self) -> &'static str {
        match self {
            TaskFilter::Open => "t.status != 'DONE'",
            TaskFilter::Overdue => "t.status = 'OVERDUE'",
            TaskFilter::Done => "t.status = 'DONE'",
        }
    }
}

/// Fully resolved values for a new task row
#[derive(Debug, Clone)]
pub struct NewTask {
    pub tenant_id: i64,
    pub author_id: i64,
    pub created: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub title: String,
    pub body: Option<String>,
    pub status: TaskStatus,
}

/// Replacement values for an edit
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: String,
    pub due_date: Option<NaiveDate>,

    /// `None` keeps the stored body
    pub body: Option<String>,
    pub status: TaskStatus,
}

const TASK_COLUMNS: &str = "id, tenant_id, author_id, created, due_date, title, body, status";

impl Task {
    pub(crate) async fn create<'e, E>(executor: E, data: NewTask) -> StoreResult<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            INSERT INTO task (tenant_id, author_id, created, due_date, title, body, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(data.tenant_id)
            .bind(data.author_id)
            .bind(data.created)
            .bind(data.due_date)
            .bind(&data.title)
            .bind(&data.body)
            .bind(data.status)
            .fetch_one(executor)
            .await?;

        Ok(task)
    }

    /// Looks a task up by id within one tenant
    pub(crate) async fn find_in_tenant<'e, E>(
        executor: E,
        id: i64,
        tenant_id: i64,
    ) -> StoreResult<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {TASK_COLUMNS} FROM task WHERE id = ? AND tenant_id = ?");

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(task)
    }

    /// Lists an author's tasks, newest first
    ///
    /// Tenant and author are matched on the task row and again on the
    /// joined user row, so a task whose author moved tenants never leaks.
    pub(crate) async fn list_for_author<'e, E>(
        executor: E,
        tenant_id: i64,
        author_id: i64,
        filter: TaskFilter,
    ) -> StoreResult<Vec<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            SELECT t.id, t.tenant_id, t.author_id, t.created, t.due_date,
                   t.title, t.body, t.status
            FROM task t
            JOIN "user" u ON u.id = t.author_id
            WHERE t.tenant_id = ? AND t.author_id = ?
              AND u.tenant_id = ? AND u.id = ?
              AND {}
            ORDER BY t.created DESC, t.id DESC
            "#,
            filter.predicate()
        );

        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(tenant_id)
            .bind(author_id)
            .bind(tenant_id)
            .bind(author_id)
            .fetch_all(executor)
            .await?;

        Ok(tasks)
    }

    pub(crate) async fn update<'e, E>(
        executor: E,
        id: i64,
        tenant_id: i64,
        changes: TaskChanges,
    ) -> StoreResult<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            UPDATE task
            SET title = ?, due_date = ?, body = COALESCE(?, body), status = ?
            WHERE id = ? AND tenant_id = ?
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(&changes.title)
            .bind(changes.due_date)
            .bind(&changes.body)
            .bind(changes.status)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(task)
    }

    pub(crate) async fn set_status<'e, E>(
        executor: E,
        id: i64,
        tenant_id: i64,
        status: TaskStatus,
    ) -> StoreResult<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "UPDATE task SET status = ? WHERE id = ? AND tenant_id = ? RETURNING {TASK_COLUMNS}"
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(status)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(task)
    }

    /// Deletes a task and its comments
    ///
    /// Run inside a transaction so the two deletes land together. Returns
    /// the number of comments removed, or `None` if the task row was absent.
    pub(crate) async fn delete(
        conn: &mut SqliteConnection,
        id: i64,
        tenant_id: i64,
    ) -> StoreResult<Option<u64>> {
        let comments = sqlx::query("DELETE FROM task_comment WHERE task_id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM task WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok((deleted > 0).then_some(comments))
    }

    /// Ids of tasks in the tenant due on or before `today` that are not
    /// already OVERDUE
    ///
    /// DONE tasks are included: a completed task whose due date has passed
    /// is flagged again.
    pub(crate) async fn newly_due_ids<'e, E>(
        executor: E,
        tenant_id: i64,
        today: NaiveDate,
    ) -> StoreResult<Vec<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM task
            WHERE tenant_id = ? AND status != 'OVERDUE'
              AND due_date IS NOT NULL AND due_date <= ?
            ORDER BY id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }

    /// Moves one task to OVERDUE
    ///
    /// Returns `false` if the task was already OVERDUE or is gone.
    pub(crate) async fn mark_overdue<'e, E>(executor: E, id: i64, tenant_id: i64) -> StoreResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE task SET status = 'OVERDUE' WHERE id = ? AND tenant_id = ? AND status != 'OVERDUE'",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_match_check_constraint() {
        assert_eq!(TaskStatus::Active.as_str(), "ACTIVE");
        assert_eq!(TaskStatus::Overdue.as_str(), "OVERDUE");
        assert_eq!(TaskStatus::Done.as_str(), "DONE");
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&TaskStatus::Overdue).unwrap();
        assert_eq!(json, "\"OVERDUE\"");
    }

    #[test]
    fn test_open_statuses() {
        assert!(TaskStatus::Active.is_open());
        assert!(TaskStatus::Overdue.is_open());
        assert!(!TaskStatus::Done.is_open());
    }
}
