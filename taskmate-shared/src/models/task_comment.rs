/// Task comment model and database operations
///
/// A comment inherits its tenant from the parent task, and every read joins
/// back to that task so both `tenant_id` columns are checked. Deleting a
/// task removes its comments in the same transaction; `ON DELETE CASCADE`
/// backs that up at the schema level.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_comment (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     tenant_id INTEGER NOT NULL REFERENCES tenant(id),
///     task_id INTEGER NOT NULL REFERENCES task(id) ON DELETE CASCADE,
///     created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
///     content TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, Sqlite};

use crate::error::StoreResult;

/// Comment on a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TaskComment {
    pub id: i64,
    pub tenant_id: i64,
    pub task_id: i64,
    pub created: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub tenant_id: i64,
    pub task_id: i64,
    pub created: DateTime<Utc>,
    pub content: String,
}

const COMMENT_COLUMNS: &str = "c.id, c.tenant_id, c.task_id, c.created, c.content";

impl TaskComment {
    pub(crate) async fn create<'e, E>(executor: E, data: NewComment) -> StoreResult<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let comment = sqlx::query_as::<_, TaskComment>(
            r#"
            INSERT INTO task_comment (tenant_id, task_id, created, content)
            VALUES (?, ?, ?, ?)
            RETURNING id, tenant_id, task_id, created, content
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.task_id)
        .bind(data.created)
        .bind(&data.content)
        .fetch_one(executor)
        .await?;

        Ok(comment)
    }

    /// Comments on one task, in insertion order
    pub(crate) async fn list_for_task<'e, E>(
        executor: E,
        task_id: i64,
        tenant_id: i64,
    ) -> StoreResult<Vec<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM task_comment c
            JOIN task t ON t.id = c.task_id
            WHERE c.task_id = ? AND c.tenant_id = ? AND t.tenant_id = ?
            ORDER BY c.task_id ASC, c.id ASC
            "#
        );

        let comments = sqlx::query_as::<_, TaskComment>(&sql)
            .bind(task_id)
            .bind(tenant_id)
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(comments)
    }

    /// Comments on an author's tasks, grouped by task
    ///
    /// `done` selects comments on DONE tasks; otherwise comments on open
    /// (ACTIVE or OVERDUE) tasks.
    pub(crate) async fn list_for_author<'e, E>(
        executor: E,
        tenant_id: i64,
        author_id: i64,
        done: bool,
    ) -> StoreResult<Vec<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let status_predicate = if done {
            "t.status = 'DONE'"
        } else {
            "t.status != 'DONE'"
        };

        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM task_comment c
            JOIN task t ON t.id = c.task_id
            WHERE c.tenant_id = ? AND t.tenant_id = ? AND t.author_id = ?
              AND {status_predicate}
            ORDER BY c.task_id ASC, c.id ASC
            "#
        );

        let comments = sqlx::query_as::<_, TaskComment>(&sql)
            .bind(tenant_id)
            .bind(tenant_id)
            .bind(author_id)
            .fetch_all(executor)
            .await?;

        Ok(comments)
    }

    /// Finds a comment only if it hangs off the given task
    pub(crate) async fn find_on_task<'e, E>(
        executor: E,
        id: i64,
        task_id: i64,
        tenant_id: i64,
    ) -> StoreResult<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM task_comment c
            WHERE c.id = ? AND c.task_id = ? AND c.tenant_id = ?
            "#
        );

        let comment = sqlx::query_as::<_, TaskComment>(&sql)
            .bind(id)
            .bind(task_id)
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(comment)
    }

    pub(crate) async fn delete<'e, E>(
        executor: E,
        id: i64,
        task_id: i64,
        tenant_id: i64,
    ) -> StoreResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("DELETE FROM task_comment WHERE id = ? AND task_id = ? AND tenant_id = ?")
                .bind(id)
                .bind(task_id)
                .bind(tenant_id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
