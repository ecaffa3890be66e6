/// Task endpoints
///
/// All handlers run behind the session middleware and act only on the
/// caller's tenant through a [`ScopedStore`](taskmate_shared::scope::ScopedStore).
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - Open board: open and overdue tasks, latest open task, open comments
/// - `POST   /v1/tasks` - Create a task
/// - `GET    /v1/tasks/done` - Done board
/// - `GET    /v1/tasks/done/:id` - One done task with its comments
/// - `GET    /v1/tasks/:id` - One task with its comments
/// - `PUT    /v1/tasks/:id` - Edit a task
/// - `DELETE /v1/tasks/:id` - Delete a task and its comments
/// - `POST   /v1/tasks/:id/done` - Mark a task done

use crate::{app::AppState, error::ApiResult, routes::comments::CommentView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use taskmate_shared::{
    models::{task::Task, task_comment::TaskComment},
    scope::TenantContext,
};
use validator::Validate;

/// Task as returned to clients
///
/// Carries the stored UTC creation instant plus the same instant in the
/// tenant's timezone.
#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,

    pub created_local: DateTime<FixedOffset>,
}

impl TaskView {
    pub fn new(task: Task, ctx: &TenantContext) -> Self {
        let created_local = ctx.to_tenant_local(task.created);
        Self {
            task,
            created_local,
        }
    }
}

fn task_views(tasks: Vec<Task>, ctx: &TenantContext) -> Vec<TaskView> {
    tasks.into_iter().map(|t| TaskView::new(t, ctx)).collect()
}

fn comment_views(comments: Vec<TaskComment>, ctx: &TenantContext) -> Vec<CommentView> {
    comments.into_iter().map(|c| CommentView::new(c, ctx)).collect()
}

/// Open board response
#[derive(Debug, Serialize)]
pub struct TaskBoard {
    /// Every task not yet DONE, overdue ones included
    pub active: Vec<TaskView>,
    pub overdue: Vec<TaskView>,

    /// Most recently created open task
    pub latest: Option<TaskView>,

    /// Comments on every open (ACTIVE or OVERDUE) task
    pub comments: Vec<CommentView>,
}

/// Done board response
#[derive(Debug, Serialize)]
pub struct DoneBoard {
    pub done: Vec<TaskView>,
    pub latest: Option<TaskView>,
    pub comments: Vec<CommentView>,
}

/// Single task with its comments
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: TaskView,

    pub comments: Vec<CommentView>,
}

/// Create / edit request
///
/// `due_date` is `YYYY-MM-DD`; blank or absent means no due date. On edit,
/// a blank or absent `body` keeps the stored body.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    #[validate(length(min = 1, message = "Title is required."))]
    pub title: String,

    pub due_date: Option<String>,

    pub body: Option<String>,
}

/// Open board
pub async fn open_board(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<TaskBoard>> {
    let store = state.scoped(ctx.clone());

    let active = store.list_active().await?;
    let overdue = store.list_overdue().await?;
    let latest = store.latest_active().await?;
    let comments = store.list_open_comments().await?;

    Ok(Json(TaskBoard {
        active: task_views(active, &ctx),
        overdue: task_views(overdue, &ctx),
        latest: latest.map(|t| TaskView::new(t, &ctx)),
        comments: comment_views(comments, &ctx),
    }))
}

/// Done board
pub async fn done_board(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Json<DoneBoard>> {
    let store = state.scoped(ctx.clone());

    let done = store.list_done().await?;
    let latest = store.latest_done().await?;
    let comments = store.list_done_comments().await?;

    Ok(Json(DoneBoard {
        done: task_views(done, &ctx),
        latest: latest.map(|t| TaskView::new(t, &ctx)),
        comments: comment_views(comments, &ctx),
    }))
}

/// Create a task
///
/// # Errors
///
/// - `422 Unprocessable Entity`: blank title or malformed due date
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(req): Json<TaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    req.validate()?;

    let task = state
        .scoped(ctx.clone())
        .create_task(&req.title, req.due_date.as_deref(), req.body.as_deref())
        .await?;

    tracing::info!(task_id = task.id, tenant_id = ctx.tenant_id, "Task created");

    Ok((StatusCode::CREATED, Json(TaskView::new(task, &ctx))))
}

/// One of the caller's tasks, any status
///
/// # Errors
///
/// - `404 Not Found`: no such task in the caller's tenant
/// - `403 Forbidden`: the task belongs to another member of the tenant
pub async fn get_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<TaskDetail>> {
    let store = state.scoped(ctx.clone());

    let task = store.get_task(task_id, true).await?;
    let comments = store.list_comments(task.id).await?;

    Ok(Json(TaskDetail {
        task: TaskView::new(task, &ctx),
        comments: comment_views(comments, &ctx),
    }))
}

/// One of the caller's DONE tasks
pub async fn get_done_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<TaskDetail>> {
    let store = state.scoped(ctx.clone());

    let task = store.get_done_task(task_id).await?;
    let comments = store.list_comments(task.id).await?;

    Ok(Json(TaskDetail {
        task: TaskView::new(task, &ctx),
        comments: comment_views(comments, &ctx),
    }))
}

/// Edit a task
///
/// Status is recomputed from the new due date, so editing a DONE task
/// reopens it.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<i64>,
    Json(req): Json<TaskRequest>,
) -> ApiResult<Json<TaskView>> {
    req.validate()?;

    let task = state
        .scoped(ctx.clone())
        .update_task(task_id, &req.title, req.due_date.as_deref(), req.body.as_deref())
        .await?;

    Ok(Json(TaskView::new(task, &ctx)))
}

/// Mark a task done
pub async fn mark_done(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<TaskView>> {
    let task = state.scoped(ctx.clone()).mark_done(task_id).await?;

    Ok(Json(TaskView::new(task, &ctx)))
}

/// Delete a task together with its comments
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.scoped(ctx).delete_task(task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
