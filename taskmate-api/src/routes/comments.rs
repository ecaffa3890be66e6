/// Comment endpoints
///
/// - `POST   /v1/tasks/:id/comments` - Comment on one of the caller's tasks
/// - `DELETE /v1/tasks/:id/comments/:comment_id` - Remove a comment from one of the caller's tasks

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use taskmate_shared::{models::task_comment::TaskComment, scope::TenantContext};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: TaskComment,

    pub created_local: DateTime<FixedOffset>,
}

impl CommentView {
    pub fn new(comment: TaskComment, ctx: &TenantContext) -> Self {
        let created_local = ctx.to_tenant_local(comment.created);
        Self {
            comment,
            created_local,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "Comment is required."))]
    pub content: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    req.validate()?;

    let comment = state
        .scoped(ctx.clone())
        .add_comment(task_id, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(CommentView::new(comment, &ctx))))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path((task_id, comment_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state.scoped(ctx).delete_comment(task_id, comment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
