/// Database models for Taskmate
///
/// # Models
///
/// - `tenant`: organizations, the isolation boundary, with their timezone
/// - `user`: accounts, one tenant each
/// - `task`: tasks and their lifecycle status
/// - `task_comment`: comments attached to a task
///
/// Tenant and user operations are public. Task and comment queries are
/// crate-private; outside this crate they are reached only through
/// [`ScopedStore`](crate::scope::ScopedStore).

pub mod tenant;
pub mod user;
pub mod task;
pub mod task_comment;
