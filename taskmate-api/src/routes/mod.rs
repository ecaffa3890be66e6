/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `timezones`: Supported timezone catalogue
/// - `auth`: Registration and login
/// - `tasks`: Task boards and task lifecycle
/// - `comments`: Comments on a task
/// - `settings`: Tenant settings

pub mod auth;
pub mod comments;
pub mod health;
pub mod settings;
pub mod tasks;
pub mod timezones;
