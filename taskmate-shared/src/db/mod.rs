/// Database layer for Taskmate
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: embedded migration runner and status
/// - Models are in the `models` module at crate root level

pub mod pool;
pub mod migrations;
