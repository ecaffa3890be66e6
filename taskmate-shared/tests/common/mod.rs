//! Common test utilities for the data layer integration tests
//!
//! Each test gets its own private in-memory database with migrations
//! applied, a [`FixedClock`] pinned to 2024-06-15 12:00 UTC, and helpers to
//! create tenants and members without paying for password hashing.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use taskmate_shared::clock::FixedClock;
use taskmate_shared::db::migrations::run_migrations;
use taskmate_shared::db::pool::{create_pool, DatabaseConfig};
use taskmate_shared::models::tenant::{CreateTenant, Tenant};
use taskmate_shared::models::user::{CreateUser, User};
use taskmate_shared::scope::{ScopedStore, TenantContext};

/// Instant the test clock starts at
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Test context: one database, one clock
pub struct TestContext {
    pub db: SqlitePool,
    pub clock: FixedClock,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let db = create_pool(DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        Ok(Self {
            db,
            clock: FixedClock::new(start_instant()),
        })
    }

    /// Creates a tenant holding a single member named `username`
    pub async fn tenant_with_member(
        &self,
        username: &str,
        timezone: &str,
    ) -> anyhow::Result<TenantContext> {
        let tenant = Tenant::create(
            &self.db,
            CreateTenant {
                name: format!("{username}_trial"),
                timezone: Some(timezone.to_string()),
            },
        )
        .await?;

        self.member(tenant.id, username).await
    }

    /// Adds another member to an existing tenant
    pub async fn member(&self, tenant_id: i64, username: &str) -> anyhow::Result<TenantContext> {
        let user = User::create(
            &self.db,
            CreateUser {
                tenant_id,
                username: username.to_string(),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await?;

        Ok(TenantContext::resolve(&self.db, user.id, tenant_id).await?)
    }

    pub fn store(&self, ctx: &TenantContext) -> ScopedStore {
        ScopedStore::new(self.db.clone(), ctx.clone(), Arc::new(self.clock.clone()))
    }

    /// Number of comment rows attached to a task, bypassing all scoping
    pub async fn raw_comment_count(&self, task_id: i64) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM task_comment WHERE task_id = ?")
            .bind(task_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
