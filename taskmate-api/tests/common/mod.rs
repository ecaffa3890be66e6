//! Common test utilities for API integration tests
//!
//! Every test gets its own in-memory database, a router wired to a
//! [`FixedClock`] pinned to 2024-06-15 12:00 UTC, and helpers to register,
//! log in and send JSON requests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use taskmate_api::app::{build_router, AppState};
use taskmate_api::config::{ApiConfig, Config, DatabaseConfig, SessionConfig};
use taskmate_shared::auth::jwt::{create_token, Claims};
use taskmate_shared::clock::FixedClock;
use taskmate_shared::db::migrations::run_migrations;
use taskmate_shared::db::pool::{self, create_pool};
use taskmate_shared::models::user::{CreateUser, User};
use tower::Service as _;

pub const PASSWORD: &str = "correct horse battery staple";
pub const SECRET: &str = "integration-test-secret-key-of-32-bytes";

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A logged-in user
pub struct Session {
    pub user_id: i64,
    pub tenant_id: i64,
    pub token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: axum::Router,
    pub clock: FixedClock,
    pub config: Config,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let db = create_pool(pool::DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            session: SessionConfig {
                secret: SECRET.to_string(),
                ttl_hours: 1,
            },
        };

        let clock = FixedClock::new(at(2024, 6, 15, 12));
        let state = AppState::with_clock(db.clone(), config.clone(), Arc::new(clock.clone()));
        let app = build_router(state);

        Ok(Self {
            db,
            app,
            clock,
            config,
        })
    }

    /// Sends a request, with an optional bearer token and JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body for {method} {uri}: {}", String::from_utf8_lossy(&bytes))
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send("DELETE", uri, Some(token), None).await
    }

    pub async fn register(&self, username: &str, timezone: &str) -> TestResponse {
        self.send(
            "POST",
            "/v1/auth/register",
            None,
            Some(serde_json::json!({
                "username": username,
                "password": PASSWORD,
                "timezone": timezone,
            })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.send(
            "POST",
            "/v1/auth/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Registers `username` and logs them in
    pub async fn sign_up(&self, username: &str, timezone: &str) -> Session {
        let registered = self.register(username, timezone).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let logged_in = self.login(username, PASSWORD).await;
        assert_eq!(logged_in.status, StatusCode::OK, "{}", logged_in.body);

        Session {
            user_id: logged_in.body["user_id"].as_i64().unwrap(),
            tenant_id: logged_in.body["tenant_id"].as_i64().unwrap(),
            token: logged_in.body["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Adds a second member to an existing tenant and issues them a token
    ///
    /// Registration always creates a fresh tenant, so shared tenants only
    /// exist through the data layer.
    pub async fn colleague(&self, tenant_id: i64, username: &str) -> Session {
        let user = User::create(
            &self.db,
            CreateUser {
                tenant_id,
                username: username.to_string(),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await
        .unwrap();

        Session {
            user_id: user.id,
            tenant_id,
            token: self.token_for(user.id, tenant_id),
        }
    }

    pub fn token_for(&self, user_id: i64, tenant_id: i64) -> String {
        let claims = Claims::new(user_id, tenant_id, self.config.session_ttl());
        create_token(&claims, SECRET).unwrap()
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, session: &Session, title: &str, due: Option<&str>) -> i64 {
        let response = self
            .post(
                "/v1/tasks",
                &session.token,
                serde_json::json!({ "title": title, "due_date": due }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }
}
