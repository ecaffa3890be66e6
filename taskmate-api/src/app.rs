/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskmate_api::{app::AppState, config::Config};
/// use taskmate_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let state = AppState::new(pool, config);
/// let app = taskmate_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use taskmate_shared::{
    auth::jwt,
    clock::{DefaultClock, SharedClock},
    error::StoreError,
    scope::{ScopedStore, TenantContext},
};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Time source for status rules
    pub clock: SharedClock,
}

impl AppState {
    /// Creates new application state backed by the system clock
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self::with_clock(db, config, Arc::new(DefaultClock))
    }

    pub fn with_clock(db: SqlitePool, config: Config, clock: SharedClock) -> Self {
        Self {
            db,
            config: Arc::new(config),
            clock,
        }
    }

    /// Gets the secret for session token operations
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }

    /// Binds the data layer to an authenticated caller
    pub fn scoped(&self, ctx: TenantContext) -> ScopedStore {
        ScopedStore::new(self.db.clone(), ctx, Arc::clone(&self.clock))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// ├── /v1/
/// │   ├── GET  /timezones              # Supported zones (public)
/// │   ├── /auth/                       # Public
/// │   │   ├── POST /register
/// │   │   └── POST /login
/// │   ├── /tasks/                      # Session required
/// │   │   ├── GET    /                 # Open board
/// │   │   ├── POST   /
/// │   │   ├── GET    /done             # Done board
/// │   │   ├── GET    /done/:id
/// │   │   ├── GET    /:id
/// │   │   ├── PUT    /:id
/// │   │   ├── DELETE /:id
/// │   │   ├── POST   /:id/done
/// │   │   ├── POST   /:id/comments
/// │   │   └── DELETE /:id/comments/:comment_id
/// │   └── /settings                    # Session required
/// │       ├── GET
/// │       └── PUT
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer), outermost
/// 2. Session authentication on `/v1/tasks` and `/v1/settings`
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::open_board).post(routes::tasks::create_task),
        )
        .route("/done", get(routes::tasks::done_board))
        .route("/done/:id", get(routes::tasks::get_done_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/done", post(routes::tasks::mark_done))
        .route("/:id/comments", post(routes::comments::add_comment))
        .route(
            "/:id/comments/:comment_id",
            delete(routes::comments::delete_comment),
        );

    let settings_routes = Router::new().route(
        "/",
        get(routes::settings::get_settings).put(routes::settings::update_settings),
    );

    // Everything under here acts on behalf of a logged-in user
    let session_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/settings", settings_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let v1_routes = Router::new()
        .route("/timezones", get(routes::timezones::list_timezones))
        .nest("/auth", auth_routes)
        .merge(session_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization header,
/// reloads the caller from the database, then injects the resulting
/// [`TenantContext`] into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    // Parse Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.session_secret())?;

    // A token for a user that no longer exists in that tenant is dead
    let ctx = match TenantContext::resolve(&state.db, claims.sub, claims.tenant_id).await {
        Ok(ctx) => ctx,
        Err(StoreError::NotFound { .. }) => {
            tracing::warn!(
                user_id = claims.sub,
                tenant_id = claims.tenant_id,
                "Session refers to an unknown user"
            );
            return Err(ApiError::Unauthorized("Session is no longer valid".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
