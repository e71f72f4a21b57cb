use std::sync::Arc;

use anyhow::Context as _;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{self, SessionKeys};
use crate::config::AppConfig;
use crate::database::models::NewAccount;
use crate::database::{AccountStore, DatabaseManager, MemoryStore, PgStore, TestimonialStore};
use crate::handlers::{
    self, accounts, portal,
    testimonials::{self, PublicSite, StaffPortal},
};

/// Shared handler state. Both stores usually point at the same backend.
#[derive(Clone)]
pub struct AppState {
    pub testimonials: Arc<dyn TestimonialStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub sessions: Arc<SessionKeys>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, sessions: SessionKeys) -> Self
    where
        S: TestimonialStore + AccountStore + 'static,
    {
        Self {
            testimonials: store.clone(),
            accounts: store,
            sessions: Arc::new(sessions),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(testimonials::routes::<PublicSite>())
        .merge(portal_routes())
        .merge(testimonials::routes::<StaffPortal>())
        .merge(account_routes())
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn portal_routes() -> Router<AppState> {
    Router::new()
        .route("/portal/", get(portal::dashboard))
        .route("/portal/login/", get(portal::login_form).post(portal::login))
        .route("/portal/logout/", get(portal::logout).post(portal::logout))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register/", get(accounts::register_form).post(accounts::register))
        .route("/accounts/login/", get(accounts::login_form).post(accounts::login))
        .route("/accounts/logout/", get(accounts::logout).post(accounts::logout))
}

/// Wire up the store and session keys from configuration
pub async fn bootstrap(config: &AppConfig) -> anyhow::Result<AppState> {
    let sessions = SessionKeys::new(&config.security).context("invalid session configuration")?;

    let state = match config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;
            }
            AppState::new(Arc::new(PgStore::new(pool)), sessions)
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store, data will not survive a restart");
            AppState::new(Arc::new(MemoryStore::new()), sessions)
        }
    };

    if let Some((username, password)) = &config.security.bootstrap_admin {
        ensure_admin(&state, username, password).await?;
    }

    Ok(state)
}

/// Create the configured superuser unless an account of that name exists
async fn ensure_admin(state: &AppState, username: &str, password: &str) -> anyhow::Result<()> {
    if state.accounts.find_by_username(username).await?.is_some() {
        return Ok(());
    }

    let password_hash = auth::hash_password(password)?;
    let account = state
        .accounts
        .create(NewAccount {
            is_staff: true,
            is_superuser: true,
            ..NewAccount::regular(username, password_hash)
        })
        .await?;
    info!(user = %account.username, "Bootstrap admin created");
    Ok(())
}
