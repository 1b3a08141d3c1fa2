//! HTTP application — shared state, session extraction and the router.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::{AppConfig, StoreBackend};
use crate::dashboard::dashboard_routes;
use crate::error::{ApiError, ConfigError, Result};
use crate::onboarding::model::SessionUser;
use crate::onboarding::{WizardRegistry, onboarding_routes};
use crate::store::{MemoryStore, OnboardingStore, SessionProvider, SupabaseStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OnboardingStore>,
    pub sessions: Arc<dyn SessionProvider>,
    pub wizards: Arc<WizardRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn OnboardingStore>, sessions: Arc<dyn SessionProvider>) -> Self {
        let wizards = WizardRegistry::new(Arc::clone(&store));
        Self {
            store,
            sessions,
            wizards,
        }
    }

    /// Build the configured backend. In memory mode a demo user is
    /// registered under `config.dev_token`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let (store, sessions): (Arc<dyn OnboardingStore>, Arc<dyn SessionProvider>) =
            match config.backend {
                StoreBackend::Memory => {
                    let memory = Arc::new(MemoryStore::new());
                    memory
                        .register_user(
                            SessionUser {
                                id: "demo-user".to_string(),
                                email: Some("demo@spotly.local".to_string()),
                            },
                            &config.dev_token,
                        )
                        .await;
                    tracing::warn!("Using in-memory store; data is lost on restart");
                    let store: Arc<dyn OnboardingStore> = memory.clone();
                    let sessions: Arc<dyn SessionProvider> = memory;
                    (store, sessions)
                }
                StoreBackend::Supabase => {
                    let supabase_config =
                        config
                            .supabase
                            .as_ref()
                            .ok_or_else(|| ConfigError::MissingRequired {
                                key: "SUPABASE_URL".to_string(),
                                hint: "Supabase backend selected without connection settings"
                                    .to_string(),
                            })?;
                    let supabase = Arc::new(SupabaseStore::new(supabase_config)?);
                    let store: Arc<dyn OnboardingStore> = supabase.clone();
                    let sessions: Arc<dyn SessionProvider> = supabase;
                    (store, sessions)
                }
            };

        let wizards = WizardRegistry::with_capacity(Arc::clone(&store), config.event_capacity);
        Ok(Self {
            store,
            sessions,
            wizards,
        })
    }
}

/// The signed-in user, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        match state.sessions.user_for_token(token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(ApiError::Unauthorized),
        }
    }
}

/// Build the full router.
pub fn app_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(onboarding_routes())
        .merge(dashboard_routes())
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "spotly"
    }))
}
