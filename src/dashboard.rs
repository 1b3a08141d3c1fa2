//! Home gate and community review feed.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::onboarding::model::{Profile, ReviewKind, SessionUser, StoredReview};
use crate::server::{AppState, CurrentUser};

/// Reviews returned when the client does not ask for a limit.
const DEFAULT_REVIEW_LIMIT: usize = 20;
const MAX_REVIEW_LIMIT: usize = 100;

/// Which screen the home page should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum HomeView {
    Onboarding,
    Dashboard { greeting: String },
}

/// Decide the home screen. Onboarding wins while the profile is missing or
/// not onboarded, or while a wizard is still live for the user (a commit is
/// awaiting retry).
pub fn home_view(user: &SessionUser, profile: Option<&Profile>, wizard_live: bool) -> HomeView {
    match profile {
        Some(profile) if profile.is_onboarded && !wizard_live => {
            let name = profile
                .username
                .as_deref()
                .filter(|n| !n.is_empty())
                .or(user.email.as_deref())
                .unwrap_or(&user.id);
            HomeView::Dashboard {
                greeting: format!("Welcome to Spotly, {name}!"),
            }
        }
        _ => HomeView::Onboarding,
    }
}

/// GET /api/home
async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<HomeView>, ApiError> {
    let profile = state.store.get_profile(&user.id).await?;
    let wizard_live = state.wizards.get(&user.id).await.is_some();
    Ok(Json(home_view(&user, profile.as_ref(), wizard_live)))
}

#[derive(Debug, Deserialize)]
struct ReviewQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    limit: Option<usize>,
}

/// GET /api/reviews
async fn list_reviews(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<StoredReview>>, ApiError> {
    let onboarded = state
        .store
        .get_profile(&user.id)
        .await?
        .is_some_and(|p| p.is_onboarded);
    if !onboarded {
        return Err(ApiError::Forbidden(
            "Finish onboarding to unlock community reviews".to_string(),
        ));
    }

    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<ReviewKind>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_REVIEW_LIMIT)
        .clamp(1, MAX_REVIEW_LIMIT);

    Ok(Json(state.store.list_reviews(kind, limit).await?))
}

/// Build the home and review feed routes.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/home", get(home))
        .route("/api/reviews", get(list_reviews))
}
