//! REST endpoints driving the onboarding wizard.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::error;

use super::model::OnboardingCompleted;
use super::state::Step;
use super::view::StepView;
use super::wizard::{OnboardingWizard, WizardAction};
use crate::error::{ApiError, WizardError};
use crate::server::{AppState, CurrentUser};

/// Wizard state as seen by the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WizardSnapshot<'a> {
    step: Step,
    submission_in_flight: bool,
    view: StepView<'a>,
}

fn snapshot(wizard: &OnboardingWizard) -> Json<serde_json::Value> {
    let snapshot = WizardSnapshot {
        step: wizard.step(),
        submission_in_flight: wizard.submission_in_flight(),
        view: wizard.view(),
    };
    Json(serde_json::json!(snapshot))
}

/// The user's live wizard. A new one is only started while the profile is
/// not yet onboarded; an existing one is kept so a failed review insert can
/// still be retried after the profile flag was set.
async fn wizard_for(
    state: &AppState,
    user_id: &str,
) -> Result<Arc<Mutex<OnboardingWizard>>, ApiError> {
    if let Some(wizard) = state.wizards.get(user_id).await {
        return Ok(wizard);
    }
    let onboarded = state
        .store
        .get_profile(user_id)
        .await?
        .is_some_and(|p| p.is_onboarded);
    if onboarded {
        return Err(ApiError::Conflict("Onboarding is already complete".to_string()));
    }
    Ok(state.wizards.get_or_create(user_id).await)
}

/// GET /api/onboarding
async fn get_wizard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let wizard = wizard_for(&state, &user.id).await?;
    let wizard = wizard.lock().await;
    Ok(snapshot(&wizard))
}

/// POST /api/onboarding/actions
async fn apply_action(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(action): Json<WizardAction>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let wizard = wizard_for(&state, &user.id).await?;
    let mut wizard = wizard.lock().await;
    wizard.apply(action)?;
    Ok(snapshot(&wizard))
}

/// POST /api/onboarding/submit
///
/// The wizard lock is released while the external writes run; the wizard's
/// in-flight flag rejects a second submit in the meantime. The commit runs
/// on its own task so it still completes if the request is dropped.
async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let wizard = state
        .wizards
        .get(&user.id)
        .await
        .ok_or_else(|| ApiError::Conflict("No onboarding in progress".to_string()))?;

    let plan = wizard.lock().await.begin_submit()?;
    let store = Arc::clone(&state.store);
    let commit = tokio::spawn(async move {
        let outcome = plan.execute(store.as_ref()).await;
        let mut guard = wizard.lock().await;
        guard.complete_submit(outcome)?;
        Ok::<_, WizardError>(snapshot(&guard))
    });

    commit.await.map_err(|e| {
        error!(user_id = %user.id, error = %e, "Commit task failed");
        ApiError::Internal
    })?
    .map_err(ApiError::from)
}

/// POST /api/onboarding/finish
async fn finish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<OnboardingCompleted>, ApiError> {
    let wizard = state
        .wizards
        .get(&user.id)
        .await
        .ok_or_else(|| ApiError::Conflict("No onboarding in progress".to_string()))?;

    let event = wizard.lock().await.finish()?;
    state.wizards.remove(&user.id).await;
    Ok(Json(event))
}

/// Build the onboarding REST routes.
pub fn onboarding_routes() -> Router<AppState> {
    Router::new()
        .route("/api/onboarding", get(get_wizard))
        .route("/api/onboarding/actions", post(apply_action))
        .route("/api/onboarding/submit", post(submit))
        .route("/api/onboarding/finish", post(finish))
}
