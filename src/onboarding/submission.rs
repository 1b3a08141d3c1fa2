//! Submission coordinator — commits the buffered onboarding result through
//! two sequential writes: the profile first, then the reviews.
//!
//! The profile write flips `is_onboarded`, which is what lets the user into
//! the app. If the review insert then fails the flag stays set: there is no
//! compensating rollback, and the wizard simply stays on the last review
//! step so the user can resubmit. Resubmitting rewrites the profile with the
//! same values.

use tracing::{info, warn};

use super::model::{ProfilePatch, ReviewKind, ReviewRecord};
use super::review::Review;
use super::survey::SurveyAnswers;
use crate::error::WizardError;
use crate::store::OnboardingStore;

/// Everything one commit attempt will write.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitPlan {
    pub user_id: String,
    pub profile: ProfilePatch,
    /// Study review first, dining review second.
    pub reviews: Vec<ReviewRecord>,
}

impl CommitPlan {
    pub fn new(user_id: &str, survey: SurveyAnswers, study: &Review, meal: &Review) -> Self {
        Self {
            user_id: user_id.to_string(),
            profile: ProfilePatch::onboarded(survey),
            reviews: vec![
                ReviewRecord::from_review(user_id, study, ReviewKind::Study),
                ReviewRecord::from_review(user_id, meal, ReviewKind::Dining),
            ],
        }
    }

    /// Run the writes. `insert_reviews` is only attempted after
    /// `update_profile` succeeds.
    pub async fn execute(&self, store: &dyn OnboardingStore) -> Result<(), WizardError> {
        info!(user_id = %self.user_id, "Submitting onboarding data");

        if let Err(e) = store.update_profile(&self.user_id, &self.profile).await {
            warn!(user_id = %self.user_id, error = %e, "Profile update failed; reviews not inserted");
            return Err(WizardError::ProfileWriteFailed(e));
        }

        if let Err(e) = store.insert_reviews(&self.reviews).await {
            warn!(
                user_id = %self.user_id,
                error = %e,
                "Review insert failed after profile was marked onboarded"
            );
            return Err(WizardError::ReviewWriteFailed(e));
        }

        info!(user_id = %self.user_id, reviews = self.reviews.len(), "Onboarding data committed");
        Ok(())
    }
}

/// Tracks the single commit window of a wizard.
#[derive(Debug, Default)]
pub struct SubmissionCoordinator {
    in_flight: bool,
}

impl SubmissionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a commit is currently running.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Open the commit window and build the plan. Fails if a commit is
    /// already running.
    pub fn begin(
        &mut self,
        user_id: &str,
        survey: SurveyAnswers,
        study: &Review,
        meal: &Review,
    ) -> Result<CommitPlan, WizardError> {
        if self.in_flight {
            return Err(WizardError::SubmissionInFlight);
        }
        self.in_flight = true;
        Ok(CommitPlan::new(user_id, survey, study, meal))
    }

    /// Close the commit window, whatever the outcome.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }
}
