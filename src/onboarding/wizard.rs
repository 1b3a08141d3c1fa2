//! OnboardingWizard — owns the stage, applies user actions and hands the
//! final step to the submission coordinator.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::model::OnboardingCompleted;
use super::review::{ReviewDraft, ReviewPatch};
use super::state::{Stage, Step};
use super::submission::{CommitPlan, SubmissionCoordinator};
use super::survey::SurveyDraft;
use super::view::StepView;
use crate::error::{ValidationErrors, WizardError};
use crate::store::OnboardingStore;

/// Default capacity of a wizard's own completion channel.
const DEFAULT_EVENT_CAPACITY: usize = 16;

/// A synchronous user action. Submitting the final review is async and goes
/// through [`OnboardingWizard::submit`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    /// Leave the welcome screen.
    Start,
    /// Pick an option for one survey question.
    Answer { question: String, option: String },
    ConfirmSurvey,
    /// Acknowledge the study or meal prompt.
    AcceptPrompt,
    EditReview { patch: ReviewPatch },
    /// Confirm the study review.
    ConfirmReview,
}

impl WizardAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Answer { .. } => "answer",
            Self::ConfirmSurvey => "confirm_survey",
            Self::AcceptPrompt => "accept_prompt",
            Self::EditReview { .. } => "edit_review",
            Self::ConfirmReview => "confirm_review",
        }
    }
}

/// One user's onboarding session.
pub struct OnboardingWizard {
    user_id: String,
    store: Arc<dyn OnboardingStore>,
    stage: Stage,
    coordinator: SubmissionCoordinator,
    events: broadcast::Sender<OnboardingCompleted>,
    /// Set once `finish` has announced completion.
    completed: bool,
}

impl OnboardingWizard {
    pub fn new(user_id: impl Into<String>, store: Arc<dyn OnboardingStore>) -> Self {
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self::with_events(user_id, store, events)
    }

    /// Create a wizard that announces completion on a shared channel.
    pub fn with_events(
        user_id: impl Into<String>,
        store: Arc<dyn OnboardingStore>,
        events: broadcast::Sender<OnboardingCompleted>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            store,
            stage: Stage::Welcome,
            coordinator: SubmissionCoordinator::new(),
            events,
            completed: false,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn step(&self) -> Step {
        self.stage.step()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn submission_in_flight(&self) -> bool {
        self.coordinator.in_flight()
    }

    /// Receive `OnboardingCompleted` events.
    pub fn subscribe(&self) -> broadcast::Receiver<OnboardingCompleted> {
        self.events.subscribe()
    }

    /// The screen for the current step.
    pub fn view(&self) -> StepView<'_> {
        match &self.stage {
            Stage::Welcome => StepView::welcome(),
            Stage::Survey { draft } => StepView::survey(draft),
            Stage::PromptStudy { .. } => StepView::study_prompt(),
            Stage::ReviewStudy { draft, .. } => StepView::study_review(draft),
            Stage::PromptMeal { .. } => StepView::meal_prompt(),
            Stage::ReviewMeal { draft, .. } => {
                StepView::meal_review(draft, self.coordinator.in_flight())
            }
            Stage::Unlock => StepView::unlock(),
        }
    }

    /// Mutable access to the survey answers while the survey is open.
    pub fn survey_mut(&mut self) -> Option<&mut SurveyDraft> {
        match &mut self.stage {
            Stage::Survey { draft } => Some(draft),
            _ => None,
        }
    }

    /// Mutable access to the review being edited. `None` outside the review
    /// steps and while a commit is running.
    pub fn review_mut(&mut self) -> Option<&mut ReviewDraft> {
        if self.coordinator.in_flight() {
            return None;
        }
        self.stage.review_draft_mut()
    }

    /// Apply a synchronous action and return the resulting step.
    pub fn apply(&mut self, action: WizardAction) -> Result<Step, WizardError> {
        let result = match action {
            WizardAction::Start => self.start(),
            WizardAction::Answer { question, option } => self
                .answer_survey(&question, &option)
                .map(|()| self.step()),
            WizardAction::ConfirmSurvey => self.confirm_survey(),
            WizardAction::AcceptPrompt => self.accept_prompt(),
            WizardAction::EditReview { patch } => self.edit_review(patch).map(|()| self.step()),
            WizardAction::ConfirmReview => self.confirm_study_review(),
        };
        if let Err(e) = &result {
            debug!(user_id = %self.user_id, error = %e, "Wizard action rejected");
        }
        result
    }

    /// Welcome → Survey.
    pub fn start(&mut self) -> Result<Step, WizardError> {
        if !matches!(self.stage, Stage::Welcome) {
            return Err(self.invalid(WizardAction::Start.name()));
        }
        self.enter(Stage::Survey {
            draft: SurveyDraft::default(),
        })
    }

    pub fn answer_survey(&mut self, question: &str, option: &str) -> Result<(), WizardError> {
        let step = self.step();
        let draft = self.survey_mut().ok_or(WizardError::InvalidAction {
            step,
            action: "answer".to_string(),
        })?;
        draft.answer(question, option).map_err(|e| {
            let mut errors = ValidationErrors::default();
            errors.push(e);
            WizardError::Validation(errors)
        })
    }

    /// Survey → PromptStudy, once every question is answered.
    pub fn confirm_survey(&mut self) -> Result<Step, WizardError> {
        let Stage::Survey { draft } = &self.stage else {
            return Err(self.invalid(WizardAction::ConfirmSurvey.name()));
        };
        let survey = draft.validate()?;
        self.enter(Stage::PromptStudy { survey })
    }

    /// PromptStudy → ReviewStudy, or PromptMeal → ReviewMeal.
    pub fn accept_prompt(&mut self) -> Result<Step, WizardError> {
        let next = match &self.stage {
            Stage::PromptStudy { survey } => Stage::ReviewStudy {
                survey: *survey,
                draft: ReviewDraft::default(),
            },
            Stage::PromptMeal { survey, study } => Stage::ReviewMeal {
                survey: *survey,
                study: study.clone(),
                draft: ReviewDraft::default(),
            },
            _ => return Err(self.invalid(WizardAction::AcceptPrompt.name())),
        };
        self.enter(next)
    }

    pub fn edit_review(&mut self, patch: ReviewPatch) -> Result<(), WizardError> {
        if self.coordinator.in_flight() {
            return Err(WizardError::SubmissionInFlight);
        }
        let step = self.step();
        let draft = self.stage.review_draft_mut().ok_or(WizardError::InvalidAction {
            step,
            action: "edit_review".to_string(),
        })?;
        draft.apply(patch);
        Ok(())
    }

    /// ReviewStudy → PromptMeal. The meal review is confirmed through
    /// [`submit`](Self::submit).
    pub fn confirm_study_review(&mut self) -> Result<Step, WizardError> {
        let Stage::ReviewStudy { survey, draft } = &self.stage else {
            return Err(self.invalid(WizardAction::ConfirmReview.name()));
        };
        let study = draft.validate()?;
        let survey = *survey;
        self.enter(Stage::PromptMeal { survey, study })
    }

    /// Validate the meal review and open the commit window.
    pub fn begin_submit(&mut self) -> Result<CommitPlan, WizardError> {
        let Stage::ReviewMeal {
            survey,
            study,
            draft,
        } = &self.stage
        else {
            return Err(self.invalid("submit"));
        };
        let meal = draft.validate()?;
        self.coordinator.begin(&self.user_id, *survey, study, &meal)
    }

    /// Close the commit window. Success moves to Unlock; failure keeps the
    /// wizard on ReviewMeal with its drafts intact.
    pub fn complete_submit(&mut self, outcome: Result<(), WizardError>) -> Result<Step, WizardError> {
        if !self.coordinator.in_flight() {
            return Err(self.invalid("complete_submit"));
        }
        self.coordinator.finish();
        match outcome {
            Ok(()) => self.enter(Stage::Unlock),
            Err(e) => {
                debug!(user_id = %self.user_id, step = %self.step(), "Commit failed; awaiting retry");
                Err(e)
            }
        }
    }

    /// Confirm the meal review: commit everything and unlock on success.
    ///
    /// If this future is dropped mid-commit the in-flight flag is cleared and
    /// the wizard stays on ReviewMeal, as after a failed commit.
    pub async fn submit(&mut self) -> Result<Step, WizardError> {
        let plan = self.begin_submit()?;
        let store = Arc::clone(&self.store);
        let window = CommitWindow { wizard: self };
        let outcome = plan.execute(store.as_ref()).await;
        window.close(outcome)
    }

    /// Whether `finish` has already announced completion.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Confirm the unlock screen and tell the host onboarding is done.
    /// Completion is announced once; later calls are rejected.
    pub fn finish(&mut self) -> Result<OnboardingCompleted, WizardError> {
        if !self.step().is_terminal() || self.completed {
            return Err(self.invalid("finish"));
        }
        self.completed = true;
        let event = OnboardingCompleted {
            user_id: self.user_id.clone(),
            completed_at: Utc::now(),
        };
        // No subscribers is fine; the event is also returned.
        let _ = self.events.send(event.clone());
        info!(user_id = %self.user_id, "Onboarding completed");
        Ok(event)
    }

    fn enter(&mut self, next: Stage) -> Result<Step, WizardError> {
        let from = self.step();
        let to = next.step();
        if !from.can_transition_to(to) {
            return Err(WizardError::InvalidTransition { from, to });
        }
        debug!(user_id = %self.user_id, %from, %to, "Wizard advanced");
        self.stage = next;
        Ok(to)
    }

    fn invalid(&self, action: &str) -> WizardError {
        WizardError::InvalidAction {
            step: self.step(),
            action: action.to_string(),
        }
    }
}

/// Holds the wizard while a commit runs and reopens it if the commit never
/// reports back.
struct CommitWindow<'a> {
    wizard: &'a mut OnboardingWizard,
}

impl CommitWindow<'_> {
    fn close(self, outcome: Result<(), WizardError>) -> Result<Step, WizardError> {
        self.wizard.complete_submit(outcome)
    }
}

impl Drop for CommitWindow<'_> {
    fn drop(&mut self) {
        if self.wizard.coordinator.in_flight() {
            warn!(user_id = %self.wizard.user_id, "Commit abandoned before it reported; reopening review");
            self.wizard.coordinator.finish();
        }
    }
}
