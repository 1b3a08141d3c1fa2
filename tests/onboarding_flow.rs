//! End-to-end wizard tests against a recording store.
//!
//! The store records every call in order and can be told to fail either
//! write, so the commit ordering and retry behaviour can be observed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::timeout;

use spotly::error::{SUBMISSION_FAILED_MESSAGE, StoreError, WizardError};
use spotly::onboarding::model::{ProfilePatch, StoredReview};
use spotly::onboarding::{
    OnboardingWizard, Profile, ReviewKind, ReviewPatch, ReviewRecord, Step, WizardAction,
};
use spotly::store::OnboardingStore;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
enum Call {
    UpdateProfile(String, ProfilePatch),
    InsertReviews(Vec<ReviewRecord>),
}

/// Records calls; either write can be switched to fail.
#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    fail_profile: AtomicBool,
    fail_reviews: AtomicBool,
    /// `insert_reviews` never returns while set.
    stall_reviews: AtomicBool,
}

impl RecordingStore {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn rejected(operation: &str) -> StoreError {
        StoreError::Rejected {
            backend: "recording".to_string(),
            operation: operation.to_string(),
            status: 500,
            body: "internal error".to_string(),
        }
    }
}

#[async_trait]
impl OnboardingStore for RecordingStore {
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::UpdateProfile(user_id.to_string(), patch.clone()));
        if self.fail_profile.load(Ordering::SeqCst) {
            return Err(Self::rejected("update_profile"));
        }
        Ok(())
    }

    async fn insert_reviews(&self, records: &[ReviewRecord]) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::InsertReviews(records.to_vec()));
        if self.stall_reviews.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_reviews.load(Ordering::SeqCst) {
            return Err(Self::rejected("insert_reviews"));
        }
        Ok(())
    }

    async fn get_profile(&self, _user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(None)
    }

    async fn list_reviews(
        &self,
        _kind: Option<ReviewKind>,
        _limit: usize,
    ) -> Result<Vec<StoredReview>, StoreError> {
        Ok(Vec::new())
    }
}

fn patch(spot: &str, text: &str, rating: i64, specific: &str) -> WizardAction {
    WizardAction::EditReview {
        patch: ReviewPatch {
            spot_name: Some(spot.to_string()),
            review_text: Some(text.to_string()),
            rating: Some(rating),
            specific_spot: Some(specific.to_string()),
        },
    }
}

/// Drive a fresh wizard up to the meal review.
fn wizard_at_meal_review(store: Arc<RecordingStore>) -> OnboardingWizard {
    let mut wizard = OnboardingWizard::new("user-42", store);
    let actions = [
        WizardAction::Start,
        WizardAction::Answer {
            question: "studyPreference".to_string(),
            option: "quiet".to_string(),
        },
        WizardAction::Answer {
            question: "diningPreference".to_string(),
            option: "value".to_string(),
        },
        WizardAction::ConfirmSurvey,
        WizardAction::AcceptPrompt,
        patch("KSL 3rd Floor", "Silent and lots of outlets", 5, "window desks"),
        WizardAction::ConfirmReview,
        WizardAction::AcceptPrompt,
        patch("Melt", "Cheap and filling", 4, ""),
    ];
    for action in actions {
        wizard.apply(action).unwrap();
    }
    assert_eq!(wizard.step(), Step::ReviewMeal);
    wizard
}

#[tokio::test]
async fn full_flow_commits_profile_then_both_reviews() {
    timeout(TEST_TIMEOUT, async {
        let store = Arc::new(RecordingStore::default());
        let mut wizard = wizard_at_meal_review(Arc::clone(&store));
        let mut events = wizard.subscribe();

        assert_eq!(wizard.submit().await.unwrap(), Step::Unlock);

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        let Call::UpdateProfile(user_id, profile) = &calls[0] else {
            panic!("profile must be written first, got {:?}", calls[0]);
        };
        assert_eq!(user_id, "user-42");
        assert!(profile.is_onboarded);
        assert_eq!(
            serde_json::to_value(profile.preferences).unwrap(),
            json!({"studyPreference": "quiet", "diningPreference": "value"})
        );

        let Call::InsertReviews(records) = &calls[1] else {
            panic!("reviews must be written second, got {:?}", calls[1]);
        };
        let rows = serde_json::to_value(records).unwrap();
        assert_eq!(
            rows,
            json!([
                {
                    "user_id": "user-42",
                    "spot_name": "KSL 3rd Floor",
                    "rating": 5,
                    "review_text": "Silent and lots of outlets",
                    "specific_spot": "window desks",
                    "type": "study"
                },
                {
                    "user_id": "user-42",
                    "spot_name": "Melt",
                    "rating": 4,
                    "review_text": "Cheap and filling",
                    "specific_spot": "",
                    "type": "dining"
                }
            ])
        );

        let event = wizard.finish().unwrap();
        assert_eq!(event.user_id, "user-42");
        assert_eq!(events.recv().await.unwrap(), event);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn campus_scenario_unlocks_with_one_profile_write_and_one_insert() {
    timeout(TEST_TIMEOUT, async {
        let store = Arc::new(RecordingStore::default());
        let mut wizard = OnboardingWizard::new("student-1", Arc::clone(&store) as Arc<dyn OnboardingStore>);

        wizard.start().unwrap();
        wizard.answer_survey("studyPreference", "quiet").unwrap();
        wizard.answer_survey("diningPreference", "value").unwrap();
        wizard.confirm_survey().unwrap();
        wizard.accept_prompt().unwrap();
        wizard
            .apply(patch("KSL 3rd Floor", "Silent and spacious", 5, ""))
            .unwrap();
        wizard.confirm_study_review().unwrap();
        wizard.accept_prompt().unwrap();
        wizard
            .apply(patch("Melt", "Great sandwiches", 4, "counter seats"))
            .unwrap();

        assert_eq!(wizard.submit().await.unwrap(), Step::Unlock);

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        let Call::UpdateProfile(user_id, profile) = &calls[0] else {
            panic!("expected profile update first, got {:?}", calls[0]);
        };
        assert_eq!(user_id, "student-1");
        assert_eq!(
            serde_json::to_value(profile).unwrap(),
            json!({
                "preferences": {"studyPreference": "quiet", "diningPreference": "value"},
                "is_onboarded": true
            })
        );

        let Call::InsertReviews(records) = &calls[1] else {
            panic!("expected review insert second, got {:?}", calls[1]);
        };
        assert_eq!(
            serde_json::to_value(records).unwrap(),
            json!([
                {
                    "user_id": "student-1",
                    "spot_name": "KSL 3rd Floor",
                    "rating": 5,
                    "review_text": "Silent and spacious",
                    "specific_spot": "",
                    "type": "study"
                },
                {
                    "user_id": "student-1",
                    "spot_name": "Melt",
                    "rating": 4,
                    "review_text": "Great sandwiches",
                    "specific_spot": "counter seats",
                    "type": "dining"
                }
            ])
        );
        assert_eq!(wizard.step(), Step::Unlock);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn abandoned_submit_reopens_the_review_step() {
    let store = Arc::new(RecordingStore::default());
    store.stall_reviews.store(true, Ordering::SeqCst);
    let mut wizard = wizard_at_meal_review(Arc::clone(&store));

    // The caller gives up while the review insert is still pending.
    let abandoned = timeout(Duration::from_millis(50), wizard.submit()).await;
    assert!(abandoned.is_err());

    assert!(!wizard.submission_in_flight());
    assert_eq!(wizard.step(), Step::ReviewMeal);
    wizard.apply(patch("Melt", "Still great", 4, "")).unwrap();

    store.stall_reviews.store(false, Ordering::SeqCst);
    assert_eq!(wizard.submit().await.unwrap(), Step::Unlock);
}

#[tokio::test]
async fn profile_failure_skips_review_insert() {
    timeout(TEST_TIMEOUT, async {
        let store = Arc::new(RecordingStore::default());
        store.fail_profile.store(true, Ordering::SeqCst);
        let mut wizard = wizard_at_meal_review(Arc::clone(&store));

        let err = wizard.submit().await.unwrap_err();
        assert!(matches!(err, WizardError::ProfileWriteFailed(_)));
        assert_eq!(err.user_message(), SUBMISSION_FAILED_MESSAGE);

        assert_eq!(store.calls().len(), 1);
        assert!(matches!(store.calls()[0], Call::UpdateProfile(..)));
        assert_eq!(wizard.step(), Step::ReviewMeal);
        assert!(!wizard.submission_in_flight());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn review_failure_keeps_drafts_and_retry_succeeds() {
    timeout(TEST_TIMEOUT, async {
        let store = Arc::new(RecordingStore::default());
        store.fail_reviews.store(true, Ordering::SeqCst);
        let mut wizard = wizard_at_meal_review(Arc::clone(&store));

        let err = wizard.submit().await.unwrap_err();
        assert!(matches!(err, WizardError::ReviewWriteFailed(_)));
        assert_eq!(wizard.step(), Step::ReviewMeal);
        assert_eq!(wizard.stage().review_draft().unwrap().spot_name, "Melt");
        assert!(!wizard.submission_in_flight());

        store.fail_reviews.store(false, Ordering::SeqCst);
        assert_eq!(wizard.submit().await.unwrap(), Step::Unlock);

        let calls = store.calls();
        assert_eq!(calls.len(), 4);
        // The retry rewrites the profile with identical values.
        assert_eq!(calls[0], calls[2]);
        assert_eq!(calls[1], calls[3]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn second_submit_is_rejected_while_commit_is_open() {
    let store = Arc::new(RecordingStore::default());
    let mut wizard = wizard_at_meal_review(Arc::clone(&store));

    let plan = wizard.begin_submit().unwrap();
    assert!(wizard.submission_in_flight());
    assert!(matches!(
        wizard.begin_submit(),
        Err(WizardError::SubmissionInFlight)
    ));
    assert!(wizard.review_mut().is_none());
    assert!(matches!(
        wizard.apply(patch("Other", "x", 1, "")),
        Err(WizardError::SubmissionInFlight)
    ));

    let outcome = plan.execute(store.as_ref()).await;
    assert_eq!(wizard.complete_submit(outcome).unwrap(), Step::Unlock);
    assert_eq!(store.calls().len(), 2);
}

#[tokio::test]
async fn empty_required_fields_block_submit_without_store_calls() {
    let store = Arc::new(RecordingStore::default());
    let mut wizard = wizard_at_meal_review(Arc::clone(&store));
    wizard
        .apply(WizardAction::EditReview {
            patch: ReviewPatch {
                review_text: Some("   ".to_string()),
                ..Default::default()
            },
        })
        .unwrap();

    let Err(WizardError::Validation(errors)) = wizard.submit().await else {
        panic!("expected validation failure");
    };
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["reviewText"]);
    assert!(store.calls().is_empty());
    assert_eq!(wizard.step(), Step::ReviewMeal);
}

#[tokio::test]
async fn rating_boundaries_are_committed_as_is() {
    let store = Arc::new(RecordingStore::default());
    let mut wizard = OnboardingWizard::new("u", Arc::clone(&store) as Arc<dyn OnboardingStore>);
    wizard.apply(WizardAction::Start).unwrap();
    wizard.answer_survey("studyPreference", "social").unwrap();
    wizard.answer_survey("diningPreference", "quality").unwrap();
    wizard.confirm_survey().unwrap();
    wizard.accept_prompt().unwrap();
    wizard.apply(patch("Library", "ok", 1, "")).unwrap();
    wizard.confirm_study_review().unwrap();
    wizard.accept_prompt().unwrap();
    // Out-of-range control values snap to the nearest bound.
    wizard.apply(patch("Diner", "great", 9, "")).unwrap();
    wizard.submit().await.unwrap();

    let Call::InsertReviews(records) = &store.calls()[1] else {
        panic!("expected review insert");
    };
    assert_eq!(records[0].rating.get(), 1);
    assert_eq!(records[1].rating.get(), 5);
}

#[test]
fn out_of_order_actions_leave_step_unchanged() {
    let store = Arc::new(RecordingStore::default());
    let mut wizard = OnboardingWizard::new("u", store);

    for action in [
        WizardAction::ConfirmSurvey,
        WizardAction::AcceptPrompt,
        WizardAction::ConfirmReview,
    ] {
        assert!(matches!(
            wizard.apply(action),
            Err(WizardError::InvalidAction { step: Step::Welcome, .. })
        ));
    }
    assert_eq!(wizard.step(), Step::Welcome);
    assert!(wizard.finish().is_err());
}
