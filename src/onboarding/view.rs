//! What each step shows. Drafts are lent by reference so the host always
//! renders the latest edits.

use serde::Serialize;

use super::review::ReviewDraft;
use super::survey::{SURVEY_QUESTIONS, SurveyDraft, SurveyQuestion};

/// The active screen of the wizard.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StepView<'a> {
    Welcome {
        title: &'static str,
        body: &'static str,
        action: &'static str,
    },
    Survey {
        title: &'static str,
        questions: &'static [SurveyQuestion],
        answers: &'a SurveyDraft,
        action: &'static str,
    },
    Prompt {
        title: &'static str,
        body: &'static str,
        action: &'static str,
    },
    ReviewForm {
        title: &'static str,
        draft: &'a ReviewDraft,
        rating_label: String,
        submit_label: &'static str,
        /// Submit is disabled while a commit is running.
        submitting: bool,
    },
    Unlock {
        title: &'static str,
        body: &'static str,
        action: &'static str,
    },
}

impl<'a> StepView<'a> {
    pub fn welcome() -> Self {
        Self::Welcome {
            title: "Welcome to Spotly!",
            body: "To unlock the best spots on campus, first share a couple of your favorites.",
            action: "Get Started",
        }
    }

    pub fn survey(answers: &'a SurveyDraft) -> Self {
        Self::Survey {
            title: "First, a few questions...",
            questions: SURVEY_QUESTIONS,
            answers,
            action: "Next",
        }
    }

    pub fn study_prompt() -> Self {
        Self::Prompt {
            title: "First, what's your go-to study spot on campus?",
            body: "Think of that one place you can always count on to get work done.",
            action: "I've got one!",
        }
    }

    pub fn meal_prompt() -> Self {
        Self::Prompt {
            title: "Awesome, thanks! Now, what's your favorite place for a meal?",
            body: "On-campus or off-campus, where do you go for a great bite?",
            action: "I know just the place",
        }
    }

    pub fn study_review(draft: &'a ReviewDraft) -> Self {
        Self::ReviewForm {
            title: "Your Go-To Study Spot",
            draft,
            rating_label: draft.rating.label(),
            submit_label: "Submit Review",
            submitting: false,
        }
    }

    pub fn meal_review(draft: &'a ReviewDraft, submitting: bool) -> Self {
        Self::ReviewForm {
            title: "Your Favorite Meal Spot",
            draft,
            rating_label: draft.rating.label(),
            submit_label: if submitting {
                "Submitting..."
            } else {
                "Finish & Unlock Spotly"
            },
            submitting,
        }
    }

    pub fn unlock() -> Self {
        Self::Unlock {
            title: "You're in!",
            body: "You've unlocked Spotly. Here's what other students are saying.",
            action: "See All Spots",
        }
    }
}
