//! Onboarding state machine — which step the wizard is on and what it holds.

use serde::{Deserialize, Serialize};

use super::review::{Review, ReviewDraft};
use super::survey::{SurveyAnswers, SurveyDraft};

/// The steps of the onboarding wizard.
///
/// Progresses linearly: Welcome → Survey → PromptStudy → ReviewStudy →
/// PromptMeal → ReviewMeal → Unlock. ReviewMeal may be re-entered while a
/// failed commit is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Welcome,
    Survey,
    PromptStudy,
    ReviewStudy,
    PromptMeal,
    ReviewMeal,
    Unlock,
}

impl Step {
    /// Every step, in wizard order.
    pub const ALL: [Step; 7] = [
        Step::Welcome,
        Step::Survey,
        Step::PromptStudy,
        Step::ReviewStudy,
        Step::PromptMeal,
        Step::ReviewMeal,
        Step::Unlock,
    ];

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Step) -> bool {
        use Step::*;
        matches!(
            (self, target),
            (Welcome, Survey)
                | (Survey, PromptStudy)
                | (PromptStudy, ReviewStudy)
                | (ReviewStudy, PromptMeal)
                | (PromptMeal, ReviewMeal)
                | (ReviewMeal, ReviewMeal)
                | (ReviewMeal, Unlock)
        )
    }

    /// Whether this step is terminal (onboarding is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unlock)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<Step> {
        advance(*self)
    }
}

/// Pure step mapping. The ReviewMeal → Unlock edge is only taken once the
/// commit succeeds.
pub fn advance(current: Step) -> Option<Step> {
    use Step::*;
    match current {
        Welcome => Some(Survey),
        Survey => Some(PromptStudy),
        PromptStudy => Some(ReviewStudy),
        ReviewStudy => Some(PromptMeal),
        PromptMeal => Some(ReviewMeal),
        ReviewMeal => Some(Unlock),
        Unlock => None,
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::Survey => "survey",
            Self::PromptStudy => "promptStudy",
            Self::ReviewStudy => "reviewStudy",
            Self::PromptMeal => "promptMeal",
            Self::ReviewMeal => "reviewMeal",
            Self::Unlock => "unlock",
        };
        write!(f, "{s}")
    }
}

/// Wizard data, shaped by the active step.
///
/// Each variant carries only what that step can see: the survey answers
/// exist once the survey is confirmed, the study review once it is
/// validated, and so on.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Welcome,
    Survey {
        draft: SurveyDraft,
    },
    PromptStudy {
        survey: SurveyAnswers,
    },
    ReviewStudy {
        survey: SurveyAnswers,
        draft: ReviewDraft,
    },
    PromptMeal {
        survey: SurveyAnswers,
        study: Review,
    },
    ReviewMeal {
        survey: SurveyAnswers,
        study: Review,
        draft: ReviewDraft,
    },
    Unlock,
}

impl Stage {
    /// The step this stage represents.
    pub fn step(&self) -> Step {
        match self {
            Self::Welcome => Step::Welcome,
            Self::Survey { .. } => Step::Survey,
            Self::PromptStudy { .. } => Step::PromptStudy,
            Self::ReviewStudy { .. } => Step::ReviewStudy,
            Self::PromptMeal { .. } => Step::PromptMeal,
            Self::ReviewMeal { .. } => Step::ReviewMeal,
            Self::Unlock => Step::Unlock,
        }
    }

    /// The review draft being edited, if this is a review step.
    pub fn review_draft(&self) -> Option<&ReviewDraft> {
        match self {
            Self::ReviewStudy { draft, .. } | Self::ReviewMeal { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn review_draft_mut(&mut self) -> Option<&mut ReviewDraft> {
        match self {
            Self::ReviewStudy { draft, .. } | Self::ReviewMeal { draft, .. } => Some(draft),
            _ => None,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Welcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use Step::*;
        let transitions = [
            (Welcome, Survey),
            (Survey, PromptStudy),
            (PromptStudy, ReviewStudy),
            (ReviewStudy, PromptMeal),
            (PromptMeal, ReviewMeal),
            (ReviewMeal, Unlock),
        ];
        for (from, to) in transitions {
            assert!(
                from.can_transition_to(to),
                "{from} should transition to {to}"
            );
        }
    }

    #[test]
    fn retry_self_loop_only_on_review_meal() {
        for step in Step::ALL {
            assert_eq!(
                step.can_transition_to(step),
                step == Step::ReviewMeal,
                "self-transition on {step}"
            );
        }
    }

    #[test]
    fn invalid_transitions() {
        use Step::*;
        // Skip steps
        assert!(!Welcome.can_transition_to(PromptStudy));
        assert!(!Survey.can_transition_to(ReviewMeal));
        // Go backward
        assert!(!PromptMeal.can_transition_to(ReviewStudy));
        // Terminal
        assert!(!Unlock.can_transition_to(Welcome));
    }

    #[test]
    fn next_walks_all_steps() {
        let mut current = Step::Welcome;
        for expected in &Step::ALL[1..] {
            let next = current.next().unwrap();
            assert_eq!(next, *expected);
            current = next;
        }
        assert!(current.is_terminal());
        assert!(current.next().is_none());
    }

    #[test]
    fn display_matches_serde() {
        for step in Step::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "Display and serde should match for {step:?}");
        }
    }

    #[test]
    fn stage_reports_its_step() {
        assert_eq!(Stage::default().step(), Step::Welcome);
        assert_eq!(
            Stage::Survey {
                draft: SurveyDraft::default()
            }
            .step(),
            Step::Survey
        );
        assert_eq!(Stage::Unlock.step(), Step::Unlock);
    }

    #[test]
    fn only_review_stages_expose_a_draft() {
        let mut survey = Stage::Survey {
            draft: SurveyDraft::default(),
        };
        assert!(survey.review_draft().is_none());
        assert!(survey.review_draft_mut().is_none());
    }
}
