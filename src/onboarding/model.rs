//! Records exchanged with the persistence collaborator, and the completion
//! event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::review::{Rating, Review};
use super::survey::SurveyAnswers;

/// Which onboarding question a review answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    Study,
    Dining,
}

impl std::fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Study => write!(f, "study"),
            Self::Dining => write!(f, "dining"),
        }
    }
}

impl std::str::FromStr for ReviewKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(Self::Study),
            "dining" => Ok(Self::Dining),
            _ => Err(format!("Unknown review type: {}", s)),
        }
    }
}

/// Row written to the `reviews` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub user_id: String,
    pub spot_name: String,
    pub rating: Rating,
    pub review_text: String,
    pub specific_spot: String,
    #[serde(rename = "type")]
    pub kind: ReviewKind,
}

impl ReviewRecord {
    pub fn from_review(user_id: &str, review: &Review, kind: ReviewKind) -> Self {
        Self {
            user_id: user_id.to_string(),
            spot_name: review.spot_name().to_string(),
            rating: review.rating(),
            review_text: review.review_text().to_string(),
            specific_spot: review.specific_spot().to_string(),
            kind,
        }
    }
}

/// A review as read back for the community dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReview {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: ReviewRecord,
}

/// Update applied to the user's `profiles` row on commit. A full overwrite,
/// so resubmitting after a failure is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilePatch {
    pub preferences: SurveyAnswers,
    pub is_onboarded: bool,
}

impl ProfilePatch {
    pub fn onboarded(preferences: SurveyAnswers) -> Self {
        Self {
            preferences,
            is_onboarded: true,
        }
    }
}

/// A `profiles` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Raw JSON column; older rows may predate the current survey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<serde_json::Value>,
    #[serde(default)]
    pub is_onboarded: bool,
}

/// The authenticated user behind a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Emitted once the user confirms the unlock step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingCompleted {
    pub user_id: String,
    pub completed_at: DateTime<Utc>,
}
