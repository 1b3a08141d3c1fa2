//! Preference survey — fixed single-choice questions answered before the
//! first review.

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationErrors};

/// Question key for the study-spot preference.
pub const STUDY_PREFERENCE: &str = "studyPreference";
/// Question key for the dining-spot preference.
pub const DINING_PREFERENCE: &str = "diningPreference";

/// What kind of study spot the user prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyPreference {
    Quiet,
    Social,
}

impl std::str::FromStr for StudyPreference {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiet" => Ok(Self::Quiet),
            "social" => Ok(Self::Social),
            _ => Err(format!("Unknown study preference: {}", s)),
        }
    }
}

/// The most important factor for a dining spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiningPreference {
    Quality,
    Value,
}

impl std::str::FromStr for DiningPreference {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quality" => Ok(Self::Quality),
            "value" => Ok(Self::Value),
            _ => Err(format!("Unknown dining preference: {}", s)),
        }
    }
}

/// One selectable answer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SurveyOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// A mutually-exclusive-choice question.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SurveyQuestion {
    pub key: &'static str,
    pub prompt: &'static str,
    pub options: &'static [SurveyOption],
}

impl SurveyQuestion {
    pub fn offers(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// The survey, in display order.
pub static SURVEY_QUESTIONS: &[SurveyQuestion] = &[
    SurveyQuestion {
        key: STUDY_PREFERENCE,
        prompt: "I prefer study spots that are:",
        options: &[
            SurveyOption {
                value: "quiet",
                label: "Quiet",
            },
            SurveyOption {
                value: "social",
                label: "Social",
            },
        ],
    },
    SurveyQuestion {
        key: DINING_PREFERENCE,
        prompt: "The most important factor for a dining spot is:",
        options: &[
            SurveyOption {
                value: "quality",
                label: "Quality",
            },
            SurveyOption {
                value: "value",
                label: "Value",
            },
        ],
    },
];

/// Look up a question by key.
pub fn question(key: &str) -> Option<&'static SurveyQuestion> {
    SURVEY_QUESTIONS.iter().find(|q| q.key == key)
}

/// Confirmed survey answers. Written to the profile's `preferences` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswers {
    pub study_preference: StudyPreference,
    pub dining_preference: DiningPreference,
}

/// In-progress survey answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_preference: Option<StudyPreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dining_preference: Option<DiningPreference>,
}

impl SurveyDraft {
    /// Record an answer. Unknown keys and options outside the question's
    /// option set are rejected and leave the draft unchanged.
    pub fn answer(&mut self, key: &str, value: &str) -> Result<(), FieldError> {
        let q = question(key).ok_or_else(|| FieldError::new(key, "Unknown question"))?;
        if !q.offers(value) {
            return Err(FieldError::new(key, format!("'{value}' is not one of the offered options")));
        }

        match q.key {
            STUDY_PREFERENCE => {
                let parsed = value
                    .parse::<StudyPreference>()
                    .map_err(|e| FieldError::new(key, e))?;
                self.study_preference = Some(parsed);
            }
            DINING_PREFERENCE => {
                let parsed = value
                    .parse::<DiningPreference>()
                    .map_err(|e| FieldError::new(key, e))?;
                self.dining_preference = Some(parsed);
            }
            _ => return Err(FieldError::new(key, "Unknown question")),
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.study_preference.is_some() && self.dining_preference.is_some()
    }

    /// Check that every question has an answer.
    pub fn validate(&self) -> Result<SurveyAnswers, ValidationErrors> {
        match (self.study_preference, self.dining_preference) {
            (Some(study_preference), Some(dining_preference)) => Ok(SurveyAnswers {
                study_preference,
                dining_preference,
            }),
            (study, dining) => {
                let mut errors = ValidationErrors::default();
                if study.is_none() {
                    errors.push(FieldError::required(STUDY_PREFERENCE));
                }
                if dining.is_none() {
                    errors.push(FieldError::required(DINING_PREFERENCE));
                }
                Err(errors)
            }
        }
    }
}
