//! Place review form — shared by the study-spot and dining-spot steps.

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationErrors};

/// A star rating, always within `Rating::MIN..=Rating::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// `None` outside 1..=5.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Snap any input to the nearest valid rating, the way a 1–5 range
    /// control sanitizes its value.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// "1 Star", "4 Stars".
    pub fn label(self) -> String {
        if self.0 > 1 {
            format!("{} Stars", self.0)
        } else {
            format!("{} Star", self.0)
        }
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "Rating {value} is outside {}..={}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An in-progress review, edited field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub spot_name: String,
    pub review_text: String,
    pub rating: Rating,
    /// Optional; empty when the user leaves it blank.
    pub specific_spot: String,
}

/// A partial edit to a `ReviewDraft`. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_text: Option<String>,
    /// Raw control value; clamped into range on apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_spot: Option<String>,
}

impl ReviewDraft {
    pub fn apply(&mut self, patch: ReviewPatch) {
        if let Some(spot_name) = patch.spot_name {
            self.spot_name = spot_name;
        }
        if let Some(review_text) = patch.review_text {
            self.review_text = review_text;
        }
        if let Some(rating) = patch.rating {
            self.rating = Rating::clamped(rating);
        }
        if let Some(specific_spot) = patch.specific_spot {
            self.specific_spot = specific_spot;
        }
    }

    /// Check required fields. Whitespace-only text counts as empty; accepted
    /// text is kept exactly as typed.
    pub fn validate(&self) -> Result<Review, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.spot_name.trim().is_empty() {
            errors.push(FieldError::required("spotName"));
        }
        if self.review_text.trim().is_empty() {
            errors.push(FieldError::required("reviewText"));
        }
        errors.into_result()?;

        Ok(Review {
            spot_name: self.spot_name.clone(),
            review_text: self.review_text.clone(),
            rating: self.rating,
            specific_spot: self.specific_spot.clone(),
        })
    }
}

/// A validated review. Fields are fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    spot_name: String,
    review_text: String,
    rating: Rating,
    specific_spot: String,
}

impl Review {
    pub fn spot_name(&self) -> &str {
        &self.spot_name
    }

    pub fn review_text(&self) -> &str {
        &self.review_text
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn specific_spot(&self) -> &str {
        &self.specific_spot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ReviewDraft {
        ReviewDraft {
            spot_name: "KSL 3rd Floor".to_string(),
            review_text: "Silent and spacious".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_rating_is_three() {
        assert_eq!(ReviewDraft::default().rating.get(), 3);
    }

    #[test]
    fn rating_bounds_accept_one_and_five() {
        assert_eq!(Rating::new(1).map(Rating::get), Some(1));
        assert_eq!(Rating::new(5).map(Rating::get), Some(5));
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
    }

    #[test]
    fn patch_clamps_rating_into_range() {
        let mut draft = filled();
        for (input, expected) in [(-3, 1), (0, 1), (1, 1), (5, 5), (6, 5), (i64::MAX, 5)] {
            draft.apply(ReviewPatch {
                rating: Some(input),
                ..Default::default()
            });
            assert_eq!(draft.rating.get(), expected, "input {input}");
        }
    }

    #[test]
    fn rating_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("0").is_err());
        assert!(serde_json::from_str::<Rating>("6").is_err());
        assert_eq!(serde_json::from_str::<Rating>("5").unwrap().get(), 5);
    }

    #[test]
    fn rating_label_pluralizes() {
        assert_eq!(Rating::clamped(1).label(), "1 Star");
        assert_eq!(Rating::clamped(4).label(), "4 Stars");
    }

    #[test]
    fn patch_leaves_absent_fields_alone() {
        let mut draft = filled();
        draft.apply(ReviewPatch {
            specific_spot: Some("window seats".to_string()),
            ..Default::default()
        });
        assert_eq!(draft.spot_name, "KSL 3rd Floor");
        assert_eq!(draft.specific_spot, "window seats");
    }

    #[test]
    fn validate_requires_name_and_text() {
        let errors = ReviewDraft::default().validate().unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["spotName", "reviewText"]);

        let blank = ReviewDraft {
            spot_name: "   ".to_string(),
            review_text: "ok".to_string(),
            ..Default::default()
        };
        let fields: Vec<String> = blank
            .validate()
            .unwrap_err()
            .fields()
            .map(String::from)
            .collect();
        assert_eq!(fields, vec!["spotName".to_string()]);
    }

    #[test]
    fn validated_text_is_kept_as_typed() {
        let draft = ReviewDraft {
            spot_name: "  Melt ".to_string(),
            review_text: "Great sandwiches\n".to_string(),
            specific_spot: " counter seats".to_string(),
            ..Default::default()
        };
        let review = draft.validate().unwrap();
        assert_eq!(review.spot_name(), "  Melt ");
        assert_eq!(review.review_text(), "Great sandwiches\n");
        assert_eq!(review.specific_spot(), " counter seats");
    }

    #[test]
    fn specific_spot_is_optional() {
        let review = filled().validate().unwrap();
        assert_eq!(review.spot_name(), "KSL 3rd Floor");
        assert_eq!(review.specific_spot(), "");
        assert_eq!(review.rating().get(), 3);
    }

    #[test]
    fn draft_uses_form_field_names() {
        let json = serde_json::to_value(filled()).unwrap();
        assert_eq!(json["spotName"], "KSL 3rd Floor");
        assert_eq!(json["rating"], 3);
        assert_eq!(json["specificSpot"], "");
    }
}
