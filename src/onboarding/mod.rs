//! Onboarding wizard — the first-launch flow that collects a new user's
//! preferences and two seed reviews before unlocking the app.
//!
//! The wizard walks a fixed sequence of steps (see [`Step`]). Each step owns
//! only the data it needs (see [`Stage`]). The final step commits everything
//! to the store through the [`submission`] module and, once acknowledged,
//! publishes an [`OnboardingCompleted`] event.

pub mod model;
pub mod registry;
pub mod review;
pub mod routes;
pub mod state;
pub mod submission;
pub mod survey;
pub mod view;
pub mod wizard;

pub use model::{OnboardingCompleted, Profile, ReviewKind, ReviewRecord, SessionUser};
pub use registry::WizardRegistry;
pub use review::{Rating, Review, ReviewDraft, ReviewPatch};
pub use routes::onboarding_routes;
pub use state::{Stage, Step};
pub use survey::{DiningPreference, StudyPreference, SurveyAnswers, SurveyDraft};
pub use wizard::{OnboardingWizard, WizardAction};
