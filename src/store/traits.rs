//! Collaborator traits — the persistence and session operations the
//! onboarding flow depends on.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::onboarding::model::{Profile, ProfilePatch, ReviewKind, ReviewRecord, SessionUser, StoredReview};

/// Profile and review persistence.
#[async_trait]
pub trait OnboardingStore: Send + Sync {
    /// Overwrite the user's preferences and onboarded flag.
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError>;

    /// Insert all records in one batched call.
    async fn insert_reviews(&self, records: &[ReviewRecord]) -> Result<(), StoreError>;

    /// Fetch a profile row, `None` if the user has none yet.
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Most recent community reviews, newest first.
    async fn list_reviews(
        &self,
        kind: Option<ReviewKind>,
        limit: usize,
    ) -> Result<Vec<StoredReview>, StoreError>;
}

/// Resolves an access token to the signed-in user.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` when the token is unknown or expired.
    async fn user_for_token(&self, access_token: &str) -> Result<Option<SessionUser>, StoreError>;
}
