//! In-process store for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::traits::{OnboardingStore, SessionProvider};
use crate::error::StoreError;
use crate::onboarding::model::{Profile, ProfilePatch, ReviewKind, ReviewRecord, SessionUser, StoredReview};

/// Profiles, reviews and sessions held in memory.
#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<String, Profile>>,
    reviews: RwLock<Vec<StoredReview>>,
    sessions: RwLock<HashMap<String, SessionUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user with an empty profile, reachable through `access_token`.
    pub async fn register_user(&self, user: SessionUser, access_token: &str) {
        self.profiles
            .write()
            .await
            .entry(user.id.clone())
            .or_insert_with(|| Profile {
                id: user.id.clone(),
                ..Default::default()
            });
        self.sessions
            .write()
            .await
            .insert(access_token.to_string(), user);
    }

    /// Number of stored reviews.
    pub async fn review_count(&self) -> usize {
        self.reviews.read().await.len()
    }
}

#[async_trait]
impl OnboardingStore for MemoryStore {
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.get_mut(user_id).ok_or_else(|| StoreError::NotFound {
            entity: "profile".to_string(),
            id: user_id.to_string(),
        })?;
        profile.preferences = Some(serde_json::to_value(patch.preferences)?);
        profile.is_onboarded = patch.is_onboarded;
        debug!(user_id, "Profile updated");
        Ok(())
    }

    async fn insert_reviews(&self, records: &[ReviewRecord]) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut reviews = self.reviews.write().await;
        reviews.extend(records.iter().cloned().map(|record| StoredReview {
            id: Uuid::new_v4(),
            created_at: now,
            record,
        }));
        debug!(count = records.len(), "Reviews inserted");
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn list_reviews(
        &self,
        kind: Option<ReviewKind>,
        limit: usize,
    ) -> Result<Vec<StoredReview>, StoreError> {
        let reviews = self.reviews.read().await;
        Ok(reviews
            .iter()
            .rev()
            .filter(|r| kind.is_none_or(|k| r.record.kind == k))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionProvider for MemoryStore {
    async fn user_for_token(&self, access_token: &str) -> Result<Option<SessionUser>, StoreError> {
        Ok(self.sessions.read().await.get(access_token).cloned())
    }
}
