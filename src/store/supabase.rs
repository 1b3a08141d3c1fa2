//! Supabase backend — PostgREST for tables, GoTrue for sessions.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::traits::{OnboardingStore, SessionProvider};
use crate::config::SupabaseConfig;
use crate::error::StoreError;
use crate::onboarding::model::{Profile, ProfilePatch, ReviewKind, ReviewRecord, SessionUser, StoredReview};

const BACKEND: &str = "supabase";

/// Talks to a Supabase project over its REST APIs.
pub struct SupabaseStore {
    base_url: String,
    service_key: SecretString,
    timeout: Duration,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::Request {
                backend: BACKEND.to_string(),
                operation: "build_client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            timeout: config.request_timeout,
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// A request authorized with the service key.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        self.client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, StoreError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout {
                    backend: BACKEND.to_string(),
                    operation: operation.to_string(),
                    timeout: self.timeout,
                }
            } else {
                StoreError::Request {
                    backend: BACKEND.to_string(),
                    operation: operation.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    /// Turn a non-2xx response into `StoreError::Rejected`.
    async fn ensure_success(operation: &str, resp: Response) -> Result<Response, StoreError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            backend: BACKEND.to_string(),
            operation: operation.to_string(),
            status,
            body,
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
        resp.json().await.map_err(|e| StoreError::InvalidResponse {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl OnboardingStore for SupabaseStore {
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError> {
        let operation = "update_profile";
        let request = self
            .request(Method::PATCH, &self.table_url("profiles"))
            .query(&profile_filter(user_id))
            .header("Prefer", "return=representation")
            .json(patch);
        let resp = Self::ensure_success(operation, self.send(operation, request).await?).await?;

        // PostgREST answers 200 with an empty array when the filter matched nothing.
        let rows: Vec<serde_json::Value> = Self::read_json(resp).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound {
                entity: "profile".to_string(),
                id: user_id.to_string(),
            });
        }
        tracing::debug!(user_id, "Profile updated");
        Ok(())
    }

    async fn insert_reviews(&self, records: &[ReviewRecord]) -> Result<(), StoreError> {
        let operation = "insert_reviews";
        let request = self
            .request(Method::POST, &self.table_url("reviews"))
            .header("Prefer", "return=minimal")
            .json(records);
        Self::ensure_success(operation, self.send(operation, request).await?).await?;
        tracing::debug!(count = records.len(), "Reviews inserted");
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let operation = "get_profile";
        let mut query = profile_filter(user_id);
        query.push(("select", "*".to_string()));
        let request = self
            .request(Method::GET, &self.table_url("profiles"))
            .query(&query);
        let resp = Self::ensure_success(operation, self.send(operation, request).await?).await?;
        let rows: Vec<Profile> = Self::read_json(resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_reviews(
        &self,
        kind: Option<ReviewKind>,
        limit: usize,
    ) -> Result<Vec<StoredReview>, StoreError> {
        let operation = "list_reviews";
        let request = self
            .request(Method::GET, &self.table_url("reviews"))
            .query(&review_query(kind, limit));
        let resp = Self::ensure_success(operation, self.send(operation, request).await?).await?;
        Self::read_json(resp).await
    }
}

#[async_trait]
impl SessionProvider for SupabaseStore {
    async fn user_for_token(&self, access_token: &str) -> Result<Option<SessionUser>, StoreError> {
        let operation = "user_for_token";
        let request = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(access_token);
        let resp = self.send(operation, request).await?;
        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        let resp = Self::ensure_success(operation, resp).await?;
        Ok(Some(Self::read_json(resp).await?))
    }
}

fn profile_filter(user_id: &str) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{user_id}"))]
}

fn review_query(kind: Option<ReviewKind>, limit: usize) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
        ("limit", limit.to_string()),
    ];
    if let Some(kind) = kind {
        query.push(("type", format!("eq.{kind}")));
    }
    query
}
