//! REST profile store.
//!
//! Routes, relative to the configured base URL:
//!
//! | Operation        | Request                                       |
//! |------------------|-----------------------------------------------|
//! | `create_profile` | `POST /profiles/{id}`                         |
//! | `get_points`     | `GET /profiles/{id}`                          |
//! | `set_points`     | `PUT /profiles/{id}` with `{"points": n}`     |
//! | `add_points`     | `POST /profiles/{id}/points` with `{"delta"}` |
//! | `top`            | `GET /leaderboard?limit=n`                    |
//!
//! `add_points` is applied by the server in one step and answers with the
//! points before and after the change.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use tracing::instrument;

use studyduel_core::model::RankProfile;
use studyduel_core::traits::{PointsUpdate, ProfileStore};

use crate::StoreError;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Profile store backed by a remote REST service.
pub struct HttpStore {
    base_url: Url,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Serialize)]
struct SetPointsBody {
    points: u32,
}

#[derive(Serialize)]
struct AddPointsBody {
    delta: i64,
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Network(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Network(format!(
                "invalid base URL '{base_url}': not a hierarchical URL"
            )));
        }
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Send a request, mapping transport failures and error statuses.
    async fn send(
        &self,
        request: RequestBuilder,
        account_id: Option<&str>,
    ) -> Result<Response, StoreError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                StoreError::Network(format!("profile service not reachable at {}", self.base_url))
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(account_id) = account_id {
                return Err(StoreError::UnknownAccount(account_id.to_string()));
            }
        }
        if status.is_client_error() || status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl ProfileStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn create_profile(&self, account_id: &str) -> Result<RankProfile, StoreError> {
        let request = self.client.post(self.url(&["profiles", account_id]));
        Self::parse(self.send(request, None).await?).await
    }

    #[instrument(skip(self))]
    async fn get_points(&self, account_id: &str) -> Result<u32, StoreError> {
        let request = self.client.get(self.url(&["profiles", account_id]));
        let profile: RankProfile = Self::parse(self.send(request, Some(account_id)).await?).await?;
        Ok(profile.points)
    }

    #[instrument(skip(self))]
    async fn set_points(&self, account_id: &str, points: u32) -> Result<(), StoreError> {
        let request = self
            .client
            .put(self.url(&["profiles", account_id]))
            .json(&SetPointsBody { points });
        self.send(request, Some(account_id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_points(&self, account_id: &str, delta: i64) -> Result<PointsUpdate, StoreError> {
        let request = self
            .client
            .post(self.url(&["profiles", account_id, "points"]))
            .json(&AddPointsBody { delta });
        Self::parse(self.send(request, Some(account_id)).await?).await
    }

    #[instrument(skip(self))]
    async fn top(&self, limit: usize) -> Result<Vec<RankProfile>, StoreError> {
        let mut url = self.url(&["leaderboard"]);
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        Self::parse(self.send(self.client.get(url), None).await?).await
    }
}
