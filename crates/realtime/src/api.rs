//! REST API client for the notification endpoints.
//!
//! The push channel is fire-and-forget; these endpoints are what the
//! client reconciles against (first page, paging, unread count, deletes).
//! Every response body is wrapped in the backend's `{ "data": ... }`
//! envelope.

use serde::Deserialize;
use ustaz_core::{Notification, Pagination};

/// HTTP client for the notification endpoints of one backend.
#[derive(Debug, Clone)]
pub struct NotificationApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

/// Query parameters for `GET /notifications`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Filter by read flag; `None` returns both.
    pub is_read: Option<bool>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl ListQuery {
    /// Query for the 1-based `page` of size `limit`.
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            is_read: None,
            limit: Some(limit),
            skip: Some(page.saturating_sub(1) * limit),
        }
    }

    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(is_read) = self.is_read {
            pairs.push(("isRead", is_read.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        pairs
    }
}

/// One page of notifications as returned by `GET /notifications`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
    #[serde(default)]
    pub unread_count: u64,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UnreadCount {
    count: u64,
}

/// Errors from the notification REST layer.
#[derive(Debug, thiserror::Error)]
pub enum NotificationApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Notification API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl NotificationApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, NotificationApiError::ApiError { status: 401, .. })
    }
}

impl NotificationApi {
    /// * `api_url` - base URL, e.g. `https://api.example.com/api`.
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `GET /notifications`
    pub async fn list(&self, query: &ListQuery) -> Result<NotificationPage, NotificationApiError> {
        let response = self
            .client
            .get(format!("{}/notifications", self.api_url))
            .bearer_auth(&self.token)
            .query(&query.to_pairs())
            .send()
            .await?;

        Self::parse_data(response).await
    }

    /// `GET /notifications/unread-count`
    pub async fn unread_count(&self) -> Result<u64, NotificationApiError> {
        let response = self
            .client
            .get(format!("{}/notifications/unread-count", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let unread: UnreadCount = Self::parse_data(response).await?;
        Ok(unread.count)
    }

    /// `PUT /notifications/{id}/read`. Returns the updated notification.
    pub async fn mark_as_read(&self, id: &str) -> Result<Notification, NotificationApiError> {
        let response = self
            .client
            .put(format!("{}/notifications/{}/read", self.api_url, id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse_data(response).await
    }

    /// `PUT /notifications/read-all`
    pub async fn mark_all_as_read(&self) -> Result<(), NotificationApiError> {
        let response = self
            .client
            .put(format!("{}/notifications/read-all", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// `DELETE /notifications/{id}`
    pub async fn delete(&self, id: &str) -> Result<(), NotificationApiError> {
        let response = self
            .client
            .delete(format!("{}/notifications/{}", self.api_url, id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, NotificationApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), "Notification API request failed");
            return Err(NotificationApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Unwrap the `{ "data": T }` envelope of a successful response.
    async fn parse_data<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, NotificationApiError> {
        let response = Self::ensure_success(response).await?;
        let envelope = response.json::<Envelope<T>>().await?;
        Ok(envelope.data)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), NotificationApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
