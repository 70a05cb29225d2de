use crate::error::{Error, Result};
use crate::session::Message;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Payload for creating a new interview record
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterview<'a> {
    pub role: &'a str,
    pub tech_stack: &'a str,
    pub messages: &'a [Message],
}

/// Partial update: one or both of the transcript and the feedback.
/// Absent fields are left untouched by the store (last write wins).
#[derive(Debug, Default, Serialize)]
pub struct InterviewUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<&'a [Message]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<&'a str>,
}

impl<'a> InterviewUpdate<'a> {
    pub fn messages(messages: &'a [Message]) -> Self {
        Self {
            messages: Some(messages),
            ..Default::default()
        }
    }

    pub fn feedback(feedback: &'a str) -> Self {
        Self {
            feedback: Some(feedback),
            ..Default::default()
        }
    }
}

/// Interview record as returned by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredInterview {
    /// Store-assigned identifier, opaque and stable
    #[serde(rename = "_id")]
    pub id: String,

    pub role: String,
    pub tech_stack: String,
    pub messages: Vec<Message>,

    #[serde(default)]
    pub feedback: String,
}

/// Idempotent push of the growing transcript to the external store.
///
/// Fire-and-forget from the state machine's perspective, but each call
/// completes (or fails visibly) before the coordinator takes the next
/// dependent step. No offline queue, no retry.
#[async_trait::async_trait]
pub trait InterviewStore: Send + Sync {
    async fn create(&self, new: NewInterview<'_>) -> Result<StoredInterview>;
    async fn update(&self, id: &str, update: InterviewUpdate<'_>) -> Result<()>;
}

/// HTTP-backed store client
///
/// Every call carries the opaque credential in the `x-auth-token` header;
/// a 401 means the credential is no longer good and the client must
/// re-authenticate.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpStore {
    pub fn new(client: reqwest::Client, base_url: &str, auth_token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.header("x-auth-token", token),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Store {} failed with {}: {}", what, status, body);
            return Err(Error::Upstream(format!("store {} returned {}", what, status)));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl InterviewStore for HttpStore {
    async fn create(&self, new: NewInterview<'_>) -> Result<StoredInterview> {
        let url = format!("{}/api/interviews", self.base_url);

        let response = self
            .request(self.client.post(&url))
            .json(&new)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("store create failed: {}", e)))?;

        let stored: StoredInterview = Self::check(response, "create")
            .await?
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("unreadable store response: {}", e)))?;

        info!("Created interview {} in store", stored.id);
        Ok(stored)
    }

    async fn update(&self, id: &str, update: InterviewUpdate<'_>) -> Result<()> {
        let url = format!("{}/api/interviews/{}", self.base_url, id);

        let response = self
            .request(self.client.put(&url))
            .json(&update)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("store update failed: {}", e)))?;

        Self::check(response, "update").await?;
        Ok(())
    }
}
