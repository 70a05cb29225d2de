use super::client::{InterviewStore, InterviewUpdate, NewInterview, StoredInterview};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// In-process interview store.
///
/// Backs offline practice mode (no store URL configured) and tests; records
/// live only as long as the service does.
#[derive(Default)]
pub struct MemoryStore {
    interviews: RwLock<HashMap<String, StoredInterview>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored record (primarily for assertions in tests)
    pub async fn get(&self, id: &str) -> Option<StoredInterview> {
        self.interviews.read().await.get(id).cloned()
    }
}

#[async_trait::async_trait]
impl InterviewStore for MemoryStore {
    async fn create(&self, new: NewInterview<'_>) -> Result<StoredInterview> {
        let stored = StoredInterview {
            id: uuid::Uuid::new_v4().to_string(),
            role: new.role.to_string(),
            tech_stack: new.tech_stack.to_string(),
            messages: new.messages.to_vec(),
            feedback: String::new(),
        };

        info!("Created interview {} in memory", stored.id);

        self.interviews
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, update: InterviewUpdate<'_>) -> Result<()> {
        let mut interviews = self.interviews.write().await;
        let stored = interviews
            .get_mut(id)
            .ok_or_else(|| Error::Upstream(format!("unknown interview {}", id)))?;

        if let Some(messages) = update.messages {
            stored.messages = messages.to_vec();
        }
        if let Some(feedback) = update.feedback {
            stored.feedback = feedback.to_string();
        }
        Ok(())
    }
}
