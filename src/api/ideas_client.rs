use crate::error::IdeaError;
use crate::handlers::ai_dtos::{AiRequest, AiResponse};
use crate::utils::ideas::CLIENT_FALLBACK_IDEAS;

pub const DEFAULT_TOPIC: &str = "local gym in Montreal";

pub fn campaign_prompt(topic: &str) -> String {
    format!(
        "Generate 5 punchy ad campaign ideas for {}. Short, high-converting.",
        topic
    )
}

/// Calls the AI endpoint for campaign ideas, the way the landing page widget does.
#[derive(Clone)]
pub struct IdeaClient {
    http: reqwest::Client,
    endpoint: String,
}

impl IdeaClient {
    /// `endpoint` is the full URL of the AI route, e.g. `http://localhost:3000/api/ai`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Never fails: any transport or decoding problem yields the local list.
    pub async fn generate(&self, topic: &str) -> Vec<String> {
        match self.try_generate(topic).await {
            Ok(ideas) if !ideas.is_empty() => ideas,
            Ok(_) => {
                tracing::warn!("Idea endpoint returned no ideas, using local list");
                Self::fallback()
            }
            Err(e) => {
                tracing::warn!("Idea request failed, using local list: {}", e);
                Self::fallback()
            }
        }
    }

    pub async fn try_generate(&self, topic: &str) -> Result<Vec<String>, IdeaError> {
        let body = AiRequest {
            prompt: campaign_prompt(topic),
            count: 5,
        };
        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(IdeaError::Status(response.status()));
        }
        let data: AiResponse = response.json().await?;
        Ok(data.ideas)
    }

    pub fn fallback() -> Vec<String> {
        CLIENT_FALLBACK_IDEAS.iter().map(|s| s.to_string()).collect()
    }
}
