use crate::config::ServerConfig;
use crate::error::IdeaError;
use crate::utils::ideas::parse_model_reply;
use openai_api_rs::v1::{api::OpenAIClient, chat_completion};

pub const SYSTEM_PROMPT: &str =
    "You are an expert direct-response marketer. Return only a JSON array of short strings.";
pub const TEMPERATURE: f64 = 0.8;

/// `None` when no key is configured.
pub fn create_openai_client(config: &ServerConfig) -> Result<Option<OpenAIClient>, IdeaError> {
    let Some(api_key) = config.openai_api_key.clone() else {
        return Ok(None);
    };
    OpenAIClient::builder()
        .with_endpoint(config.openai_api_base.clone())
        .with_api_key(api_key)
        .build()
        .map(Some)
        .map_err(|e| IdeaError::Client(e.to_string()))
}

pub fn user_prompt(prompt: &str, n: usize) -> String {
    format!("{} Return {} options, max 12 words each.", prompt, n)
}

pub async fn request_ideas(
    client: &OpenAIClient,
    model: &str,
    prompt: &str,
    n: usize,
) -> Result<Vec<String>, IdeaError> {
    let messages = vec![
        chat_completion::ChatCompletionMessage {
            role: chat_completion::MessageRole::system,
            content: chat_completion::Content::Text(SYSTEM_PROMPT.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
        chat_completion::ChatCompletionMessage {
            role: chat_completion::MessageRole::user,
            content: chat_completion::Content::Text(user_prompt(prompt, n)),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
    ];

    let request = chat_completion::ChatCompletionRequest::new(model.to_string(), messages)
        .temperature(TEMPERATURE);

    let result = client
        .chat_completion(request)
        .await
        .map_err(|e| IdeaError::Upstream(e.to_string()))?;

    let text = result
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .unwrap_or_default();

    let ideas = parse_model_reply(&text, n);
    if ideas.is_empty() {
        return Err(IdeaError::EmptyReply);
    }
    tracing::debug!("Model returned {} ideas", ideas.len());
    Ok(ideas)
}
