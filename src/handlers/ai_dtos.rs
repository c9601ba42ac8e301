use crate::utils::ideas::{parse_count, sanitize_prompt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AiRequest {
    pub prompt: String,
    pub count: usize,
}

impl AiRequest {
    /// Lenient read of a request body: `prompt` may be any value and `count`
    /// a number or numeric string. Only a JSON `null` body is rejected.
    pub fn from_value(body: &Value) -> Option<Self> {
        if body.is_null() {
            return None;
        }
        Some(Self {
            prompt: sanitize_prompt(body.get("prompt")),
            count: parse_count(body.get("count")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AiResponse {
    #[serde(default)]
    pub ideas: Vec<String>,
}
