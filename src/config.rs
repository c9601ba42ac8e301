use std::num::NonZeroU32;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Without a key the AI endpoint serves its static list.
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub ai_model: String,
    pub static_dir: String,
    pub ai_rate_limit_per_minute: NonZeroU32,
    /// Origin allowed by the CORS layer. Any origin when unset.
    pub frontend_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset and
    /// unparsable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!("Invalid PORT, using {}: {}", DEFAULT_PORT, e);
                DEFAULT_PORT
            }
            None => DEFAULT_PORT,
        };

        let ai_rate_limit_per_minute = get("AI_RATE_LIMIT_PER_MINUTE")
            .and_then(|v| v.parse::<u32>().ok())
            .and_then(NonZeroU32::new)
            .unwrap_or(nonzero_ext::nonzero!(10u32));

        Self {
            port,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_api_base: get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            ai_model: get("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            ai_rate_limit_per_minute,
            frontend_url: get("FRONTEND_URL"),
        }
    }
}
