use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Clone)]
pub struct Config {
    pub google_search_api_key: String,
    pub google_cse_id: String,
    pub groq_api_key: String,
    pub model: String,
    pub llm_base_url: String,
    pub search_base_url: String,
    pub bind_addr: String,
    pub request_timeout: Duration,
    pub max_iterations: usize,
    pub max_tokens: u32,
    pub session_timeout: Duration,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        // Credentials are checked first so a missing key is reported before
        // anything else is parsed.
        let google_search_api_key = required("GOOGLE_SEARCH_API_KEY")?;
        let google_cse_id = required("GOOGLE_CSE_ID")?;
        let groq_api_key = required("GROQ_API_KEY")?;

        let timeout_secs: u64 = parse_or(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", 30)?;
        let max_iterations: usize = parse_or(get("MAX_ITERATIONS"), "MAX_ITERATIONS", 5)?;
        if max_iterations == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_ITERATIONS",
                reason: "must be at least 1".into(),
            });
        }
        let session_minutes: u64 =
            parse_or(get("SESSION_TIMEOUT_MINUTES"), "SESSION_TIMEOUT_MINUTES", 60)?;
        if session_minutes == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_TIMEOUT_MINUTES",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            google_search_api_key,
            google_cse_id,
            groq_api_key,
            model: get("MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            llm_base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.into()),
            search_base_url: get("SEARCH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.into()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8501".into()),
            request_timeout: Duration::from_secs(timeout_secs),
            max_iterations,
            max_tokens: parse_or(get("MAX_TOKENS"), "MAX_TOKENS", 1024)?,
            session_timeout: Duration::from_secs(session_minutes * 60),
            log_dir: get("LOG_DIR").unwrap_or_else(|| "logs".into()),
        })
    }
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("google_search_api_key", &"<redacted>")
            .field("google_cse_id", &"<redacted>")
            .field("groq_api_key", &"<redacted>")
            .field("model", &self.model)
            .field("llm_base_url", &self.llm_base_url)
            .field("search_base_url", &self.search_base_url)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("max_iterations", &self.max_iterations)
            .field("max_tokens", &self.max_tokens)
            .field("session_timeout", &self.session_timeout)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}
