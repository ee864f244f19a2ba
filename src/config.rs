use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "dentalnote";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,tower_http=info")
}

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
    /// Base URL of the generation backend (OpenAI-compatible).
    pub backend_base_url: String,
    /// API key for the generation backend.
    pub backend_api_key: String,
    /// Model identifier sent with every generation request.
    pub model: String,
    /// Request timeout for a single generation call, in seconds.
    pub generation_timeout_secs: u64,
    /// Maximum tokens the model may produce per consultation note.
    pub max_tokens: u32,
    /// Sampling temperature for generation.
    pub temperature: f32,
}

impl ServiceConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// `OPENAI_API_KEY` has no default; generation requests fail with an
    /// auth error upstream if it is missing, which is surfaced like any
    /// other backend failure.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("DENTALNOTE_ADDR", "127.0.0.1:8000"),
            db_path: PathBuf::from(env_or("DENTALNOTE_DB", "dentalnote.db")),
            backend_base_url: env_or("GENERATION_BASE_URL", "https://api.openai.com/v1"),
            backend_api_key: env_or("OPENAI_API_KEY", ""),
            model: env_or("GENERATION_MODEL", "gpt-4o-mini"),
            generation_timeout_secs: env_parse_or("GENERATION_TIMEOUT_SECS", 60),
            max_tokens: env_parse_or("GENERATION_MAX_TOKENS", 512),
            temperature: env_parse_or("GENERATION_TEMPERATURE", 0.2),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            db_path: PathBuf::from("dentalnote.db"),
            backend_base_url: "https://api.openai.com/v1".into(),
            backend_api_key: String::new(),
            model: "gpt-4o-mini".into(),
            generation_timeout_secs: 60,
            max_tokens: 512,
            temperature: 0.2,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
