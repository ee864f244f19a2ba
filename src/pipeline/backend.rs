use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Generation backend abstraction (allows mocking).
///
/// One call is one attempt: the backend never retries internally, and it
/// makes no promise that the returned text is well-formed JSON; that is
/// the validator's concern.
pub trait GenerationBackend: Send + Sync {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        params: &GenerationParams,
    ) -> Result<String, PipelineError>;
}

/// HTTP client for an OpenAI-compatible chat-completions backend.
pub struct OpenAiBackend {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiBackend {
    /// Create a backend client with a bounded request timeout.
    ///
    /// The timeout is the only local defense against a hung generation
    /// call; without it one slow request could pin a worker indefinitely.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        }
    }
}

/// Request body for POST {base}/chat/completions
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from the chat-completions endpoint
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl GenerationBackend for OpenAiBackend {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        params: &GenerationParams,
    ) -> Result<String, PipelineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    PipelineError::GenerationUnavailable(format!(
                        "cannot reach {}",
                        self.base_url
                    ))
                } else if e.is_timeout() {
                    PipelineError::GenerationUnavailable(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    PipelineError::GenerationUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PipelineError::BackendRejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().map_err(|e| {
            PipelineError::GenerationUnavailable(format!("invalid backend payload: {e}"))
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            PipelineError::GenerationUnavailable("backend returned no choices".into())
        })?;

        Ok(choice.message.content)
    }
}

/// Mock backend for testing — returns a configured response or failure
/// and counts how often it was invoked.
#[cfg(test)]
pub struct MockBackend {
    response: Result<String, String>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A backend whose single attempt fails as unavailable.
    pub fn unavailable(detail: &str) -> Self {
        Self {
            response: Err(detail.to_string()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl GenerationBackend for MockBackend {
    fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _system: &str,
        _params: &GenerationParams,
    ) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(detail) => Err(PipelineError::GenerationUnavailable(detail.clone())),
        }
    }
}
