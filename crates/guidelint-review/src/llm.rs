use std::time::Duration;

use guidelint_core::{GuidelintError, LlmConfig};
use serde::{Deserialize, Serialize};

use crate::prompt::build_system_prompt;

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use guidelint_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this code".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use guidelint_review::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes `/chat/completions` under the
/// configured base URL: OpenAI, Ollama, vLLM, LiteLLM, Scaleway, etc.
/// Requests are sent once; there are no retries.
///
/// # Examples
///
/// ```
/// use guidelint_core::LlmConfig;
/// use guidelint_review::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gpt-4o");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GuidelintError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, GuidelintError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GuidelintError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full URL of the chat completions endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use guidelint_core::LlmConfig;
    /// use guidelint_review::llm::LlmClient;
    ///
    /// let config = LlmConfig {
    ///     base_url: "http://localhost:11434/v1/".into(),
    ///     ..LlmConfig::default()
    /// };
    /// let client = LlmClient::new(&config).unwrap();
    /// assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    /// ```
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Review one assembled batch prompt and return the raw reply text.
    ///
    /// # Errors
    ///
    /// See [`LlmClient::chat`].
    pub async fn review(&self, prompt: &str) -> Result<String, GuidelintError> {
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: build_system_prompt().to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: prompt.to_string(),
            },
        ];
        self.chat(messages).await
    }

    /// Send a chat completion request and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`GuidelintError::Llm`] on transport errors, a non-success
    /// status, an unreadable body, or an empty first choice.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, GuidelintError> {
        let body = self.request_body(&messages);

        let mut request = self.client.post(self.endpoint());
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| GuidelintError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GuidelintError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GuidelintError::Llm(format!("failed to parse response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GuidelintError::Llm("empty response".into()))
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "presence_penalty": 0,
            "top_p": self.config.top_p,
            "seed": self.config.seed,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_construction_succeeds() {
        let config = LlmConfig::default();
        let client = LlmClient::new(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn model_returns_config_model() {
        let config = LlmConfig {
            model: "gpt-4o-mini".into(),
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn chat_message_serializes() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn request_body_carries_sampling_settings() {
        let config = LlmConfig {
            model: "mistral-small".into(),
            temperature: 0.0,
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        let body = client.request_body(&[ChatMessage {
            role: Role::User,
            content: "x".into(),
        }]);

        assert_eq!(body["model"], "mistral-small");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 8000);
        assert_eq!(body["presence_penalty"], 0);
        assert_eq!(body["top_p"], 0.5);
        assert_eq!(body["seed"], 1234);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn completion_content_extraction() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"comments\":[]}"}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(raw).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("{\"comments\":[]}")
        );

        let empty: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.choices.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_llm_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 5,
            ..LlmConfig::default()
        };
        let client = LlmClient::new(&config).unwrap();
        let result = client.review("prompt").await;
        assert!(matches!(result, Err(GuidelintError::Llm(_))));
    }
}
