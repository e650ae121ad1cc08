//! Naming services: turn a set of file names into a short topic.
//!
//! The chat-completion client is opt-in and needs an API key. Only file names
//! are sent, never media content. The keyword heuristic works offline.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AiError, AiResult};

/// Name used when a group cannot be named.
pub const GROUP_FALLBACK: &str = "Untitled Group";
/// Topic used when the chat service fails.
pub const TOPIC_FALLBACK: &str = "Untitled";

/// Environment variable holding the chat API key.
pub const API_KEY_ENV: &str = "REEL_NAMING_API_KEY";
/// Environment variable overriding the chat endpoint.
pub const API_URL_ENV: &str = "REEL_NAMING_API_URL";

/// Something that can produce a short name for a set of file names.
#[allow(async_fn_in_trait)]
pub trait NamingService {
    async fn name_group(&self, names: &[String]) -> AiResult<String>;
}

/// Name a group, falling back to [`GROUP_FALLBACK`].
///
/// Blank names are dropped first; no input, a service error or an empty
/// answer all produce the fallback.
pub async fn name_or_fallback<S: NamingService + ?Sized>(service: &S, names: &[String]) -> String {
    let valid: Vec<String> = names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .cloned()
        .collect();
    if valid.is_empty() {
        debug!("No valid file names to name");
        return GROUP_FALLBACK.to_string();
    }
    match service.name_group(&valid).await {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(_) => GROUP_FALLBACK.to_string(),
        Err(e) => {
            warn!(error = %e, "Naming service failed, using fallback name");
            GROUP_FALLBACK.to_string()
        }
    }
}

// ── Chat completion client ──────────────────────────────────────

/// Configuration for the chat-completion naming client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatNamingConfig {
    /// Chat completions endpoint URL.
    pub api_url: String,
    /// API key (read from the environment, never stored in project files).
    #[serde(skip)]
    pub api_key: String,
    /// Model to ask.
    pub model: String,
    /// Maximum tokens for the answer.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatNamingConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            max_tokens: 10,
            timeout_secs: 15,
        }
    }
}

impl ChatNamingConfig {
    /// Defaults, with key and endpoint taken from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.api_key = key;
        }
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url;
            }
        }
        config
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

/// The prompt sent for a set of names.
pub fn topic_prompt(names: &[String]) -> String {
    format!(
        "Based on the given content, generate a short topic: {}",
        names.join(" ")
    )
}

fn answer_text(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .map(|m| m.content.trim().to_string())
        .unwrap_or_default()
}

/// Names groups by asking an OpenAI-compatible chat completion endpoint.
pub struct ChatNamingService {
    config: ChatNamingConfig,
    client: reqwest::Client,
}

impl ChatNamingService {
    /// Create a client. Fails without an API key.
    pub fn new(config: ChatNamingConfig) -> AiResult<Self> {
        if config.api_key.is_empty() {
            return Err(AiError::NotConfigured(format!(
                "set {API_KEY_ENV} to enable the naming service"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChatNamingConfig {
        &self.config
    }

    /// Topic for some content, or [`TOPIC_FALLBACK`] if the request fails.
    ///
    /// An empty answer is returned as an empty string.
    pub async fn clip_topic(&self, content: &[String]) -> String {
        match self.request_topic(content).await {
            Ok(topic) => topic,
            Err(e) => {
                warn!(error = %e, "Topic request failed");
                TOPIC_FALLBACK.to_string()
            }
        }
    }

    async fn request_topic(&self, content: &[String]) -> AiResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: "You are a helpful assistant.".into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: topic_prompt(content),
                },
            ],
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: ChatResponse = response.json().await?;
        let topic = answer_text(parsed);
        debug!(topic = %topic, inputs = content.len(), "Topic received");
        Ok(topic)
    }
}

impl NamingService for ChatNamingService {
    async fn name_group(&self, names: &[String]) -> AiResult<String> {
        let topic = self.clip_topic(names).await;
        if topic.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(topic)
    }
}

// ── Offline heuristic ───────────────────────────────────────────

/// Names a group after the words its file names share most.
#[derive(Debug, Clone, Default)]
pub struct KeywordNamingService;

impl KeywordNamingService {
    pub fn new() -> Self {
        Self
    }

    /// Lowercased words of a file name, without extension or numbering.
    fn words(name: &str) -> Vec<String> {
        let stem = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && ext.len() <= 4 => stem,
            _ => name,
        };
        stem.split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() >= 3 && !w.chars().all(|c| c.is_ascii_digit()))
            .map(|w| w.to_lowercase())
            .collect()
    }

    /// Best name for `names`, if any word survives filtering.
    pub fn suggest(&self, names: &[String]) -> Option<String> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut order = 0;
        for name in names {
            let mut seen = Vec::new();
            for word in Self::words(name) {
                if seen.contains(&word) {
                    continue;
                }
                let entry = counts.entry(word.clone()).or_insert((0, order));
                entry.0 += 1;
                order += 1;
                seen.push(word);
            }
        }

        let mut ranked: Vec<(String, usize, usize)> =
            counts.into_iter().map(|(w, (n, first))| (w, n, first)).collect();
        // Most shared first, then earliest seen.
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let top = ranked.first()?.1;
        let words: Vec<String> = ranked
            .iter()
            .filter(|(_, n, _)| *n == top)
            .take(2)
            .map(|(w, _, _)| capitalize(w))
            .collect();
        Some(words.join(" "))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl NamingService for KeywordNamingService {
    async fn name_group(&self, names: &[String]) -> AiResult<String> {
        if names.is_empty() {
            return Err(AiError::NoInput);
        }
        self.suggest(names).ok_or(AiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNaming(AiResult<String>);

    impl NamingService for FixedNaming {
        async fn name_group(&self, _names: &[String]) -> AiResult<String> {
            match &self.0 {
                Ok(name) => Ok(name.clone()),
                Err(_) => Err(AiError::EmptyResponse),
            }
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fallback_on_error_and_empty() {
        let failing = FixedNaming(Err(AiError::EmptyResponse));
        assert_eq!(name_or_fallback(&failing, &names(&["a.mp4"])).await, GROUP_FALLBACK);

        let blank = FixedNaming(Ok("   ".into()));
        assert_eq!(name_or_fallback(&blank, &names(&["a.mp4"])).await, GROUP_FALLBACK);

        let ok = FixedNaming(Ok(" Beach Trip ".into()));
        assert_eq!(name_or_fallback(&ok, &names(&["", "a.mp4"])).await, "Beach Trip");
    }

    #[tokio::test]
    async fn test_fallback_without_valid_names() {
        let ok = FixedNaming(Ok("Never asked".into()));
        assert_eq!(name_or_fallback(&ok, &[]).await, GROUP_FALLBACK);
        assert_eq!(name_or_fallback(&ok, &names(&["", "  "])).await, GROUP_FALLBACK);
    }

    #[test]
    fn test_prompt_format() {
        assert_eq!(
            topic_prompt(&names(&["beach.mp4", "sunset.mp4"])),
            "Based on the given content, generate a short topic: beach.mp4 sunset.mp4"
        );
    }

    #[test]
    fn test_chat_requires_api_key() {
        let result = ChatNamingService::new(ChatNamingConfig::default());
        assert!(matches!(result, Err(AiError::NotConfigured(_))));
    }

    #[test]
    fn test_chat_config_defaults() {
        let config = ChatNamingConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 10);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_answer_text_trims() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  Cooking \n"}}]}"#,
        )
        .unwrap();
        assert_eq!(answer_text(response), "Cooking");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(answer_text(empty), "");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_gives_topic_fallback() {
        let config = ChatNamingConfig {
            api_url: "http://127.0.0.1:9/v1/chat/completions".into(),
            api_key: "test-key".into(),
            timeout_secs: 2,
            ..Default::default()
        };
        let service = ChatNamingService::new(config).unwrap();
        assert_eq!(service.clip_topic(&names(&["a.mp4"])).await, TOPIC_FALLBACK);
        // The fallback topic is still a usable group name.
        assert_eq!(name_or_fallback(&service, &names(&["a.mp4"])).await, TOPIC_FALLBACK);
    }

    #[tokio::test]
    async fn test_keyword_naming() {
        let service = KeywordNamingService::new();
        let group = names(&["beach_day_01.mp4", "Beach-sunset.MOV", "beach_swim.mp4"]);
        assert_eq!(service.name_group(&group).await.unwrap(), "Beach");

        let pair = names(&["cooking pasta.mp4", "cooking pasta 2.mp4"]);
        assert_eq!(service.name_group(&pair).await.unwrap(), "Cooking Pasta");

        assert!(matches!(
            service.name_group(&names(&["01.mp4"])).await,
            Err(AiError::EmptyResponse)
        ));
        assert!(matches!(service.name_group(&[]).await, Err(AiError::NoInput)));
    }
}
