//! OpenAI-compatible chat-completions client. Any endpoint speaking the
//! `/v1/chat/completions` wire format works; the URL comes from config.

use super::http_client::build_client;
use super::traits::Provider;
use super::types::{
    ContentBlock, GenerationParams, ImageSource, MessageRole, ProviderMessage, ProviderResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAiProvider {
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    api_url: String,
    client: Client,
}

// ─── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlContent },
}

#[derive(Debug, Serialize)]
struct ImageUrlContent {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// ─── Mapping ────────────────────────────────────────────────────────────────

fn role_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    }
}

fn map_message(message: &ProviderMessage) -> WireMessage {
    let mut text_parts = Vec::new();
    let mut image_parts = Vec::new();

    for block in &message.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text.clone()),
            ContentBlock::Image { source } => {
                let url = match source {
                    ImageSource::Base64 { media_type, data } => {
                        format!("data:{media_type};base64,{data}")
                    }
                    ImageSource::Url { url } => url.clone(),
                };
                image_parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrlContent { url },
                });
            }
        }
    }

    let content = if image_parts.is_empty() {
        WireContent::Text(text_parts.join("\n"))
    } else {
        let mut parts = Vec::new();
        if !text_parts.is_empty() {
            parts.push(ContentPart::Text {
                text: text_parts.join("\n"),
            });
        }
        parts.extend(image_parts);
        WireContent::Parts(parts)
    };

    WireMessage {
        role: role_str(message.role),
        content,
    }
}

fn build_request(
    system_prompt: Option<&str>,
    messages: &[ProviderMessage],
    model: &str,
    params: &GenerationParams,
) -> ChatRequest {
    let mut wire_messages = Vec::with_capacity(messages.len() + 1);

    if let Some(sys) = system_prompt {
        wire_messages.push(WireMessage {
            role: "system",
            content: WireContent::Text(sys.to_string()),
        });
    }

    for message in messages {
        wire_messages.push(map_message(message));
    }

    ChatRequest {
        model: model.to_string(),
        messages: wire_messages,
        temperature: params.temperature,
        max_tokens: params.max_tokens,
        frequency_penalty: params.frequency_penalty,
    }
}

// ─── Provider impl ──────────────────────────────────────────────────────────

impl OpenAiProvider {
    pub fn new(api_url: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            api_url: api_url.into(),
            client: build_client(),
        }
    }

    async fn send(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let auth_header = self
            .cached_auth_header
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("openai: no API key configured"))?;

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .map_err(|error| anyhow::anyhow!("openai request failed: {error}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            anyhow::bail!("openai returned {status}: {snippet}");
        }

        response
            .json()
            .await
            .map_err(|error| anyhow::anyhow!("openai response JSON decode failed: {error}"))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        model: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<ProviderResponse> {
        let request = build_request(system_prompt, messages, model, params);
        let chat_response = self.send(&request).await?;

        let text = chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No response from openai"))?;

        let mut provider_response = match chat_response.usage {
            Some(usage) => {
                ProviderResponse::with_usage(text, usage.prompt_tokens, usage.completion_tokens)
            }
            None => ProviderResponse::text_only(text),
        };
        if let Some(api_model) = chat_response.model {
            provider_response = provider_response.with_model(api_model);
        }
        Ok(provider_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_places_system_prompt_first() {
        let messages = vec![ProviderMessage::user("hello")];
        let params = GenerationParams::new(0.7, 1000);
        let request = build_request(Some("be helpful"), &messages, "gpt-4o", &params);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "be helpful");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert!(value.get("frequency_penalty").is_none());
    }

    #[test]
    fn build_request_serializes_penalty_when_set() {
        let params = GenerationParams::new(0.2, 1500).with_frequency_penalty(0.5);
        let request = build_request(None, &[ProviderMessage::user("hi")], "gpt-4o", &params);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["frequency_penalty"], 0.5);
        assert_eq!(value["max_tokens"], 1500);
    }

    #[test]
    fn image_message_becomes_content_parts() {
        let message = ProviderMessage::user_with_image(
            "this is the previous report",
            ImageSource::url("https://example.com/r.png"),
        );
        let wire = map_message(&message);
        let value = serde_json::to_value(&wire).unwrap();

        assert_eq!(value["role"], "user");
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][1]["type"], "image_url");
        assert_eq!(
            value["content"][1]["image_url"]["url"],
            "https://example.com/r.png"
        );
    }

    #[test]
    fn base64_image_becomes_data_url() {
        let message = ProviderMessage {
            role: MessageRole::User,
            content: vec![ContentBlock::Image {
                source: ImageSource::base64("image/png", "aGVsbG8="),
            }],
        };
        let value = serde_json::to_value(map_message(&message)).unwrap();
        assert_eq!(
            value["content"][0]["image_url"]["url"],
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn response_parses_usage_and_model() {
        let raw = serde_json::json!({
            "choices": [{"message": {"content": "hi there"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7},
            "model": "gpt-4o-2024-08-06"
        });
        let parsed: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi there"));
        assert_eq!(parsed.usage.as_ref().unwrap().prompt_tokens, 12);
        assert_eq!(parsed.model.as_deref(), Some("gpt-4o-2024-08-06"));
    }
}
