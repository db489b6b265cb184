//! Conversation Orchestrator: relays chat turns to the provider, triggers
//! report generation in the background, and resolves submitted codes.
//!
//! Conversation state lives with the caller (each client session holds its
//! own history); the orchestrator is request-scoped and shares nothing
//! mutable across sessions.

use crate::config::Config;
use crate::error::{LlmError, ReportError, StorageError};
use crate::llm::{GenerationParams, ImageSource, MessageRole, Provider, ProviderMessage};
use crate::report::{ReportAssembler, ReportRecord};
use crate::storage::AssetStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// System prompt for an ordinary chat turn.
const CHAT_SYSTEM_PROMPT: &str =
    "You are a helpful, friendly assistant. Answer the user's questions clearly and accurately.";

/// System prompt when a stored report image accompanies the request.
const RESUME_SYSTEM_PROMPT: &str = "You are a helpful, friendly assistant. A report image \
     describing the user's previous conversation is attached; continue the conversation based \
     on its contents.";

/// Caption for the attached report image.
const RESUME_IMAGE_CAPTION: &str =
    "This image is a report of the previous conversation. Continue based on its contents.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Ordered, append-only message sequence plus the code bound to this
/// conversation. The code is assigned once and reused for every report
/// regeneration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationHistory {
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Outcome of a background report generation, delivered on the channel
/// returned by [`Orchestrator::spawn_report`].
#[derive(Debug)]
pub enum ReportEvent {
    Completed(ReportRecord),
    Failed(String),
}

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    assembler: Arc<ReportAssembler>,
    store: Arc<dyn AssetStore>,
    chat_model: String,
    chat_params: GenerationParams,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<dyn AssetStore>, config: &Config) -> Self {
        let assembler = Arc::new(ReportAssembler::new(provider.clone(), &config.report));
        Self {
            provider,
            assembler,
            store,
            chat_model: config.chat.model.clone(),
            chat_params: GenerationParams::new(config.chat.temperature, config.chat.max_tokens),
        }
    }

    pub fn assembler(&self) -> Arc<ReportAssembler> {
        self.assembler.clone()
    }

    pub fn store(&self) -> Arc<dyn AssetStore> {
        self.store.clone()
    }

    /// Relay one chat turn. When `report_image_url` is set (the user resumed
    /// with a code), the stored report image is attached as visual context
    /// ahead of the conversation.
    pub async fn chat_turn(
        &self,
        messages: &[ConversationMessage],
        report_image_url: Option<&str>,
    ) -> crate::Result<ConversationMessage> {
        let mut provider_messages = Vec::with_capacity(messages.len() + 1);
        let system_prompt = match report_image_url {
            Some(url) => {
                provider_messages.push(ProviderMessage::user_with_image(
                    RESUME_IMAGE_CAPTION,
                    ImageSource::url(url),
                ));
                RESUME_SYSTEM_PROMPT
            }
            None => CHAT_SYSTEM_PROMPT,
        };
        provider_messages.extend(
            messages
                .iter()
                .map(|m| ProviderMessage::text(m.role, m.content.clone())),
        );

        let response = self
            .provider
            .chat(
                Some(system_prompt),
                &provider_messages,
                &self.chat_model,
                &self.chat_params,
            )
            .await
            .map_err(|error| LlmError::Request {
                provider: self.provider.name().to_string(),
                message: error.to_string(),
            })?;

        Ok(ConversationMessage {
            role: MessageRole::Assistant,
            content: response.text,
        })
    }

    /// Generate a report synchronously (the `POST /report` path).
    pub async fn generate_report(
        &self,
        history: &ConversationHistory,
    ) -> Result<ReportRecord, ReportError> {
        self.assembler.assemble(history).await
    }

    /// Fire-and-forget report generation. The chat reply is never blocked
    /// on this; the returned channel carries the outcome for callers that
    /// want to update UI state, and may simply be dropped. Failures are
    /// logged and reported as a [`ReportEvent::Failed`] notification.
    ///
    /// Concurrent generations for the same code are not deduplicated; the
    /// later storage write wins.
    pub fn spawn_report(&self, history: ConversationHistory) -> mpsc::Receiver<ReportEvent> {
        let (sender, receiver) = mpsc::channel(1);
        let assembler = self.assembler.clone();
        tokio::spawn(async move {
            match assembler.assemble(&history).await {
                Ok(record) => {
                    tracing::info!(code = %record.code, "background report generated");
                    let _ = sender.send(ReportEvent::Completed(record)).await;
                }
                Err(error) => {
                    tracing::error!(%error, "background report generation failed");
                    let _ = sender.send(ReportEvent::Failed(error.to_string())).await;
                }
            }
        });
        receiver
    }

    /// Resolve a user-submitted code to the stored report image URL.
    /// Malformed codes and unknown codes both fail without touching
    /// conversation state.
    pub async fn submit_code(&self, code: &str) -> Result<String, StorageError> {
        match self.store.get(code).await? {
            Some(url) => Ok(url),
            None => Err(StorageError::NotFound(code.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ContentBlock, ProviderResponse};
    use crate::report::CodeFormat;
    use crate::storage::MemoryAssetStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: String,
        calls: Mutex<Vec<(Option<String>, Vec<ProviderMessage>)>>,
    }

    impl ScriptedProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            system_prompt: Option<&str>,
            messages: &[ProviderMessage],
            _model: &str,
            _params: &GenerationParams,
        ) -> anyhow::Result<ProviderResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.map(str::to_owned), messages.to_vec()));
            Ok(ProviderResponse::text_only(self.reply.clone()))
        }
    }

    fn orchestrator_with(provider: Arc<ScriptedProvider>) -> Orchestrator {
        let config = Config::default();
        let store = Arc::new(MemoryAssetStore::new(CodeFormat::new(
            &config.report.code_prefix,
        )));
        Orchestrator::new(provider, store, &config)
    }

    #[tokio::test]
    async fn chat_turn_returns_assistant_reply() {
        let provider = ScriptedProvider::replying("hi, how can I help?");
        let orchestrator = orchestrator_with(provider.clone());

        let reply = orchestrator
            .chat_turn(
                &[ConversationMessage {
                    role: MessageRole::User,
                    content: "hello".into(),
                }],
                None,
            )
            .await
            .expect("chat turn");

        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, "hi, how can I help?");

        let calls = provider.calls.lock().unwrap();
        let (system_prompt, messages) = &calls[0];
        assert_eq!(system_prompt.as_deref(), Some(CHAT_SYSTEM_PROMPT));
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn resume_attaches_report_image_before_history() {
        let provider = ScriptedProvider::replying("welcome back");
        let orchestrator = orchestrator_with(provider.clone());

        orchestrator
            .chat_turn(
                &[ConversationMessage {
                    role: MessageRole::User,
                    content: "where were we?".into(),
                }],
                Some("https://bucket.example.com/reports/SSY-20240101-120000.png"),
            )
            .await
            .expect("chat turn");

        let calls = provider.calls.lock().unwrap();
        let (system_prompt, messages) = &calls[0];
        assert_eq!(system_prompt.as_deref(), Some(RESUME_SYSTEM_PROMPT));
        assert_eq!(messages.len(), 2);
        assert!(
            messages[0]
                .content
                .iter()
                .any(|block| matches!(block, ContentBlock::Image { .. })),
            "first message should carry the report image"
        );
    }

    #[tokio::test]
    async fn spawn_report_delivers_completion_event() {
        let provider =
            ScriptedProvider::replying("1. FLOW: resumed work\n2. CORE EXPRESSIONS: focused\n");
        let orchestrator = orchestrator_with(provider);

        let mut events = orchestrator.spawn_report(ConversationHistory {
            messages: vec![ConversationMessage {
                role: MessageRole::User,
                content: "hello".into(),
            }],
            code: Some("SSY-20240101-120000".into()),
            timestamp: None,
        });

        match events.recv().await.expect("event") {
            ReportEvent::Completed(record) => {
                assert_eq!(record.code, "SSY-20240101-120000");
                assert_eq!(record.flow, "resumed work");
            }
            ReportEvent::Failed(message) => panic!("unexpected failure: {message}"),
        }
    }

    #[tokio::test]
    async fn submit_code_resolves_stored_image() {
        let provider = ScriptedProvider::replying("unused");
        let orchestrator = orchestrator_with(provider);
        orchestrator
            .store()
            .put("SSY-20240101-120000", b"png")
            .await
            .unwrap();

        let url = orchestrator
            .submit_code("SSY-20240101-120000")
            .await
            .expect("submit");
        assert!(url.contains("SSY-20240101-120000"));
    }

    #[tokio::test]
    async fn submit_code_unknown_is_not_found() {
        let provider = ScriptedProvider::replying("unused");
        let orchestrator = orchestrator_with(provider);
        assert!(matches!(
            orchestrator.submit_code("SSY-20240101-120000").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn submit_code_malformed_is_invalid() {
        let provider = ScriptedProvider::replying("unused");
        let orchestrator = orchestrator_with(provider);
        assert!(matches!(
            orchestrator.submit_code("not-a-code").await,
            Err(StorageError::InvalidCode { .. })
        ));
    }
}
