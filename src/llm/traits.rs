use super::types::{GenerationParams, ProviderMessage, ProviderResponse};
use async_trait::async_trait;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "openai").
    fn name(&self) -> &str;

    /// Send one chat-completions request: an optional system prompt followed
    /// by the conversation messages, roles preserved verbatim.
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        model: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<ProviderResponse>;

    /// Warm up the HTTP connection pool (TLS handshake, DNS). Default
    /// implementation is a no-op.
    async fn warmup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
