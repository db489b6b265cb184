//! Shared fixtures for integration tests: a scripted provider and a
//! gateway test server bound to an ephemeral port.

// Each test binary uses a different subset of these fixtures.
#![allow(dead_code)]

use async_trait::async_trait;
use recallkey::Config;
use recallkey::gateway::{AppState, serve_with_state};
use recallkey::llm::{GenerationParams, Provider, ProviderMessage, ProviderResponse};
use recallkey::report::CodeFormat;
use recallkey::session::Orchestrator;
use recallkey::storage::MemoryAssetStore;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Provider double that replays queued responses in order; the last queued
/// response repeats once the queue drains. An empty queue means every call
/// fails.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<(Option<String>, Vec<ProviderMessage>)>>,
}

impl ScriptedProvider {
    pub fn replying(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| (*r).to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
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

        let mut responses = self.responses.lock().unwrap();
        match responses.len() {
            0 => anyhow::bail!("scripted provider exhausted"),
            1 => Ok(ProviderResponse::text_only(responses[0].clone())),
            _ => Ok(ProviderResponse::text_only(
                responses.pop_front().expect("non-empty queue"),
            )),
        }
    }
}

pub struct GatewayTestServer {
    pub port: u16,
    pub store: Arc<MemoryAssetStore>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl GatewayTestServer {
    pub async fn start(provider: Arc<ScriptedProvider>) -> Self {
        let config = Config::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral gateway listener should bind");
        let port = listener
            .local_addr()
            .expect("listener should expose local address")
            .port();

        let store = Arc::new(MemoryAssetStore::new(CodeFormat::new(
            &config.report.code_prefix,
        )));
        let state = AppState {
            orchestrator: Arc::new(Orchestrator::new(provider, store.clone(), &config)),
        };

        let handle = tokio::spawn(async move { serve_with_state(listener, state).await });
        wait_until_ready(port).await;

        Self {
            port,
            store,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }
}

impl Drop for GatewayTestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_until_ready(port: u16) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .expect("reqwest client should be built");

    for _ in 0..80 {
        let health = client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await;
        if matches!(health, Ok(response) if response.status().is_success()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("gateway did not become ready on port {port}");
}
