#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mindease_core::{GenerationClient, GenerationError, GenerationRequest, GenerationResponse};
use tokio::sync::Notify;

type Reply = Result<Option<GenerationResponse>, GenerationError>;

/// Answers every request with the same canned reply and records prompts.
pub struct FakeClient {
    reply: Reply,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn replying(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            gate: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn text(text: &str) -> Arc<Self> {
        Self::replying(Ok(Some(GenerationResponse::with_text(text))))
    }

    pub fn status(status: u16, body: Option<&str>) -> Arc<Self> {
        Self::replying(Err(GenerationError::Status {
            status,
            body: body.map(str::to_string),
        }))
    }

    /// Like [`FakeClient::text`], but each reply waits for `gate` to be notified.
    pub fn gated(text: &str, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(Some(GenerationResponse::with_text(text))),
            gate: Some(gate),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationClient for FakeClient {
    async fn generate_content(&self, request: &GenerationRequest) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.contents[0].parts[0].text.clone();
        self.prompts.lock().unwrap().push(prompt);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone()
    }
}
