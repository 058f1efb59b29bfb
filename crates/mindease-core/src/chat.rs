use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ai::{GenerationClient, GenerationRequest};
use crate::classify::{Flow, FlowError};
use crate::extract;
use crate::session::UserSession;
use crate::state::{ChatState, ConversationEntry, RequestState, StateCell};

/// Appended to every assistant reply.
pub const SUPPORTIVE_SUFFIX: &str = "\n\nRemember, you are not alone. Take care of yourself.";

const EMPTY_MESSAGE: &str = "Please enter a message.";

pub fn format_reply(reply: &str) -> String {
    format!("{reply}{SUPPORTIVE_SUFFIX}")
}

/// One chat screen: a conversation with the generation backend.
pub struct ChatSession {
    client: Arc<dyn GenerationClient>,
    user: Option<UserSession>,
    state: StateCell<ChatState>,
}

impl ChatSession {
    pub fn new(client: Arc<dyn GenerationClient>, user: Option<UserSession>) -> Self {
        Self {
            client,
            user,
            state: StateCell::new(ChatState::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ChatState {
        self.state.snapshot()
    }

    pub fn clear_error(&self) {
        self.state.update(|state| state.clear_error());
    }

    pub fn greeting(&self) -> String {
        let name = self
            .user
            .as_ref()
            .and_then(|user| user.label())
            .unwrap_or("there");
        format!("Hi {name}, how are you feeling today?")
    }

    /// Send one message and commit the reply or an error.
    ///
    /// Ignored while a previous message is still in flight. Failures end up
    /// in the state's error slot; nothing is returned to the caller.
    pub async fn send_message(&self, text: &str) {
        if text.trim().is_empty() {
            let err = FlowError::Validation(EMPTY_MESSAGE.to_string());
            debug!(category = ?err.category(), "rejected blank chat message");
            self.state
                .update_if_idle(|state| state.set_error(err.user_message(Flow::Chat)));
            return;
        }

        let Some(request) = self.state.begin(Flow::Chat) else {
            debug!("chat request already in flight, dropping message");
            return;
        };

        match self.exchange(text).await {
            Ok(reply) => {
                info!("chat reply received ({} chars)", reply.len());
                request.finish(|state| {
                    state.append(ConversationEntry::new(text, reply));
                    state.clear_error();
                });
            }
            Err(err) => {
                warn!(category = ?err.category(), "chat request failed: {err}");
                request.fail(&err);
            }
        }
    }

    async fn exchange(&self, text: &str) -> Result<String, FlowError> {
        let request = GenerationRequest::from_prompt(text);
        let body = self.client.generate_content(&request).await?;
        let reply = extract::extract(body.as_ref())?;
        Ok(format_reply(&reply))
    }
}
