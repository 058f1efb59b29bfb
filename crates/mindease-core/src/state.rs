//! UI-agnostic session state
//!
//! Chat and tip screens each own one state struct behind a [`StateCell`].
//! The session is the only writer; front-ends read committed snapshots or
//! subscribe to changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::classify::{Flow, FlowError};

/// A chat message in the AI conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One completed exchange. Only created from a successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub user: String,
    pub reply: String,
}

impl ConversationEntry {
    pub fn new(user: &str, reply: String) -> Self {
        Self {
            user: user.to_string(),
            reply,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Helpfulness {
    #[default]
    Unrated,
    Helpful,
    NotHelpful,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTip {
    pub id: u64,
    pub text: String,
    pub category: String,
    pub is_favorite: bool,
    pub helpfulness: Helpfulness,
}

impl GeneratedTip {
    pub fn new(id: u64, text: &str, category: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            category: category.to_string(),
            is_favorite: false,
            helpfulness: Helpfulness::Unrated,
        }
    }
}

/// Loading flag and error slot shared by every session state.
pub trait RequestState {
    fn is_loading(&self) -> bool;
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, message: String);
    fn clear_error(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatState {
    pub history: Vec<ConversationEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ChatState {
    pub fn append(&mut self, entry: ConversationEntry) {
        self.history.push(entry);
    }

    /// History flattened into alternating user/assistant messages.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.history
            .iter()
            .flat_map(|entry| {
                [
                    ChatMessage {
                        role: ChatRole::User,
                        content: entry.user.clone(),
                    },
                    ChatMessage {
                        role: ChatRole::Assistant,
                        content: entry.reply.clone(),
                    },
                ]
            })
            .collect()
    }
}

impl RequestState for ChatState {
    fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Static tips, generated tips and the tip screen's request state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TipsState {
    pub tips: Vec<GeneratedTip>,
    pub generated: Vec<GeneratedTip>,
    pub suggestions: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    next_id: u64,
}

impl Default for TipsState {
    fn default() -> Self {
        Self {
            tips: Vec::new(),
            generated: Vec::new(),
            suggestions: Vec::new(),
            loading: false,
            error: None,
            next_id: 1,
        }
    }
}

impl TipsState {
    /// Replace the static tips. Ids handed out later stay above theirs.
    pub fn set_static_tips(&mut self, tips: Vec<GeneratedTip>) {
        let max_id = tips.iter().map(|tip| tip.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        self.tips = tips;
    }

    /// Append a generated tip with the next free id.
    pub fn append(&mut self, text: &str, category: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.generated.push(GeneratedTip::new(id, text, category));
        id
    }

    /// Hides generated tips. Their ids are not reused.
    pub fn clear_generated(&mut self) {
        self.generated.clear();
    }

    pub fn all_tips(&self) -> impl Iterator<Item = &GeneratedTip> {
        self.tips.iter().chain(self.generated.iter())
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut GeneratedTip> {
        self.tips
            .iter_mut()
            .chain(self.generated.iter_mut())
            .find(|tip| tip.id == id)
    }

    /// Returns false when no tip has this id.
    pub fn toggle_favorite(&mut self, id: u64) -> bool {
        match self.find_mut(id) {
            Some(tip) => {
                tip.is_favorite = !tip.is_favorite;
                true
            }
            None => false,
        }
    }

    pub fn rate(&mut self, id: u64, helpfulness: Helpfulness) -> bool {
        match self.find_mut(id) {
            Some(tip) => {
                tip.helpfulness = helpfulness;
                true
            }
            None => false,
        }
    }

    pub fn favorite_tips(&self) -> Vec<GeneratedTip> {
        self.all_tips().filter(|tip| tip.is_favorite).cloned().collect()
    }

    pub fn helpful_tips(&self) -> Vec<GeneratedTip> {
        self.all_tips()
            .filter(|tip| tip.helpfulness == Helpfulness::Helpful)
            .cloned()
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<GeneratedTip> {
        self.all_tips()
            .filter(|tip| tip.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on tip text.
    pub fn search(&self, query: &str) -> Vec<GeneratedTip> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.all_tips().cloned().collect();
        }
        self.all_tips()
            .filter(|tip| tip.text.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

impl RequestState for TipsState {
    fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Single-writer holder for a session state.
///
/// Every mutation is one commit on a `watch` channel, so subscribers never
/// observe a half-applied update.
pub struct StateCell<S> {
    tx: watch::Sender<S>,
}

impl<S: RequestState + Clone> StateCell<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    pub fn update(&self, apply: impl FnOnce(&mut S)) {
        self.tx.send_modify(apply);
    }

    /// Apply only when no request is in flight. Returns whether it applied.
    pub fn update_if_idle(&self, apply: impl FnOnce(&mut S)) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            apply(state);
            true
        })
    }

    /// Claim the loading flag and clear the error slot.
    ///
    /// `None` when a request is already in flight. The check and the claim
    /// happen under the channel lock, so two racing callers cannot both win.
    pub fn begin(&self, flow: Flow) -> Option<InFlight<'_, S>> {
        let claimed = self.update_if_idle(|state| {
            state.set_loading(true);
            state.clear_error();
        });
        claimed.then(|| InFlight {
            cell: self,
            flow,
            finished: false,
        })
    }
}

/// An outstanding request holding the loading flag.
///
/// If it is dropped without [`finish`](InFlight::finish) (cancelled future,
/// panic), it records an interruption error and releases the flag.
pub struct InFlight<'a, S: RequestState + Clone> {
    cell: &'a StateCell<S>,
    flow: Flow,
    finished: bool,
}

impl<S: RequestState + Clone> InFlight<'_, S> {
    /// Apply the outcome, then clear loading, in one commit.
    pub fn finish(mut self, apply: impl FnOnce(&mut S)) {
        self.finished = true;
        self.cell.update(|state| {
            apply(state);
            state.set_loading(false);
        });
    }

    /// Record `err` in the error slot and release the flag.
    pub fn fail(self, err: &FlowError) {
        let message = err.user_message(self.flow);
        self.finish(|state| state.set_error(message));
    }
}

impl<S: RequestState + Clone> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let message = FlowError::Interrupted.user_message(self.flow);
        self.cell.update(|state| {
            state.set_error(message);
            state.set_loading(false);
        });
    }
}
