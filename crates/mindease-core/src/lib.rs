pub mod ai;
pub mod catalog;
pub mod chat;
pub mod classify;
pub mod config;
pub mod extract;
pub mod prompt;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod tips;

// Re-export main types for convenience
pub use ai::{
    GeminiClient, GenerationClient, GenerationError, GenerationRequest, GenerationResponse,
};
pub use catalog::TipCatalog;
pub use chat::ChatSession;
pub use classify::{ErrorCategory, Flow, FlowError};
pub use config::Config;
pub use scheduler::{DailyTipScheduler, NotifyError, SchedulerOptions, TipNotifier};
pub use session::UserSession;
pub use state::{
    ChatMessage, ChatRole, ChatState, ConversationEntry, GeneratedTip, Helpfulness, TipsState,
};
pub use tips::TipsSession;
