use std::sync::Arc;

use chrono::Local;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ai::{GenerationClient, GenerationRequest};
use crate::catalog::TipCatalog;
use crate::classify::{Flow, FlowError};
use crate::extract::{self, ExtractionError};
use crate::prompt;
use crate::state::{Helpfulness, RequestState, StateCell, TipsState};

/// Category label for single personalized tips.
pub const PERSONALIZED_CATEGORY: &str = "AI Generated";

pub const STRESS_RELIEF: &str = "Stress Relief";
pub const ANXIETY_MANAGEMENT: &str = "Anxiety Management";
pub const DEPRESSION_SUPPORT: &str = "Depression Support";

const MORNING_CONTEXT: &str =
    "starting the day with positive energy and setting a good mood for the day ahead";
const EVENING_CONTEXT: &str = "winding down, relaxing, and preparing for restful sleep";

const EMPTY_CATEGORY: &str = "Please provide a valid category.";
const EMPTY_CATALOG: &str = "No tips found in the data file.";

pub const SUGGESTIONS: [&str; 10] = [
    "I'm feeling stressed today",
    "Help me sleep better",
    "I need motivation",
    "I'm feeling anxious",
    "I want to be more mindful",
    "I need self-care ideas",
    "Help me with work-life balance",
    "I'm feeling overwhelmed",
    "I want to improve my mood",
    "I need relaxation techniques",
];

/// The daily tips screen: catalog tips plus tips generated on demand.
pub struct TipsSession {
    client: Arc<dyn GenerationClient>,
    state: StateCell<TipsState>,
}

impl TipsSession {
    pub fn new(client: Arc<dyn GenerationClient>, catalog: &TipCatalog) -> Self {
        let mut initial = TipsState::default();
        initial.suggestions = SUGGESTIONS.iter().map(|s| s.to_string()).collect();
        initial.set_static_tips(catalog.to_tips());
        if catalog.is_empty() {
            initial.set_error(EMPTY_CATALOG.to_string());
        }
        debug!("tips session loaded {} catalog tips", catalog.len());

        Self {
            client,
            state: StateCell::new(initial),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TipsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TipsState {
        self.state.snapshot()
    }

    pub fn clear_error(&self) {
        self.state.update(|state| state.clear_error());
    }

    pub fn clear_generated_tips(&self) {
        self.state.update(|state| state.clear_generated());
    }

    pub fn toggle_favorite(&self, id: u64) -> bool {
        let mut found = false;
        self.state.update(|state| found = state.toggle_favorite(id));
        found
    }

    pub fn rate_tip(&self, id: u64, helpfulness: Helpfulness) -> bool {
        let mut found = false;
        self.state.update(|state| found = state.rate(id, helpfulness));
        found
    }

    /// One tip shaped by the user's mood, free-text context and the clock.
    pub async fn generate_personalized_tip(&self, mood: Option<&str>, context: Option<&str>) {
        let Some(request) = self.state.begin(Flow::PersonalizedTip) else {
            debug!("tip request already in flight, skipping");
            return;
        };

        let prompt = prompt::personalized_tip_prompt(mood, context, &Local::now());
        match self.generate_text(&prompt).await {
            Ok(text) => {
                info!("generated personalized tip");
                request.finish(|state| {
                    state.append(text.trim(), PERSONALIZED_CATEGORY);
                    state.clear_error();
                });
            }
            Err(err) => {
                warn!(category = ?err.category(), "personalized tip failed: {err}");
                request.fail(&err);
            }
        }
    }

    /// A batch of tips for `category`, all labelled with it.
    pub async fn generate_tips_by_category(&self, category: &str) {
        if self.state.snapshot().loading {
            debug!("tip request already in flight, skipping");
            return;
        }
        if category.trim().is_empty() {
            let err = FlowError::Validation(EMPTY_CATEGORY.to_string());
            debug!(category = ?err.category(), "rejected blank tip category");
            self.state
                .update_if_idle(|state| state.set_error(err.user_message(Flow::CategoryTips)));
            return;
        }

        let Some(request) = self.state.begin(Flow::CategoryTips) else {
            debug!("tip request already in flight, skipping");
            return;
        };

        let prompt = prompt::category_tips_prompt(category);
        let outcome = self.generate_text(&prompt).await.and_then(|text| {
            let tips = extract::parse_tip_batch(&text);
            if tips.is_empty() {
                Err(FlowError::from(ExtractionError::NoValidTips))
            } else {
                Ok(tips)
            }
        });

        match outcome {
            Ok(tips) => {
                info!("generated {} tips for category {category}", tips.len());
                request.finish(|state| {
                    for tip in &tips {
                        state.append(tip, category);
                    }
                    state.clear_error();
                });
            }
            Err(err) => {
                warn!(category = ?err.category(), "category tips failed: {err}");
                request.fail(&err);
            }
        }
    }

    pub async fn generate_morning_tip(&self) {
        self.generate_personalized_tip(None, Some(MORNING_CONTEXT)).await
    }

    pub async fn generate_evening_tip(&self) {
        self.generate_personalized_tip(None, Some(EVENING_CONTEXT)).await
    }

    pub async fn generate_stress_relief_tip(&self) {
        self.generate_tips_by_category(STRESS_RELIEF).await
    }

    pub async fn generate_anxiety_tip(&self) {
        self.generate_tips_by_category(ANXIETY_MANAGEMENT).await
    }

    pub async fn generate_depression_tip(&self) {
        self.generate_tips_by_category(DEPRESSION_SUPPORT).await
    }

    pub async fn generate_tip_from_suggestion(&self, suggestion: &str) {
        self.generate_personalized_tip(None, Some(suggestion)).await
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, FlowError> {
        let request = GenerationRequest::from_prompt(prompt);
        let body = self.client.generate_content(&request).await?;
        Ok(extract::extract(body.as_ref())?)
    }
}
