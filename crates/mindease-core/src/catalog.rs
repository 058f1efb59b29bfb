use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use tracing::error;

use crate::state::GeneratedTip;

const BUNDLED_TIPS: &str = include_str!("../assets/daily_tips.json");

/// Shown when the catalog has nothing to offer.
pub const FALLBACK_TIP: &str = "Take a deep breath and relax.";

/// Category label given to catalog tips.
pub const STATIC_CATEGORY: &str = "General";

/// The fixed list of daily tips, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct TipCatalog {
    tips: Vec<String>,
}

impl TipCatalog {
    /// Tips compiled into the binary.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_TIPS).unwrap_or_else(|err| {
            error!("bundled tip catalog is unreadable: {err:#}");
            Self::default()
        })
    }

    /// Parse a JSON array of strings, skipping blank entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<String> =
            serde_json::from_str(json).context("tip catalog is not a JSON array of strings")?;
        let tips = raw
            .into_iter()
            .map(|tip| tip.trim().to_string())
            .filter(|tip| !tip.is_empty())
            .collect();
        Ok(Self { tips })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read tip catalog {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tips.iter().map(String::as_str)
    }

    /// Catalog entries as tips with ids `1..=n`.
    pub fn to_tips(&self) -> Vec<GeneratedTip> {
        self.tips
            .iter()
            .zip(1u64..)
            .map(|(text, id)| GeneratedTip::new(id, text, STATIC_CATEGORY))
            .collect()
    }

    pub fn random_tip(&self) -> String {
        self.tips
            .choose(&mut rand::thread_rng())
            .map(String::clone)
            .unwrap_or_else(|| FALLBACK_TIP.to_string())
    }
}
