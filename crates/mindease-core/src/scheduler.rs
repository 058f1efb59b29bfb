//! Periodic daily-tip notifications.
//!
//! A single background task picks a random catalog tip every period and
//! hands it to a [`TipNotifier`]. Enabling again replaces the running job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::TipCatalog;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers a tip to the user (system notification, terminal, ...).
#[async_trait]
pub trait TipNotifier: Send + Sync {
    async fn notify(&self, tip: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub period: Duration,
    pub retry_delay: Duration,
    pub max_retries: u32,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(24 * 60 * 60),
            retry_delay: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// Deliver one random tip, retrying failed deliveries.
///
/// Returns whether a delivery succeeded.
pub async fn run_once(
    catalog: &TipCatalog,
    notifier: &dyn TipNotifier,
    options: &SchedulerOptions,
) -> bool {
    let tip = catalog.random_tip();
    for attempt in 0..=options.max_retries {
        if attempt > 0 {
            tokio::time::sleep(options.retry_delay).await;
        }
        match notifier.notify(&tip).await {
            Ok(()) => {
                debug!("daily tip delivered on attempt {}", attempt + 1);
                return true;
            }
            Err(err) => warn!("daily tip attempt {} failed: {err}", attempt + 1),
        }
    }
    warn!("daily tip skipped until next period");
    false
}

pub struct DailyTipScheduler {
    options: SchedulerOptions,
    job: Option<JoinHandle<()>>,
}

impl DailyTipScheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options, job: None }
    }

    /// Start the periodic job, replacing any job already running.
    pub fn enable(&mut self, catalog: Arc<TipCatalog>, notifier: Arc<dyn TipNotifier>) {
        self.disable();

        let options = self.options;
        info!("daily tips enabled, every {}s", options.period.as_secs());
        self.job = Some(tokio::spawn(async move {
            loop {
                run_once(&catalog, notifier.as_ref(), &options).await;
                tokio::time::sleep(options.period).await;
            }
        }));
    }

    pub fn disable(&mut self) {
        if let Some(job) = self.job.take() {
            job.abort();
            info!("daily tips disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.job.as_ref().is_some_and(|job| !job.is_finished())
    }
}

impl Default for DailyTipScheduler {
    fn default() -> Self {
        Self::new(SchedulerOptions::default())
    }
}

impl Drop for DailyTipScheduler {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            job.abort();
        }
    }
}
