//! Executor dispatch for the named sync types.
//!
//! The executors here are placeholders that log and sleep; the real
//! per-vendor collectors live in the web application and are not wired into
//! this service. The dispatch structure (one method per [`SyncType`], the
//! `all` composite fanning out over every concrete type) is what the
//! scheduler depends on.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::sync_types::SyncType;

#[derive(Debug)]
pub enum SyncError {
    /// A persisted `sync_type` value that no executor is registered for.
    UnknownType(String),
    Executor(String),
    /// One or more steps of the `all` composite failed.
    Composite(Vec<String>),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::UnknownType(sync_type) => write!(f, "unknown sync type: {}", sync_type),
            SyncError::Executor(msg) => write!(f, "{}", msg),
            SyncError::Composite(failures) => {
                write!(f, "composite sync failed: {}", failures.join("; "))
            }
        }
    }
}

impl std::error::Error for SyncError {}

#[async_trait]
pub trait SyncExecutor: Send + Sync {
    async fn execute(&self, sync_type: SyncType) -> Result<(), SyncError>;
}

/// Production executor set.
pub struct SyncDispatcher {
    step_delay: Duration,
}

impl SyncDispatcher {
    pub fn new() -> Self {
        Self {
            step_delay: Duration::from_millis(250),
        }
    }

    pub fn with_step_delay(step_delay: Duration) -> Self {
        Self { step_delay }
    }

    async fn run_concrete(&self, sync_type: SyncType) -> Result<(), SyncError> {
        match sync_type {
            SyncType::Products => self.sync_step("refreshing pet product catalog").await,
            SyncType::Recalls => self.sync_step("checking product recall feeds").await,
            SyncType::Ingredients => self.sync_step("updating ingredient safety data").await,
            SyncType::Livestock => self.sync_step("syncing livestock product listings").await,
            SyncType::FeedNutrition => self.sync_step("syncing feed nutrition profiles").await,
            SyncType::FarmSafety => self.sync_step("checking farm animal safety advisories").await,
            SyncType::ExoticProducts => self.sync_step("syncing exotic pet product listings").await,
            SyncType::ExoticNutrition => self.sync_step("syncing exotic pet nutrition data").await,
            SyncType::ExoticSafety => self.sync_step("checking exotic pet safety advisories").await,
            // `all` fans out in execute(); it is never a concrete step.
            SyncType::All => Err(SyncError::Executor(
                "'all' is a composite sync type".to_string(),
            )),
        }
    }

    async fn sync_step(&self, what: &'static str) -> Result<(), SyncError> {
        info!("{}", what);
        tokio::time::sleep(self.step_delay).await;
        Ok(())
    }
}

impl Default for SyncDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncExecutor for SyncDispatcher {
    async fn execute(&self, sync_type: SyncType) -> Result<(), SyncError> {
        match sync_type {
            SyncType::All => run_each(|sync_type| self.run_concrete(sync_type)).await,
            concrete => self.run_concrete(concrete).await,
        }
    }
}

/// Runs every concrete sync type in sequence, wrapping each call so one
/// failure never prevents the remaining types from running. Failures are
/// collected and reported together.
async fn run_each<F, Fut>(run: F) -> Result<(), SyncError>
where
    F: Fn(SyncType) -> Fut,
    Fut: Future<Output = Result<(), SyncError>>,
{
    let mut failures = Vec::new();
    for sync_type in SyncType::individual() {
        if let Err(err) = run(sync_type).await {
            warn!(sync_type = %sync_type, "composite sync step failed: {}", err);
            failures.push(format!("{}: {}", sync_type, err));
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncError::Composite(failures))
    }
}
