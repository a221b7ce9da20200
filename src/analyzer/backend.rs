//! Lazily initialised analyzer backend state
//!
//! Each backend moves through `Uninitialized -> Initializing -> Ready | Failed`.
//! Initialization is single-flight: the slot's async mutex is held for the
//! whole attempt loop, so concurrent callers wait for the same attempt and then
//! observe its outcome. After `max_attempts` failures the backend stays
//! `Failed` for the lifetime of the cell. A `Ready` backend that keeps failing
//! is reset to `Uninitialized` after `max_consecutive_errors` failures in a row.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::error::Result;

/// Observable initialization phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InitPhase {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

enum Slot<T> {
    Uninitialized,
    Ready(Arc<T>),
    Failed,
}

/// Retry policy for initialization and error-driven resets
#[derive(Debug, Clone, Copy)]
pub struct InitPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub max_consecutive_errors: u32,
}

impl From<&AnalyzerConfig> for InitPolicy {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            max_attempts: config.init_max_attempts.max(1),
            retry_delay: config.init_retry_delay(),
            max_consecutive_errors: config.max_consecutive_errors.max(1),
        }
    }
}

pub struct BackendCell<T> {
    name: &'static str,
    slot: tokio::sync::Mutex<Slot<T>>,
    phase: Mutex<InitPhase>,
    consecutive_errors: AtomicU32,
    init_attempts: AtomicU32,
    policy: InitPolicy,
}

impl<T: Send + Sync> BackendCell<T> {
    pub fn new(name: &'static str, policy: InitPolicy) -> Self {
        Self {
            name,
            slot: tokio::sync::Mutex::new(Slot::Uninitialized),
            phase: Mutex::new(InitPhase::Uninitialized),
            consecutive_errors: AtomicU32::new(0),
            init_attempts: AtomicU32::new(0),
            policy,
        }
    }

    pub fn phase(&self) -> InitPhase {
        *self.phase.lock()
    }

    /// Total initialization attempts made so far
    pub fn init_attempts(&self) -> u32 {
        self.init_attempts.load(Ordering::Relaxed)
    }

    /// Return the ready backend, initialising it first if needed.
    /// `None` once the backend has been marked failed.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Option<Arc<T>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;
        match &*slot {
            Slot::Ready(backend) => return Some(backend.clone()),
            Slot::Failed => return None,
            Slot::Uninitialized => {}
        }

        *self.phase.lock() = InitPhase::Initializing;

        for attempt in 1..=self.policy.max_attempts {
            self.init_attempts.fetch_add(1, Ordering::Relaxed);
            match init().await {
                Ok(backend) => {
                    let backend = Arc::new(backend);
                    *slot = Slot::Ready(backend.clone());
                    *self.phase.lock() = InitPhase::Ready;
                    self.consecutive_errors.store(0, Ordering::Relaxed);
                    tracing::info!("{} analyzer ready after {} attempt(s)", self.name, attempt);
                    return Some(backend);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} analyzer initialization attempt {}/{} failed: {}",
                        self.name,
                        attempt,
                        self.policy.max_attempts,
                        e
                    );
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        *slot = Slot::Failed;
        *self.phase.lock() = InitPhase::Failed;
        tracing::warn!("{} analyzer marked failed, falling through", self.name);
        None
    }

    pub fn record_success(&self) {
        self.consecutive_errors.store(0, Ordering::Relaxed);
    }

    /// Count a failed call; resets a ready backend once the limit is reached
    pub async fn record_failure(&self) {
        let errors = self.consecutive_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if errors < self.policy.max_consecutive_errors {
            return;
        }

        let mut slot = self.slot.lock().await;
        if matches!(&*slot, Slot::Ready(_)) {
            *slot = Slot::Uninitialized;
            *self.phase.lock() = InitPhase::Uninitialized;
            tracing::warn!(
                "{} analyzer reset after {} consecutive errors",
                self.name,
                errors
            );
        }
        self.consecutive_errors.store(0, Ordering::Relaxed);
    }
}
