use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// The deadline passed before the guarded future finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline expired")]
pub struct Expired;

/// A cancellable deadline.
///
/// Built on `tokio::time::Instant`, so tests drive it with
/// `tokio::time::pause()` / `advance()`. An idle (never started or
/// cancelled) timer never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    /// A timer already running for `duration`.
    pub fn started(duration: Duration) -> Self {
        let mut timer = Self::default();
        timer.start(duration);
        timer
    }

    /// (Re)arm the deadline `duration` from now.
    pub fn start(&mut self, duration: Duration) {
        self.deadline = Some(Instant::now() + duration);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before expiry; zero once expired, `None` when idle.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Race `fut` against the deadline.
    ///
    /// An idle timer imposes no limit.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Expired> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| Expired),
            None => Ok(fut.await),
        }
    }
}
