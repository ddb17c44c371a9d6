//! Progress notification and cooperative cancellation.
//!
//! The runner pushes one update per generation to an optional observer.
//! Observers are notified only; they cannot steer the run. Stopping a
//! run early goes through [`CancellationToken`], which the runner polls
//! between generations.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Generation just evaluated (0 = initial population).
    pub generation: usize,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Short human-readable status.
    pub message: String,
}

/// Receives per-generation progress from the optimizer.
pub trait ProgressObserver: Send + Sync {
    /// Called after each generation is evaluated.
    fn on_progress(&self, generation: usize, best_fitness: f64, message: &str);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, f64, &str) + Send + Sync,
{
    fn on_progress(&self, generation: usize, best_fitness: f64, message: &str) {
        self(generation, best_fitness, message)
    }
}

/// Channel-backed observer. A dropped receiver is ignored.
pub struct ChannelObserver {
    sender: Sender<ProgressUpdate>,
}

impl ChannelObserver {
    /// Wraps the sending half of a channel.
    pub fn new(sender: Sender<ProgressUpdate>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, generation: usize, best_fitness: f64, message: &str) {
        let update = ProgressUpdate {
            generation,
            best_fitness,
            message: message.to_string(),
        };
        let _ = self.sender.send(update);
    }
}

/// Shared flag for stopping a run between generations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
