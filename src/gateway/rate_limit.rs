//! Rate limiting for tool execution
//!
//! Plain owned state, one limiter per gateway (and so per conversation).
//! Never shared process-wide.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::config::RateLimitConfig;

/// A rate-limit denial; surfaced to the model as a failed tool result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("Tool call limit reached for this session ({max} calls). Start a new conversation to continue.")]
    SessionLimit { max: usize },

    #[error("Too many tool calls in the last minute (limit {max}). Wait before calling more tools.")]
    PerMinuteLimit { max: usize },

    #[error("Tool calls are in cooldown. Wait {remaining_ms} ms before the next call.")]
    Cooldown { remaining_ms: u64 },
}

/// Sliding-window rate limiter for tool calls
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimitConfig,
    /// Timestamps of recent calls (pruned against a 60s cutoff on check)
    recent: Vec<Instant>,
    session_count: usize,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            limits,
            recent: Vec::new(),
            session_count: 0,
            last_call: None,
        }
    }

    /// Check all limits in order: session cap, per-minute window, cooldown.
    /// First failure wins.
    pub fn check(&mut self) -> Result<(), RateLimitError> {
        let now = Instant::now();

        if self.session_count >= self.limits.max_calls_per_session {
            debug!(count = %self.session_count, "RateLimiter::check: session limit");
            return Err(RateLimitError::SessionLimit {
                max: self.limits.max_calls_per_session,
            });
        }

        // Recompute the sliding window by filtering the timestamp list
        if let Some(cutoff) = now.checked_sub(Duration::from_secs(60)) {
            self.recent.retain(|t| *t > cutoff);
        }
        if self.recent.len() >= self.limits.max_calls_per_minute {
            debug!(window = %self.recent.len(), "RateLimiter::check: per-minute limit");
            return Err(RateLimitError::PerMinuteLimit {
                max: self.limits.max_calls_per_minute,
            });
        }

        if let Some(last) = self.last_call {
            let cooldown = Duration::from_millis(self.limits.cooldown_ms);
            let elapsed = now.duration_since(last);
            if elapsed < cooldown {
                let remaining_ms = (cooldown - elapsed).as_millis() as u64;
                debug!(%remaining_ms, "RateLimiter::check: cooldown");
                return Err(RateLimitError::Cooldown { remaining_ms });
            }
        }

        Ok(())
    }

    /// Record an accepted call
    pub fn record(&mut self) {
        let now = Instant::now();
        self.recent.push(now);
        self.session_count += 1;
        self.last_call = Some(now);
    }

    /// Clear all counters for a new conversation
    pub fn reset(&mut self) {
        debug!("RateLimiter::reset: called");
        self.recent.clear();
        self.session_count = 0;
        self.last_call = None;
    }

    pub fn session_count(&self) -> usize {
        self.session_count
    }
}
