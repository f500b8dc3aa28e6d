// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconnect policy and exponential backoff.

use std::time::Duration;

use rand::Rng;
use sauron_config::model::{ReconnectConfig, ReconnectMode};

/// Exponential backoff with a cap and multiplicative jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub factor: f64,
    /// Each delay is scaled by a random factor in `[1 - jitter, 1 + jitter)`.
    pub jitter: f64,
}

impl Backoff {
    /// Delay before retry `attempt` (1-based), before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * self.factor.powi(exponent);
        self.clamp(secs)
    }

    /// Delay before retry `attempt` (1-based), jittered and capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt).as_secs_f64();
        if self.jitter <= 0.0 {
            return self.clamp(base);
        }
        let spread = rand::thread_rng().gen_range(-self.jitter..self.jitter);
        self.clamp(base * (1.0 + spread))
    }

    fn clamp(&self, secs: f64) -> Duration {
        Duration::try_from_secs_f64(secs)
            .map(|d| d.min(self.max))
            .unwrap_or(self.max)
    }
}

/// What the connection manager does after losing its link.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconnectPolicy {
    /// Stop after the first disconnect.
    None,
    /// Retry up to `max_retries` times between successful handshakes.
    Bounded { max_retries: u32, backoff: Backoff },
    /// Retry forever.
    Unbounded { backoff: Backoff },
}

impl ReconnectPolicy {
    pub fn from_config(config: &ReconnectConfig) -> Self {
        let backoff = Backoff {
            initial: Duration::try_from_secs_f64(config.initial_delay_secs)
                .unwrap_or(Duration::from_secs(1)),
            max: Duration::try_from_secs_f64(config.max_delay_secs)
                .unwrap_or(Duration::from_secs(3600)),
            factor: config.factor,
            jitter: config.jitter,
        };
        match config.mode {
            ReconnectMode::None => ReconnectPolicy::None,
            ReconnectMode::Bounded => ReconnectPolicy::Bounded {
                max_retries: config.max_retries,
                backoff,
            },
            ReconnectMode::Unbounded => ReconnectPolicy::Unbounded { backoff },
        }
    }

    /// Delay before the next attempt after `failures` consecutive losses,
    /// or `None` when the policy gives up.
    pub fn next_delay(&self, failures: u32) -> Option<Duration> {
        match self {
            ReconnectPolicy::None => None,
            ReconnectPolicy::Bounded {
                max_retries,
                backoff,
            } => (failures <= *max_retries).then(|| backoff.delay(failures)),
            ReconnectPolicy::Unbounded { backoff } => Some(backoff.delay(failures)),
        }
    }
}
