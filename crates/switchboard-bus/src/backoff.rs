// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capped exponential backoff with bounded jitter for stream reconnects.

use std::time::Duration;

use rand::Rng;

/// Reconnect backoff: doubles from a base up to a ceiling, with jitter in
/// [50%, 100%] of the deterministic delay so a fleet of consoles does not
/// reconnect in lockstep. The attempt counter resets after a successful
/// connection.
#[derive(Debug)]
pub struct Backoff {
    base_ms: u64,
    cap_ms: u64,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base_ms: (base.as_millis() as u64).max(1),
            cap_ms: (cap.as_millis() as u64).max(1),
            attempt: 0,
        }
    }

    /// Failed attempts since the last successful connection.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Called after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Registers a failed attempt and returns how long to wait before the
    /// next one.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let exact = self.deterministic_ms(self.attempt);
        let low = exact / 2;
        let jittered = if low == exact {
            exact
        } else {
            rand::thread_rng().gen_range(low..=exact)
        };
        Duration::from_millis(jittered)
    }

    /// The un-jittered delay for an attempt: `base * 2^(attempt-1)`,
    /// clamped to the cap.
    fn deterministic_ms(&self, attempt: u32) -> u64 {
        let shift = attempt.saturating_sub(1).min(32);
        self.base_ms
            .saturating_mul(1u64.checked_shl(shift).unwrap_or(u64::MAX))
            .min(self.cap_ms)
    }
}
