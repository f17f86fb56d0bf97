// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rate-limited view following of the active vehicle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

/// Minimum ground time between two re-centers.
pub const DEFAULT_FOLLOW_INTERVAL_MS: u64 = 120;

/// Source of ground time in milliseconds.
pub trait GroundClock {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl GroundClock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Clock that only moves when told to. Clones share the same time, so a test
/// can keep one handle and hand the other to a `MapView`.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::Relaxed);
    }
}

impl GroundClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

/// Decides when a position report should re-center the view.
#[derive(Debug, Clone)]
pub struct FollowLimiter {
    interval_ms: u64,
    last_update_ms: u64,
    enabled: bool,
}

impl Default for FollowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_FOLLOW_INTERVAL_MS, false)
    }
}

impl FollowLimiter {
    #[must_use]
    pub fn new(interval_ms: u64, enabled: bool) -> Self {
        Self {
            interval_ms,
            last_update_ms: 0,
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Feed a position report. Returns whether the view should re-center.
    ///
    /// Reports from the active vehicle advance the window once the interval
    /// has passed, whether or not following is on; the re-center itself also
    /// needs following enabled and a visible view.
    pub fn on_position(&mut self, is_active: bool, visible: bool, now_ms: u64) -> bool {
        if !is_active {
            return false;
        }
        if now_ms.saturating_sub(self.last_update_ms) <= self.interval_ms {
            return false;
        }
        self.last_update_ms = now_ms;
        self.enabled && visible
    }
}
