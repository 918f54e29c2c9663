// Copyright 2025 John Brosnihan
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
//! Per-run phase timing
//!
//! An [`Instrumentation`] value is owned by whoever drives the simulation
//! and passed to each phase explicitly. Phases accumulate elapsed time into
//! it through [`Instrumentation::measure`]; there is no global clock.

use std::fmt;
use std::time::{Duration, Instant};

/// Timed phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Force accumulation and integration
    Update,
    /// Collision detection, merging and compaction
    Collision,
    /// Whole run, including generation and snapshots
    Total,
}

impl Phase {
    fn slot(self) -> usize {
        match self {
            Phase::Update => 0,
            Phase::Collision => 1,
            Phase::Total => 2,
        }
    }
}

/// Accumulated elapsed time per [`Phase`]
#[derive(Debug, Clone, Default)]
pub struct Instrumentation {
    elapsed: [Duration; 3],
}

impl Instrumentation {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` and add its wall-clock time to `phase`
    pub fn measure<R>(&mut self, phase: Phase, op: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = op();
        self.elapsed[phase.slot()] += start.elapsed();
        result
    }

    /// Add an externally measured duration to `phase`
    pub fn record(&mut self, phase: Phase, elapsed: Duration) {
        self.elapsed[phase.slot()] += elapsed;
    }

    /// Time accumulated so far for `phase`
    pub fn elapsed(&self, phase: Phase) -> Duration {
        self.elapsed[phase.slot()]
    }

    /// Snapshot of the accumulated times
    pub fn report(&self) -> TimingReport {
        TimingReport {
            total: self.elapsed(Phase::Total),
            update: self.elapsed(Phase::Update),
            collision: self.elapsed(Phase::Collision),
        }
    }
}

/// Summary of where a run spent its time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingReport {
    /// Whole run
    pub total: Duration,
    /// Force accumulation and integration
    pub update: Duration,
    /// Collision resolution
    pub collision: Duration,
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl TimingReport {
    /// Total run time in milliseconds
    pub fn total_ms(&self) -> f64 {
        millis(self.total)
    }

    /// Share of the total spent in `part`, in percent
    pub fn share(&self, part: Duration) -> f64 {
        if self.total.is_zero() {
            0.0
        } else {
            part.as_secs_f64() / self.total.as_secs_f64() * 100.0
        }
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let update_share = self.share(self.update);
        let collision_share = self.share(self.collision);
        let other_share = if self.total.is_zero() {
            0.0
        } else {
            100.0 - update_share - collision_share
        };
        write!(
            f,
            "Total execution time: {:.1}ms: UpdateObjTime {:.1}ms ({:.1}%), CollisionTime {:.1}ms ({:.1}%), Others ({:.1}%)",
            self.total_ms(),
            millis(self.update),
            update_share,
            millis(self.collision),
            collision_share,
            other_share
        )
    }
}
