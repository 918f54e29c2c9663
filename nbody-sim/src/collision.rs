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
//! Collision detection and deterministic merging
//!
//! A resolution pass has three phases:
//!
//! - **Detect**: read-only scan of every pair `j < i`. Pairs closer than the
//!   merge threshold become candidates keyed by `i * n - j`. Rows are
//!   scanned in parallel and each row's hits are inserted into one shared
//!   ordered map under a mutex.
//! - **Merge**: sequential. Candidates are taken highest key first, so the
//!   merge order depends only on the key and never on which worker found a
//!   pair. The higher index of a pair survives and absorbs the lower one.
//! - **Compact**: removed particles are dropped once, and only if a merge
//!   happened.
//!
//! A particle can be claimed by several survivors. A candidate whose
//! absorbed particle is already gone is skipped. The survivor is not
//! checked: in a chain `a-b-c`, `b` may absorb `a` after `c` has already
//! absorbed `b`, and `a`'s mass leaves with `b` at compaction.

use crate::parallel::WorkerPool;
use crate::storage::ParticleStorage;
use log::{debug, trace};
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default merge distance
pub const DEFAULT_MERGE_THRESHOLD: f64 = 1.0;

/// Two overlapping particles; `survivor > absorbed` always holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    /// Index that keeps existing after the merge
    pub survivor: usize,
    /// Index that is absorbed and later compacted away
    pub absorbed: usize,
}

impl CollisionPair {
    /// Create a pair from the scanning index `i` and a lower partner `j`
    pub fn new(survivor: usize, absorbed: usize) -> Self {
        debug_assert!(absorbed < survivor, "absorbed index must be below survivor");
        CollisionPair { survivor, absorbed }
    }

    /// Ordering key `survivor * n - absorbed` for a set of `n` particles
    ///
    /// Increases with the survivor and, for a fixed survivor, with a
    /// decreasing absorbed index. Unique for every pair of a given set.
    pub fn key(&self, n: usize) -> usize {
        self.survivor * n - self.absorbed
    }
}

/// Candidates found by detection, keyed by [`CollisionPair::key`]
pub type CandidateSet = BTreeMap<usize, CollisionPair>;

/// Outcome of one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Overlapping pairs found by detection
    pub candidates: usize,
    /// Merges actually performed
    pub merges: usize,
    /// Particles dropped by compaction
    pub removed: usize,
}

/// Detects overlapping particles and merges them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResolver {
    merge_threshold: f64,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_THRESHOLD)
    }
}

impl CollisionResolver {
    /// Create a resolver merging particles closer than `merge_threshold`
    pub fn new(merge_threshold: f64) -> Self {
        CollisionResolver { merge_threshold }
    }

    /// Merge distance
    pub fn merge_threshold(&self) -> f64 {
        self.merge_threshold
    }

    fn threshold_squared(&self) -> f64 {
        self.merge_threshold * self.merge_threshold
    }

    /// Find every pair closer than the merge threshold
    ///
    /// Does not modify the set.
    pub fn detect<S: ParticleStorage>(&self, set: &S, pool: &WorkerPool) -> CandidateSet {
        #[cfg(feature = "parallel")]
        {
            if pool.is_parallel() && set.len() > 1 {
                return self.detect_parallel(set, pool);
            }
        }

        let _ = pool;
        let n = set.len();
        let mut candidates = CandidateSet::new();
        let mut row = Vec::new();
        for i in 0..n {
            self.detect_row(set, i, &mut row);
            candidates.extend(row.drain(..).map(|pair| (pair.key(n), pair)));
        }
        candidates
    }

    #[cfg(feature = "parallel")]
    fn detect_parallel<S: ParticleStorage>(&self, set: &S, pool: &WorkerPool) -> CandidateSet {
        use std::sync::{Mutex, PoisonError};

        let n = set.len();
        let found = Mutex::new(CandidateSet::new());

        pool.install(|| {
            (0..n).into_par_iter().for_each(|i| {
                let mut local = Vec::new();
                self.detect_row(set, i, &mut local);

                if !local.is_empty() {
                    let mut candidates = found.lock().unwrap_or_else(PoisonError::into_inner);
                    candidates.extend(local.into_iter().map(|pair| (pair.key(n), pair)));
                }
            });
        });

        found.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scan partners `j < i` of particle `i`
    fn detect_row<S: ParticleStorage>(&self, set: &S, i: usize, out: &mut Vec<CollisionPair>) {
        let limit = self.threshold_squared();
        for j in (0..i).rev() {
            if set.distance_squared(i, j) < limit {
                out.push(CollisionPair::new(i, j));
            }
        }
    }

    /// Merge candidates in descending key order
    ///
    /// Returns the number of merges performed. Removed particles stay in
    /// place until [`ParticleStorage::compact`] runs.
    pub fn merge<S: ParticleStorage>(&self, set: &mut S, mut candidates: CandidateSet) -> usize {
        let mut merges = 0;

        while let Some((_, pair)) = candidates.pop_last() {
            if set.is_removed(pair.absorbed) {
                continue;
            }

            trace!("merging particle {} into {}", pair.absorbed, pair.survivor);
            set.merge_into(pair.survivor, pair.absorbed);
            merges += 1;
        }

        merges
    }

    /// Run detect, merge and compact on `set`
    pub fn resolve<S: ParticleStorage>(&self, set: &mut S, pool: &WorkerPool) -> ResolutionReport {
        if set.len() < 2 {
            return ResolutionReport::default();
        }

        let candidates = self.detect(set, pool);
        let mut report = ResolutionReport {
            candidates: candidates.len(),
            ..ResolutionReport::default()
        };

        report.merges = self.merge(set, candidates);
        if report.merges > 0 {
            report.removed = set.compact();
            debug!(
                "collision pass: {} candidates, {} merges, {} particles remain",
                report.candidates,
                report.merges,
                set.len()
            );
        }

        report
    }
}
