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
//! Validated simulation parameters
//!
//! Parameters arrive from the command line (or any other front end) as raw
//! numbers and are checked here, before any particle state exists. A
//! [`SimulationConfig`] that was constructed successfully is always valid.

use crate::collision::DEFAULT_MERGE_THRESHOLD;
use crate::error::{Error, Result};
use crate::storage::StorageLayout;

/// Parameters for one simulation run
///
/// # Example
///
/// ```
/// use nbody_sim::config::SimulationConfig;
/// use nbody_sim::storage::StorageLayout;
///
/// let config = SimulationConfig::new(1000, 50, 42, 1e6, 0.1)
///     .unwrap()
///     .with_layout(StorageLayout::SoA)
///     .with_threads(4);
/// assert_eq!(config.particle_count(), 1000);
///
/// assert!(SimulationConfig::new(-1, 50, 42, 1e6, 0.1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    particle_count: usize,
    iteration_count: usize,
    random_seed: u64,
    enclosure_size: f64,
    time_step: f64,
    merge_threshold: f64,
    layout: StorageLayout,
    threads: usize,
    benchmark: bool,
}

fn non_negative_count(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(format!("{name} must be >= 0, got {value}")))
}

fn non_negative_real(name: &str, value: f64) -> Result<f64> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(Error::invalid(format!(
            "{name} must be finite and >= 0, got {value}"
        )))
    }
}

impl SimulationConfig {
    /// Validate the five core parameters
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first parameter that is
    /// negative or not a finite number.
    pub fn new(
        particle_count: i64,
        iteration_count: i64,
        random_seed: u64,
        enclosure_size: f64,
        time_step: f64,
    ) -> Result<Self> {
        Ok(SimulationConfig {
            particle_count: non_negative_count("num_objects", particle_count)?,
            iteration_count: non_negative_count("num_iterations", iteration_count)?,
            random_seed,
            enclosure_size: non_negative_real("size_enclosure", enclosure_size)?,
            time_step: non_negative_real("time_step", time_step)?,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            layout: StorageLayout::default(),
            threads: 0,
            benchmark: false,
        })
    }

    /// Set the merge distance used by every collision pass
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `threshold` is negative or not finite.
    pub fn with_merge_threshold(mut self, threshold: f64) -> Result<Self> {
        self.merge_threshold = non_negative_real("merge_threshold", threshold)?;
        Ok(self)
    }

    /// Select the particle storage layout
    pub fn with_layout(mut self, layout: StorageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the worker count for parallel phases (`0` = automatic)
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Enable benchmark mode (quiet output, elapsed time only)
    pub fn with_benchmark(mut self, benchmark: bool) -> Self {
        self.benchmark = benchmark;
        self
    }

    /// Number of particles generated
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Number of steps to run
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// Seed for particle generation
    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    /// Edge length of the cubic enclosure
    pub fn enclosure_size(&self) -> f64 {
        self.enclosure_size
    }

    /// Time step in seconds
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Merge distance
    pub fn merge_threshold(&self) -> f64 {
        self.merge_threshold
    }

    /// Particle storage layout
    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// Worker count for parallel phases (`0` = automatic)
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Whether benchmark mode is on
    pub fn benchmark(&self) -> bool {
        self.benchmark
    }
}
