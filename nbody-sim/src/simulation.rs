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
//! Simulation driver
//!
//! Ties the pieces together in the fixed per-step order:
//! force accumulation and integration, then collision resolution. One extra
//! collision pass runs right after generation so the initial snapshot never
//! contains overlapping bodies. Steps are strictly sequential; parallelism
//! only happens inside a phase.

use crate::collision::{CollisionResolver, ResolutionReport};
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::instrumentation::{Instrumentation, Phase, TimingReport};
use crate::integration::ForceIntegrator;
use crate::parallel::WorkerPool;
use crate::snapshot::{Snapshot, FINAL_SNAPSHOT, INITIAL_SNAPSHOT};
use crate::storage::{self, AoSStorage, ParticleStorage, SoAStorage, StorageLayout};
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

/// Figures reported at the end of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Steps executed
    pub iterations: usize,
    /// Particles generated
    pub initial_count: usize,
    /// Particles left after the last step
    pub final_count: usize,
    /// Merges performed, including the initial pass
    pub merges: usize,
    /// Time spent per phase
    pub timing: TimingReport,
}

/// A particle set together with everything needed to advance it
pub struct Simulation<S: ParticleStorage> {
    config: SimulationConfig,
    particles: S,
    integrator: ForceIntegrator,
    resolver: CollisionResolver,
    pool: WorkerPool,
    instrumentation: Instrumentation,
    initial_count: usize,
    merges: usize,
    steps: usize,
}

impl<S: ParticleStorage> Simulation<S> {
    /// Generate the particle set described by `config` and resolve initial overlaps
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let started = Instant::now();
        let count = i64::try_from(config.particle_count()).unwrap_or(i64::MAX);
        let particles = storage::generate::<S>(count, config.random_seed(), config.enclosure_size())?;
        Self::build(config, particles, started)
    }

    /// Start from an explicit particle set instead of a generated one
    pub fn with_particles(config: SimulationConfig, particles: S) -> Result<Self> {
        Self::build(config, particles, Instant::now())
    }

    fn build(config: SimulationConfig, particles: S, started: Instant) -> Result<Self> {
        let pool = WorkerPool::new(config.threads())?;
        let mut simulation = Simulation {
            integrator: ForceIntegrator::new(config.time_step(), config.enclosure_size()),
            resolver: CollisionResolver::new(config.merge_threshold()),
            initial_count: particles.len(),
            config,
            particles,
            pool,
            instrumentation: Instrumentation::new(),
            merges: 0,
            steps: 0,
        };

        info!(
            "simulating {} particles ({} layout, {} workers)",
            simulation.initial_count,
            simulation.particles.layout(),
            simulation.pool.thread_count()
        );

        let report = simulation.resolve_collisions();
        if report.merges > 0 {
            info!(
                "initial pass merged {} overlapping particles, {} remain",
                report.merges,
                simulation.particles.len()
            );
        }
        simulation.instrumentation.record(Phase::Total, started.elapsed());
        Ok(simulation)
    }

    fn resolve_collisions(&mut self) -> ResolutionReport {
        let resolver = &self.resolver;
        let particles = &mut self.particles;
        let pool = &self.pool;
        let report = self
            .instrumentation
            .measure(Phase::Collision, || resolver.resolve(particles, pool));
        self.merges += report.merges;
        report
    }

    /// Advance one step: integrate, then resolve collisions
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PreconditionViolation`] if a particle with a
    /// non-positive mass reaches force computation.
    pub fn step(&mut self) -> Result<ResolutionReport> {
        let started = Instant::now();
        let integrator = &self.integrator;
        let particles = &mut self.particles;
        let pool = &self.pool;
        self.instrumentation
            .measure(Phase::Update, || integrator.step(particles, pool))?;

        let report = self.resolve_collisions();
        self.steps += 1;
        self.instrumentation.record(Phase::Total, started.elapsed());
        debug!(
            "step {}: {} particles, {} merges",
            self.steps,
            self.particles.len(),
            report.merges
        );
        Ok(report)
    }

    /// Run the configured number of steps
    pub fn run(&mut self) -> Result<RunSummary> {
        for _ in 0..self.config.iteration_count() {
            self.step()?;
        }
        Ok(self.summary())
    }

    /// Run `op` and count its wall-clock time toward the run total
    pub fn timed<R>(&mut self, op: impl FnOnce(&Self) -> R) -> R {
        let started = Instant::now();
        let result = op(self);
        self.instrumentation.record(Phase::Total, started.elapsed());
        result
    }

    /// Figures for the run so far
    ///
    /// The total covers generation, every step and anything run through
    /// [`Simulation::timed`].
    pub fn summary(&self) -> RunSummary {
        let timing = self.instrumentation.report();
        RunSummary {
            iterations: self.steps,
            initial_count: self.initial_count,
            final_count: self.particles.len(),
            merges: self.merges,
            timing,
        }
    }

    /// Current snapshot of the particle set
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_storage(&self.particles, self.config.enclosure_size(), self.config.time_step())
    }

    /// The particle set
    pub fn particles(&self) -> &S {
        &self.particles
    }

    /// The configuration this simulation was built from
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Steps executed so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Worker count used by the parallel phases
    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }
}

/// Result of a complete run: summary plus both snapshots
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Run figures
    pub summary: RunSummary,
    /// State after the initial collision pass
    pub initial: Snapshot,
    /// State after the last step
    pub last: Snapshot,
}

fn save_snapshot<S: ParticleStorage>(
    simulation: &Simulation<S>,
    output_dir: Option<&Path>,
    name: &str,
) -> Result<Snapshot> {
    let snapshot = simulation.snapshot();
    if let Some(dir) = output_dir {
        snapshot.save(dir.join(name))?;
    }
    Ok(snapshot)
}

fn run_layout<S: ParticleStorage>(config: &SimulationConfig, output_dir: Option<&Path>) -> Result<RunOutput> {
    let mut simulation = Simulation::<S>::new(config.clone())?;

    let initial = simulation.timed(|sim| save_snapshot(sim, output_dir, INITIAL_SNAPSHOT))?;
    simulation.run()?;
    let last = simulation.timed(|sim| save_snapshot(sim, output_dir, FINAL_SNAPSHOT))?;

    let summary = simulation.summary();
    info!(
        "finished {} steps: {} of {} particles remain after {} merges",
        summary.iterations, summary.final_count, summary.initial_count, summary.merges
    );

    Ok(RunOutput {
        summary,
        initial,
        last,
    })
}

/// Run a full simulation with the layout selected in `config`
///
/// When `output_dir` is given, the initial and final snapshots are written
/// there as [`INITIAL_SNAPSHOT`] and [`FINAL_SNAPSHOT`].
pub fn run_with_layout(config: &SimulationConfig, output_dir: Option<&Path>) -> Result<RunOutput> {
    match config.layout() {
        StorageLayout::AoS => run_layout::<AoSStorage>(config, output_dir),
        StorageLayout::SoA => run_layout::<SoAStorage>(config, output_dir),
    }
}
