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
//! # N-body Simulation
//!
//! Gravitational N-body dynamics in a cubic enclosure: point masses attract
//! pairwise, move under semi-implicit Euler integration, bounce elastically
//! off the walls and merge when they come closer than a threshold.
//!
//! ## Features
//!
//! - **Interchangeable layouts**: array-of-structures and structure-of-arrays
//!   particle storage behind one [`ParticleStorage`] trait
//! - **Exact pairwise forces**: O(n²) Newtonian gravity with no softening
//! - **Deterministic merging**: collision candidates are merged in a fixed
//!   key order, so results do not depend on the worker count
//! - **Parallelization**: optional Rayon worker pool for the force and
//!   collision scans
//!
//! ## Example
//!
//! ```rust
//! use nbody_sim::config::SimulationConfig;
//! use nbody_sim::storage::SoAStorage;
//! use nbody_sim::Simulation;
//!
//! let config = SimulationConfig::new(100, 10, 42, 1e5, 0.1).unwrap();
//! let mut simulation = Simulation::<SoAStorage>::new(config).unwrap();
//! let summary = simulation.run().unwrap();
//! assert_eq!(summary.iterations, 10);
//! println!("{}", simulation.snapshot());
//! ```

#![warn(missing_docs)]

/// Error types
pub mod error;

/// 3D vector math
pub mod vector;

/// Particle storage layouts
pub mod storage;

/// Force accumulation and time integration
pub mod integration;

/// Collision detection and merging
pub mod collision;

/// Worker pool for parallel phases
pub mod parallel;

/// Phase timing
pub mod instrumentation;

/// Snapshot file format
pub mod snapshot;

/// Run configuration
pub mod config;

/// Simulation driver
pub mod simulation;

pub use error::{Error, Result};
pub use simulation::{run_with_layout, RunOutput, RunSummary, Simulation};
pub use storage::{ParticleStorage, StorageLayout};
pub use vector::Vec3;
