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
//! Particle storage with interchangeable memory layouts
//!
//! A particle set is an ordered, densely indexed collection of point masses.
//! The same logical operations are available over two physical layouts:
//!
//! - [`AoSStorage`]: array-of-structures, one [`Particle`] record per body
//! - [`SoAStorage`]: structure-of-arrays, one contiguous column per attribute
//!
//! Both implement [`ParticleStorage`], and every system in the crate is
//! generic over that trait, so a layout can be chosen at build or
//! configuration time without changing simulation results.
//!
//! # Memory Layout
//!
//! ```text
//! AoS: [Particle{m,p,v,f,removed}, Particle{m,p,v,f,removed}, ...]
//! SoA: mass: [m0, m1, ...]  x: [x0, x1, ...]  ...  removed: [r0, r1, ...]
//! ```

mod aos;
mod soa;

pub use aos::AoSStorage;
pub use soa::SoAStorage;

use crate::error::{Error, Result};
use crate::vector::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};
use std::fmt;
use std::str::FromStr;

/// Mean of the generated mass distribution (kg)
pub const MASS_MEAN: f64 = 1e21;

/// Standard deviation of the generated mass distribution (kg)
pub const MASS_STD_DEV: f64 = 1e15;

/// Logical particle record, independent of the physical layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Mass in kilograms, strictly positive for live particles
    pub mass: f64,
    /// Position inside the enclosure
    pub position: Vec3,
    /// Velocity
    pub velocity: Vec3,
    /// Force accumulated during the current step
    pub force: Vec3,
    /// Set when the particle has been absorbed and awaits compaction
    pub removed: bool,
}

impl Particle {
    /// Create a particle at rest
    pub fn new(mass: f64, position: Vec3) -> Self {
        Particle {
            mass,
            position,
            velocity: Vec3::zero(),
            force: Vec3::zero(),
            removed: false,
        }
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Physical layout of a particle set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageLayout {
    /// Array of structures
    #[default]
    AoS,
    /// Structure of arrays
    SoA,
}

impl fmt::Display for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLayout::AoS => write!(f, "aos"),
            StorageLayout::SoA => write!(f, "soa"),
        }
    }
}

impl FromStr for StorageLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aos" => Ok(StorageLayout::AoS),
            "soa" => Ok(StorageLayout::SoA),
            other => Err(Error::invalid(format!(
                "unknown storage layout '{other}', expected 'aos' or 'soa'"
            ))),
        }
    }
}

/// Capability set shared by every particle layout
///
/// Indices are dense (`0..len()`). Between [`merge_into`](Self::merge_into)
/// and [`compact`](Self::compact) some indices may be flagged removed;
/// callers must compact before the next step.
///
/// Accessors take an index and panic when it is out of bounds, like slice
/// indexing.
pub trait ParticleStorage: Send + Sync {
    /// Create an empty storage with room for `capacity` particles
    fn with_capacity(capacity: usize) -> Self
    where
        Self: Sized;

    /// The physical layout of this storage
    fn layout(&self) -> StorageLayout;

    /// Number of particles, including any flagged removed but not yet compacted
    fn len(&self) -> usize;

    /// Check if the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a particle at index `len()`
    fn push(&mut self, particle: Particle);

    /// Mass of particle `i`
    fn mass(&self, i: usize) -> f64;

    /// Position of particle `i`
    fn position(&self, i: usize) -> Vec3;

    /// Velocity of particle `i`
    fn velocity(&self, i: usize) -> Vec3;

    /// Accumulated force on particle `i`
    fn force(&self, i: usize) -> Vec3;

    /// Whether particle `i` has been absorbed by a merge
    fn is_removed(&self, i: usize) -> bool;

    /// Set the mass of particle `i`
    fn set_mass(&mut self, i: usize, mass: f64);

    /// Set the position of particle `i`
    fn set_position(&mut self, i: usize, position: Vec3);

    /// Set the velocity of particle `i`
    fn set_velocity(&mut self, i: usize, velocity: Vec3);

    /// Add `force` to the accumulator of particle `i`
    fn add_force(&mut self, i: usize, force: Vec3);

    /// Flag particle `i` for removal at the next compaction
    fn mark_removed(&mut self, i: usize);

    /// Zero every force accumulator
    fn reset_forces(&mut self);

    /// Drop every particle flagged removed, keeping survivors in their
    /// relative order. Returns the number of particles dropped.
    fn compact(&mut self) -> usize;

    /// Copy of particle `i` as a logical record
    fn get(&self, i: usize) -> Particle {
        Particle {
            mass: self.mass(i),
            position: self.position(i),
            velocity: self.velocity(i),
            force: self.force(i),
            removed: self.is_removed(i),
        }
    }

    /// Copy every particle out as logical records, in index order
    fn to_vec(&self) -> Vec<Particle> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// Squared distance between particles `i` and `j`
    fn distance_squared(&self, i: usize, j: usize) -> f64 {
        (self.position(i) - self.position(j)).norm_squared()
    }

    /// Keep particle `i` inside `[0, enclosure_size]³`
    ///
    /// Each axis is handled on its own: a coordinate past a wall is clamped
    /// to that wall and the matching velocity component changes sign.
    /// Returns `true` if any axis bounced.
    fn apply_boundary(&mut self, i: usize, enclosure_size: f64) -> bool {
        let mut position = self.position(i);
        let mut velocity = self.velocity(i);
        let mut bounced = false;

        for axis in 0..3 {
            if position[axis] < 0.0 {
                position[axis] = 0.0;
                velocity[axis] = -velocity[axis];
                bounced = true;
            } else if position[axis] > enclosure_size {
                position[axis] = enclosure_size;
                velocity[axis] = -velocity[axis];
                bounced = true;
            }
        }

        if bounced {
            self.set_position(i, position);
            self.set_velocity(i, velocity);
        }
        bounced
    }

    /// Absorb particle `j` into particle `i`
    ///
    /// Masses add. Velocities add component-wise without mass weighting, so
    /// momentum is not conserved. `j` is flagged removed.
    fn merge_into(&mut self, i: usize, j: usize) {
        debug_assert_ne!(i, j, "a particle cannot absorb itself");
        self.set_mass(i, self.mass(i) + self.mass(j));
        self.set_velocity(i, self.velocity(i) + self.velocity(j));
        self.mark_removed(j);
    }
}

/// Build a storage from explicit particle records
pub fn from_particles<S, I>(particles: I) -> S
where
    S: ParticleStorage,
    I: IntoIterator<Item = Particle>,
{
    let iter = particles.into_iter();
    let mut storage = S::with_capacity(iter.size_hint().0);
    for particle in iter {
        storage.push(particle);
    }
    storage
}

/// Generate `count` particles from a seeded random distribution
///
/// Positions are uniform in `[0, enclosure_size]³` and masses follow
/// `Normal(MASS_MEAN, MASS_STD_DEV)`. For each particle the draws happen in
/// the order `x, y, z, mass`, so a seed always reproduces the same set
/// regardless of layout.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `count` is negative or
/// `enclosure_size` is negative or not finite.
pub fn generate<S: ParticleStorage>(count: i64, seed: u64, enclosure_size: f64) -> Result<S> {
    if count < 0 {
        return Err(Error::invalid(format!(
            "particle count must be >= 0, got {count}"
        )));
    }
    if !(enclosure_size >= 0.0 && enclosure_size.is_finite()) {
        return Err(Error::invalid(format!(
            "enclosure size must be finite and >= 0, got {enclosure_size}"
        )));
    }

    let count = usize::try_from(count)
        .map_err(|_| Error::invalid(format!("particle count {count} does not fit in memory")))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let uniform = Uniform::new_inclusive(0.0, enclosure_size);
    let normal = Normal::new(MASS_MEAN, MASS_STD_DEV)
        .map_err(|e| Error::invalid(format!("mass distribution: {e}")))?;

    let mut storage = S::with_capacity(count);
    for _ in 0..count {
        let x = uniform.sample(&mut rng);
        let y = uniform.sample(&mut rng);
        let z = uniform.sample(&mut rng);
        let mass = normal.sample(&mut rng);
        storage.push(Particle::new(mass, Vec3::new(x, y, z)));
    }

    Ok(storage)
}
