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
//! Array-of-structures particle storage

use super::{Particle, ParticleStorage, StorageLayout};
use crate::vector::Vec3;

/// Particle set stored as one contiguous `Vec<Particle>`
///
/// Every attribute of a particle sits in the same cache line, which favours
/// per-particle access such as the integration write-back.
///
/// # Example
///
/// ```
/// use nbody_sim::storage::{AoSStorage, Particle, ParticleStorage};
/// use nbody_sim::Vec3;
///
/// let mut set = AoSStorage::with_capacity(2);
/// set.push(Particle::new(2.0, Vec3::zero()));
/// set.push(Particle::new(3.0, Vec3::zero()));
/// set.merge_into(1, 0);
/// assert_eq!(set.compact(), 1);
/// assert_eq!(set.mass(0), 5.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AoSStorage {
    particles: Vec<Particle>,
}

impl AoSStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the underlying records
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

impl ParticleStorage for AoSStorage {
    fn with_capacity(capacity: usize) -> Self {
        AoSStorage {
            particles: Vec::with_capacity(capacity),
        }
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::AoS
    }

    fn len(&self) -> usize {
        self.particles.len()
    }

    fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    fn mass(&self, i: usize) -> f64 {
        self.particles[i].mass
    }

    fn position(&self, i: usize) -> Vec3 {
        self.particles[i].position
    }

    fn velocity(&self, i: usize) -> Vec3 {
        self.particles[i].velocity
    }

    fn force(&self, i: usize) -> Vec3 {
        self.particles[i].force
    }

    fn is_removed(&self, i: usize) -> bool {
        self.particles[i].removed
    }

    fn set_mass(&mut self, i: usize, mass: f64) {
        self.particles[i].mass = mass;
    }

    fn set_position(&mut self, i: usize, position: Vec3) {
        self.particles[i].position = position;
    }

    fn set_velocity(&mut self, i: usize, velocity: Vec3) {
        self.particles[i].velocity = velocity;
    }

    fn add_force(&mut self, i: usize, force: Vec3) {
        self.particles[i].force += force;
    }

    fn mark_removed(&mut self, i: usize) {
        self.particles[i].removed = true;
    }

    fn reset_forces(&mut self) {
        for particle in &mut self.particles {
            particle.force = Vec3::zero();
        }
    }

    fn get(&self, i: usize) -> Particle {
        self.particles[i]
    }

    fn to_vec(&self) -> Vec<Particle> {
        self.particles.clone()
    }

    fn compact(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !p.removed);
        before - self.particles.len()
    }
}
