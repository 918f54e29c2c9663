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
//! Force accumulation and time integration
//!
//! One physics step is:
//!
//! 1. zero every force accumulator
//! 2. accumulate pairwise gravity (see [`gravity`])
//! 3. semi-implicit Euler for each particle: `v += F/m * dt`, then
//!    `p += v * dt` with the updated velocity
//! 4. reflect off the enclosure walls
//!
//! Arithmetic is plain `f64`. Extreme values from near-singular encounters
//! propagate as ordinary numbers; integration only logs when it produces
//! non-finite state.

pub mod gravity;

pub use gravity::{pairwise_force, GRAVITATIONAL_CONSTANT};

use crate::error::{Error, Result};
use crate::parallel::WorkerPool;
use crate::storage::ParticleStorage;
use crate::vector::Vec3;
use log::{debug, warn};

/// Outcome of a single integration step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Particles that were integrated
    pub particles: usize,
    /// Particles that hit at least one wall
    pub bounces: usize,
    /// Particles left with a non-finite position or velocity
    pub invalid: usize,
}

/// Advances a particle set by one fixed time step
///
/// # Example
///
/// ```
/// use nbody_sim::integration::ForceIntegrator;
/// use nbody_sim::parallel::WorkerPool;
/// use nbody_sim::storage::{from_particles, AoSStorage, Particle, ParticleStorage};
/// use nbody_sim::Vec3;
///
/// let integrator = ForceIntegrator::new(0.1, 100.0);
/// let pool = WorkerPool::single().unwrap();
/// let mut set: AoSStorage = from_particles(vec![
///     Particle::new(1.0, Vec3::new(50.0, 50.0, 50.0)).with_velocity(Vec3::new(1.0, 0.0, 0.0)),
/// ]);
///
/// integrator.step(&mut set, &pool).unwrap();
/// assert!((set.position(0).x - 50.1).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceIntegrator {
    g_constant: f64,
    time_step: f64,
    enclosure_size: f64,
}

impl ForceIntegrator {
    /// Create an integrator with the standard gravitational constant
    pub fn new(time_step: f64, enclosure_size: f64) -> Self {
        ForceIntegrator {
            g_constant: GRAVITATIONAL_CONSTANT,
            time_step,
            enclosure_size,
        }
    }

    /// Override the gravitational constant (scaled demonstrations, tests)
    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.g_constant = g;
        self
    }

    /// Gravitational constant in use
    pub fn g_constant(&self) -> f64 {
        self.g_constant
    }

    /// Time step in seconds
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Edge length of the cubic enclosure
    pub fn enclosure_size(&self) -> f64 {
        self.enclosure_size
    }

    /// Fail if any particle has a non-positive or NaN mass
    ///
    /// Generation and merging both keep masses positive, so a failure here
    /// means an internal invariant has been broken.
    pub fn check_masses<S: ParticleStorage>(&self, set: &S) -> Result<()> {
        for i in 0..set.len() {
            let mass = set.mass(i);
            if !(mass > 0.0) {
                return Err(Error::PreconditionViolation(format!(
                    "particle {i} has non-positive mass {mass}"
                )));
            }
        }
        Ok(())
    }

    /// Zero the accumulators and sum all pairwise forces into them
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionViolation`] if a mass is not positive.
    pub fn accumulate_forces<S: ParticleStorage>(&self, set: &mut S, pool: &WorkerPool) -> Result<()> {
        set.reset_forces();
        self.check_masses(set)?;
        gravity::accumulate(self.g_constant, set, pool);
        Ok(())
    }

    /// Apply accumulated forces with semi-implicit Euler, then bounce off walls
    pub fn integrate<S: ParticleStorage>(&self, set: &mut S) -> StepStats {
        let dt = self.time_step;
        let mut stats = StepStats {
            particles: set.len(),
            ..StepStats::default()
        };

        for i in 0..set.len() {
            let velocity = set.velocity(i) + set.force(i) / set.mass(i) * dt;
            set.set_velocity(i, velocity);
            set.set_position(i, set.position(i) + velocity * dt);

            if set.apply_boundary(i, self.enclosure_size) {
                stats.bounces += 1;
            }
            if !set.position(i).is_valid() || !set.velocity(i).is_valid() {
                stats.invalid += 1;
            }
        }

        if stats.invalid > 0 {
            warn!(
                "integration left {} of {} particles with non-finite state",
                stats.invalid, stats.particles
            );
        }
        stats
    }

    /// Run one full physics step: accumulate forces, then integrate
    pub fn step<S: ParticleStorage>(&self, set: &mut S, pool: &WorkerPool) -> Result<StepStats> {
        self.accumulate_forces(set, pool)?;
        let stats = self.integrate(set);
        debug!(
            "integrated {} particles, {} wall bounces",
            stats.particles, stats.bounces
        );
        Ok(stats)
    }
}

/// Vector sum of every force accumulator
///
/// Right after accumulation this is zero up to rounding, since each pair
/// contributes equal and opposite forces.
pub fn total_force<S: ParticleStorage>(set: &S) -> Vec3 {
    let mut total = Vec3::zero();
    for i in 0..set.len() {
        total += set.force(i);
    }
    total
}

/// Total kinetic energy, `Σ ½ m v²`
pub fn kinetic_energy<S: ParticleStorage>(set: &S) -> f64 {
    (0..set.len())
        .map(|i| 0.5 * set.mass(i) * set.velocity(i).norm_squared())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{from_particles, AoSStorage, Particle, SoAStorage};

    #[test]
    fn test_semi_implicit_euler() {
        // F = 2 N on 1 kg for 0.1 s: v' = 10 + 2*0.1 = 10.2, p' = 10.2*0.1
        let integrator = ForceIntegrator::new(0.1, 1e6);
        let mut set: AoSStorage = from_particles(vec![
            Particle::new(1.0, Vec3::new(100.0, 100.0, 100.0)).with_velocity(Vec3::new(10.0, 0.0, 0.0)),
        ]);
        set.add_force(0, Vec3::new(2.0, 0.0, 0.0));

        let stats = integrator.integrate(&mut set);
        assert_eq!(stats.particles, 1);
        assert!((set.velocity(0).x - 10.2).abs() < 1e-12);
        assert!((set.position(0).x - 101.02).abs() < 1e-9);
    }

    #[test]
    fn test_upper_wall_bounce() {
        let integrator = ForceIntegrator::new(1.0, 10.0);
        let mut set: SoAStorage = from_particles(vec![
            Particle::new(1.0, Vec3::new(9.5, 5.0, 5.0)).with_velocity(Vec3::new(2.0, 0.5, 0.0)),
        ]);

        let stats = integrator.integrate(&mut set);
        assert_eq!(stats.bounces, 1);
        assert_eq!(set.position(0).x, 10.0);
        assert_eq!(set.velocity(0).x, -2.0);
        assert_eq!(set.position(0).y, 5.5);
        assert_eq!(set.velocity(0).y, 0.5);
    }

    #[test]
    fn test_lower_wall_bounce_on_every_axis() {
        let integrator = ForceIntegrator::new(1.0, 10.0);
        let mut set: AoSStorage = from_particles(vec![
            Particle::new(1.0, Vec3::new(0.5, 0.5, 0.5)).with_velocity(Vec3::new(-1.0, -2.0, -3.0)),
        ]);

        integrator.integrate(&mut set);
        assert_eq!(set.position(0), Vec3::zero());
        assert_eq!(set.velocity(0), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_check_masses_rejects_zero() {
        let integrator = ForceIntegrator::new(0.1, 10.0);
        let pool = WorkerPool::single().unwrap();
        let mut set: AoSStorage = from_particles(vec![
            Particle::new(1.0, Vec3::zero()),
            Particle::new(0.0, Vec3::new(1.0, 1.0, 1.0)),
        ]);

        let result = integrator.step(&mut set, &pool);
        assert!(matches!(result, Err(Error::PreconditionViolation(_))));
    }

    #[test]
    fn test_two_bodies_attract() {
        let integrator = ForceIntegrator::new(1.0, 1e6);
        let pool = WorkerPool::single().unwrap();
        let mut set: SoAStorage = from_particles(vec![
            Particle::new(1e21, Vec3::new(1000.0, 500.0, 500.0)),
            Particle::new(1e21, Vec3::new(2000.0, 500.0, 500.0)),
        ]);

        integrator.accumulate_forces(&mut set, &pool).unwrap();
        assert!(set.force(0).x > 0.0);
        assert!(set.force(1).x < 0.0);
        assert_eq!(total_force(&set), Vec3::zero());

        integrator.integrate(&mut set);
        assert!(set.velocity(0).x > 0.0);
        assert!(set.velocity(1).x < 0.0);
        assert!(kinetic_energy(&set) > 0.0);
    }

    #[test]
    fn test_zero_time_step_leaves_positions() {
        let integrator = ForceIntegrator::new(0.0, 100.0);
        let pool = WorkerPool::single().unwrap();
        let mut set: AoSStorage = from_particles(vec![
            Particle::new(1e21, Vec3::new(10.0, 10.0, 10.0)),
            Particle::new(1e21, Vec3::new(20.0, 10.0, 10.0)),
        ]);

        integrator.step(&mut set, &pool).unwrap();
        assert_eq!(set.position(0), Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(set.velocity(1), Vec3::zero());
    }
}
