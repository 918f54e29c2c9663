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
//! Structure-of-arrays particle storage

use super::{Particle, ParticleStorage, StorageLayout};
use crate::vector::Vec3;

/// Particle set stored as one column per attribute
///
/// The pairwise force and collision scans only read positions and masses,
/// so keeping those in their own dense columns keeps the inner loops on a
/// small working set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoAStorage {
    mass: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    vx: Vec<f64>,
    vy: Vec<f64>,
    vz: Vec<f64>,
    fx: Vec<f64>,
    fy: Vec<f64>,
    fz: Vec<f64>,
    removed: Vec<bool>,
}

impl SoAStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Dense mass column
    pub fn masses(&self) -> &[f64] {
        &self.mass
    }

    /// Dense position columns as `(x, y, z)`
    pub fn positions(&self) -> (&[f64], &[f64], &[f64]) {
        (&self.x, &self.y, &self.z)
    }

    fn columns_mut(&mut self) -> [&mut Vec<f64>; 10] {
        [
            &mut self.mass,
            &mut self.x,
            &mut self.y,
            &mut self.z,
            &mut self.vx,
            &mut self.vy,
            &mut self.vz,
            &mut self.fx,
            &mut self.fy,
            &mut self.fz,
        ]
    }
}

impl ParticleStorage for SoAStorage {
    fn with_capacity(capacity: usize) -> Self {
        SoAStorage {
            mass: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            vx: Vec::with_capacity(capacity),
            vy: Vec::with_capacity(capacity),
            vz: Vec::with_capacity(capacity),
            fx: Vec::with_capacity(capacity),
            fy: Vec::with_capacity(capacity),
            fz: Vec::with_capacity(capacity),
            removed: Vec::with_capacity(capacity),
        }
    }

    fn layout(&self) -> StorageLayout {
        StorageLayout::SoA
    }

    fn len(&self) -> usize {
        self.mass.len()
    }

    fn push(&mut self, particle: Particle) {
        self.mass.push(particle.mass);
        self.x.push(particle.position.x);
        self.y.push(particle.position.y);
        self.z.push(particle.position.z);
        self.vx.push(particle.velocity.x);
        self.vy.push(particle.velocity.y);
        self.vz.push(particle.velocity.z);
        self.fx.push(particle.force.x);
        self.fy.push(particle.force.y);
        self.fz.push(particle.force.z);
        self.removed.push(particle.removed);
    }

    fn mass(&self, i: usize) -> f64 {
        self.mass[i]
    }

    fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.x[i], self.y[i], self.z[i])
    }

    fn velocity(&self, i: usize) -> Vec3 {
        Vec3::new(self.vx[i], self.vy[i], self.vz[i])
    }

    fn force(&self, i: usize) -> Vec3 {
        Vec3::new(self.fx[i], self.fy[i], self.fz[i])
    }

    fn is_removed(&self, i: usize) -> bool {
        self.removed[i]
    }

    fn set_mass(&mut self, i: usize, mass: f64) {
        self.mass[i] = mass;
    }

    fn set_position(&mut self, i: usize, position: Vec3) {
        self.x[i] = position.x;
        self.y[i] = position.y;
        self.z[i] = position.z;
    }

    fn set_velocity(&mut self, i: usize, velocity: Vec3) {
        self.vx[i] = velocity.x;
        self.vy[i] = velocity.y;
        self.vz[i] = velocity.z;
    }

    fn add_force(&mut self, i: usize, force: Vec3) {
        self.fx[i] += force.x;
        self.fy[i] += force.y;
        self.fz[i] += force.z;
    }

    fn mark_removed(&mut self, i: usize) {
        self.removed[i] = true;
    }

    fn reset_forces(&mut self) {
        self.fx.fill(0.0);
        self.fy.fill(0.0);
        self.fz.fill(0.0);
    }

    fn distance_squared(&self, i: usize, j: usize) -> f64 {
        let dx = self.x[i] - self.x[j];
        let dy = self.y[i] - self.y[j];
        let dz = self.z[i] - self.z[j];
        dx * dx + dy * dy + dz * dz
    }

    fn compact(&mut self) -> usize {
        let len = self.len();
        let mut write = 0;

        for read in 0..len {
            if self.removed[read] {
                continue;
            }
            if write != read {
                for column in self.columns_mut() {
                    column[write] = column[read];
                }
            }
            write += 1;
        }

        for column in self.columns_mut() {
            column.truncate(write);
        }
        self.removed.clear();
        self.removed.resize(write, false);

        len - write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_stay_aligned() {
        let mut set = SoAStorage::new();
        set.push(Particle::new(1.0, Vec3::new(1.0, 2.0, 3.0)));
        set.push(Particle::new(2.0, Vec3::new(4.0, 5.0, 6.0)));
        assert_eq!(set.masses(), &[1.0, 2.0]);
        let (x, y, z) = set.positions();
        assert_eq!(x, &[1.0, 4.0]);
        assert_eq!(y, &[2.0, 5.0]);
        assert_eq!(z, &[3.0, 6.0]);
        assert_eq!(set.layout(), StorageLayout::SoA);
    }

    #[test]
    fn test_compact_moves_every_column() {
        let mut set = SoAStorage::new();
        for k in 0..5 {
            let f = k as f64;
            set.push(
                Particle::new(f + 1.0, Vec3::new(f, f, f)).with_velocity(Vec3::new(-f, 0.0, f)),
            );
            set.add_force(k, Vec3::new(f, 0.0, 0.0));
        }
        set.mark_removed(0);
        set.mark_removed(2);
        assert_eq!(set.compact(), 2);
        assert_eq!(set.len(), 3);

        let survivors = set.to_vec();
        let masses: Vec<f64> = survivors.iter().map(|p| p.mass).collect();
        assert_eq!(masses, vec![2.0, 4.0, 5.0]);
        assert_eq!(survivors[1].position, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(survivors[1].velocity, Vec3::new(-3.0, 0.0, 3.0));
        assert_eq!(survivors[2].force, Vec3::new(4.0, 0.0, 0.0));
        assert!(survivors.iter().all(|p| !p.removed));
    }

    #[test]
    fn test_reset_forces() {
        let mut set = SoAStorage::new();
        set.push(Particle::new(1.0, Vec3::zero()));
        set.add_force(0, Vec3::new(1.0, 2.0, 3.0));
        set.add_force(0, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(set.force(0), Vec3::new(2.0, 4.0, 6.0));
        set.reset_forces();
        assert_eq!(set.force(0), Vec3::zero());
    }
}
