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
//! Pairwise Newtonian gravity
//!
//! Every unordered pair `(i, j)` attracts along the line joining the two
//! bodies with magnitude `G * mᵢ * mⱼ / r²`, written here as
//! `G * mᵢ * mⱼ / r³` times the displacement vector. No softening is
//! applied: close encounters are expected to be merged by the collision
//! pass, and the extreme forces of near misses are accepted as-is.
//!
//! ## Parallel Computation
//!
//! The force on `j` from a pair is the exact negation of the force on `i`,
//! so each pair cancels bit-for-bit. The sequential path walks the upper
//! triangle and writes both halves. The parallel path gives every worker
//! whole rows: row `i` sums its contributions over ascending `j` into a
//! private total, and totals are written back on the calling thread. Both
//! paths add each particle's contributions in ascending partner order, so
//! the accumulated forces are identical for any number of workers.

use crate::parallel::WorkerPool;
use crate::storage::ParticleStorage;
use crate::vector::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Gravitational constant in SI units (m³/(kg⋅s²))
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;

/// Force exerted on body `i` by body `j`
///
/// Returns the zero vector for coincident bodies, which have no defined
/// direction.
#[inline]
pub fn pairwise_force(g: f64, pos_i: Vec3, mass_i: f64, pos_j: Vec3, mass_j: f64) -> Vec3 {
    let d = pos_j - pos_i;
    let r_squared = d.norm_squared();
    if r_squared == 0.0 {
        return Vec3::zero();
    }
    let r = r_squared.sqrt();
    let scale = mass_i * mass_j * g / (r * r * r);
    d * scale
}

/// Accumulate all pairwise forces into the particles' accumulators
///
/// Accumulators are added to, not overwritten; callers reset them first.
pub fn accumulate<S: ParticleStorage>(g: f64, set: &mut S, pool: &WorkerPool) {
    #[cfg(feature = "parallel")]
    {
        if pool.is_parallel() && set.len() > 1 {
            accumulate_parallel(g, set, pool);
            return;
        }
    }

    let _ = pool;
    accumulate_sequential(g, set);
}

fn accumulate_sequential<S: ParticleStorage>(g: f64, set: &mut S) {
    let n = set.len();
    for i in 0..n {
        let pos_i = set.position(i);
        let mass_i = set.mass(i);
        for j in (i + 1)..n {
            let f = pairwise_force(g, pos_i, mass_i, set.position(j), set.mass(j));
            set.add_force(i, f);
            set.add_force(j, -f);
        }
    }
}

#[cfg(feature = "parallel")]
fn accumulate_parallel<S: ParticleStorage>(g: f64, set: &mut S, pool: &WorkerPool) {
    let n = set.len();
    let totals: Vec<Vec3> = {
        let view: &S = set;
        pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| row_force(g, view, i))
                .collect()
        })
    };

    for (i, total) in totals.into_iter().enumerate() {
        set.add_force(i, total);
    }
}

/// Total force on particle `i`, summed over ascending partner index
///
/// Each pair is always evaluated with the lower index first so the value
/// matches the sequential triangle walk exactly.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
fn row_force<S: ParticleStorage>(g: f64, set: &S, i: usize) -> Vec3 {
    let pos_i = set.position(i);
    let mass_i = set.mass(i);
    let mut total = Vec3::zero();

    for j in 0..set.len() {
        if j < i {
            total += -pairwise_force(g, set.position(j), set.mass(j), pos_i, mass_i);
        } else if j > i {
            total += pairwise_force(g, pos_i, mass_i, set.position(j), set.mass(j));
        }
    }

    total
}
