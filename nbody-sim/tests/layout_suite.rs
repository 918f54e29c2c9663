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
//! Behavioural suite shared by every particle layout
//!
//! Each test body is generic over [`ParticleStorage`] and instantiated once
//! per layout, so both layouts are held to the same contract.

use approx::assert_abs_diff_eq;
use nbody_sim::collision::CollisionResolver;
use nbody_sim::config::SimulationConfig;
use nbody_sim::integration::{total_force, ForceIntegrator};
use nbody_sim::parallel::WorkerPool;
use nbody_sim::storage::{from_particles, generate, AoSStorage, Particle, SoAStorage};
use nbody_sim::{ParticleStorage, Simulation, Vec3};

fn pool() -> WorkerPool {
    WorkerPool::single().unwrap()
}

fn no_overlap_after_resolution<S: ParticleStorage>() {
    let threshold = 15.0;
    let mut set: S = generate(300, 2024, 200.0).unwrap();
    let resolver = CollisionResolver::new(threshold);

    let report = resolver.resolve(&mut set, &pool());
    assert!(report.merges > 0, "dense set should produce merges");

    for i in 0..set.len() {
        for j in 0..i {
            assert!(
                set.distance_squared(i, j) >= threshold * threshold,
                "particles {i} and {j} still overlap"
            );
        }
    }
}

fn merge_conserves_mass_and_adds_velocity<S: ParticleStorage>() {
    let survivor = Particle::new(3.5e21, Vec3::new(1.0, 1.0, 1.0)).with_velocity(Vec3::new(1.0, -2.0, 0.5));
    let absorbed = Particle::new(1.25e21, Vec3::new(2.0, 2.0, 2.0)).with_velocity(Vec3::new(4.0, 1.0, -0.5));
    let mut set: S = from_particles(vec![absorbed, survivor]);

    set.merge_into(1, 0);

    assert!(set.is_removed(0));
    assert_eq!(set.mass(1), 3.5e21 + 1.25e21);
    // Velocities add without mass weighting, so momentum is not conserved
    assert_eq!(set.velocity(1), Vec3::new(5.0, -1.0, 0.0));
    assert_eq!(set.position(1), Vec3::new(1.0, 1.0, 1.0));

    assert_eq!(set.compact(), 1);
    assert_eq!(set.len(), 1);
    assert_eq!(set.mass(0), 4.75e21);
}

fn merges_conserve_pair_mass<S: ParticleStorage>() {
    let resolver = CollisionResolver::new(12.0);
    let mut set: S = generate(250, 77, 120.0).unwrap();
    let mut candidates = resolver.detect(&set, &pool());
    assert!(!candidates.is_empty());

    let mut merges = 0;
    while let Some((_, pair)) = candidates.pop_last() {
        if set.is_removed(pair.absorbed) {
            continue;
        }
        let survivor_mass = set.mass(pair.survivor);
        let absorbed_mass = set.mass(pair.absorbed);
        set.merge_into(pair.survivor, pair.absorbed);
        assert_eq!(set.mass(pair.survivor), survivor_mass + absorbed_mass);
        merges += 1;
    }

    let mut resolved: S = generate(250, 77, 120.0).unwrap();
    let report = resolver.resolve(&mut resolved, &pool());
    assert_eq!(report.merges, merges);
    assert_eq!(resolved.len(), 250 - report.removed);
    assert_eq!(set.compact(), report.removed);
    assert_eq!(set.to_vec(), resolved.to_vec());
}

fn boundary_reflection<S: ParticleStorage>() {
    let size = 100.0;
    let mut set: S = from_particles(vec![
        Particle::new(1.0, Vec3::new(size + 1e-6, 50.0, -3.0)).with_velocity(Vec3::new(2.0, 1.0, -4.0)),
        Particle::new(1.0, Vec3::new(150.0, 120.0, 100.0)).with_velocity(Vec3::new(1.0, 1.0, 1.0)),
    ]);

    assert!(set.apply_boundary(0, size));
    assert_eq!(set.position(0), Vec3::new(size, 50.0, 0.0));
    assert_eq!(set.velocity(0), Vec3::new(-2.0, 1.0, 4.0));

    // A corner overshoot bounces each axis on its own
    assert!(set.apply_boundary(1, size));
    assert_eq!(set.position(1), Vec3::new(size, size, size));
    assert_eq!(set.velocity(1), Vec3::new(-1.0, -1.0, 1.0));
}

fn newtons_third_law<S: ParticleStorage>() {
    let mut set: S = generate(120, 9, 1e5).unwrap();
    let integrator = ForceIntegrator::new(0.1, 1e5);
    integrator.accumulate_forces(&mut set, &pool()).unwrap();

    let scale: f64 = (0..set.len()).map(|i| set.force(i).norm()).sum();
    let total = total_force(&set);
    assert!(scale > 0.0);
    assert_abs_diff_eq!(total.x, 0.0, epsilon = scale * 1e-12);
    assert_abs_diff_eq!(total.y, 0.0, epsilon = scale * 1e-12);
    assert_abs_diff_eq!(total.z, 0.0, epsilon = scale * 1e-12);
}

fn forces_reset_every_step<S: ParticleStorage>() {
    let mut set: S = generate(10, 3, 1e4).unwrap();
    let integrator = ForceIntegrator::new(0.0, 1e4);

    integrator.accumulate_forces(&mut set, &pool()).unwrap();
    let first: Vec<Vec3> = (0..set.len()).map(|i| set.force(i)).collect();
    integrator.accumulate_forces(&mut set, &pool()).unwrap();
    let second: Vec<Vec3> = (0..set.len()).map(|i| set.force(i)).collect();

    assert_eq!(first, second);
}

fn scenario_a_coincident_pair<S: ParticleStorage>() {
    let (m1, m2) = (1.0e21, 2.5e21);
    let here = Vec3::new(40.0, 40.0, 40.0);
    let mut set: S = from_particles(vec![Particle::new(m1, here), Particle::new(m2, here)]);

    let report = CollisionResolver::default().resolve(&mut set, &pool());
    assert_eq!(report.merges, 1);
    assert_eq!(set.len(), 1);
    assert_eq!(set.mass(0), m1 + m2);
}

fn scenario_b_empty_set<S: ParticleStorage>() {
    let config = SimulationConfig::new(0, 5, 1, 100.0, 0.1).unwrap().with_threads(1);
    let mut simulation = Simulation::<S>::new(config).unwrap();
    let summary = simulation.run().unwrap();

    assert_eq!(summary.final_count, 0);
    assert_eq!(simulation.snapshot().to_string(), "100.000 0.100 0\n");
}

fn scenario_c_lone_particle_at_rest<S: ParticleStorage>() {
    let start = Vec3::new(12.5, 30.0, 99.0);
    let config = SimulationConfig::new(0, 25, 1, 100.0, 0.5).unwrap().with_threads(1);
    let particles: S = from_particles(vec![Particle::new(1e21, start)]);
    let mut simulation = Simulation::with_particles(config, particles).unwrap();

    simulation.run().unwrap();
    assert_eq!(simulation.particles().position(0), start);
    assert_eq!(simulation.particles().velocity(0), Vec3::zero());
}

fn scenario_d_wall_overshoot_after_step<S: ParticleStorage>() {
    let size = 1000.0;
    let config = SimulationConfig::new(0, 1, 1, size, 1.0).unwrap().with_threads(1);
    let particles: S = from_particles(vec![
        Particle::new(1e21, Vec3::new(size - 0.5, 500.0, 500.0)).with_velocity(Vec3::new(0.75, 0.0, 0.0)),
    ]);
    let mut simulation = Simulation::with_particles(config, particles).unwrap();

    simulation.step().unwrap();
    assert_eq!(simulation.particles().position(0).x, size);
    assert_eq!(simulation.particles().velocity(0).x, -0.75);
}

fn compaction_is_stable<S: ParticleStorage>() {
    let mut set: S = from_particles((0..8).map(|k| Particle::new(k as f64 + 1.0, Vec3::new(k as f64, 0.0, 0.0))));
    for i in [0, 3, 4, 7] {
        set.mark_removed(i);
    }
    assert_eq!(set.compact(), 4);
    let masses: Vec<f64> = (0..set.len()).map(|i| set.mass(i)).collect();
    assert_eq!(masses, vec![2.0, 3.0, 6.0, 7.0]);
}

macro_rules! layout_suite {
    ($module:ident, $storage:ty) => {
        mod $module {
            use super::*;

            #[test]
            fn test_no_overlap_after_resolution() {
                no_overlap_after_resolution::<$storage>();
            }

            #[test]
            fn test_merge_conserves_mass_and_adds_velocity() {
                merge_conserves_mass_and_adds_velocity::<$storage>();
            }

            #[test]
            fn test_merges_conserve_pair_mass() {
                merges_conserve_pair_mass::<$storage>();
            }

            #[test]
            fn test_boundary_reflection() {
                boundary_reflection::<$storage>();
            }

            #[test]
            fn test_newtons_third_law() {
                newtons_third_law::<$storage>();
            }

            #[test]
            fn test_forces_reset_every_step() {
                forces_reset_every_step::<$storage>();
            }

            #[test]
            fn test_scenario_a_coincident_pair() {
                scenario_a_coincident_pair::<$storage>();
            }

            #[test]
            fn test_scenario_b_empty_set() {
                scenario_b_empty_set::<$storage>();
            }

            #[test]
            fn test_scenario_c_lone_particle_at_rest() {
                scenario_c_lone_particle_at_rest::<$storage>();
            }

            #[test]
            fn test_scenario_d_wall_overshoot_after_step() {
                scenario_d_wall_overshoot_after_step::<$storage>();
            }

            #[test]
            fn test_compaction_is_stable() {
                compaction_is_stable::<$storage>();
            }
        }
    };
}

layout_suite!(aos, AoSStorage);
layout_suite!(soa, SoAStorage);
