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
//! Benchmarks comparing the AoS and SoA particle layouts
//!
//! These benchmarks measure:
//! - Force accumulation and integration for a full step
//! - Collision detection with one and several workers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nbody_sim::collision::CollisionResolver;
use nbody_sim::integration::ForceIntegrator;
use nbody_sim::parallel::WorkerPool;
use nbody_sim::storage::{generate, AoSStorage, SoAStorage};
use nbody_sim::ParticleStorage;

const ENCLOSURE: f64 = 1.0e4;
const TIME_STEP: f64 = 0.01;
const SEED: u64 = 31728674;

fn bench_step_for<S: ParticleStorage>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(format!("step_{name}"));
    let integrator = ForceIntegrator::new(TIME_STEP, ENCLOSURE);

    for count in [100, 500, 1000].iter() {
        // Pairwise interactions dominate the cost
        group.throughput(Throughput::Elements((*count * (*count - 1) / 2) as u64));

        for threads in [1, 4] {
            let pool = WorkerPool::new(threads).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{threads}_threads"), count),
                count,
                |b, &count| {
                    let mut set: S = generate(count, SEED, ENCLOSURE).unwrap();
                    b.iter(|| {
                        let stats = integrator.step(&mut set, &pool).unwrap();
                        black_box(stats);
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark: force accumulation plus integration
fn bench_step(c: &mut Criterion) {
    bench_step_for::<AoSStorage>(c, "aos");
    bench_step_for::<SoAStorage>(c, "soa");
}

fn bench_detect_for<S: ParticleStorage>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(format!("detect_{name}"));
    let resolver = CollisionResolver::new(50.0);

    for count in [500, 2000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        let set: S = generate(*count, SEED, ENCLOSURE).unwrap();

        for threads in [1, 4] {
            let pool = WorkerPool::new(threads).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{threads}_threads"), count),
                &set,
                |b, set| {
                    b.iter(|| black_box(resolver.detect(set, &pool)));
                },
            );
        }
    }

    group.finish();
}

/// Benchmark: candidate detection without merging
fn bench_detect(c: &mut Criterion) {
    bench_detect_for::<AoSStorage>(c, "aos");
    bench_detect_for::<SoAStorage>(c, "soa");
}

criterion_group!(benches, bench_step, bench_detect);
criterion_main!(benches);
