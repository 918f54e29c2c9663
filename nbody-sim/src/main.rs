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
//! Command-line front end
//!
//! ```text
//! nbody-sim <num_objects> <num_iterations> <random_seed> <size_enclosure> <time_step> [en_benchmark]
//! ```
//!
//! Exit codes: 1 for malformed arguments, 2 for parameters that fail
//! validation, 3 for snapshot I/O failures, 4 for a particle set that breaks
//! an internal precondition during the run.

use anyhow::Context;
use clap::Parser;
use nbody_sim::config::SimulationConfig;
use nbody_sim::{run_with_layout, Error, StorageLayout};
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_BAD_ARGUMENTS: u8 = 1;
const EXIT_INVALID_PARAMETER: u8 = 2;
const EXIT_IO: u8 = 3;
const EXIT_PRECONDITION: u8 = 4;

#[derive(Parser, Debug)]
#[command(version, about = "Gravitational N-body simulation with collision merging")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Number of particles to generate
    num_objects: i64,

    /// Number of simulation steps
    num_iterations: i64,

    /// Seed for the particle generator
    random_seed: u64,

    /// Edge length of the cubic enclosure
    size_enclosure: f64,

    /// Time step in seconds
    time_step: f64,

    /// Pass `en_benchmark` to print only the elapsed milliseconds
    #[arg(value_parser = ["en_benchmark"])]
    benchmark: Option<String>,

    /// Particle storage layout
    #[arg(long, default_value = "aos")]
    layout: StorageLayout,

    /// Worker threads for the parallel phases (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Distance below which two particles merge
    #[arg(long, default_value_t = nbody_sim::collision::DEFAULT_MERGE_THRESHOLD)]
    merge_threshold: f64,

    /// Directory for init_config.txt and final_config.txt
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl Args {
    fn config(&self) -> nbody_sim::Result<SimulationConfig> {
        Ok(SimulationConfig::new(
            self.num_objects,
            self.num_iterations,
            self.random_seed,
            self.size_enclosure,
            self.time_step,
        )?
        .with_merge_threshold(self.merge_threshold)?
        .with_layout(self.layout)
        .with_threads(self.threads)
        .with_benchmark(self.benchmark.is_some()))
    }

    fn echo(&self) {
        println!("nbody-sim invoked with 5 parameters.");
        println!("Arguments:");
        println!(" num_objects: {}", self.num_objects);
        println!(" num_iterations: {}", self.num_iterations);
        println!(" random_seed: {}", self.random_seed);
        println!(" size_enclosure: {}", self.size_enclosure);
        println!(" time_step: {}", self.time_step);
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<Error>() {
        Some(Error::InvalidParameter(_)) => EXIT_INVALID_PARAMETER,
        Some(Error::Io(_)) => EXIT_IO,
        Some(Error::PreconditionViolation(_)) => EXIT_PRECONDITION,
        None => EXIT_BAD_ARGUMENTS,
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.config()?;
    if !config.benchmark() {
        args.echo();
    }

    let output = run_with_layout(&config, Some(&args.output_dir))
        .with_context(|| format!("simulation writing to {}", args.output_dir.display()))?;

    if config.benchmark() {
        print!("{:.6}", output.summary.timing.total_ms());
    } else {
        println!(
            "{} particles remain after {} steps",
            output.summary.final_count, output.summary.iterations
        );
        println!("{}", output.summary.timing);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_BAD_ARGUMENTS);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
