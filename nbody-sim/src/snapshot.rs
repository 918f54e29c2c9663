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
//! Plain-text particle snapshots
//!
//! ```text
//! <enclosure_size> <time_step> <particle_count>
//! <x> <y> <z> <vx> <vy> <vz> <mass>
//! ...
//! ```
//!
//! Floats are written with three decimals, the count as an integer, fields
//! separated by single spaces, one particle per line.

use crate::error::{Error, Result};
use crate::storage::ParticleStorage;
use crate::vector::Vec3;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// File name of the snapshot written before the first step
pub const INITIAL_SNAPSHOT: &str = "init_config.txt";

/// File name of the snapshot written after the last step
pub const FINAL_SNAPSHOT: &str = "final_config.txt";

/// One particle line of a snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotRow {
    /// Position
    pub position: Vec3,
    /// Velocity
    pub velocity: Vec3,
    /// Mass
    pub mass: f64,
}

/// Header plus one row per surviving particle
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Edge length of the enclosure
    pub enclosure_size: f64,
    /// Time step
    pub time_step: f64,
    /// Particles in index order
    pub rows: Vec<SnapshotRow>,
}

impl Snapshot {
    /// Capture the current state of a particle set
    pub fn from_storage<S: ParticleStorage>(set: &S, enclosure_size: f64, time_step: f64) -> Self {
        let rows = (0..set.len())
            .filter(|&i| !set.is_removed(i))
            .map(|i| SnapshotRow {
                position: set.position(i),
                velocity: set.velocity(i),
                mass: set.mass(i),
            })
            .collect();

        Snapshot {
            enclosure_size,
            time_step,
            rows,
        }
    }

    /// Number of particles in the snapshot
    pub fn particle_count(&self) -> usize {
        self.rows.len()
    }

    /// Total mass of all rows
    pub fn total_mass(&self) -> f64 {
        self.rows.iter().map(|row| row.mass).sum()
    }

    /// Write the snapshot text to `writer`
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        write!(writer, "{self}")?;
        writer.flush()?;
        Ok(())
    }

    /// Write the snapshot to a file, replacing any existing one
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:.3} {:.3} {}",
            self.enclosure_size,
            self.time_step,
            self.rows.len()
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} {:.3}",
                row.position.x,
                row.position.y,
                row.position.z,
                row.velocity.x,
                row.velocity.y,
                row.velocity.z,
                row.mass
            )?;
        }
        Ok(())
    }
}

fn parse_fields(line: &str, line_no: usize, expected: usize) -> Result<Vec<f64>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != expected {
        return Err(Error::invalid(format!(
            "snapshot line {line_no}: expected {expected} fields, found {}",
            fields.len()
        )));
    }
    fields
        .iter()
        .map(|field| {
            field.parse::<f64>().map_err(|e| {
                Error::invalid(format!("snapshot line {line_no}: bad number '{field}': {e}"))
            })
        })
        .collect()
}

impl FromStr for Snapshot {
    type Err = Error;

    /// Parse snapshot text; values carry the three-decimal rounding of the file
    fn from_str(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| Error::invalid("snapshot is empty"))?;
        let mut header_fields = header.split_whitespace();
        let mut next_header = |name: &str| {
            header_fields
                .next()
                .ok_or_else(|| Error::invalid(format!("snapshot header is missing {name}")))
        };
        let enclosure_size: f64 = next_header("enclosure size")?
            .parse()
            .map_err(|e| Error::invalid(format!("snapshot header enclosure size: {e}")))?;
        let time_step: f64 = next_header("time step")?
            .parse()
            .map_err(|e| Error::invalid(format!("snapshot header time step: {e}")))?;
        let count: usize = next_header("particle count")?
            .parse()
            .map_err(|e| Error::invalid(format!("snapshot header particle count: {e}")))?;

        let mut rows = Vec::new();
        for (index, line) in lines {
            let v = parse_fields(line, index + 1, 7)?;
            rows.push(SnapshotRow {
                position: Vec3::new(v[0], v[1], v[2]),
                velocity: Vec3::new(v[3], v[4], v[5]),
                mass: v[6],
            });
        }

        if rows.len() != count {
            return Err(Error::invalid(format!(
                "snapshot header declares {count} particles but {} rows follow",
                rows.len()
            )));
        }

        Ok(Snapshot {
            enclosure_size,
            time_step,
            rows,
        })
    }
}
