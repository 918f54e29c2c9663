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
//! Error types for the simulation core
//!
//! The core is a pure in-memory pipeline, so there are no transient or
//! retryable failures. Parameter problems are caught before any state is
//! built, and broken internal invariants abort the run.

use thiserror::Error;

/// Crate-wide result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration, particle generation and the step loop
#[derive(Debug, Error)]
pub enum Error {
    /// A user supplied parameter failed validation
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Internal consistency failure, e.g. a non-positive mass reaching
    /// force computation
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// Snapshot I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for building an [`Error::InvalidParameter`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}
