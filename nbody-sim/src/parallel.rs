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
//! Fixed-size worker pool for the parallel phases
//!
//! Only two phases fan out: the outer loop of pairwise force accumulation
//! and the outer loop of collision detection. Everything else runs on the
//! calling thread. With the `parallel` feature disabled the pool is an empty
//! placeholder and [`WorkerPool::install`] just calls the closure.

use crate::error::Result;
#[cfg(feature = "parallel")]
use crate::error::Error;

/// Handle to the threads used by the parallel phases
pub struct WorkerPool {
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers
    ///
    /// `0` lets Rayon pick (one worker per logical CPU, or `RAYON_NUM_THREADS`).
    #[cfg(feature = "parallel")]
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("nbody-worker-{index}"))
            .build()
            .map_err(|e| Error::invalid(format!("cannot build worker pool: {e}")))?;
        Ok(WorkerPool { pool })
    }

    /// Build a pool with `threads` workers
    #[cfg(not(feature = "parallel"))]
    pub fn new(_threads: usize) -> Result<Self> {
        Ok(WorkerPool {})
    }

    /// A pool that runs every phase on one worker
    pub fn single() -> Result<Self> {
        Self::new(1)
    }

    /// Number of workers that parallel phases fan out to
    pub fn thread_count(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            self.pool.current_num_threads()
        }

        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }

    /// Whether phases should take their parallel path
    pub fn is_parallel(&self) -> bool {
        self.thread_count() > 1
    }

    /// Run `op` inside the pool so Rayon iterators use its workers
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        #[cfg(feature = "parallel")]
        {
            self.pool.install(op)
        }

        #[cfg(not(feature = "parallel"))]
        {
            op()
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.thread_count())
            .finish()
    }
}
