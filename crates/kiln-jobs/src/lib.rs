// Copyright 2025 eraflo
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

//! # Kiln Jobs
//!
//! A small worker-thread pool for producers that compute frame data off the
//! main thread (skinning buffers, cloth solves, procedural meshes).
//! Submission is fire-and-forget; a producer that depends on a job's result
//! calls [`JobHandle::wait`] before building its render blocks — joins are
//! always producer-initiated, never hidden inside the render context.

#![warn(missing_docs)]

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::thread::{available_parallelism, JoinHandle};

type Job = Box<dyn FnOnce() + Send>;

/// A handle to a submitted job, joined with [`wait`](Self::wait).
#[must_use = "a job handle that is never waited on cannot synchronize anything"]
pub struct JobHandle {
    done: Receiver<()>,
}

impl JobHandle {
    /// Blocks until the job has finished.
    pub fn wait(self) {
        // A disconnect also means the job can no longer be running.
        let _ = self.done.recv();
    }
}

/// A fixed pool of worker threads consuming a shared job queue.
pub struct JobSystem {
    queue: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl JobSystem {
    /// Creates a pool with one worker per available CPU.
    pub fn new() -> Self {
        Self::with_threads(available_parallelism().map(|n| n.get()).unwrap_or(1))
    }

    /// Creates a pool with an explicit worker count (at least one).
    pub fn with_threads(threads: usize) -> Self {
        let (queue, jobs) = unbounded::<Job>();
        let workers = (0..threads.max(1))
            .map(|index| {
                let jobs = jobs.clone();
                std::thread::Builder::new()
                    .name(format!("kiln-job-{index}"))
                    .spawn(move || {
                        while let Ok(job) = jobs.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();
        log::debug!("job system started with {} workers", threads.max(1));
        Self {
            queue: Some(queue),
            workers,
        }
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Submits a job for execution on some worker thread.
    pub fn add(&self, task: impl FnOnce() + Send + 'static) -> JobHandle {
        self.add_boxed(Box::new(task))
    }

    /// Runs several jobs and joins them all before returning.
    pub fn fork(&self, tasks: impl IntoIterator<Item = Job>) {
        let handles: Vec<JobHandle> = tasks.into_iter().map(|task| self.add_boxed(task)).collect();
        for handle in handles {
            handle.wait();
        }
    }

    fn add_boxed(&self, task: Job) -> JobHandle {
        let (done_tx, done_rx) = bounded(1);
        let job: Job = Box::new(move || {
            task();
            let _ = done_tx.send(());
        });
        // On a failed send the done sender is dropped with the job, so
        // `wait` still returns; the job itself never runs.
        match &self.queue {
            Some(queue) => {
                if queue.send(job).is_err() {
                    log::warn!("job dropped: no live worker to run it");
                }
            }
            None => log::warn!("job dropped: queue already closed"),
        }
        JobHandle { done: done_rx }
    }
}

impl Default for JobSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        // Closing the queue lets each worker drain what remains and exit.
        self.queue.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
