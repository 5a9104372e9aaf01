//! Spawns roles onto named threads and tears them down again.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use derive_more::derive::Display;

use crate::{Role, StopSignal, Worker, WorkerError, WorkerReport, WorkerResult};

/// `WorkerId` identifies one spawned worker within its [`Supervisor`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(usize);

struct Handle {
    id: WorkerId,
    role: Role,
    thread_name: String,
    stop: Arc<StopSignal>,
    thread: thread::JoinHandle<WorkerReport>,
}

impl Handle {
    fn join(self) -> WorkerResult<WorkerReport> {
        self.thread.join().map_err(|_| {
            tracing::error!("Worker thread {} panicked", self.thread_name);
            WorkerError::Panicked(self.thread_name)
        })
    }
}

/// `Supervisor` owns the threads of every role in a simulation.
///
/// Threads are named `"{role}-{n}"` with `n` counting from 1 per role.
/// Dropping the supervisor stops and joins whatever is still running.
#[derive(Default)]
pub struct Supervisor {
    next_id: usize,
    spawned: HashMap<Role, usize>,
    handles: Vec<Handle>,
}

impl Supervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `worker` onto a fresh thread with its own [`StopSignal`].
    ///
    /// # Errors
    ///
    /// [`WorkerError::Spawn`] when the OS refuses to create the thread.
    pub fn spawn<W: Worker>(&mut self, worker: W) -> WorkerResult<WorkerId> {
        let role = worker.role();
        let count = self.spawned.entry(role).or_default();
        *count += 1;
        let thread_name = format!("{role}-{count}");

        let stop = Arc::new(StopSignal::new());
        let thread = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || worker.run(&stop))
                .map_err(|source| WorkerError::Spawn {
                    name: thread_name.clone(),
                    source,
                })?
        };

        self.next_id += 1;
        let id = WorkerId(self.next_id);
        tracing::info!("Spawned {thread_name} as worker {id}");

        self.handles.push(Handle {
            id,
            role,
            thread_name,
            stop,
            thread,
        });
        Ok(id)
    }

    /// Asks one worker to stop after its current iteration.
    ///
    /// # Errors
    ///
    /// [`WorkerError::UnknownWorker`] when `id` was never spawned or was
    /// already joined.
    pub fn stop(&self, id: WorkerId) -> WorkerResult<()> {
        let handle = self
            .handles
            .iter()
            .find(|handle| handle.id == id)
            .ok_or(WorkerError::UnknownWorker(id))?;

        tracing::info!("Stopping {}", handle.thread_name);
        handle.stop.stop();
        Ok(())
    }

    pub fn stop_all(&self) {
        tracing::info!("Stopping {} workers", self.handles.len());
        for handle in &self.handles {
            handle.stop.stop();
        }
    }

    /// Stops one worker and waits for its report.
    ///
    /// # Errors
    ///
    /// [`WorkerError::UnknownWorker`] for an unknown `id` and
    /// [`WorkerError::Panicked`] when the worker thread panicked.
    pub fn remove(&mut self, id: WorkerId) -> WorkerResult<WorkerReport> {
        let index = self
            .handles
            .iter()
            .position(|handle| handle.id == id)
            .ok_or(WorkerError::UnknownWorker(id))?;

        let handle = self.handles.swap_remove(index);
        handle.stop.stop();
        handle.join()
    }

    /// Waits for every worker and collects the reports of those that did
    /// not panic.
    pub fn join_all(&mut self) -> Vec<WorkerReport> {
        self.handles
            .drain(..)
            .filter_map(|handle| handle.join().ok())
            .collect()
    }

    /// Number of workers whose thread has not returned yet.
    #[must_use]
    pub fn running(&self) -> usize {
        self.handles
            .iter()
            .filter(|handle| !handle.thread.is_finished())
            .count()
    }

    /// Number of spawned workers with the given role that were not joined yet.
    #[must_use]
    pub fn count(&self, role: Role) -> usize {
        self.handles.iter().filter(|handle| handle.role == role).count()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }

        self.stop_all();
        let _ = self.join_all();
    }
}

impl core::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Supervisor")
            .field("spawned", &self.handles.len())
            .field("running", &self.running())
            .finish()
    }
}
