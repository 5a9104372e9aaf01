use thiserror::Error;

use crate::WorkerId;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("failed to spawn worker thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no running worker with id {0}")]
    UnknownWorker(WorkerId),

    #[error("worker thread {0} panicked")]
    Panicked(String),
}

pub type WorkerResult<T> = std::result::Result<T, WorkerError>;
