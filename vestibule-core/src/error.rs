use thiserror::Error;

/// Failures surfaced by the admission engine.
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// The user is already a member of the queue's wait set. Recoverable:
    /// the gateway falls back to a live rank lookup.
    #[error("user {user_id} is already waiting in queue '{queue}'")]
    AlreadyQueued { queue: String, user_id: u64 },

    /// The ordered store could not be reached or rejected a command. The
    /// engine never retries; callers decide.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures communicating with the backing ordered store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("ordered store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, AdmissionError>;
