//! Error types for the refresh pipeline

use niu_client::ClientError;
use thiserror::Error;

/// Fatal setup failures. Setup either completes fully or leaves nothing
/// behind; no partial state is ever observable.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Login was rejected or unreachable
    #[error("authentication failed during setup: {0}")]
    Auth(#[source] ClientError),

    /// Vehicle listing failed or the configured index resolved to nothing
    #[error("vehicle resolution failed during setup: {0}")]
    Vehicle(#[source] ClientError),
}

/// Cycle-level failure surfaced at the scheduler boundary.
///
/// Individual fetch failures degrade their field group and are not errors;
/// this fires only when the whole cycle produced no fresh data at all.
#[derive(Debug, Error)]
pub enum PollError {
    /// Every telemetry endpoint failed this tick
    #[error("all telemetry fetches failed this cycle; first failure: {first}")]
    AllFetchesFailed {
        #[source]
        first: ClientError,
    },
}

/// Snapshot persistence failures; logged and swallowed by the cycle.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write snapshot file: {0}")]
    Io(#[from] std::io::Error),
}
