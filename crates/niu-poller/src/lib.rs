//! niu-poller - Refresh cycle for the NIU telemetry bridge
//!
//! Owns the mutable half of the pipeline: the session and resolved vehicle
//! from setup, the per-kind raw cache carried across cycles, the
//! process-lifetime last-good store, and the redacted snapshot persister.
//! The host scheduler calls [`Poller::refresh`] on a fixed interval.

pub mod cycle;
pub mod error;
pub mod last_good;
pub mod persist;

pub use cycle::{Credentials, Poller};
pub use error::{PersistError, PollError, SetupError};
pub use last_good::LastGoodStore;
pub use persist::SnapshotPersister;
