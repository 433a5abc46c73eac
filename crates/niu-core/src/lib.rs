//! niu-core - Field schema and snapshot types for the NIU telemetry bridge
//!
//! This crate holds the pure half of the refresh pipeline: the declared
//! field set, the table-driven mapper from raw vendor JSON to a flat
//! normalized snapshot, and the redaction pass applied before snapshots
//! are persisted. No I/O happens here.

pub mod error;
pub mod fields;
pub mod mapper;
pub mod redact;
pub mod snapshot;

pub use error::MappingAnomaly;
pub use fields::{schema, FetchKind, Field, FieldGroup, FieldSpec, PathSeg, Transform};
pub use mapper::{rewrite_thumb_url, Mapper, RawSet};
pub use redact::{redacted, REDACTION_MARKER};
pub use snapshot::NormalizedSnapshot;
