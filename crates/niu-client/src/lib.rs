//! niu-client - REST client for the NIU vendor cloud API
//!
//! Covers the three upstream-facing concerns of the telemetry pipeline:
//! authentication (token login), vehicle resolution (account listing), and
//! the four per-vehicle telemetry fetches. The API is fixed and
//! undocumented; this client consumes it as observed, including its
//! inconsistent success convention (HTTP 200 plus an internal `status`
//! field on telemetry endpoints, but not on login or the vehicle listing).

pub mod client;
pub mod error;
pub mod testing;
pub mod types;

pub use client::{password_digest, NiuClient, ACCOUNT_BASE_URL, API_BASE_URL};
pub use error::{ClientError, Result};
pub use types::{Session, Vehicle, VehicleList};
