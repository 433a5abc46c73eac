//! Session and vehicle types

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Bearer token obtained at login.
///
/// Created once at setup and never refreshed or invalidated; an expired
/// token surfaces as ordinary fetch failures on later cycles.
#[derive(Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Raw token value, sent as the vendor's `token` header.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep the token out of logs and panics.
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// One vehicle on the account, as listed by the vendor.
#[derive(Debug, Clone, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "sn_id", default)]
    pub serial_number: String,
    #[serde(rename = "scooter_name", default)]
    pub display_name: String,
    #[serde(rename = "sku_name", default)]
    pub sku_name: Option<String>,
    #[serde(rename = "product_type", default)]
    pub product_type: Option<String>,
    #[serde(rename = "frame_id", default)]
    pub frame_id: Option<String>,
}

/// The account's vehicle listing: parsed items plus the raw payload, which
/// is retained for the diagnostic snapshot file.
#[derive(Debug, Clone)]
pub struct VehicleList {
    raw: Value,
    vehicles: Vec<Vehicle>,
}

impl VehicleList {
    /// Parse `data.items[]` out of a listing payload.
    ///
    /// Items that do not match the expected shape are skipped rather than
    /// failing the whole listing.
    pub(crate) fn from_raw(raw: Value) -> Self {
        let vehicles = raw
            .get("data")
            .and_then(|data| data.get("items"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        serde_json::from_value::<Vehicle>(item.clone())
                            .map_err(|err| debug!(%err, "skipping malformed vehicle item"))
                            .ok()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { raw, vehicles }
    }

    /// The listing payload exactly as the vendor sent it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Select the vehicle at the configured zero-based index.
    ///
    /// Out-of-range indexes and entries without a serial number both yield
    /// [`ClientError::VehicleNotFound`]; there is no usable vehicle either way.
    pub fn select(&self, index: usize) -> Result<Vehicle> {
        let not_found = ClientError::VehicleNotFound {
            index,
            count: self.vehicles.len(),
        };
        let vehicle = self.vehicles.get(index).cloned().ok_or(not_found)?;
        if vehicle.serial_number.is_empty() {
            return Err(ClientError::VehicleNotFound {
                index,
                count: self.vehicles.len(),
            });
        }
        Ok(vehicle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> VehicleList {
        VehicleList::from_raw(json!({
            "desc": "OK",
            "data": {
                "items": [
                    { "sn_id": "SN0001", "scooter_name": "Daily", "sku_name": "N1S" },
                    { "sn_id": "SN0002", "scooter_name": "Spare" }
                ]
            }
        }))
    }

    #[test]
    fn select_by_index() {
        let vehicle = listing().select(1).unwrap();
        assert_eq!(vehicle.serial_number, "SN0002");
        assert_eq!(vehicle.display_name, "Spare");
        assert_eq!(vehicle.sku_name, None);
    }

    #[test]
    fn out_of_range_index_is_not_found() {
        let err = listing().select(5).unwrap_err();
        match err {
            ClientError::VehicleNotFound { index, count } => {
                assert_eq!(index, 5);
                assert_eq!(count, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_listing_is_not_found() {
        let list = VehicleList::from_raw(json!({ "data": { "items": [] } }));
        assert!(matches!(
            list.select(0),
            Err(ClientError::VehicleNotFound { index: 0, count: 0 })
        ));
    }

    #[test]
    fn missing_serial_number_is_not_found() {
        let list = VehicleList::from_raw(json!({
            "data": { "items": [{ "scooter_name": "No SN" }] }
        }));
        assert!(matches!(
            list.select(0),
            Err(ClientError::VehicleNotFound { .. })
        ));
    }

    #[test]
    fn session_debug_redacts_token() {
        let session = Session::new("very-secret");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
