//! Test utilities for niu-client
//!
//! Provides an in-process mock of the vendor cloud API so integration
//! tests can drive a real [`NiuClient`] against scripted failures:
//! HTTP errors, non-zero vendor status fields, malformed bodies and
//! delayed responses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::client::{
    BATTERY_INFO_PATH, LOGIN_PATH, MOTOR_INDEX_PATH, OVERALL_TALLY_PATH, TRACK_LIST_PATH,
    VEHICLE_LIST_PATH,
};
use crate::{NiuClient, Result};

/// Vendor endpoints whose behavior tests can script independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    VehicleList,
    Battery,
    MotorIndex,
    OverallTally,
    TrackList,
}

/// Scripted behavior for one endpoint.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Serve the endpoint's current payload.
    Normal,
    /// Respond with the given HTTP status and an empty body.
    HttpStatus(u16),
    /// Respond 200 with a non-zero vendor-internal status field.
    VendorStatus(i64),
    /// Respond 200 with a body that is not JSON.
    MalformedBody,
    /// Sleep before answering; pair with a short client timeout to
    /// simulate a vendor timeout.
    Delay(Duration),
}

#[derive(Default)]
struct VendorState {
    behaviors: HashMap<Endpoint, Behavior>,
    payloads: HashMap<Endpoint, Value>,
    last_login_form: Option<HashMap<String, String>>,
    last_track_request: Option<Value>,
}

type SharedState = Arc<Mutex<VendorState>>;

/// An in-process vendor API double that shuts down when dropped.
pub struct MockVendor {
    pub addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockVendor {
    /// Start the mock on an ephemeral local port with canned payloads.
    pub async fn start() -> Result<Self> {
        let mut initial = VendorState::default();
        initial
            .payloads
            .insert(Endpoint::Login, sample_login_payload());
        initial
            .payloads
            .insert(Endpoint::VehicleList, sample_vehicle_list_payload());
        initial
            .payloads
            .insert(Endpoint::Battery, sample_battery_payload());
        initial
            .payloads
            .insert(Endpoint::MotorIndex, sample_motor_index_payload());
        initial
            .payloads
            .insert(Endpoint::OverallTally, sample_overall_tally_payload());
        initial
            .payloads
            .insert(Endpoint::TrackList, sample_track_list_payload());
        let state: SharedState = Arc::new(Mutex::new(initial));

        let router = Router::new()
            .route(LOGIN_PATH, post(login))
            .route(VEHICLE_LIST_PATH, get(vehicle_list))
            .route(BATTERY_INFO_PATH, get(battery_info))
            .route(MOTOR_INDEX_PATH, get(motor_index))
            .route(OVERALL_TALLY_PATH, post(overall_tally))
            .route(TRACK_LIST_PATH, post(track_list))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client whose account and API hosts both point at this mock.
    pub fn client(&self) -> Result<NiuClient> {
        NiuClient::with_bases(&self.base_url(), &self.base_url())
    }

    /// Same, with a custom request timeout (for delay/timeout tests).
    pub fn client_with_timeout(&self, timeout: Duration) -> Result<NiuClient> {
        NiuClient::with_config(&self.base_url(), &self.base_url(), timeout)
    }

    /// Script one endpoint's behavior for subsequent requests.
    pub fn set_behavior(&self, endpoint: Endpoint, behavior: Behavior) {
        self.state.lock().behaviors.insert(endpoint, behavior);
    }

    /// Replace one endpoint's served payload.
    pub fn set_payload(&self, endpoint: Endpoint, payload: Value) {
        self.state.lock().payloads.insert(endpoint, payload);
    }

    /// Form fields of the most recent login request.
    pub fn last_login_form(&self) -> Option<HashMap<String, String>> {
        self.state.lock().last_login_form.clone()
    }

    /// JSON body of the most recent track-list request.
    pub fn last_track_request(&self) -> Option<Value> {
        self.state.lock().last_track_request.clone()
    }
}

impl Drop for MockVendor {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// =========================================================================
// Handlers
// =========================================================================

async fn respond(state: &SharedState, endpoint: Endpoint) -> Response {
    // Snapshot behavior and payload before any await so the lock is not
    // held across the delay.
    let (behavior, payload) = {
        let guard = state.lock();
        (
            guard
                .behaviors
                .get(&endpoint)
                .cloned()
                .unwrap_or(Behavior::Normal),
            guard.payloads.get(&endpoint).cloned().unwrap_or(Value::Null),
        )
    };

    match behavior {
        Behavior::Normal => Json(payload).into_response(),
        Behavior::HttpStatus(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            String::new(),
        )
            .into_response(),
        Behavior::VendorStatus(code) => {
            Json(json!({ "status": code, "desc": "error" })).into_response()
        }
        Behavior::MalformedBody => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "this is not json",
        )
            .into_response(),
        Behavior::Delay(duration) => {
            tokio::time::sleep(duration).await;
            Json(payload).into_response()
        }
    }
}

async fn login(
    State(state): State<SharedState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    state.lock().last_login_form = Some(fields);
    respond(&state, Endpoint::Login).await
}

async fn vehicle_list(State(state): State<SharedState>) -> Response {
    respond(&state, Endpoint::VehicleList).await
}

async fn battery_info(State(state): State<SharedState>) -> Response {
    respond(&state, Endpoint::Battery).await
}

async fn motor_index(State(state): State<SharedState>) -> Response {
    respond(&state, Endpoint::MotorIndex).await
}

async fn overall_tally(State(state): State<SharedState>) -> Response {
    respond(&state, Endpoint::OverallTally).await
}

async fn track_list(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    state.lock().last_track_request = Some(body);
    respond(&state, Endpoint::TrackList).await
}

// =========================================================================
// Canned payloads
// =========================================================================

/// Login response with token `test-access-token`.
pub fn sample_login_payload() -> Value {
    json!({
        "status": 0,
        "desc": "OK",
        "data": {
            "token": {
                "access_token": "test-access-token",
                "refresh_token": "test-refresh-token",
                "token_expires_in": 2591999
            },
            "user": { "user_id": "u-1" }
        }
    })
}

/// Listing with two vehicles, `SN0001` and `SN0002`.
pub fn sample_vehicle_list_payload() -> Value {
    json!({
        "desc": "OK",
        "data": {
            "items": [
                {
                    "sn_id": "SN0001",
                    "scooter_name": "Daily",
                    "sku_name": "N1S",
                    "product_type": "native",
                    "frame_id": "F10001"
                },
                {
                    "sn_id": "SN0002",
                    "scooter_name": "Spare",
                    "sku_name": "NQi GT",
                    "product_type": "native",
                    "frame_id": "F10002"
                }
            ]
        }
    })
}

pub fn sample_battery_payload() -> Value {
    json!({
        "status": 0,
        "desc": "OK",
        "data": {
            "batteries": {
                "compartmentA": {
                    "batteryCharging": 76,
                    "isConnected": true,
                    "chargedTimes": "85",
                    "temperatureDesc": "normal",
                    "temperature": 28,
                    "gradeBattery": "92.4",
                    "bmsId": "BMS123456",
                    "isCharging": 0,
                    "estimatedMileage": 65,
                    "centreCtrlBattery": 88
                }
            }
        }
    })
}

pub fn sample_motor_index_payload() -> Value {
    json!({
        "status": 0,
        "desc": "OK",
        "data": {
            "nowSpeed": 0,
            "isConnected": true,
            "lockStatus": 1,
            "leftTime": "2.5",
            "hdop": 1.2,
            "postion": { "lat": 52.379189, "lng": 4.899431 },
            "lastTrack": {
                "distance": 5230,
                "ridingTime": 820,
                "time": 1699999000000_i64
            }
        }
    })
}

pub fn sample_overall_tally_payload() -> Value {
    json!({
        "status": 0,
        "desc": "OK",
        "data": { "totalMileage": 4309.05, "bindDaysCount": 1230 }
    })
}

/// One completed trip with an internal-CDN thumbnail URL.
pub fn sample_track_list_payload() -> Value {
    json!({
        "status": 0,
        "desc": "OK",
        "data": [
            {
                "trackId": "tr-0001",
                "startTime": 1700000000000_i64,
                "endTime": 1700000600000_i64,
                "distance": 5230,
                "avespeed": 23.5,
                "ridingtime": 600,
                "track_thumb": "https://app-api.niucache.com/track/thumb/x.jpg",
                "lastPoint": { "lat": 52.379189, "lng": 4.899431 }
            }
        ]
    })
}
