//! The refresh cycle: fetch, map, fall back, persist.

use std::fmt;

use niu_client::{ClientError, NiuClient, Session, Vehicle};
use niu_core::{FetchKind, Mapper, NormalizedSnapshot, RawSet};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{PollError, SetupError};
use crate::last_good::LastGoodStore;
use crate::persist::SnapshotPersister;

/// Account credentials collected by the host configuration layer.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Drives one vehicle's telemetry through fetch → map → fallback → persist.
///
/// `refresh` takes `&mut self`, so at most one cycle is ever in flight; the
/// external scheduler owns the interval and drops ticks that arrive while a
/// cycle is still running.
#[derive(Debug)]
pub struct Poller {
    client: NiuClient,
    session: Session,
    vehicle: Vehicle,
    vehicles_info: Value,
    raws: RawSet,
    mapper: Mapper,
    last_good: LastGoodStore,
    persister: Option<SnapshotPersister>,
}

impl Poller {
    /// Authenticate and resolve the configured vehicle.
    ///
    /// Both steps are fatal on failure: either setup completes fully or no
    /// poller (and no downstream state) exists at all.
    pub async fn connect(
        client: NiuClient,
        credentials: &Credentials,
        vehicle_index: usize,
    ) -> Result<Self, SetupError> {
        let session = client
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(SetupError::Auth)?;

        let listing = client
            .list_vehicles(&session)
            .await
            .map_err(SetupError::Vehicle)?;
        let vehicle = listing.select(vehicle_index).map_err(SetupError::Vehicle)?;

        info!(
            sn = %vehicle.serial_number,
            name = %vehicle.display_name,
            "vehicle resolved"
        );

        Ok(Self {
            client,
            session,
            vehicle,
            vehicles_info: listing.raw().clone(),
            raws: RawSet::default(),
            mapper: Mapper::local(),
            last_good: LastGoodStore::new(),
            persister: None,
        })
    }

    /// Attach a snapshot persister. Persist failures are logged, never fatal.
    pub fn with_persister(mut self, persister: SnapshotPersister) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Override the mapper; tests pin a fixed UTC offset.
    pub fn with_mapper(mut self, mapper: Mapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// The vehicle resolved at setup.
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// Run one refresh cycle and return the normalized snapshot.
    ///
    /// The four fetches run concurrently; a kind that fails keeps its
    /// previous (stale) raw payload and degrades to stale/null fields
    /// without affecting the other kinds. `Err` is returned only when all
    /// four fetches failed this tick, so the scheduler can apply its own
    /// availability policy.
    #[instrument(skip(self), fields(sn = %self.vehicle.serial_number))]
    pub async fn refresh(&mut self) -> Result<NormalizedSnapshot, PollError> {
        let sn = self.vehicle.serial_number.clone();
        let (battery, motor, tally, tracks) = tokio::join!(
            self.client.battery_info(&self.session, &sn),
            self.client.motor_index(&self.session, &sn),
            self.client.overall_tally(&self.session, &sn),
            self.client.track_list(&self.session, &sn),
        );

        let mut first_failure: Option<ClientError> = None;
        let mut failures = 0;
        let outcomes = [
            (FetchKind::Battery, battery),
            (FetchKind::MotorIndex, motor),
            (FetchKind::OverallTally, tally),
            (FetchKind::TrackList, tracks),
        ];
        for (kind, outcome) in outcomes {
            match outcome {
                Ok(payload) => self.raws.replace(kind, payload),
                Err(err) => {
                    warn!(%kind, %err, "telemetry fetch failed; keeping stale data");
                    failures += 1;
                    first_failure.get_or_insert(err);
                }
            }
        }

        let mut snapshot = self.mapper.map(&self.raws);
        self.last_good.apply(&mut snapshot);

        if let Some(persister) = &self.persister {
            if let Err(err) =
                persister.persist(&self.vehicle, &snapshot, &self.raws, &self.vehicles_info)
            {
                warn!(%err, "snapshot persistence failed");
            }
        }

        if failures == FetchKind::ALL.len() {
            if let Some(first) = first_failure {
                return Err(PollError::AllFetchesFailed { first });
            }
        }

        Ok(snapshot)
    }
}
