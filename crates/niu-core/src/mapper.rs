//! Pure mapping from raw vendor payloads to the normalized field set.

use chrono::{FixedOffset, Local, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::{json_type_name, MappingAnomaly};
use crate::fields::{schema, FetchKind, FieldSpec, PathSeg, Transform};
use crate::snapshot::NormalizedSnapshot;

const THUMB_HOST_INTERNAL: &str = "app-api.niucache.com";
const THUMB_HOST_PUBLIC: &str = "app-api.niu.com";
const THUMB_PATH_INTERNAL: &str = "/track/thumb/";
const THUMB_PATH_PUBLIC: &str = "/track/overseas/thumb/";

/// Per-kind raw payloads held across cycles.
///
/// A kind's slot is replaced only on that kind's own successful fetch; a
/// failed fetch leaves the previous (stale) payload in place, so mapping
/// runs against whatever data is currently held.
#[derive(Debug, Clone, Default)]
pub struct RawSet {
    battery: Option<Value>,
    motor_index: Option<Value>,
    overall_tally: Option<Value>,
    track_list: Option<Value>,
}

impl RawSet {
    pub fn get(&self, kind: FetchKind) -> Option<&Value> {
        match kind {
            FetchKind::Battery => self.battery.as_ref(),
            FetchKind::MotorIndex => self.motor_index.as_ref(),
            FetchKind::OverallTally => self.overall_tally.as_ref(),
            FetchKind::TrackList => self.track_list.as_ref(),
        }
    }

    /// Replace one kind's payload wholesale.
    pub fn replace(&mut self, kind: FetchKind, payload: Value) {
        let slot = match kind {
            FetchKind::Battery => &mut self.battery,
            FetchKind::MotorIndex => &mut self.motor_index,
            FetchKind::OverallTally => &mut self.overall_tally,
            FetchKind::TrackList => &mut self.track_list,
        };
        *slot = Some(payload);
    }
}

/// Table-driven field mapper.
///
/// Timestamp fields render in `utc_offset`. [`Mapper::local`] resolves the
/// host zone's current offset once at construction; tests pin an explicit
/// offset instead of depending on the environment.
#[derive(Debug, Clone)]
pub struct Mapper {
    utc_offset: FixedOffset,
}

impl Mapper {
    /// Mapper rendering timestamps in the host's current UTC offset.
    pub fn local() -> Self {
        Self {
            utc_offset: *Local::now().offset(),
        }
    }

    /// Mapper rendering timestamps at a fixed UTC offset.
    pub fn with_offset(utc_offset: FixedOffset) -> Self {
        Self { utc_offset }
    }

    /// Map every declared field from `raws` into a fresh snapshot.
    ///
    /// Anomalies null the affected field only; they are logged here and
    /// never surface as errors.
    pub fn map(&self, raws: &RawSet) -> NormalizedSnapshot {
        let mut snapshot = NormalizedSnapshot::empty();
        for spec in schema() {
            let value = match raws.get(spec.kind) {
                Some(raw) => match self.extract(raw, spec) {
                    Ok(value) => value,
                    Err(anomaly) => {
                        debug!(
                            field = %spec.field.qualified_name(),
                            %anomaly,
                            "field mapping anomaly"
                        );
                        Value::Null
                    }
                },
                None => Value::Null,
            };
            snapshot.set(spec.field, value);
        }
        snapshot
    }

    fn extract(&self, raw: &Value, spec: &FieldSpec) -> Result<Value, MappingAnomaly> {
        let node = lookup(raw, spec.path)?;
        match spec.transform {
            Transform::Verbatim => scalar(node),
            Transform::EpochMillis => self.epoch_millis(node),
            Transform::DurationSecs => duration_secs(node),
            Transform::ThumbUrl => thumb_url(node),
        }
    }

    fn epoch_millis(&self, node: &Value) -> Result<Value, MappingAnomaly> {
        let ms = match node {
            Value::Null => return Ok(Value::Null),
            Value::Number(n) => n.as_i64().ok_or(MappingAnomaly::WrongType {
                expected: "integer",
                found: "number",
            })?,
            other => {
                return Err(MappingAnomaly::WrongType {
                    expected: "integer",
                    found: json_type_name(other),
                })
            }
        };
        // A zero timestamp is the vendor's "no trip yet" placeholder.
        if ms == 0 {
            return Ok(Value::Null);
        }
        let utc = Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or(MappingAnomaly::InvalidTimestamp(ms))?;
        let rendered = utc
            .with_timezone(&self.utc_offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        Ok(Value::String(rendered))
    }
}

/// JSON path walk; each missing or mistyped step is its own anomaly.
fn lookup<'a>(root: &'a Value, path: &[PathSeg]) -> Result<&'a Value, MappingAnomaly> {
    let mut node = root;
    for seg in path {
        node = match seg {
            PathSeg::Key(key) => match node {
                Value::Object(map) => map.get(*key).ok_or(MappingAnomaly::MissingKey(*key))?,
                other => {
                    return Err(MappingAnomaly::WrongType {
                        expected: "object",
                        found: json_type_name(other),
                    })
                }
            },
            PathSeg::Index(index) => match node {
                Value::Array(items) => items
                    .get(*index)
                    .ok_or(MappingAnomaly::IndexOutOfBounds(*index))?,
                other => {
                    return Err(MappingAnomaly::WrongType {
                        expected: "array",
                        found: json_type_name(other),
                    })
                }
            },
        };
    }
    Ok(node)
}

fn scalar(node: &Value) -> Result<Value, MappingAnomaly> {
    match node {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(node.clone()),
        other => Err(MappingAnomaly::WrongType {
            expected: "scalar",
            found: json_type_name(other),
        }),
    }
}

fn duration_secs(node: &Value) -> Result<Value, MappingAnomaly> {
    let secs = match node {
        Value::Null => return Ok(Value::Null),
        Value::Number(n) => n.as_i64().ok_or(MappingAnomaly::WrongType {
            expected: "integer",
            found: "number",
        })?,
        other => {
            return Err(MappingAnomaly::WrongType {
                expected: "integer",
                found: json_type_name(other),
            })
        }
    };
    if secs == 0 {
        return Ok(Value::Null);
    }
    if secs < 0 {
        return Err(MappingAnomaly::NegativeDuration(secs));
    }
    Ok(Value::String(format_duration(secs)))
}

/// Zero-based `HH:MM:SS`; rides longer than a day keep counting hours.
fn format_duration(secs: i64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

fn thumb_url(node: &Value) -> Result<Value, MappingAnomaly> {
    match node {
        Value::Null => Ok(Value::Null),
        Value::String(url) if url.is_empty() => Ok(Value::Null),
        Value::String(url) => Ok(Value::String(rewrite_thumb_url(url))),
        other => Err(MappingAnomaly::WrongType {
            expected: "string",
            found: json_type_name(other),
        }),
    }
}

/// Rewrite a trip thumbnail URL to its externally reachable form: internal
/// CDN host to public host, then internal path segment to public segment.
pub fn rewrite_thumb_url(url: &str) -> String {
    url.replace(THUMB_HOST_INTERNAL, THUMB_HOST_PUBLIC)
        .replace(THUMB_PATH_INTERNAL, THUMB_PATH_PUBLIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn utc_mapper() -> Mapper {
        Mapper::with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn battery_payload() -> Value {
        json!({
            "status": 0,
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

    fn motor_payload() -> Value {
        json!({
            "status": 0,
            "data": {
                "nowSpeed": 0,
                "isConnected": true,
                "lockStatus": 1,
                "leftTime": "2.5",
                "hdop": 1.2,
                "postion": { "lat": 52.379189, "lng": 4.899431 },
                "lastTrack": { "distance": 5230, "ridingTime": 820, "time": 1699999000000_i64 }
            }
        })
    }

    fn track_payload() -> Value {
        json!({
            "status": 0,
            "data": [{
                "startTime": 1700000000000_i64,
                "endTime": 1700000600000_i64,
                "distance": 5230,
                "avespeed": 23.5,
                "ridingtime": 600,
                "track_thumb": "https://app-api.niucache.com/track/thumb/x.jpg"
            }]
        })
    }

    fn full_raws() -> RawSet {
        let mut raws = RawSet::default();
        raws.replace(FetchKind::Battery, battery_payload());
        raws.replace(FetchKind::MotorIndex, motor_payload());
        raws.replace(
            FetchKind::OverallTally,
            json!({ "status": 0, "data": { "totalMileage": 4309.05, "bindDaysCount": 1230 } }),
        );
        raws.replace(FetchKind::TrackList, track_payload());
        raws
    }

    #[test]
    fn maps_every_group_from_full_payloads() {
        let snapshot = utc_mapper().map(&full_raws());

        assert_eq!(snapshot.get(Field::BatteryCharging), &json!(76));
        assert_eq!(snapshot.get(Field::Temperature), &json!(28));
        assert_eq!(snapshot.get(Field::NowSpeed), &json!(0));
        assert_eq!(snapshot.get(Field::Latitude), &json!(52.379189));
        assert_eq!(snapshot.get(Field::Distance), &json!(5230));
        assert_eq!(snapshot.get(Field::TotalMileage), &json!(4309.05));
        assert_eq!(snapshot.get(Field::TrackAvgSpeed), &json!(23.5));
    }

    #[test]
    fn epoch_millis_renders_fixed_format() {
        let snapshot = utc_mapper().map(&full_raws());
        assert_eq!(
            snapshot.get(Field::TrackStartTime),
            &json!("2023-11-14 22:13:20")
        );
        assert_eq!(
            snapshot.get(Field::TrackEndTime),
            &json!("2023-11-14 22:23:20")
        );
    }

    #[test]
    fn epoch_millis_honors_offset() {
        let mapper = Mapper::with_offset(FixedOffset::east_opt(3600).unwrap());
        let snapshot = mapper.map(&full_raws());
        assert_eq!(
            snapshot.get(Field::TrackStartTime),
            &json!("2023-11-14 23:13:20")
        );
    }

    #[test]
    fn zero_or_missing_timestamp_is_null() {
        let mut raws = full_raws();
        raws.replace(
            FetchKind::TrackList,
            json!({ "status": 0, "data": [{ "startTime": 0, "distance": 1 }] }),
        );
        let snapshot = utc_mapper().map(&raws);
        assert_eq!(snapshot.get(Field::TrackStartTime), &Value::Null);
        assert_eq!(snapshot.get(Field::TrackEndTime), &Value::Null);
    }

    #[test]
    fn riding_time_is_zero_based_and_unwrapped() {
        let mut raws = RawSet::default();
        raws.replace(
            FetchKind::TrackList,
            json!({ "status": 0, "data": [{ "ridingtime": 3725 }] }),
        );
        let snapshot = utc_mapper().map(&raws);
        assert_eq!(snapshot.get(Field::TrackRidingTime), &json!("01:02:05"));

        // Rides past 24h keep counting hours instead of wrapping.
        raws.replace(
            FetchKind::TrackList,
            json!({ "status": 0, "data": [{ "ridingtime": 90000 }] }),
        );
        let snapshot = utc_mapper().map(&raws);
        assert_eq!(snapshot.get(Field::TrackRidingTime), &json!("25:00:00"));
    }

    #[test]
    fn thumb_url_is_rewritten_to_public_form() {
        let snapshot = utc_mapper().map(&full_raws());
        assert_eq!(
            snapshot.get(Field::TrackThumb),
            &json!("https://app-api.niu.com/track/overseas/thumb/x.jpg")
        );
    }

    #[test]
    fn rewrite_is_exact_substring_replacement() {
        assert_eq!(
            rewrite_thumb_url("https://app-api.niucache.com/track/thumb/x.jpg"),
            "https://app-api.niu.com/track/overseas/thumb/x.jpg"
        );
        // Already-public URLs pass through the host rewrite untouched.
        assert_eq!(
            rewrite_thumb_url("https://app-api.niu.com/track/overseas/thumb/x.jpg"),
            "https://app-api.niu.com/track/overseas/thumb/x.jpg"
        );
    }

    #[test]
    fn empty_track_list_nulls_the_whole_group() {
        let mut raws = full_raws();
        raws.replace(FetchKind::TrackList, json!({ "status": 0, "data": [] }));
        let snapshot = utc_mapper().map(&raws);
        for (field, value) in snapshot.group(crate::fields::FieldGroup::LastTrack) {
            assert_eq!(value, &Value::Null, "{field:?}");
        }
    }

    #[test]
    fn missing_intermediate_key_nulls_only_that_field() {
        let mut raws = full_raws();
        raws.replace(
            FetchKind::Battery,
            json!({ "status": 0, "data": { "batteries": {} } }),
        );
        let snapshot = utc_mapper().map(&raws);
        assert_eq!(snapshot.get(Field::Temperature), &Value::Null);
        // Other kinds are untouched.
        assert_eq!(snapshot.get(Field::NowSpeed), &json!(0));
    }

    #[test]
    fn wrong_typed_node_yields_null_not_panic() {
        let mut raws = full_raws();
        raws.replace(
            FetchKind::MotorIndex,
            json!({ "status": 0, "data": { "postion": "not-an-object", "nowSpeed": { "v": 1 } } }),
        );
        let snapshot = utc_mapper().map(&raws);
        assert_eq!(snapshot.get(Field::Latitude), &Value::Null);
        // Non-scalar leaf is an anomaly, not a value.
        assert_eq!(snapshot.get(Field::NowSpeed), &Value::Null);
    }

    #[test]
    fn absent_kind_yields_nulls_for_its_fields() {
        let mut raws = RawSet::default();
        raws.replace(FetchKind::Battery, battery_payload());
        let snapshot = utc_mapper().map(&raws);
        assert_eq!(snapshot.get(Field::BatteryCharging), &json!(76));
        assert_eq!(snapshot.get(Field::TotalMileage), &Value::Null);
    }
}
