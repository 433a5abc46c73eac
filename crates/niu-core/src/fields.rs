//! Declared field set and its accessor schema.
//!
//! The snapshot is a fixed, flat set of named data points partitioned into
//! logical groups. Every field carries a static accessor spec (source fetch
//! kind, JSON path into the vendor payload, optional transform) so mapping
//! is table-driven instead of ad-hoc dictionary traversal.

/// One of the four vendor telemetry endpoints a raw payload originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Battery,
    MotorIndex,
    OverallTally,
    TrackList,
}

impl FetchKind {
    /// All kinds, in fetch order.
    pub const ALL: [FetchKind; 4] = [
        FetchKind::Battery,
        FetchKind::MotorIndex,
        FetchKind::OverallTally,
        FetchKind::TrackList,
    ];

    /// Key for this kind in the snapshot file's `raw` section.
    pub fn raw_key(&self) -> &'static str {
        match self {
            FetchKind::Battery => "battery_info",
            FetchKind::MotorIndex => "motor_index_info",
            FetchKind::OverallTally => "overall_tally",
            FetchKind::TrackList => "track_list",
        }
    }
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw_key())
    }
}

/// Logical partition of the flat field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldGroup {
    Battery,
    Motor,
    Position,
    Distance,
    OverallTally,
    LastTrack,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 6] = [
        FieldGroup::Battery,
        FieldGroup::Motor,
        FieldGroup::Position,
        FieldGroup::Distance,
        FieldGroup::OverallTally,
        FieldGroup::LastTrack,
    ];

    /// Group key as it appears in the snapshot file's `parsed` section.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Battery => "battery",
            FieldGroup::Motor => "motor",
            FieldGroup::Position => "position",
            FieldGroup::Distance => "distance",
            FieldGroup::OverallTally => "overall_tally",
            FieldGroup::LastTrack => "last_track",
        }
    }
}

impl std::fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named data point in the snapshot.
///
/// Variants are unique even where the vendor reuses a field name across
/// groups (`isConnected`, `distance`); the wire name comes from
/// [`Field::name`] and the partition from [`Field::group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    // Battery
    BatteryCharging,
    BatteryConnected,
    ChargedTimes,
    TemperatureDesc,
    Temperature,
    GradeBattery,
    BmsId,
    IsCharging,
    EstimatedMileage,
    CentreCtrlBattery,
    // Motor
    NowSpeed,
    MotorConnected,
    LockStatus,
    LeftTime,
    Hdop,
    // Position
    Latitude,
    Longitude,
    // Distance (last-trip summary embedded in the motor payload)
    Distance,
    RidingTime,
    Time,
    // Overall tally
    TotalMileage,
    BindDaysCount,
    // Last track (trip list, newest entry)
    TrackStartTime,
    TrackEndTime,
    TrackDistance,
    TrackAvgSpeed,
    TrackRidingTime,
    TrackThumb,
}

impl Field {
    /// All declared fields, in group order.
    pub const ALL: [Field; 28] = [
        Field::BatteryCharging,
        Field::BatteryConnected,
        Field::ChargedTimes,
        Field::TemperatureDesc,
        Field::Temperature,
        Field::GradeBattery,
        Field::BmsId,
        Field::IsCharging,
        Field::EstimatedMileage,
        Field::CentreCtrlBattery,
        Field::NowSpeed,
        Field::MotorConnected,
        Field::LockStatus,
        Field::LeftTime,
        Field::Hdop,
        Field::Latitude,
        Field::Longitude,
        Field::Distance,
        Field::RidingTime,
        Field::Time,
        Field::TotalMileage,
        Field::BindDaysCount,
        Field::TrackStartTime,
        Field::TrackEndTime,
        Field::TrackDistance,
        Field::TrackAvgSpeed,
        Field::TrackRidingTime,
        Field::TrackThumb,
    ];

    /// The group this field belongs to.
    pub fn group(&self) -> FieldGroup {
        match self {
            Field::BatteryCharging
            | Field::BatteryConnected
            | Field::ChargedTimes
            | Field::TemperatureDesc
            | Field::Temperature
            | Field::GradeBattery
            | Field::BmsId
            | Field::IsCharging
            | Field::EstimatedMileage
            | Field::CentreCtrlBattery => FieldGroup::Battery,
            Field::NowSpeed
            | Field::MotorConnected
            | Field::LockStatus
            | Field::LeftTime
            | Field::Hdop => FieldGroup::Motor,
            Field::Latitude | Field::Longitude => FieldGroup::Position,
            Field::Distance | Field::RidingTime | Field::Time => FieldGroup::Distance,
            Field::TotalMileage | Field::BindDaysCount => FieldGroup::OverallTally,
            Field::TrackStartTime
            | Field::TrackEndTime
            | Field::TrackDistance
            | Field::TrackAvgSpeed
            | Field::TrackRidingTime
            | Field::TrackThumb => FieldGroup::LastTrack,
        }
    }

    /// Wire name of the field, unique within its group.
    pub fn name(&self) -> &'static str {
        match self {
            Field::BatteryCharging => "batteryCharging",
            Field::BatteryConnected => "isConnected",
            Field::ChargedTimes => "chargedTimes",
            Field::TemperatureDesc => "temperatureDesc",
            Field::Temperature => "temperature",
            Field::GradeBattery => "gradeBattery",
            Field::BmsId => "bmsId",
            Field::IsCharging => "isCharging",
            Field::EstimatedMileage => "estimatedMileage",
            Field::CentreCtrlBattery => "centreCtrlBattery",
            Field::NowSpeed => "nowSpeed",
            Field::MotorConnected => "isConnected",
            Field::LockStatus => "lockStatus",
            Field::LeftTime => "leftTime",
            Field::Hdop => "hdop",
            Field::Latitude => "lat",
            Field::Longitude => "lng",
            Field::Distance => "distance",
            Field::RidingTime => "ridingTime",
            Field::Time => "time",
            Field::TotalMileage => "totalMileage",
            Field::BindDaysCount => "bindDaysCount",
            Field::TrackStartTime => "startTime",
            Field::TrackEndTime => "endTime",
            Field::TrackDistance => "distance",
            Field::TrackAvgSpeed => "avespeed",
            Field::TrackRidingTime => "ridingtime",
            Field::TrackThumb => "track_thumb",
        }
    }

    /// `group.field` form used in configuration and log events.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.group().as_str(), self.name())
    }

    /// Parse a `group.field` name back to the declared field, if any.
    pub fn from_qualified(name: &str) -> Option<Field> {
        let (group, field) = name.split_once('.')?;
        Field::ALL
            .into_iter()
            .find(|f| f.group().as_str() == group && f.name() == field)
    }
}

/// How a raw value is post-processed during mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Passed through as-is; must be a scalar.
    Verbatim,
    /// Epoch-millisecond integer rendered as `YYYY-MM-DD HH:MM:SS`.
    EpochMillis,
    /// Second count rendered as `HH:MM:SS`; hours are not wrapped at 24.
    DurationSecs,
    /// Trip thumbnail URL rewritten to the public CDN host and path.
    ThumbUrl,
}

/// One step of a JSON path: object key or array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSeg {
    Key(&'static str),
    Index(usize),
}

/// Static accessor spec: where a field's value lives and how it is shaped.
#[derive(Debug)]
pub struct FieldSpec {
    pub field: Field,
    pub kind: FetchKind,
    pub path: &'static [PathSeg],
    pub transform: Transform,
}

impl FieldSpec {
    pub fn group(&self) -> FieldGroup {
        self.field.group()
    }
}

/// The full accessor table, one entry per declared field.
pub fn schema() -> &'static [FieldSpec] {
    &SCHEMA
}

use PathSeg::{Index, Key};

macro_rules! spec {
    ($field:ident, $kind:ident, [$($seg:expr),+], $transform:ident) => {
        FieldSpec {
            field: Field::$field,
            kind: FetchKind::$kind,
            path: &[$($seg),+],
            transform: Transform::$transform,
        }
    };
}

static SCHEMA: [FieldSpec; 28] = [
    // Battery: everything lives under the first battery compartment.
    spec!(BatteryCharging, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("batteryCharging")], Verbatim),
    spec!(BatteryConnected, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("isConnected")], Verbatim),
    spec!(ChargedTimes, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("chargedTimes")], Verbatim),
    spec!(TemperatureDesc, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("temperatureDesc")], Verbatim),
    spec!(Temperature, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("temperature")], Verbatim),
    spec!(GradeBattery, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("gradeBattery")], Verbatim),
    spec!(BmsId, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("bmsId")], Verbatim),
    spec!(IsCharging, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("isCharging")], Verbatim),
    spec!(EstimatedMileage, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("estimatedMileage")], Verbatim),
    spec!(CentreCtrlBattery, Battery, [Key("data"), Key("batteries"), Key("compartmentA"), Key("centreCtrlBattery")], Verbatim),
    // Motor
    spec!(NowSpeed, MotorIndex, [Key("data"), Key("nowSpeed")], Verbatim),
    spec!(MotorConnected, MotorIndex, [Key("data"), Key("isConnected")], Verbatim),
    spec!(LockStatus, MotorIndex, [Key("data"), Key("lockStatus")], Verbatim),
    spec!(LeftTime, MotorIndex, [Key("data"), Key("leftTime")], Verbatim),
    spec!(Hdop, MotorIndex, [Key("data"), Key("hdop")], Verbatim),
    // Position ("postion" is the vendor's spelling on the wire)
    spec!(Latitude, MotorIndex, [Key("data"), Key("postion"), Key("lat")], Verbatim),
    spec!(Longitude, MotorIndex, [Key("data"), Key("postion"), Key("lng")], Verbatim),
    // Distance: last-trip summary embedded in the motor payload
    spec!(Distance, MotorIndex, [Key("data"), Key("lastTrack"), Key("distance")], Verbatim),
    spec!(RidingTime, MotorIndex, [Key("data"), Key("lastTrack"), Key("ridingTime")], Verbatim),
    spec!(Time, MotorIndex, [Key("data"), Key("lastTrack"), Key("time")], Verbatim),
    // Overall tally
    spec!(TotalMileage, OverallTally, [Key("data"), Key("totalMileage")], Verbatim),
    spec!(BindDaysCount, OverallTally, [Key("data"), Key("bindDaysCount")], Verbatim),
    // Last track: newest entry of the trip list
    spec!(TrackStartTime, TrackList, [Key("data"), Index(0), Key("startTime")], EpochMillis),
    spec!(TrackEndTime, TrackList, [Key("data"), Index(0), Key("endTime")], EpochMillis),
    spec!(TrackDistance, TrackList, [Key("data"), Index(0), Key("distance")], Verbatim),
    spec!(TrackAvgSpeed, TrackList, [Key("data"), Index(0), Key("avespeed")], Verbatim),
    spec!(TrackRidingTime, TrackList, [Key("data"), Index(0), Key("ridingtime")], DurationSecs),
    spec!(TrackThumb, TrackList, [Key("data"), Index(0), Key("track_thumb")], ThumbUrl),
];
