//! Aircraft profiles: weight and balance, performance tables and equipment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::{FuelGrade, FuelUnit, SpeedUnit, WeightUnit};

crate::define_id_type!(AircraftId);
crate::define_id_type!(StationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AircraftCategory {
    SingleEngine,
    MultiEngine,
    Turboprop,
    Jet,
    Helicopter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftProfile {
    pub id: Option<AircraftId>,
    pub name: String,
    pub make: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_number: Option<String>,
    pub category: AircraftCategory,
    pub weight_balance: WeightBalanceData,
    pub performance: PerformanceData,
    pub equipment: EquipmentData,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Pilot,
    Passenger,
    Baggage,
    Fuel,
    Cargo,
}

/// A named load point with a fixed arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightStation {
    pub id: StationId,
    pub name: String,
    pub max_weight: f64,
    pub arm: f64,
    #[serde(rename = "type")]
    pub kind: StationKind,
    /// Display order
    #[serde(default)]
    pub position: u32,
}

/// Forward and aft CG limits at one envelope weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CgPoint {
    pub weight: f64,
    pub forward: f64,
    pub aft: f64,
}

/// CG limits, ordered by strictly increasing weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CgEnvelope {
    pub points: Vec<CgPoint>,
}

impl CgEnvelope {
    pub fn new(points: Vec<CgPoint>) -> Self {
        Self { points }
    }

    /// Lightest and heaviest weights the envelope defines.
    pub fn weight_range(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some((first.weight, last.weight))
    }
}

/// Fuel capacity in gallons; the arm applies to the fuel load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelCapacity {
    pub total: f64,
    pub usable: f64,
    pub unusable: f64,
    pub arm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmUnit {
    Inches,
    Mm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MomentUnit {
    InLbs,
    KgMm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightBalanceUnits {
    pub weight: WeightUnit,
    pub arm: ArmUnit,
    pub moment: MomentUnit,
}

impl Default for WeightBalanceUnits {
    fn default() -> Self {
        Self {
            weight: WeightUnit::Lbs,
            arm: ArmUnit::Inches,
            moment: MomentUnit::InLbs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBalanceData {
    pub empty_weight: f64,
    pub empty_weight_arm: f64,
    pub empty_weight_moment: f64,
    pub max_gross_weight: f64,
    pub stations: Vec<WeightStation>,
    pub cg_limits: CgEnvelope,
    pub fuel_capacity: FuelCapacity,
    #[serde(default)]
    pub fuel_grade: FuelGrade,
    #[serde(default)]
    pub units: WeightBalanceUnits,
}

impl WeightBalanceData {
    pub fn station(&self, id: &StationId) -> Option<&WeightStation> {
        self.stations.iter().find(|s| &s.id == id)
    }

    /// Arm of the fuel load: the fuel station's when one is defined, else the
    /// fuel-capacity arm.
    pub fn fuel_arm(&self) -> f64 {
        self.stations
            .iter()
            .find(|s| s.kind == StationKind::Fuel)
            .map(|s| s.arm)
            .unwrap_or(self.fuel_capacity.arm)
    }
}

/// Station load input for a loading computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationLoad {
    pub station_id: StationId,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupants: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StationLoad {
    pub fn new(station_id: impl Into<StationId>, weight: f64) -> Self {
        Self {
            station_id: station_id.into(),
            weight,
            occupants: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelQuantity {
    pub quantity: f64,
    pub unit: FuelUnit,
}

impl FuelQuantity {
    pub fn gallons(quantity: f64) -> Self {
        Self {
            quantity,
            unit: FuelUnit::Gal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CgStatus {
    WithinLimits,
    ForwardLimit,
    AftLimit,
    OverWeight,
}

/// Derived loading state. Always recomputed from inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingData {
    pub aircraft_id: Option<AircraftId>,
    pub stations: Vec<StationLoad>,
    pub fuel: FuelQuantity,
    pub fuel_weight: f64,
    pub total_weight: f64,
    pub total_moment: f64,
    pub cg_position: f64,
    pub cg_status: CgStatus,
    /// Interpolated forward/aft limits at the total weight, when the weight is
    /// inside the envelope.
    pub cg_limits: Option<(f64, f64)>,
    pub calculated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CruisePerformance {
    pub altitude: f64,
    pub speed: f64,
    pub unit: SpeedUnit,
    /// Per hour
    pub fuel_burn: f64,
}

/// Takeoff or landing table entry; distances in feet, temperature in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPerformance {
    pub weight: f64,
    pub altitude: f64,
    pub temperature: f64,
    pub distance: f64,
    pub ground_roll: f64,
}

/// Climb table entry, rate in feet per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimbPerformance {
    pub weight: f64,
    pub altitude: f64,
    pub temperature: f64,
    pub rate: f64,
}

/// Range table entry, range in nautical miles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangePerformance {
    pub altitude: f64,
    pub speed: f64,
    pub fuel_burn: f64,
    pub range: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceData {
    #[serde(default)]
    pub cruise: Vec<CruisePerformance>,
    #[serde(default)]
    pub takeoff: Vec<FieldPerformance>,
    #[serde(default)]
    pub landing: Vec<FieldPerformance>,
    #[serde(default)]
    pub climb: Vec<ClimbPerformance>,
    /// Feet
    #[serde(default)]
    pub service_ceiling: f64,
    #[serde(default)]
    pub range: Vec<RangePerformance>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEquipment {
    pub gps: bool,
    pub vor: bool,
    pub ndb: bool,
    pub ils: bool,
    pub rnav: bool,
    pub waas: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransponderMode {
    #[default]
    None,
    ModeA,
    ModeC,
    ModeS,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdsbCapability {
    #[default]
    None,
    Out,
    InOut,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationEquipment {
    pub com1: bool,
    pub com2: bool,
    pub transponder: TransponderMode,
    pub adsb: AdsbCapability,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentEquipment {
    pub attitude: bool,
    pub heading: bool,
    pub altimeter: bool,
    pub airspeed: bool,
    pub vsi: bool,
    pub dme: bool,
    pub autopilot: bool,
    pub weather_radar: bool,
    pub stormscope: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentData {
    pub navigation: NavigationEquipment,
    pub communication: CommunicationEquipment,
    pub instruments: InstrumentEquipment,
    /// Flight-plan equipment suffix, e.g. "/G"
    pub equipment_suffix: String,
}

/// Partial update of an aircraft profile's descriptive fields and blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftPatch {
    pub name: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub tail_number: Option<Option<String>>,
    pub category: Option<AircraftCategory>,
    pub weight_balance: Option<WeightBalanceData>,
    pub performance: Option<PerformanceData>,
    pub equipment: Option<EquipmentData>,
}

impl AircraftPatch {
    pub fn apply_to(&self, profile: &AircraftProfile) -> AircraftProfile {
        let mut merged = profile.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(make) = &self.make {
            merged.make = make.clone();
        }
        if let Some(model) = &self.model {
            merged.model = model.clone();
        }
        if let Some(tail) = &self.tail_number {
            merged.tail_number = tail.clone();
        }
        if let Some(category) = self.category {
            merged.category = category;
        }
        if let Some(wb) = &self.weight_balance {
            merged.weight_balance = wb.clone();
        }
        if let Some(performance) = &self.performance {
            merged.performance = performance.clone();
        }
        if let Some(equipment) = &self.equipment {
            merged.equipment = equipment.clone();
        }
        merged
    }
}
