//! Performance table interpolation.
//!
//! Tables are sparse: any set of recorded (key..., value...) rows, not a
//! dense grid. A query is resolved one key dimension at a time. On each
//! dimension the distinct recorded keys are sorted; an exact match narrows
//! the table to that key, otherwise the two bracketing keys are each resolved
//! on the remaining dimensions and the results are blended linearly. Queries
//! outside the recorded range of any dimension fail instead of extrapolating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ComputationError, ComputationResult};
use crate::models::{AircraftId, AircraftProfile, PerformanceData, WeatherReport};
use crate::units::{convert_speed, SpeedUnit};

/// Keys closer than this are the same key.
const KEY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableRow<const N: usize, const M: usize> {
    pub keys: [f64; N],
    pub values: [f64; M],
}

/// Sparse N-key, M-value table.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationTable<const N: usize, const M: usize> {
    name: &'static str,
    dimensions: [&'static str; N],
    rows: Vec<TableRow<N, M>>,
}

fn same_key(a: f64, b: f64) -> bool {
    (a - b).abs() <= KEY_EPSILON
}

impl<const N: usize, const M: usize> InterpolationTable<N, M> {
    /// Build a table, rejecting non-finite entries and conflicting duplicates.
    ///
    /// Rows are sorted here, so lookups do not depend on input order.
    pub fn new(
        name: &'static str,
        dimensions: [&'static str; N],
        mut rows: Vec<TableRow<N, M>>,
    ) -> ComputationResult<Self> {
        for row in &rows {
            if row.keys.iter().chain(row.values.iter()).any(|v| !v.is_finite()) {
                return Err(ComputationError::validation(name, "table contains a non-finite entry"));
            }
        }
        rows.sort_by(|a, b| {
            a.keys
                .iter()
                .zip(b.keys.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for pair in rows.windows(2) {
            let same_keys = pair[0]
                .keys
                .iter()
                .zip(pair[1].keys.iter())
                .all(|(a, b)| same_key(*a, *b));
            if same_keys && pair[0].values != pair[1].values {
                return Err(ComputationError::validation(
                    name,
                    format!("conflicting entries recorded at {:?}", pair[0].keys),
                ));
            }
        }
        Ok(Self {
            name,
            dimensions,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn interpolate(&self, query: [f64; N]) -> ComputationResult<[f64; M]> {
        if self.rows.is_empty() {
            return Err(ComputationError::out_of_range(self.name, "table is empty"));
        }
        if let Some(bad) = query.iter().find(|q| !q.is_finite()) {
            return Err(ComputationError::validation(
                self.name,
                format!("query contains non-finite value {}", bad),
            ));
        }
        let rows: Vec<&TableRow<N, M>> = self.rows.iter().collect();
        self.resolve(&rows, 0, &query)
    }

    fn resolve(
        &self,
        rows: &[&TableRow<N, M>],
        dim: usize,
        query: &[f64; N],
    ) -> ComputationResult<[f64; M]> {
        if dim == N {
            // Duplicates were proven identical at construction
            return Ok(rows[0].values);
        }

        let mut keys: Vec<f64> = rows.iter().map(|r| r.keys[dim]).collect();
        keys.sort_by(|a, b| a.total_cmp(b));
        keys.dedup_by(|a, b| same_key(*a, *b));

        let q = query[dim];
        let (min, max) = (keys[0], keys[keys.len() - 1]);
        if q < min - KEY_EPSILON || q > max + KEY_EPSILON {
            return Err(ComputationError::out_of_range(
                self.name,
                format!(
                    "{} {} outside recorded range [{}, {}]",
                    self.dimensions[dim], q, min, max
                ),
            ));
        }

        let subset = |key: f64| -> Vec<&TableRow<N, M>> {
            rows.iter()
                .copied()
                .filter(|r| same_key(r.keys[dim], key))
                .collect()
        };

        if let Some(exact) = keys.iter().copied().find(|k| same_key(*k, q)) {
            return self.resolve(&subset(exact), dim + 1, query);
        }

        let upper = keys.partition_point(|k| *k < q);
        let (lo, hi) = (keys[upper - 1], keys[upper]);
        let below = self.resolve(&subset(lo), dim + 1, query)?;
        let above = self.resolve(&subset(hi), dim + 1, query)?;
        let t = (q - lo) / (hi - lo);

        let mut out = [0.0; M];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = below[i] + t * (above[i] - below[i]);
        }
        Ok(out)
    }
}

/// Distance figures for takeoff or landing, feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub distance: f64,
    pub ground_roll: f64,
}

/// Cruise figures at an altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CruiseResult {
    /// Knots true airspeed
    pub speed: f64,
    pub fuel_burn: f64,
}

pub fn takeoff_table(data: &PerformanceData) -> ComputationResult<InterpolationTable<3, 2>> {
    InterpolationTable::new(
        "takeoff",
        ["weight", "altitude", "temperature"],
        data.takeoff
            .iter()
            .map(|e| TableRow {
                keys: [e.weight, e.altitude, e.temperature],
                values: [e.distance, e.ground_roll],
            })
            .collect(),
    )
}

pub fn landing_table(data: &PerformanceData) -> ComputationResult<InterpolationTable<3, 2>> {
    InterpolationTable::new(
        "landing",
        ["weight", "altitude", "temperature"],
        data.landing
            .iter()
            .map(|e| TableRow {
                keys: [e.weight, e.altitude, e.temperature],
                values: [e.distance, e.ground_roll],
            })
            .collect(),
    )
}

pub fn climb_table(data: &PerformanceData) -> ComputationResult<InterpolationTable<3, 1>> {
    InterpolationTable::new(
        "climb",
        ["weight", "altitude", "temperature"],
        data.climb
            .iter()
            .map(|e| TableRow {
                keys: [e.weight, e.altitude, e.temperature],
                values: [e.rate],
            })
            .collect(),
    )
}

pub fn range_table(data: &PerformanceData) -> ComputationResult<InterpolationTable<3, 1>> {
    InterpolationTable::new(
        "range",
        ["altitude", "speed", "fuel_burn"],
        data.range
            .iter()
            .map(|e| TableRow {
                keys: [e.altitude, e.speed, e.fuel_burn],
                values: [e.range],
            })
            .collect(),
    )
}

/// Cruise entries keyed by altitude, speeds normalized to knots.
pub fn cruise_table(data: &PerformanceData) -> ComputationResult<InterpolationTable<1, 2>> {
    InterpolationTable::new(
        "cruise",
        ["altitude"],
        data.cruise
            .iter()
            .map(|e| TableRow {
                keys: [e.altitude],
                values: [convert_speed(e.speed, e.unit, SpeedUnit::Kts), e.fuel_burn],
            })
            .collect(),
    )
}

/// Pressure altitude (ft) from field elevation (ft) and altimeter setting (inHg).
pub fn pressure_altitude(field_elevation: f64, altimeter_inhg: f64) -> f64 {
    field_elevation + (29.92 - altimeter_inhg) * 1000.0
}

/// Density altitude (ft) by the 120 ft per degree rule of thumb.
pub fn density_altitude(pressure_altitude: f64, outside_air_temp_c: f64) -> f64 {
    let isa_temp = 15.0 - 2.0 * pressure_altitude / 1000.0;
    pressure_altitude + 120.0 * (outside_air_temp_c - isa_temp)
}

/// Density altitude at a field from its current weather, when the report
/// carries temperature and altimeter setting.
pub fn density_altitude_from_report(field_elevation: f64, report: &WeatherReport) -> Option<f64> {
    let altimeter = report.altimeter?;
    let temperature = report.temperature?;
    Some(density_altitude(
        pressure_altitude(field_elevation, altimeter),
        temperature,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceKind {
    Takeoff,
    Landing,
    Climb,
    Cruise,
    Range,
}

/// Conditions a calculation was made for. Unused fields stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConditions {
    pub weight: Option<f64>,
    /// Feet; pressure or density altitude depending on the table
    pub altitude: f64,
    pub temperature: Option<f64>,
    /// Runway available, feet
    pub runway_available: Option<f64>,
    pub speed: Option<f64>,
    pub fuel_burn: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResults {
    pub distance: Option<f64>,
    pub ground_roll: Option<f64>,
    pub rate: Option<f64>,
    pub speed: Option<f64>,
    pub fuel_burn: Option<f64>,
    pub range: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCalculation {
    pub aircraft_id: Option<AircraftId>,
    pub kind: PerformanceKind,
    pub conditions: PerformanceConditions,
    pub results: PerformanceResults,
    /// Human-readable operating limitations hit by these conditions.
    pub limitations: Vec<String>,
    pub calculated: DateTime<Utc>,
}

/// Typed performance queries against one aircraft profile.
pub struct PerformanceCalculator<'a> {
    profile: &'a AircraftProfile,
}

impl<'a> PerformanceCalculator<'a> {
    pub fn new(profile: &'a AircraftProfile) -> Self {
        Self { profile }
    }

    fn calculation(
        &self,
        kind: PerformanceKind,
        conditions: PerformanceConditions,
        results: PerformanceResults,
        limitations: Vec<String>,
    ) -> PerformanceCalculation {
        PerformanceCalculation {
            aircraft_id: self.profile.id.clone(),
            kind,
            conditions,
            results,
            limitations,
            calculated: Utc::now(),
        }
    }

    fn weight_limitations(&self, weight: f64, limitations: &mut Vec<String>) {
        let max = self.profile.weight_balance.max_gross_weight;
        if weight > max {
            limitations.push(format!(
                "weight {:.0} exceeds maximum gross weight {:.0}",
                weight, max
            ));
        }
    }

    fn ceiling_limitations(&self, altitude: f64, limitations: &mut Vec<String>) {
        let ceiling = self.profile.performance.service_ceiling;
        if ceiling > 0.0 && altitude > ceiling {
            limitations.push(format!(
                "altitude {:.0} ft above service ceiling {:.0} ft",
                altitude, ceiling
            ));
        }
    }

    fn field(
        &self,
        kind: PerformanceKind,
        table: InterpolationTable<3, 2>,
        weight: f64,
        altitude: f64,
        temperature: f64,
        runway_available: Option<f64>,
    ) -> ComputationResult<PerformanceCalculation> {
        let [distance, ground_roll] = table.interpolate([weight, altitude, temperature])?;

        let mut limitations = Vec::new();
        self.weight_limitations(weight, &mut limitations);
        if let Some(runway) = runway_available {
            if distance > runway {
                limitations.push(format!(
                    "{} distance {:.0} ft exceeds runway available {:.0} ft",
                    if kind == PerformanceKind::Takeoff { "takeoff" } else { "landing" },
                    distance,
                    runway
                ));
            }
        }

        Ok(self.calculation(
            kind,
            PerformanceConditions {
                weight: Some(weight),
                altitude,
                temperature: Some(temperature),
                runway_available,
                ..Default::default()
            },
            PerformanceResults {
                distance: Some(distance),
                ground_roll: Some(ground_roll),
                ..Default::default()
            },
            limitations,
        ))
    }

    pub fn takeoff(
        &self,
        weight: f64,
        altitude: f64,
        temperature: f64,
        runway_available: Option<f64>,
    ) -> ComputationResult<PerformanceCalculation> {
        let table = takeoff_table(&self.profile.performance)?;
        self.field(
            PerformanceKind::Takeoff,
            table,
            weight,
            altitude,
            temperature,
            runway_available,
        )
    }

    pub fn landing(
        &self,
        weight: f64,
        altitude: f64,
        temperature: f64,
        runway_available: Option<f64>,
    ) -> ComputationResult<PerformanceCalculation> {
        let table = landing_table(&self.profile.performance)?;
        self.field(
            PerformanceKind::Landing,
            table,
            weight,
            altitude,
            temperature,
            runway_available,
        )
    }

    pub fn climb(
        &self,
        weight: f64,
        altitude: f64,
        temperature: f64,
    ) -> ComputationResult<PerformanceCalculation> {
        let [rate] = climb_table(&self.profile.performance)?.interpolate([
            weight,
            altitude,
            temperature,
        ])?;
        let mut limitations = Vec::new();
        self.weight_limitations(weight, &mut limitations);
        self.ceiling_limitations(altitude, &mut limitations);
        if rate <= 0.0 {
            limitations.push("no climb capability at these conditions".to_string());
        }
        Ok(self.calculation(
            PerformanceKind::Climb,
            PerformanceConditions {
                weight: Some(weight),
                altitude,
                temperature: Some(temperature),
                ..Default::default()
            },
            PerformanceResults {
                rate: Some(rate),
                ..Default::default()
            },
            limitations,
        ))
    }

    pub fn cruise(&self, altitude: f64) -> ComputationResult<PerformanceCalculation> {
        let [speed, fuel_burn] = cruise_table(&self.profile.performance)?.interpolate([altitude])?;
        let mut limitations = Vec::new();
        self.ceiling_limitations(altitude, &mut limitations);
        Ok(self.calculation(
            PerformanceKind::Cruise,
            PerformanceConditions {
                altitude,
                ..Default::default()
            },
            PerformanceResults {
                speed: Some(speed),
                fuel_burn: Some(fuel_burn),
                ..Default::default()
            },
            limitations,
        ))
    }

    pub fn range(
        &self,
        altitude: f64,
        speed: f64,
        fuel_burn: f64,
    ) -> ComputationResult<PerformanceCalculation> {
        let [range] =
            range_table(&self.profile.performance)?.interpolate([altitude, speed, fuel_burn])?;
        let mut limitations = Vec::new();
        self.ceiling_limitations(altitude, &mut limitations);
        Ok(self.calculation(
            PerformanceKind::Range,
            PerformanceConditions {
                altitude,
                speed: Some(speed),
                fuel_burn: Some(fuel_burn),
                ..Default::default()
            },
            PerformanceResults {
                range: Some(range),
                ..Default::default()
            },
            limitations,
        ))
    }

    /// Cruise figures only, for route planning.
    pub fn cruise_figures(&self, altitude: f64) -> ComputationResult<CruiseResult> {
        let [speed, fuel_burn] = cruise_table(&self.profile.performance)?.interpolate([altitude])?;
        Ok(CruiseResult { speed, fuel_burn })
    }

    pub fn takeoff_figures(
        &self,
        weight: f64,
        altitude: f64,
        temperature: f64,
    ) -> ComputationResult<FieldResult> {
        let [distance, ground_roll] =
            takeoff_table(&self.profile.performance)?.interpolate([weight, altitude, temperature])?;
        Ok(FieldResult {
            distance,
            ground_roll,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlightConditions;
    use crate::services::defaults::cessna_172s;

    fn row(keys: [f64; 3], value: f64) -> TableRow<3, 1> {
        TableRow {
            keys,
            values: [value],
        }
    }

    fn grid() -> InterpolationTable<3, 1> {
        InterpolationTable::new(
            "test",
            ["weight", "altitude", "temperature"],
            vec![
                row([2000.0, 0.0, 0.0], 100.0),
                row([2000.0, 0.0, 20.0], 120.0),
                row([2000.0, 2000.0, 0.0], 140.0),
                row([2000.0, 2000.0, 20.0], 160.0),
                row([2400.0, 0.0, 0.0], 200.0),
                row([2400.0, 0.0, 20.0], 220.0),
                row([2400.0, 2000.0, 0.0], 240.0),
                row([2400.0, 2000.0, 20.0], 260.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_point_returns_recorded_value() {
        let [v] = grid().interpolate([2400.0, 2000.0, 0.0]).unwrap();
        assert_eq!(v, 240.0);
    }

    #[test]
    fn test_trilinear_midpoint() {
        let [v] = grid().interpolate([2200.0, 1000.0, 10.0]).unwrap();
        assert!((v - 180.0).abs() < 1e-9, "value {}", v);
    }

    #[test]
    fn test_single_dimension_interpolation() {
        let [v] = grid().interpolate([2000.0, 0.0, 5.0]).unwrap();
        assert!((v - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let err = grid().interpolate([2500.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ComputationError::PerformanceDataOutOfRange { .. }));
        let err = grid().interpolate([2000.0, -10.0, 0.0]).unwrap_err();
        assert!(matches!(err, ComputationError::PerformanceDataOutOfRange { .. }));
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let mut rows = grid().rows.clone();
        rows.reverse();
        let reversed = InterpolationTable::new("test", ["w", "a", "t"], rows).unwrap();
        let q = [2150.0, 700.0, 13.0];
        assert_eq!(grid().interpolate(q).unwrap(), reversed.interpolate(q).unwrap());
    }

    #[test]
    fn test_sparse_gap_is_out_of_range() {
        // Heavier weight has no high-altitude data
        let table = InterpolationTable::new(
            "sparse",
            ["weight", "altitude", "temperature"],
            vec![
                row([2000.0, 0.0, 15.0], 100.0),
                row([2000.0, 4000.0, 15.0], 140.0),
                row([2400.0, 0.0, 15.0], 200.0),
            ],
        )
        .unwrap();
        assert!(table.interpolate([2000.0, 2000.0, 15.0]).is_ok());
        assert!(matches!(
            table.interpolate([2200.0, 2000.0, 15.0]),
            Err(ComputationError::PerformanceDataOutOfRange { .. })
        ));
    }

    #[test]
    fn test_conflicting_duplicates_rejected() {
        let err = InterpolationTable::new(
            "dup",
            ["weight", "altitude", "temperature"],
            vec![row([2000.0, 0.0, 0.0], 100.0), row([2000.0, 0.0, 0.0], 101.0)],
        )
        .unwrap_err();
        assert!(matches!(err, ComputationError::Validation { .. }));

        let same = InterpolationTable::new(
            "dup",
            ["weight", "altitude", "temperature"],
            vec![row([2000.0, 0.0, 0.0], 100.0), row([2000.0, 0.0, 0.0], 100.0)],
        );
        assert!(same.is_ok());
    }

    #[test]
    fn test_empty_table() {
        let table: InterpolationTable<1, 1> = InterpolationTable::new("empty", ["x"], vec![]).unwrap();
        assert!(matches!(
            table.interpolate([1.0]),
            Err(ComputationError::PerformanceDataOutOfRange { .. })
        ));
    }

    #[test]
    fn test_takeoff_limitations() {
        let profile = cessna_172s();
        let calc = PerformanceCalculator::new(&profile);
        let result = calc.takeoff(2550.0, 0.0, 20.0, Some(1000.0)).unwrap();
        assert!(result.results.distance.unwrap() > 1000.0);
        assert_eq!(result.limitations.len(), 1);
        assert!(result.limitations[0].contains("runway"));
    }

    #[test]
    fn test_cruise_interpolates_between_altitudes() {
        let profile = cessna_172s();
        let calc = PerformanceCalculator::new(&profile);
        let cruise = calc.cruise_figures(5000.0).unwrap();
        assert!(cruise.speed > 110.0 && cruise.speed < 130.0);
        let above = calc.cruise(profile.performance.service_ceiling + 1000.0);
        assert!(above.is_err());
    }

    #[test]
    fn test_density_altitude() {
        // Standard day at sea level
        assert!((density_altitude(0.0, 15.0)).abs() < 1e-9);
        assert!((pressure_altitude(1000.0, 29.42) - 1500.0).abs() < 1e-9);
        let mut report = WeatherReport::new("KDEN", FlightConditions::Vfr);
        report.temperature = Some(30.0);
        report.altimeter = Some(29.92);
        let da = density_altitude_from_report(5434.0, &report).unwrap();
        assert!(da > 8000.0, "density altitude {}", da);
    }
}
