//! Built-in aircraft profiles.
//!
//! Figures follow the Cessna 172S information manual closely enough for
//! planning demos; they are not a substitute for the aircraft's own POH.

use crate::models::aircraft::{
    AdsbCapability, CommunicationEquipment, InstrumentEquipment, NavigationEquipment,
    TransponderMode, WeightBalanceUnits,
};
use crate::models::{
    AircraftCategory, AircraftProfile, CgEnvelope, CgPoint, ClimbPerformance, CruisePerformance,
    EquipmentData, FieldPerformance, FuelCapacity, PerformanceData, RangePerformance, StationId,
    StationKind, WeightBalanceData, WeightStation,
};
use crate::units::{FuelGrade, SpeedUnit};

fn station(id: &str, name: &str, kind: StationKind, max_weight: f64, arm: f64, position: u32) -> WeightStation {
    WeightStation {
        id: StationId::new(id),
        name: name.to_string(),
        max_weight,
        arm,
        kind,
        position,
    }
}

fn field(weight: f64, altitude: f64, temperature: f64, distance: f64, ground_roll: f64) -> FieldPerformance {
    FieldPerformance {
        weight,
        altitude,
        temperature,
        distance,
        ground_roll,
    }
}

fn climb(weight: f64, altitude: f64, temperature: f64, rate: f64) -> ClimbPerformance {
    ClimbPerformance {
        weight,
        altitude,
        temperature,
        rate,
    }
}

fn cruise(altitude: f64, speed: f64, fuel_burn: f64) -> CruisePerformance {
    CruisePerformance {
        altitude,
        speed,
        unit: SpeedUnit::Kts,
        fuel_burn,
    }
}

fn range(altitude: f64, speed: f64, fuel_burn: f64, range: f64) -> RangePerformance {
    RangePerformance {
        altitude,
        speed,
        fuel_burn,
        range,
    }
}

/// Cessna 172S Skyhawk, 180 hp, 56 gal tanks. Seeded as the default profile
/// when no aircraft are persisted.
pub fn cessna_172s() -> AircraftProfile {
    let empty_weight = 1663.0;
    let empty_weight_moment = 66071.0;

    let weight_balance = WeightBalanceData {
        empty_weight,
        empty_weight_arm: empty_weight_moment / empty_weight,
        empty_weight_moment,
        max_gross_weight: 2550.0,
        stations: vec![
            station("front-seats", "Pilot & front passenger", StationKind::Pilot, 400.0, 37.0, 0),
            station("rear-seats", "Rear passengers", StationKind::Passenger, 400.0, 73.0, 1),
            station("baggage-a", "Baggage area A", StationKind::Baggage, 120.0, 95.0, 2),
            station("baggage-b", "Baggage area B", StationKind::Baggage, 50.0, 123.0, 3),
            station("fuel", "Fuel (53 gal usable)", StationKind::Fuel, 318.0, 48.0, 4),
        ],
        cg_limits: CgEnvelope::new(vec![
            CgPoint {
                weight: 1500.0,
                forward: 35.0,
                aft: 47.3,
            },
            CgPoint {
                weight: 1950.0,
                forward: 35.0,
                aft: 47.3,
            },
            CgPoint {
                weight: 2550.0,
                forward: 41.0,
                aft: 47.3,
            },
        ]),
        fuel_capacity: FuelCapacity {
            total: 56.0,
            usable: 53.0,
            unusable: 3.0,
            arm: 48.0,
        },
        fuel_grade: FuelGrade::Avgas100ll,
        units: WeightBalanceUnits::default(),
    };

    // Short-field takeoff and landing, flaps 10 / 30, paved dry runway.
    let takeoff = vec![
        field(2200.0, 0.0, 0.0, 1135.0, 650.0),
        field(2200.0, 0.0, 20.0, 1300.0, 750.0),
        field(2200.0, 0.0, 40.0, 1490.0, 865.0),
        field(2200.0, 2000.0, 0.0, 1340.0, 775.0),
        field(2200.0, 2000.0, 20.0, 1545.0, 895.0),
        field(2200.0, 2000.0, 40.0, 1775.0, 1030.0),
        field(2200.0, 4000.0, 0.0, 1585.0, 925.0),
        field(2200.0, 4000.0, 20.0, 1830.0, 1065.0),
        field(2200.0, 4000.0, 40.0, 2110.0, 1225.0),
        field(2400.0, 0.0, 0.0, 1325.0, 770.0),
        field(2400.0, 0.0, 20.0, 1525.0, 890.0),
        field(2400.0, 0.0, 40.0, 1745.0, 1025.0),
        field(2400.0, 2000.0, 0.0, 1570.0, 920.0),
        field(2400.0, 2000.0, 20.0, 1810.0, 1060.0),
        field(2400.0, 2000.0, 40.0, 2085.0, 1225.0),
        field(2400.0, 4000.0, 0.0, 1860.0, 1100.0),
        field(2400.0, 4000.0, 20.0, 2155.0, 1265.0),
        field(2400.0, 4000.0, 40.0, 2495.0, 1460.0),
        field(2550.0, 0.0, 0.0, 1465.0, 860.0),
        field(2550.0, 0.0, 20.0, 1690.0, 995.0),
        field(2550.0, 0.0, 40.0, 1945.0, 1150.0),
        field(2550.0, 2000.0, 0.0, 1735.0, 1025.0),
        field(2550.0, 2000.0, 20.0, 2010.0, 1185.0),
        field(2550.0, 2000.0, 40.0, 2320.0, 1370.0),
        field(2550.0, 4000.0, 0.0, 2065.0, 1225.0),
        field(2550.0, 4000.0, 20.0, 2395.0, 1410.0),
        field(2550.0, 4000.0, 40.0, 2780.0, 1630.0),
    ];
    let landing = vec![
        field(2200.0, 0.0, 0.0, 1125.0, 470.0),
        field(2200.0, 0.0, 20.0, 1180.0, 505.0),
        field(2200.0, 0.0, 40.0, 1235.0, 540.0),
        field(2200.0, 2000.0, 0.0, 1185.0, 505.0),
        field(2200.0, 2000.0, 20.0, 1245.0, 540.0),
        field(2200.0, 2000.0, 40.0, 1305.0, 575.0),
        field(2200.0, 4000.0, 0.0, 1255.0, 540.0),
        field(2200.0, 4000.0, 20.0, 1320.0, 580.0),
        field(2200.0, 4000.0, 40.0, 1385.0, 620.0),
        field(2550.0, 0.0, 0.0, 1250.0, 545.0),
        field(2550.0, 0.0, 20.0, 1310.0, 585.0),
        field(2550.0, 0.0, 40.0, 1370.0, 625.0),
        field(2550.0, 2000.0, 0.0, 1315.0, 585.0),
        field(2550.0, 2000.0, 20.0, 1385.0, 630.0),
        field(2550.0, 2000.0, 40.0, 1450.0, 670.0),
        field(2550.0, 4000.0, 0.0, 1395.0, 630.0),
        field(2550.0, 4000.0, 20.0, 1465.0, 675.0),
        field(2550.0, 4000.0, 40.0, 1540.0, 720.0),
    ];
    let climb = vec![
        climb(2200.0, 0.0, 0.0, 940.0),
        climb(2200.0, 0.0, 20.0, 850.0),
        climb(2200.0, 0.0, 40.0, 775.0),
        climb(2200.0, 4000.0, 0.0, 770.0),
        climb(2200.0, 4000.0, 20.0, 685.0),
        climb(2200.0, 4000.0, 40.0, 600.0),
        climb(2200.0, 8000.0, 0.0, 600.0),
        climb(2200.0, 8000.0, 20.0, 515.0),
        climb(2200.0, 8000.0, 40.0, 430.0),
        climb(2200.0, 12000.0, 0.0, 425.0),
        climb(2200.0, 12000.0, 20.0, 350.0),
        climb(2200.0, 12000.0, 40.0, 265.0),
        climb(2550.0, 0.0, 0.0, 785.0),
        climb(2550.0, 0.0, 20.0, 710.0),
        climb(2550.0, 0.0, 40.0, 645.0),
        climb(2550.0, 4000.0, 0.0, 640.0),
        climb(2550.0, 4000.0, 20.0, 570.0),
        climb(2550.0, 4000.0, 40.0, 500.0),
        climb(2550.0, 8000.0, 0.0, 500.0),
        climb(2550.0, 8000.0, 20.0, 430.0),
        climb(2550.0, 8000.0, 40.0, 360.0),
        climb(2550.0, 12000.0, 0.0, 355.0),
        climb(2550.0, 12000.0, 20.0, 290.0),
        climb(2550.0, 12000.0, 40.0, 220.0),
    ];
    // About 65% power, best power mixture.
    let cruise = vec![
        cruise(2000.0, 114.0, 9.0),
        cruise(4000.0, 116.0, 8.8),
        cruise(6000.0, 118.0, 8.6),
        cruise(8000.0, 120.0, 8.4),
        cruise(10000.0, 122.0, 8.1),
        cruise(12000.0, 124.0, 7.7),
    ];
    // Usable fuel less a 45 minute reserve, no wind.
    let range = vec![
        range(2000.0, 105.0, 7.4, 675.0),
        range(2000.0, 105.0, 8.2, 600.0),
        range(2000.0, 114.0, 8.6, 615.0),
        range(2000.0, 114.0, 9.4, 555.0),
        range(6000.0, 108.0, 7.1, 725.0),
        range(6000.0, 108.0, 7.9, 645.0),
        range(6000.0, 118.0, 8.2, 675.0),
        range(6000.0, 118.0, 9.0, 605.0),
        range(10000.0, 112.0, 6.8, 790.0),
        range(10000.0, 112.0, 7.6, 695.0),
        range(10000.0, 122.0, 7.7, 750.0),
        range(10000.0, 122.0, 8.5, 670.0),
    ];

    AircraftProfile {
        id: None,
        name: "Cessna 172S Skyhawk".to_string(),
        make: "Cessna".to_string(),
        model: "172S".to_string(),
        tail_number: None,
        category: AircraftCategory::SingleEngine,
        weight_balance,
        performance: PerformanceData {
            cruise,
            takeoff,
            landing,
            climb,
            service_ceiling: 14000.0,
            range,
        },
        equipment: EquipmentData {
            navigation: NavigationEquipment {
                gps: true,
                vor: true,
                ndb: false,
                ils: true,
                rnav: true,
                waas: true,
            },
            communication: CommunicationEquipment {
                com1: true,
                com2: true,
                transponder: TransponderMode::ModeC,
                adsb: AdsbCapability::Out,
            },
            instruments: InstrumentEquipment {
                attitude: true,
                heading: true,
                altimeter: true,
                airspeed: true,
                vsi: true,
                dme: false,
                autopilot: true,
                weather_radar: false,
                stormscope: false,
            },
            equipment_suffix: "/G".to_string(),
        },
        is_default: true,
        created: None,
        modified: None,
    }
}
