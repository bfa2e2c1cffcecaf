//! Spherical-earth geodesy on WGS-84 coordinates.
//!
//! Distances use the haversine formula on a sphere of the IUGG mean radius;
//! the error against the ellipsoid stays well under one percent, which is
//! inside what flight-planning needs.

use qtty::{Degrees, Kilometers, NauticalMile, Radian, Radians};

use crate::models::LatLng;

/// IUGG mean earth radius.
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0088;

/// Coordinates closer than this (degrees) are treated as identical.
pub const COINCIDENT_EPSILON_DEG: f64 = 1e-9;

fn radians(deg: f64) -> f64 {
    Degrees::new(deg).to::<Radian>().value()
}

fn degrees(rad: f64) -> f64 {
    Radians::new(rad).to::<qtty::Degree>().value()
}

/// Normalize an angle to [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = Degrees::new(angle).wrap_pos().value();
    // rem_euclid can round tiny negatives up to a full turn
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed difference `a - b` folded into (-180, 180].
pub fn angle_difference(a: f64, b: f64) -> f64 {
    Degrees::new(a - b).wrap_signed().value()
}

pub fn coincident(a: LatLng, b: LatLng) -> bool {
    (a.lat - b.lat).abs() < COINCIDENT_EPSILON_DEG && (a.lng - b.lng).abs() < COINCIDENT_EPSILON_DEG
}

/// Great-circle distance in nautical miles.
pub fn haversine_nm(from: LatLng, to: LatLng) -> f64 {
    if coincident(from, to) {
        return 0.0;
    }
    let phi1 = radians(from.lat);
    let phi2 = radians(to.lat);
    let dphi = radians(to.lat - from.lat);
    let dlambda = radians(to.lng - from.lng);

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    Kilometers::new(EARTH_MEAN_RADIUS_KM * c)
        .to::<NauticalMile>()
        .value()
}

/// Initial great-circle bearing from `from` to `to`, degrees true in [0, 360).
///
/// Returns `None` for coincident points, where no bearing exists.
pub fn initial_bearing(from: LatLng, to: LatLng) -> Option<f64> {
    if coincident(from, to) {
        return None;
    }
    let phi1 = radians(from.lat);
    let phi2 = radians(to.lat);
    let dlambda = radians(to.lng - from.lng);

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    Some(normalize_degrees(degrees(y.atan2(x))))
}

/// Great-circle midpoint.
pub fn midpoint(from: LatLng, to: LatLng) -> LatLng {
    let phi1 = radians(from.lat);
    let phi2 = radians(to.lat);
    let lambda1 = radians(from.lng);
    let dlambda = radians(to.lng - from.lng);

    let bx = phi2.cos() * dlambda.cos();
    let by = phi2.cos() * dlambda.sin();
    let phi_m = (phi1.sin() + phi2.sin()).atan2(((phi1.cos() + bx).powi(2) + by.powi(2)).sqrt());
    let lambda_m = lambda1 + by.atan2(phi1.cos() + bx);

    LatLng::new(degrees(phi_m), Degrees::new(degrees(lambda_m)).wrap_signed().value())
}
