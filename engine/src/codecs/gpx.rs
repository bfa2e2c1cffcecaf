//! GPX 1.1 routes.
//!
//! Only the first `<rte>` is read. Route points carry the identifier in
//! `<name>`, the display name in `<desc>`, the waypoint kind in `<type>` and
//! the altitude in `<ele>` (metres, converted to and from feet).

use geo_types::Point;
use std::io::Cursor;

use super::{imported_name, CodecError, CodecResult, RouteCodec, RouteFormat};
use crate::models::{LatLng, Route, Waypoint, WaypointKind};
use crate::units::{convert_altitude, AltitudeUnit};

const FORMAT: RouteFormat = RouteFormat::Gpx;
const CREATOR: &str = "flightplan-engine";

#[derive(Debug, Clone, Copy, Default)]
pub struct GpxCodec;

fn non_empty(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl RouteCodec for GpxCodec {
    fn format(&self) -> RouteFormat {
        FORMAT
    }

    fn decode(&self, raw: &str) -> CodecResult<Route> {
        let document = ::gpx::read(Cursor::new(raw.as_bytes()))
            .map_err(|e| CodecError::malformed(FORMAT, e.to_string()))?;
        let rte = document
            .routes
            .first()
            .ok_or_else(|| CodecError::malformed(FORMAT, "document contains no <rte>"))?;

        let mut waypoints = Vec::with_capacity(rte.points.len());
        for (index, point) in rte.points.iter().enumerate() {
            let position = point.point();
            let coordinates = LatLng::new(position.y(), position.x());
            if !coordinates.is_valid() {
                return Err(CodecError::malformed(
                    FORMAT,
                    format!("rtept {} is out of range", index),
                ));
            }

            let identifier =
                non_empty(&point.name).unwrap_or_else(|| format!("WPT{:03}", index + 1));
            let kind = match non_empty(&point.type_) {
                Some(text) => text
                    .parse::<WaypointKind>()
                    .map_err(|e| CodecError::malformed(FORMAT, e))?,
                None => WaypointKind::Gps,
            };

            let mut waypoint = Waypoint::new(identifier, kind, coordinates);
            waypoint.name = non_empty(&point.description);
            waypoint.notes = non_empty(&point.comment);
            waypoint.altitude = point
                .elevation
                .map(|metres| convert_altitude(metres, AltitudeUnit::M, AltitudeUnit::Ft));
            waypoints.push(waypoint);
        }

        let name = non_empty(&rte.name).unwrap_or_else(|| imported_name(FORMAT));
        let mut route = Route::new(name, waypoints);
        route.description = non_empty(&rte.description);
        Ok(route)
    }

    fn encode(&self, route: &Route) -> CodecResult<String> {
        let mut rte = ::gpx::Route {
            name: Some(route.name.clone()),
            description: route.description.clone(),
            ..Default::default()
        };
        for waypoint in &route.waypoints {
            if !waypoint.coordinates.is_valid() {
                return Err(CodecError::unsupported(
                    FORMAT,
                    format!("{} has invalid coordinates", waypoint.identifier),
                ));
            }
            let mut point = ::gpx::Waypoint::new(Point::new(
                waypoint.coordinates.lng,
                waypoint.coordinates.lat,
            ));
            point.elevation = waypoint
                .altitude
                .map(|feet| convert_altitude(feet, AltitudeUnit::Ft, AltitudeUnit::M));
            point.name = Some(waypoint.identifier.clone());
            point.comment = waypoint.notes.clone();
            point.description = waypoint.name.clone();
            point.type_ = Some(waypoint.kind.to_string());
            rte.points.push(point);
        }

        let document = ::gpx::Gpx {
            version: ::gpx::GpxVersion::Gpx11,
            creator: Some(CREATOR.to_string()),
            routes: vec![rte],
            ..Default::default()
        };
        let mut out = Vec::new();
        ::gpx::write(&document, &mut out)
            .map_err(|e| CodecError::unsupported(FORMAT, e.to_string()))?;
        String::from_utf8(out).map_err(|e| CodecError::unsupported(FORMAT, e.to_string()))
    }
}
