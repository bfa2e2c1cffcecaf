//! Garmin flight-plan XML (`.fpl`).
//!
//! The document holds a table of unique waypoints and a route that refers to
//! them by identifier and type. Waypoint names travel in `<comment>`,
//! altitudes in `<elevation>` (feet).

use chrono::Utc;
use std::collections::HashMap;
use xml::escape::escape_str_pcdata as escape;
use xml::reader::{EventReader, XmlEvent};

use super::{imported_name, parse_number, CodecError, CodecResult, RouteCodec, RouteFormat};
use crate::models::{LatLng, Route, Waypoint, WaypointKind};

const FORMAT: RouteFormat = RouteFormat::Fpl;
const NAMESPACE: &str = "http://www8.garmin.com/xmlschemas/FlightPlan/v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct FplCodec;

fn garmin_type(kind: WaypointKind) -> &'static str {
    match kind {
        WaypointKind::Airport => "AIRPORT",
        WaypointKind::Vor => "VOR",
        WaypointKind::Ndb => "NDB",
        WaypointKind::Fix => "INT",
        WaypointKind::Gps | WaypointKind::Custom => "USER WAYPOINT",
    }
}

fn kind_from_garmin(text: &str) -> CodecResult<WaypointKind> {
    match text.trim().to_uppercase().as_str() {
        "AIRPORT" => Ok(WaypointKind::Airport),
        "VOR" => Ok(WaypointKind::Vor),
        "NDB" => Ok(WaypointKind::Ndb),
        "INT" | "INT-VRP" => Ok(WaypointKind::Fix),
        "USER WAYPOINT" => Ok(WaypointKind::Custom),
        other => Err(CodecError::malformed(
            FORMAT,
            format!("unknown waypoint type '{}'", other),
        )),
    }
}

/// Element of the parsed document: local name, concatenated text and
/// CDATA content, and child elements in document order.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first `name` child; empty text counts as absent.
    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn parse_document(raw: &str) -> CodecResult<Element> {
    let mut stack: Vec<Element> = Vec::new();
    for event in EventReader::from_str(raw) {
        match event.map_err(|e| CodecError::malformed(FORMAT, e.to_string()))? {
            XmlEvent::StartElement { name, .. } => stack.push(Element {
                name: name.local_name,
                ..Element::default()
            }),
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                let Some(done) = stack.pop() else {
                    return Err(CodecError::malformed(FORMAT, "unbalanced end tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => return Ok(done),
                }
            }
            _ => {}
        }
    }
    Err(CodecError::malformed(FORMAT, "document has no root element"))
}

type TableKey = (String, &'static str);

impl RouteCodec for FplCodec {
    fn format(&self) -> RouteFormat {
        FORMAT
    }

    fn decode(&self, raw: &str) -> CodecResult<Route> {
        let root = parse_document(raw)?;
        if root.name != "flight-plan" {
            return Err(CodecError::malformed(
                FORMAT,
                format!("unexpected root <{}>", root.name),
            ));
        }
        let table_section = root
            .child("waypoint-table")
            .ok_or_else(|| CodecError::malformed(FORMAT, "missing <waypoint-table>"))?;

        let mut table: HashMap<TableKey, Waypoint> = HashMap::new();
        for entry in table_section.children_named("waypoint") {
            let identifier = entry
                .child_text("identifier")
                .ok_or_else(|| CodecError::malformed(FORMAT, "waypoint without <identifier>"))?;
            let kind = kind_from_garmin(&entry.child_text("type").unwrap_or_default())?;
            let lat = entry
                .child_text("lat")
                .ok_or_else(|| CodecError::malformed(FORMAT, format!("{} has no <lat>", identifier)))?;
            let lon = entry
                .child_text("lon")
                .ok_or_else(|| CodecError::malformed(FORMAT, format!("{} has no <lon>", identifier)))?;

            let mut waypoint = Waypoint::new(
                identifier.clone(),
                kind,
                LatLng::new(
                    parse_number(FORMAT, "lat", &lat)?,
                    parse_number(FORMAT, "lon", &lon)?,
                ),
            );
            waypoint.name = entry.child_text("comment");
            if let Some(elevation) = entry.child_text("elevation") {
                waypoint.altitude = Some(parse_number(FORMAT, "elevation", &elevation)?);
            }
            table.insert((identifier, garmin_type(kind)), waypoint);
        }

        let route_section = root
            .child("route")
            .ok_or_else(|| CodecError::malformed(FORMAT, "missing <route>"))?;

        let mut waypoints = Vec::new();
        for point in route_section.children_named("route-point") {
            let identifier = point
                .child_text("waypoint-identifier")
                .ok_or_else(|| CodecError::malformed(FORMAT, "route point without identifier"))?;
            let kind = kind_from_garmin(&point.child_text("waypoint-type").unwrap_or_default())?;
            let entry = table
                .get(&(identifier.clone(), garmin_type(kind)))
                .ok_or_else(|| {
                    CodecError::malformed(
                        FORMAT,
                        format!("route point {} is not in the waypoint table", identifier),
                    )
                })?;
            // Each occurrence is its own waypoint within the route.
            let mut waypoint = entry.clone();
            waypoint.id = crate::models::WaypointId::generate();
            waypoints.push(waypoint);
        }

        let name = route_section
            .child_text("route-name")
            .unwrap_or_else(|| imported_name(FORMAT));
        let mut route = Route::new(name, waypoints);
        route.description = route_section.child_text("route-description");
        Ok(route)
    }

    fn encode(&self, route: &Route) -> CodecResult<String> {
        let mut table: Vec<&Waypoint> = Vec::new();
        let mut seen: HashMap<TableKey, &Waypoint> = HashMap::new();
        for waypoint in &route.waypoints {
            let key = (waypoint.identifier.clone(), garmin_type(waypoint.kind));
            match seen.get(&key) {
                Some(existing) if existing.coordinates != waypoint.coordinates => {
                    return Err(CodecError::unsupported(
                        FORMAT,
                        format!(
                            "identifier {} is used for two different positions",
                            waypoint.identifier
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    seen.insert(key, waypoint);
                    table.push(waypoint);
                }
            }
        }

        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        out.push_str(&format!("<flight-plan xmlns=\"{}\">\n", NAMESPACE));
        out.push_str(&format!(
            "  <created>{}</created>\n",
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        ));
        out.push_str("  <waypoint-table>\n");
        for waypoint in table {
            out.push_str("    <waypoint>\n");
            out.push_str(&format!(
                "      <identifier>{}</identifier>\n",
                escape(&waypoint.identifier)
            ));
            out.push_str(&format!("      <type>{}</type>\n", garmin_type(waypoint.kind)));
            out.push_str(&format!("      <lat>{}</lat>\n", waypoint.coordinates.lat));
            out.push_str(&format!("      <lon>{}</lon>\n", waypoint.coordinates.lng));
            if let Some(name) = &waypoint.name {
                out.push_str(&format!("      <comment>{}</comment>\n", escape(name)));
            }
            if let Some(altitude) = waypoint.altitude {
                out.push_str(&format!("      <elevation>{}</elevation>\n", altitude));
            }
            out.push_str("    </waypoint>\n");
        }
        out.push_str("  </waypoint-table>\n");

        out.push_str("  <route>\n");
        out.push_str(&format!("    <route-name>{}</route-name>\n", escape(&route.name)));
        if let Some(description) = &route.description {
            out.push_str(&format!(
                "    <route-description>{}</route-description>\n",
                escape(description)
            ));
        }
        out.push_str("    <flight-plan-index>1</flight-plan-index>\n");
        for waypoint in &route.waypoints {
            out.push_str("    <route-point>\n");
            out.push_str(&format!(
                "      <waypoint-identifier>{}</waypoint-identifier>\n",
                escape(&waypoint.identifier)
            ));
            out.push_str(&format!(
                "      <waypoint-type>{}</waypoint-type>\n",
                garmin_type(waypoint.kind)
            ));
            out.push_str("    </route-point>\n");
        }
        out.push_str("  </route>\n");
        out.push_str("</flight-plan>\n");
        Ok(out)
    }
}
