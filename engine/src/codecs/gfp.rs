//! Garmin GFP text (`FPN/RI:F:KORD,N41587W087542,AIRPORT:F:LAKE,N41540W087360`).
//!
//! Each `F:` entry is `IDENT[,NddmmmWdddmmm[,KIND]]`: the identifier, an
//! optional coordinate token (degrees, minutes and tenths of a minute) and an
//! optional waypoint kind, `CUSTOM` when absent. The encoder always writes the
//! coordinates. On import a directory entry for the identifier wins over the
//! carried coordinates; entries with neither are unknown. A bare coordinate
//! token is read as a custom waypoint named after the token.

use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use super::{imported_name, CodecError, CodecResult, RouteCodec, RouteFormat};
use crate::models::{LatLng, Route, Waypoint, WaypointKind};

const FORMAT: RouteFormat = RouteFormat::Gfp;
const PREFIX: &str = "FPN/RI:";

/// Lookup of published waypoints by identifier.
pub trait WaypointDirectory: Send + Sync {
    fn lookup(&self, identifier: &str) -> Option<Waypoint>;
}

/// In-memory directory keyed by upper-cased identifier.
#[derive(Default)]
pub struct MemoryDirectory {
    entries: RwLock<HashMap<String, Waypoint>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_waypoints(waypoints: impl IntoIterator<Item = Waypoint>) -> Self {
        let directory = Self::new();
        for waypoint in waypoints {
            directory.insert(waypoint);
        }
        directory
    }

    pub fn insert(&self, waypoint: Waypoint) {
        self.entries
            .write()
            .insert(waypoint.identifier.to_uppercase(), waypoint);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WaypointDirectory for MemoryDirectory {
    fn lookup(&self, identifier: &str) -> Option<Waypoint> {
        self.entries.read().get(&identifier.to_uppercase()).cloned()
    }
}

pub struct GfpCodec {
    directory: Arc<dyn WaypointDirectory>,
}

impl GfpCodec {
    pub fn new(directory: Arc<dyn WaypointDirectory>) -> Self {
        Self { directory }
    }

    /// Waypoint for one `F:` entry.
    fn resolve(&self, entry: &str) -> CodecResult<Waypoint> {
        let mut fields = entry.split(',').map(str::trim);
        // Some units append a ".procedure" suffix to the identifier.
        let identifier = fields
            .next()
            .and_then(|f| f.split('.').next())
            .unwrap_or_default()
            .to_uppercase();
        if identifier.is_empty() {
            return Err(CodecError::malformed(FORMAT, "empty waypoint identifier"));
        }
        let carried = match fields.next().filter(|f| !f.is_empty()) {
            Some(token) => Some(parse_coordinate_token(token)?.ok_or_else(|| {
                CodecError::malformed(FORMAT, format!("bad coordinates '{}' for {}", token, identifier))
            })?),
            None => None,
        };
        let kind = match fields.next().filter(|f| !f.is_empty()) {
            Some(text) => text
                .parse::<WaypointKind>()
                .map_err(|e| CodecError::malformed(FORMAT, e))?,
            None => WaypointKind::Custom,
        };

        if let Some(mut found) = self.directory.lookup(&identifier) {
            found.id = crate::models::WaypointId::generate();
            return Ok(found);
        }
        if let Some(position) = carried {
            return Ok(Waypoint::new(identifier, kind, position));
        }
        match parse_coordinate_token(&identifier)? {
            Some(position) => Ok(Waypoint::new(identifier, WaypointKind::Custom, position)),
            None => Err(CodecError::UnknownWaypoint { identifier }),
        }
    }
}

/// Encode a coordinate as `NddmmmWdddmmm`.
pub fn coordinate_token(position: LatLng) -> String {
    fn split(value: f64) -> (u32, u32) {
        let tenths = (value.abs() * 600.0).round() as u32;
        (tenths / 600, tenths % 600)
    }
    let (lat_deg, lat_tenths) = split(position.lat);
    let (lng_deg, lng_tenths) = split(position.lng);
    format!(
        "{}{:02}{:03}{}{:03}{:03}",
        if position.lat < 0.0 { 'S' } else { 'N' },
        lat_deg,
        lat_tenths,
        if position.lng < 0.0 { 'W' } else { 'E' },
        lng_deg,
        lng_tenths
    )
}

fn token_pattern() -> CodecResult<Regex> {
    Regex::new(r"^([NS])(\d{2})(\d{3})([EW])(\d{3})(\d{3})$")
        .map_err(|e| CodecError::malformed(FORMAT, format!("bad pattern: {}", e)))
}

/// Decode a `NddmmmWdddmmm` token, `None` if `token` is not one.
pub fn parse_coordinate_token(token: &str) -> CodecResult<Option<LatLng>> {
    let Some(caps) = token_pattern()?.captures(token) else {
        return Ok(None);
    };
    let number = |i: usize| -> f64 { caps[i].parse::<f64>().unwrap_or(0.0) };
    let lat = number(2) + number(3) / 600.0;
    let lng = number(5) + number(6) / 600.0;
    let position = LatLng::new(
        if &caps[1] == "S" { -lat } else { lat },
        if &caps[4] == "W" { -lng } else { lng },
    );
    if !position.is_valid() || number(3) >= 600.0 || number(6) >= 600.0 {
        return Err(CodecError::malformed(
            FORMAT,
            format!("coordinate token {} is out of range", token),
        ));
    }
    Ok(Some(position))
}

impl RouteCodec for GfpCodec {
    fn format(&self) -> RouteFormat {
        FORMAT
    }

    fn decode(&self, raw: &str) -> CodecResult<Route> {
        let line = raw
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("FPN/"))
            .ok_or_else(|| CodecError::malformed(FORMAT, "no FPN/ line"))?;
        let body = line
            .strip_prefix(PREFIX)
            .ok_or_else(|| CodecError::malformed(FORMAT, "expected FPN/RI: route"))?;

        let tokens: Vec<&str> = body.split(':').filter(|t| !t.is_empty()).collect();
        if tokens.len() % 2 != 0 {
            return Err(CodecError::malformed(FORMAT, "unpaired token"));
        }

        let mut waypoints = Vec::new();
        for pair in tokens.chunks(2) {
            let (tag, identifier) = (pair[0], pair[1].trim());
            match tag {
                "F" => {}
                "A" => {
                    return Err(CodecError::malformed(
                        FORMAT,
                        format!("airway segment {} is not supported", identifier),
                    ))
                }
                other => {
                    return Err(CodecError::malformed(
                        FORMAT,
                        format!("unknown token type '{}'", other),
                    ))
                }
            }

            waypoints.push(self.resolve(identifier)?);
        }

        Ok(Route::new(imported_name(FORMAT), waypoints))
    }

    fn encode(&self, route: &Route) -> CodecResult<String> {
        let mut tokens = Vec::with_capacity(route.waypoints.len());
        for waypoint in &route.waypoints {
            let identifier = waypoint.identifier.trim().to_uppercase();
            if identifier.is_empty() || identifier.contains([':', ',', '.']) {
                return Err(CodecError::unsupported(
                    FORMAT,
                    format!("identifier '{}' cannot be written", waypoint.identifier),
                ));
            }
            if !waypoint.coordinates.is_valid() {
                return Err(CodecError::unsupported(
                    FORMAT,
                    format!("{} has invalid coordinates", waypoint.identifier),
                ));
            }
            let mut token = format!("F:{},{}", identifier, coordinate_token(waypoint.coordinates));
            if waypoint.kind != WaypointKind::Custom {
                token.push(',');
                token.push_str(&waypoint.kind.as_str().to_uppercase());
            }
            tokens.push(token);
        }
        Ok(format!("{}{}", PREFIX, tokens.join(":")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Arc<MemoryDirectory> {
        Arc::new(MemoryDirectory::with_waypoints([
            Waypoint::airport("KORD", 41.978, -87.904),
            Waypoint::airport("KMDW", 41.786, -87.752),
            Waypoint::new("OBK", WaypointKind::Vor, LatLng::new(42.222, -87.868)),
        ]))
    }

    #[test]
    fn test_coordinate_tokens() {
        assert_eq!(coordinate_token(LatLng::new(41.9, -87.6)), "N41540W087360");
        assert_eq!(coordinate_token(LatLng::new(-33.95, 151.18)), "S33570E151108");
        // 59.96' rounds up into the next degree
        assert_eq!(coordinate_token(LatLng::new(10.9999, 0.0)), "N11000E000000");

        let back = parse_coordinate_token("N41540W087360").unwrap().unwrap();
        assert!((back.lat - 41.9).abs() < 1e-9);
        assert!((back.lng + 87.6).abs() < 1e-9);
        assert_eq!(parse_coordinate_token("KORD").unwrap(), None);
        assert!(parse_coordinate_token("N95000W087360").is_err());
    }

    #[test]
    fn test_round_trip_keeps_user_waypoint_names() {
        let codec = GfpCodec::new(Arc::new(MemoryDirectory::new()));
        let route = Route::new(
            "Hop",
            vec![
                Waypoint::airport("KORD", 41.978, -87.904),
                Waypoint::new("LAKE", WaypointKind::Custom, LatLng::new(41.9, -87.6)),
                Waypoint::new("FARM", WaypointKind::Gps, LatLng::new(41.5, -87.2)),
                Waypoint::airport("KMDW", 41.786, -87.752),
            ],
        );
        let raw = codec.encode(&route).unwrap();
        assert_eq!(
            raw,
            "FPN/RI:F:KORD,N41587W087542,AIRPORT:F:LAKE,N41540W087360\
             :F:FARM,N41300W087120,GPS:F:KMDW,N41472W087451,AIRPORT"
        );

        let decoded = codec.decode(&raw).unwrap();
        let idents: Vec<_> = decoded.waypoints.iter().map(|w| w.identifier.as_str()).collect();
        assert_eq!(idents, vec!["KORD", "LAKE", "FARM", "KMDW"]);
        let kinds: Vec<_> = decoded.waypoints.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WaypointKind::Airport,
                WaypointKind::Custom,
                WaypointKind::Gps,
                WaypointKind::Airport
            ]
        );
        // Tenths of a minute
        assert!((decoded.waypoints[1].coordinates.lat - 41.9).abs() < 1e-9);
        assert!((decoded.waypoints[0].coordinates.lng + 87.904).abs() < 0.002);
        assert_eq!(decoded.name, "Imported Route (GFP)");
    }

    #[test]
    fn test_directory_wins_and_resolves_bare_names() {
        let codec = GfpCodec::new(directory());
        let decoded = codec
            .decode("FPN/RI:F:KORD,N41590W087540,AIRPORT:F:N41540W087360:F:OBK")
            .unwrap();
        let idents: Vec<_> = decoded.waypoints.iter().map(|w| w.identifier.as_str()).collect();
        assert_eq!(idents, vec!["KORD", "N41540W087360", "OBK"]);
        assert_eq!(decoded.waypoints[0].coordinates, LatLng::new(41.978, -87.904));
        assert_eq!(decoded.waypoints[1].kind, WaypointKind::Custom);
        assert_eq!(decoded.waypoints[2].kind, WaypointKind::Vor);
    }

    #[test]
    fn test_unknown_identifier() {
        let codec = GfpCodec::new(directory());
        assert_eq!(
            codec.decode("FPN/RI:F:KORD:F:ZZZZ").unwrap_err(),
            CodecError::UnknownWaypoint {
                identifier: "ZZZZ".into()
            }
        );
    }

    #[test]
    fn test_malformed_documents() {
        let codec = GfpCodec::new(directory());
        assert!(codec.decode("").is_err());
        assert!(codec.decode("FPN/RI:F").is_err());
        assert!(codec.decode("FPN/RI:F:KORD:A:V10:F:KMDW").is_err());
        assert!(codec.decode("FPN/XX:F:KORD").is_err());
        assert!(codec.decode("FPN/RI:F:LAKE,NORTH").is_err());
        assert!(codec.decode("FPN/RI:F:LAKE,N41540W087360,BALLOON").is_err());
        let ok = codec.decode("header\nFPN/RI:F:kord:F:KMDW.RW31C\n").unwrap();
        assert_eq!(ok.waypoints.len(), 2);
        assert_eq!(ok.waypoints[1].identifier, "KMDW");
    }
}
