//! Route import/export codecs.
//!
//! A codec turns raw text into a [`Route`] (waypoints only; legs and totals
//! are recomputed by the route store) and back. Three formats ship with the
//! engine:
//!
//! - `fpl`: Garmin flight-plan XML (waypoint table plus route points)
//! - `gpx`: GPX 1.1 route (`rte`/`rtept`), elevation in metres
//! - `gfp`: Garmin `FPN/RI:` text; identifiers carry their coordinates, bare
//!   names are resolved through a [`WaypointDirectory`]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::Route;

pub mod fpl;
pub mod gfp;
pub mod gpx;

pub use self::fpl::FplCodec;
pub use self::gfp::{GfpCodec, MemoryDirectory, WaypointDirectory};
pub use self::gpx::GpxCodec;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteFormat {
    Fpl,
    Gfp,
    Gpx,
}

impl RouteFormat {
    pub const ALL: [RouteFormat; 3] = [RouteFormat::Fpl, RouteFormat::Gfp, RouteFormat::Gpx];

    pub fn as_str(self) -> &'static str {
        match self {
            RouteFormat::Fpl => "fpl",
            RouteFormat::Gfp => "gfp",
            RouteFormat::Gpx => "gpx",
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for RouteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fpl" => Ok(RouteFormat::Fpl),
            "gfp" => Ok(RouteFormat::Gfp),
            "gpx" => Ok(RouteFormat::Gpx),
            other => Err(CodecError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("Unknown route format '{0}'")]
    UnknownFormat(String),

    #[error("Malformed {format} document: {message}")]
    Malformed { format: RouteFormat, message: String },

    #[error("Waypoint '{identifier}' not found in directory")]
    UnknownWaypoint { identifier: String },

    #[error("Cannot encode route as {format}: {reason}")]
    Unsupported { format: RouteFormat, reason: String },
}

impl CodecError {
    pub(crate) fn malformed(format: RouteFormat, message: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(format: RouteFormat, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            format,
            reason: reason.into(),
        }
    }
}

/// Converts between a route and one interchange format.
///
/// Decoded routes carry no id, legs or totals; callers save them through the
/// route store, which assigns the id and recomputes derived data.
pub trait RouteCodec: Send + Sync {
    fn format(&self) -> RouteFormat;

    fn decode(&self, raw: &str) -> CodecResult<Route>;

    fn encode(&self, route: &Route) -> CodecResult<String>;
}

/// Default name for routes whose document carries none.
pub(crate) fn imported_name(format: RouteFormat) -> String {
    format!("Imported Route ({})", format.as_str().to_uppercase())
}

pub(crate) fn parse_number(format: RouteFormat, field: &str, text: &str) -> CodecResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CodecError::malformed(format, format!("{} is not a number: '{}'", field, text)))
}

/// Codecs by format.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<RouteFormat, Arc<dyn RouteCodec>>,
}

impl CodecRegistry {
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// FPL, GPX and a GFP codec resolving names through `directory`.
    pub fn with_directory(directory: Arc<dyn WaypointDirectory>) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(FplCodec));
        registry.register(Arc::new(GpxCodec));
        registry.register(Arc::new(GfpCodec::new(directory)));
        registry
    }

    /// Replace the codec for its format.
    pub fn register(&mut self, codec: Arc<dyn RouteCodec>) {
        self.codecs.insert(codec.format(), codec);
    }

    pub fn codec_for(&self, format: RouteFormat) -> CodecResult<Arc<dyn RouteCodec>> {
        self.codecs
            .get(&format)
            .cloned()
            .ok_or_else(|| CodecError::UnknownFormat(format.to_string()))
    }

    pub fn decode(&self, raw: &str, format: RouteFormat) -> CodecResult<Route> {
        self.codec_for(format)?.decode(raw)
    }

    pub fn encode(&self, route: &Route, format: RouteFormat) -> CodecResult<String> {
        self.codec_for(format)?.encode(route)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_directory(Arc::new(MemoryDirectory::new()))
    }
}
