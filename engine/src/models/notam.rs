//! Structured NOTAMs and per-airport summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{LatLng, Priority};

crate::define_id_type!(NotamId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotamType {
    Runway,
    Taxiway,
    Approach,
    Tower,
    Obstacle,
    Airspace,
    Lighting,
    Navaid,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotamCategory {
    Closure,
    Restriction,
    Change,
    Information,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Takeoff,
    Landing,
    Taxi,
    Approach,
    Departure,
    Enroute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotamClassification {
    pub severity: Priority,
    pub category: NotamCategory,
    pub impact_level: ImpactLevel,
    #[serde(default)]
    pub affected_operations: Vec<OperationType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedNotam {
    pub subject: String,
    pub condition: String,
    pub location: String,
    #[serde(default)]
    pub coordinates: Option<LatLng>,
    #[serde(default)]
    pub runway: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notam {
    pub id: NotamId,
    #[serde(rename = "type")]
    pub kind: NotamType,
    /// Airport identifier, upper case.
    pub airport: String,
    pub raw: String,
    #[serde(default)]
    pub parsed: Option<ParsedNotam>,
    pub effective_from: DateTime<Utc>,
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub classification: NotamClassification,
    pub is_active: bool,
}

impl Notam {
    /// Active flag set and `at` inside the effective window.
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.is_active
            && at >= self.effective_from
            && self.effective_to.map_or(true, |to| at < to)
    }
}

/// All NOTAMs cached for one airport, with the fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportNotams {
    pub airport: String,
    pub notams: Vec<Notam>,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotamSummary {
    pub airport: String,
    pub total: usize,
    pub by_severity: BTreeMap<Priority, usize>,
    pub by_type: BTreeMap<NotamType, usize>,
    pub critical: Vec<Notam>,
    pub last_updated: DateTime<Utc>,
}

impl NotamSummary {
    /// Summarize the NOTAMs effective at `at`.
    pub fn build(entry: &AirportNotams, at: DateTime<Utc>) -> Self {
        let mut by_severity: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let mut by_type = BTreeMap::new();
        let mut critical = Vec::new();
        let mut total = 0;

        for notam in entry.notams.iter().filter(|n| n.is_effective_at(at)) {
            total += 1;
            *by_severity.entry(notam.classification.severity).or_insert(0) += 1;
            *by_type.entry(notam.kind).or_insert(0) += 1;
            if notam.classification.severity == Priority::Critical {
                critical.push(notam.clone());
            }
        }

        Self {
            airport: entry.airport.clone(),
            total,
            by_severity,
            by_type,
            critical,
            last_updated: entry.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn notam(severity: Priority, kind: NotamType, active: bool, hours_left: i64) -> Notam {
        let now = Utc::now();
        Notam {
            id: NotamId::generate(),
            kind,
            airport: "KORD".into(),
            raw: "!ORD 01/001 ORD RWY 10L/28R CLSD".into(),
            parsed: None,
            effective_from: now - Duration::hours(1),
            effective_to: Some(now + Duration::hours(hours_left)),
            created: now,
            classification: NotamClassification {
                severity,
                category: NotamCategory::Closure,
                impact_level: ImpactLevel::High,
                affected_operations: vec![OperationType::Landing],
            },
            is_active: active,
        }
    }

    #[test]
    fn test_summary_counts_only_effective() {
        let entry = AirportNotams {
            airport: "KORD".into(),
            notams: vec![
                notam(Priority::Critical, NotamType::Runway, true, 4),
                notam(Priority::Low, NotamType::Lighting, true, 4),
                notam(Priority::High, NotamType::Runway, false, 4),
                notam(Priority::Medium, NotamType::Taxiway, true, -1),
            ],
            last_update: Utc::now(),
        };

        let summary = NotamSummary::build(&entry, Utc::now());
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_severity[&Priority::Critical], 1);
        assert_eq!(summary.by_severity[&Priority::High], 0);
        assert_eq!(summary.by_type[&NotamType::Runway], 1);
        assert_eq!(summary.critical.len(), 1);
    }
}
