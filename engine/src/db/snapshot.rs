//! Versioned, checksummed snapshot envelopes.
//!
//! Every collection a store persists is wrapped as
//! `{version, kind, saved_at, checksum, payload}`. The payload is kept as the
//! exact JSON text that was checksummed, so verification never depends on
//! re-serializing floats. A checksum mismatch, an unexpected kind or an
//! unknown version marks the snapshot as corrupt.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::checksum::calculate_checksum;
use super::repository::{ErrorContext, RepositoryError, RepositoryResult};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub version: u32,
    pub kind: String,
    pub saved_at: DateTime<Utc>,
    pub checksum: String,
    pub payload: String,
}

/// Serialize `value` into an envelope string.
pub fn encode<T: Serialize>(kind: &str, value: &T) -> RepositoryResult<String> {
    let context = || ErrorContext::new("encode").with_entity(kind);
    let payload = serde_json::to_string(value).map_err(|e| {
        RepositoryError::serialization(format!("Failed to serialize payload: {}", e), context())
    })?;
    let checksum = calculate_checksum(&payload);
    let envelope = SnapshotEnvelope {
        version: SNAPSHOT_VERSION,
        kind: kind.to_string(),
        saved_at: Utc::now(),
        checksum,
        payload,
    };
    serde_json::to_string_pretty(&envelope).map_err(|e| {
        RepositoryError::serialization(format!("Failed to serialize envelope: {}", e), context())
    })
}

/// Parse and verify an envelope string, returning its payload.
pub fn decode<T: DeserializeOwned>(kind: &str, raw: &str) -> RepositoryResult<T> {
    let context = || ErrorContext::new("decode").with_entity(kind);
    let envelope: SnapshotEnvelope = serde_json::from_str(raw)
        .map_err(|e| RepositoryError::corrupt(format!("Unreadable envelope: {}", e), context()))?;

    if envelope.version != SNAPSHOT_VERSION {
        return Err(RepositoryError::corrupt(
            format!("Unsupported snapshot version {}", envelope.version),
            context(),
        ));
    }
    if envelope.kind != kind {
        return Err(RepositoryError::corrupt(
            format!("Expected kind '{}', found '{}'", kind, envelope.kind),
            context(),
        ));
    }
    let actual = calculate_checksum(&envelope.payload);
    if actual != envelope.checksum {
        return Err(RepositoryError::corrupt(
            "Checksum mismatch",
            context().with_details(format!("expected={}, actual={}", envelope.checksum, actual)),
        ));
    }
    serde_json::from_str(&envelope.payload)
        .map_err(|e| RepositoryError::corrupt(format!("Payload does not match kind: {}", e), context()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_verifies_checksum() {
        let raw = encode("numbers", &vec![1, 2, 3]).unwrap();
        let values: Vec<i32> = decode("numbers", &raw).unwrap();
        assert_eq!(values, vec![1, 2, 3]);

        let mut envelope: SnapshotEnvelope = serde_json::from_str(&raw).unwrap();
        envelope.payload = "[1,7,3]".to_string();
        let tampered = serde_json::to_string(&envelope).unwrap();
        let err = decode::<Vec<i32>>("numbers", &tampered).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let raw = encode("numbers", &vec![1]).unwrap();
        let err = decode::<Vec<i32>>("words", &raw).unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("Expected kind"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode::<Vec<i32>>("numbers", "not json").unwrap_err().is_corrupt());
    }
}
