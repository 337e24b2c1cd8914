//! Timestamp canonicalization.
//!
//! Every stored or returned sample timestamp is UTC with millisecond
//! precision, rendered as `YYYY-MM-DDTHH:MM:SS.mmmZ`. The fixed width of the
//! canonical form means stored values compare correctly as plain text,
//! which the SQLite store relies on for range filters and eviction.
//!
//! Inputs are accepted in several shapes (RFC 3339 with `Z` or an offset,
//! naive `YYYY-MM-DD HH:MM:SS[.ffffff]`, naive `T`-separated). A value that
//! cannot be parsed is repaired to the current time by
//! [`normalize_or_now`] rather than rejected.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::types::Timestamp;

/// `strftime` pattern of the canonical representation.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Zoned layouts tried after strict RFC 3339.
const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"];

/// Naive layouts, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Current time truncated to millisecond precision.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(3)
}

/// Render `ts` in canonical form.
pub fn format(ts: &Timestamp) -> String {
    ts.format(CANONICAL_FORMAT).to_string()
}

/// Parse any supported representation into a millisecond-precision UTC
/// timestamp. Returns `None` when no layout matches.
pub fn parse(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).trunc_subsecs(3));
    }

    for layout in ZONED_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, layout) {
            return Some(ts.with_timezone(&Utc).trunc_subsecs(3));
        }
    }

    for layout in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(naive.and_utc().trunc_subsecs(3));
        }
    }

    None
}

/// Parse `raw`, substituting the current time (and logging a warning) when
/// it is malformed.
pub fn normalize_or_now(raw: &str) -> Timestamp {
    match parse(raw) {
        Some(ts) => ts,
        None => {
            tracing::warn!(raw = %raw, "Unparseable timestamp, substituting current time");
            now()
        }
    }
}

/// Serde adapter for canonical timestamps.
///
/// Serializes with [`CANONICAL_FORMAT`]; deserializes leniently through
/// [`parse`] and fails on unparseable input (repair is the ingestion
/// layer's decision, not the codec's).
pub mod canonical {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::types::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
