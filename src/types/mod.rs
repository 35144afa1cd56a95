//! All data types for the hierarchical memory store.

pub mod entry;
pub mod error;
pub mod id;
pub mod validation;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

pub use entry::{MemoryEntry, MemoryEntryBuilder, MemoryLevel};
pub use error::{MemoryError, MemoryErrorKind, MemoryResult};
pub use id::generate_id;
pub use validation::{validate_content, validate_level, validate_tags, ValidationLimits};

/// Default maximum content length in bytes.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 10_000;

/// Default maximum length of a single tag in bytes.
pub const DEFAULT_MAX_TAG_LENGTH: usize = 50;

/// Default maximum number of tags per memory.
pub const DEFAULT_MAX_TAG_COUNT: usize = 20;

/// Name of the data file inside the data directory.
pub const DATA_FILE_NAME: &str = "memories.json";

/// On-disk timestamp format: second precision with a literal UTC marker.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Returns the current UTC time truncated to whole seconds.
///
/// Timestamps are persisted with second precision, so keeping the sub-second
/// part in memory would make a reloaded store differ from the one that saved it.
pub fn now_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Format a timestamp the way the data file stores it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp in the data file format.
pub fn parse_timestamp(raw: &str) -> MemoryResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| MemoryError::JsonParse(format!("bad timestamp {raw:?}: {e}")))
}

/// Serde adapter for [`TIMESTAMP_FORMAT`] timestamps.
pub(crate) mod timestamp_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(|e| serde::de::Error::custom(e.detail().to_string()))
    }
}
