//! Serde helpers for the unix-seconds timestamps carried in completion responses.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;

/// Deserialize a unix timestamp in seconds into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i64::deserialize(deserializer)?;
    OffsetDateTime::from_unix_timestamp(seconds).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime as a unix timestamp in seconds
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(datetime.unix_timestamp())
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::macros::datetime;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stamped {
        #[serde(with = "crate::utils::time")]
        created: OffsetDateTime,
    }

    #[test]
    fn unix_seconds() {
        let stamped: Stamped = serde_json::from_str(r#"{"created":1700000000}"#).unwrap();
        assert_eq!(stamped.created, datetime!(2023-11-14 22:13:20 UTC));
        assert_eq!(
            serde_json::to_string(&stamped).unwrap(),
            r#"{"created":1700000000}"#
        );
    }

    #[test]
    fn rejects_strings() {
        assert!(serde_json::from_str::<Stamped>(r#"{"created":"yesterday"}"#).is_err());
    }
}
