//! `Duration` as whole milliseconds, for `#[serde(with = "crate::serde_duration")]`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub fn as_millis_u64(value: Duration) -> u64 {
    value.as_millis().min(u64::MAX as u128) as u64
}

pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(as_millis_u64(*value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
