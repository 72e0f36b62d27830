use chrono::{DateTime, Utc};

/// Encodes an instant as whole seconds since the Unix epoch.
pub(crate) fn to_timestamp(value: DateTime<Utc>) -> String {
    value.timestamp().to_string()
}

/// Decodes a value written by [`to_timestamp`].
pub(crate) fn from_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let seconds = value.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(seconds, 0)
}
