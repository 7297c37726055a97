use chrono::{DateTime, SecondsFormat, Utc};

/// Current instant in UTC.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format a UTC instant as RFC 3339 with a `Z` suffix and as many
/// fractional digits as needed.
pub fn to_rfc3339_utc(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
