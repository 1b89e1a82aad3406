use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

/// Join an API base URL and a relative route without doubling slashes.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Parse a server timestamp. The API emits zone-less local date-times, but
/// RFC 3339 values are accepted too and normalised to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = value.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Serde adapter for optional timestamps. Unparseable values read as
/// missing instead of failing the whole record.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Short form used when printing listings.
pub fn format_timestamp(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
