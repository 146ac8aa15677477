use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Parses a store timestamp (RFC 3339, e.g. `2024-08-01T08:08:27.000Z`) into
/// Unix epoch seconds.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    OffsetDateTime::parse(value, &Rfc3339)
        .ok()
        .map(|ts| ts.unix_timestamp())
}

pub fn parse_optional_timestamp(value: Option<&str>) -> Option<i64> {
    value.and_then(parse_timestamp)
}
