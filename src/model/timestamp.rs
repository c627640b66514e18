use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};

/// Bridges the document API's server-timestamp concept and the backend's
/// temporal text representation.
///
/// Persisted as an RFC 3339 string with microsecond precision, so the
/// nanosecond component is a lossy round-trip. Equality compares both
/// components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        let mut timestamp = Self { seconds, nanos };
        timestamp.normalize();
        timestamp
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime.timestamp(), datetime.timestamp_subsec_nanos() as i32)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self::new(
            millis.div_euclid(1_000),
            (millis.rem_euclid(1_000) * 1_000_000) as i32,
        )
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.seconds, self.nanos.max(0) as u32)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn to_millis(&self) -> i64 {
        self.seconds * 1_000 + (self.nanos / 1_000_000) as i64
    }

    /// The persisted text form.
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime()
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parses the persisted text form. Returns `None` for anything that is not
    /// a full RFC 3339 datetime; this is what read-time rehydration keys off.
    pub fn parse_rfc3339(raw: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|parsed| Self::from_datetime(parsed.with_timezone(&Utc)))
    }

    fn normalize(&mut self) {
        let extra_seconds = self.nanos.div_euclid(1_000_000_000);
        self.seconds += extra_seconds as i64;
        self.nanos = self.nanos.rem_euclid(1_000_000_000);
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.seconds.cmp(&other.seconds) {
            Ordering::Equal => self.nanos.cmp(&other.nanos),
            ordering => ordering,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_nanoseconds() {
        let timestamp = Timestamp::new(1, 1_500_000_000);
        assert_eq!(timestamp.seconds, 2);
        assert_eq!(timestamp.nanos, 500_000_000);
    }

    #[test]
    fn millis_roundtrip() {
        let timestamp = Timestamp::from_millis(1_700_000_123_456);
        assert_eq!(timestamp.to_millis(), 1_700_000_123_456);
        assert_eq!(timestamp.seconds, 1_700_000_123);
        assert_eq!(timestamp.nanos, 456_000_000);
    }

    #[test]
    fn rfc3339_roundtrip_at_micro_precision() {
        let original = Timestamp::new(1_700_000_000, 123_456_000);
        let rendered = original.to_rfc3339();
        let parsed = Timestamp::parse_rfc3339(&rendered).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn rejects_non_temporal_strings() {
        assert!(Timestamp::parse_rfc3339("Mumbai").is_none());
        assert!(Timestamp::parse_rfc3339("2024-01-01").is_none());
        assert!(Timestamp::parse_rfc3339("").is_none());
    }

    #[test]
    fn ordering() {
        let earlier = Timestamp::new(1, 0);
        let later = Timestamp::new(1, 1);
        assert!(earlier < later);
    }
}
