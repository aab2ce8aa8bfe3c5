//! Duration parsing and whole-second conversion.
//!
//! Durations travel as human-readable strings (`"10s"`, `"2m"`,
//! `"1h 30m"`) and are stored as whole seconds.

use std::time::Duration;

use crate::error::{Error, Result};

/// Parse an optional duration field. Empty or whitespace-only input is
/// treated as absent.
pub fn parse_optional(field: &'static str, raw: Option<&str>) -> Result<Option<Duration>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => humantime::parse_duration(s)
            .map(Some)
            .map_err(|e| Error::validation(field, format!("{s:?}: {e}"))),
    }
}

/// Round to the nearest whole second.
pub fn round_secs(field: &'static str, d: Duration) -> Result<i64> {
    let secs = d.as_secs().saturating_add(u64::from(d.subsec_millis() >= 500));
    i64::try_from(secs).map_err(|_| Error::validation(field, "duration out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!(
            parse_optional("delay", Some("10s")).unwrap(),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            parse_optional("ttr", Some("2m")).unwrap(),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            parse_optional("ttr", Some("1h 30m")).unwrap(),
            Some(Duration::from_secs(5400))
        );
    }

    #[test]
    fn empty_means_absent() {
        assert_eq!(parse_optional("delay", None).unwrap(), None);
        assert_eq!(parse_optional("delay", Some("")).unwrap(), None);
        assert_eq!(parse_optional("delay", Some("  ")).unwrap(), None);
    }

    #[test]
    fn malformed_is_a_validation_error() {
        let err = parse_optional("delay", Some("soon")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "delay", .. }));
    }

    #[test]
    fn rounds_to_nearest_second() {
        assert_eq!(round_secs("ttr", Duration::from_millis(1499)).unwrap(), 1);
        assert_eq!(round_secs("ttr", Duration::from_millis(1500)).unwrap(), 2);
        assert_eq!(round_secs("ttr", Duration::from_millis(400)).unwrap(), 0);
    }
}
