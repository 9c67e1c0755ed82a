//! Per-source normalization of raw records into [`NormalizedRecord`]s.
//!
//! A malformed record is reported through [`Malformed`] and counted by the
//! caller's [`NormalizeReport`]; it never aborts the batch.

pub mod epss;
pub mod kev;
pub mod nvd;
pub mod report;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::NormalizedRecord;
use crate::sources::SourceKind;

pub use report::{Malformed, NormalizeReport};

/// Normalize one raw record from `kind`.
pub fn normalize(kind: SourceKind, raw: &Value) -> Result<Vec<NormalizedRecord>, Malformed> {
    match kind {
        SourceKind::Nvd => nvd::normalize_nvd(raw),
        SourceKind::Kev => kev::normalize_kev(raw),
        SourceKind::Epss => epss::normalize_epss(raw),
    }
}

/// Normalize a whole batch, keeping what parses and counting what does not.
pub fn normalize_batch(kind: SourceKind, raw: &[Value]) -> (Vec<NormalizedRecord>, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let records = raw
        .iter()
        .flat_map(|value| report.observe(kind.as_str(), normalize(kind, value)))
        .collect();
    report.log_summary(kind.as_str());
    (records, report)
}

/// Registry timestamps come without a zone and are UTC; RFC 3339 is accepted too.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, Malformed> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Malformed::new("bad_date", raw))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, Malformed> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| Malformed::new("bad_date", raw))
}

/// Reject a present score outside `[0, max]`. Absent stays absent.
pub(crate) fn check_range(field: &str, value: Option<f64>, max: f64) -> Result<Option<f64>, Malformed> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=max).contains(&v) => Err(Malformed::new(
            "score_out_of_range",
            format!("{} = {} outside [0, {}]", field, v, max),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-01-05T15:15:08.503").is_ok());
        assert!(parse_timestamp("2024-01-05T15:15:08").is_ok());
        assert!(parse_timestamp("2024-01-05T15:15:08Z").is_ok());
        assert_eq!(parse_timestamp("05/01/2024").unwrap_err().reason, "bad_date");
    }

    #[test]
    fn test_check_range() {
        assert_eq!(check_range("x", None, 10.0).unwrap(), None);
        assert_eq!(check_range("x", Some(10.0), 10.0).unwrap(), Some(10.0));
        assert!(check_range("x", Some(-0.1), 10.0).is_err());
        assert!(check_range("x", Some(f64::NAN), 10.0).is_err());
    }

    #[test]
    fn test_batch_keeps_good_records_and_counts_bad() {
        let raw = vec![
            json!({"cveID": "CVE-2024-0001", "dateAdded": "2024-01-02"}),
            json!({"cveID": "junk"}),
            json!({"cveID": "CVE-2024-0002"}),
        ];
        let (records, report) = normalize_batch(SourceKind::Kev, &raw);
        assert_eq!(records.len(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.drop_reasons["bad_identifier"], 1);
    }
}
