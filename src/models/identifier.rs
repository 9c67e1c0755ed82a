use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ForecastError;

static CVE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CVE-(\d{4})-(\d{4,})$").expect("valid CVE regex"));

/// Identifier naming one vulnerability across every feed.
///
/// Always trimmed and upper-cased so that `cve-2024-0001` from one feed joins
/// with `CVE-2024-0001` from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VulnId(String);

impl VulnId {
    /// Normalize without validating the shape. Rejects only empty input.
    pub fn new(raw: &str) -> Result<Self, ForecastError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ForecastError::MalformedRecord("empty identifier".into()));
        }
        Ok(Self(normalized))
    }

    /// Normalize and require the `CVE-YYYY-NNNN` shape used by all three feeds.
    pub fn parse_cve(raw: &str) -> Result<Self, ForecastError> {
        let id = Self::new(raw)?;
        if !CVE_ID.is_match(&id.0) {
            return Err(ForecastError::MalformedRecord(format!("unparseable identifier '{}'", raw.trim())));
        }
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(year, number)` for CVE-shaped ids.
    fn cve_key(&self) -> Option<(u32, u64)> {
        let caps = CVE_ID.captures(&self.0)?;
        Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
    }
}

/// CVE ids order by year, then numerically by sequence; other ids sort after
/// them by text.
impl Ord for VulnId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.cve_key(), other.cve_key()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for VulnId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VulnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
