use serde::Deserialize;
use serde_json::Value;

use crate::models::{ExploitationEvidence, Likelihood, NormalizedRecord, VulnId};
use super::report::Malformed;
use super::{check_range, parse_date};

#[derive(Deserialize)]
struct EpssEntry {
    cve: Option<String>,
    epss: Option<Value>,
    percentile: Option<Value>,
    date: Option<String>,
}

/// Score row → probabilistic evidence. Scores arrive as decimal strings.
pub fn normalize_epss(raw: &Value) -> Result<Vec<NormalizedRecord>, Malformed> {
    let entry: EpssEntry = serde_json::from_value(raw.clone())
        .map_err(|e| Malformed::new("bad_shape", e.to_string()))?;
    let id = VulnId::parse_cve(entry.cve.as_deref().unwrap_or_default())
        .map_err(|e| Malformed::new("bad_identifier", e.to_string()))?;

    let score = check_range("epss", number(entry.epss.as_ref(), "epss")?, 1.0)?
        .ok_or_else(|| Malformed::new("missing_score", id.to_string()))?;
    let percentile = check_range("percentile", number(entry.percentile.as_ref(), "percentile")?, 1.0)?;
    let as_of = entry.date.as_deref().map(parse_date).transpose()?;

    Ok(vec![NormalizedRecord::Evidence(ExploitationEvidence::score(
        id,
        Likelihood { score, percentile, as_of },
    ))])
}

fn number(value: Option<&Value>, field: &str) -> Result<Option<f64>, Malformed> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| Malformed::new("bad_number", format!("{} = '{}'", field, s))),
        Some(other) => Err(Malformed::new("bad_number", format!("{} = {}", field, other))),
    }
}
