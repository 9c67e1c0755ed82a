use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    CvssVersion, ExploitationEvidence, NormalizedRecord, VulnId, VulnerabilityRecord,
};
use super::report::Malformed;
use super::{check_range, parse_timestamp};

#[derive(Deserialize)]
struct NvdItem {
    cve: Option<NvdCve>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdCve {
    id: Option<String>,
    published: Option<String>,
    last_modified: Option<String>,
    #[serde(default)]
    descriptions: Vec<LangValue>,
    #[serde(default)]
    metrics: NvdMetrics,
    #[serde(default)]
    weaknesses: Vec<Weakness>,
    #[serde(default)]
    references: Vec<Reference>,
}

#[derive(Deserialize)]
struct LangValue {
    lang: Option<String>,
    value: Option<String>,
}

#[derive(Deserialize, Default)]
struct NvdMetrics {
    #[serde(rename = "cvssMetricV31", default)]
    v31: Vec<CvssMetric>,
    #[serde(rename = "cvssMetricV30", default)]
    v30: Vec<CvssMetric>,
    #[serde(rename = "cvssMetricV2", default)]
    v2: Vec<CvssMetric>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CvssMetric {
    #[serde(rename = "type")]
    metric_type: Option<String>,
    cvss_data: Option<CvssData>,
    exploitability_score: Option<f64>,
    impact_score: Option<f64>,
    /// v2 carries severity on the metric rather than in `cvssData`.
    base_severity: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CvssData {
    version: Option<String>,
    vector_string: Option<String>,
    base_score: Option<f64>,
    base_severity: Option<String>,
    attack_vector: Option<String>,
    attack_complexity: Option<String>,
    access_vector: Option<String>,
    access_complexity: Option<String>,
}

#[derive(Deserialize)]
struct Weakness {
    #[serde(default)]
    description: Vec<LangValue>,
}

#[derive(Deserialize)]
struct Reference {
    #[serde(default)]
    tags: Vec<String>,
}

/// NVD CVE API 2.0 item → base record, plus exploit-reference evidence when present.
pub fn normalize_nvd(raw: &Value) -> Result<Vec<NormalizedRecord>, Malformed> {
    let item: NvdItem = serde_json::from_value(raw.clone())
        .map_err(|e| Malformed::new("bad_shape", e.to_string()))?;
    let cve = item.cve.ok_or_else(|| Malformed::new("bad_shape", "missing 'cve' object"))?;

    let raw_id = cve.id.as_deref().unwrap_or_default();
    let id = VulnId::parse_cve(raw_id).map_err(|e| Malformed::new("bad_identifier", e.to_string()))?;

    let mut record = VulnerabilityRecord::bare(id.clone());
    record.published = cve.published.as_deref().map(parse_timestamp).transpose()?;
    record.last_modified = cve.last_modified.as_deref().map(parse_timestamp).transpose()?;
    record.description = cve
        .descriptions
        .iter()
        .find(|d| d.lang.as_deref() == Some("en"))
        .and_then(|d| d.value.clone());
    record.weakness = primary_weakness(&cve.weaknesses);
    record.reference_count = Some(cve.references.len() as u32);

    if let Some((version, metric)) = preferred_metric(&cve.metrics) {
        apply_metric(&mut record, version, metric)?;
    }

    let mut out = vec![NormalizedRecord::Vulnerability(record)];

    let exploit_refs = cve
        .references
        .iter()
        .filter(|r| r.tags.iter().any(|t| t.eq_ignore_ascii_case("exploit")))
        .count() as u32;
    if exploit_refs > 0 {
        out.push(NormalizedRecord::Evidence(ExploitationEvidence::exploit_references(id, exploit_refs)));
    }

    Ok(out)
}

/// Newest CVSS version wins; within a version the NVD `Primary` metric wins.
fn preferred_metric(metrics: &NvdMetrics) -> Option<(CvssVersion, &CvssMetric)> {
    [
        (CvssVersion::V31, metrics.v31.as_slice()),
        (CvssVersion::V30, metrics.v30.as_slice()),
        (CvssVersion::V2, metrics.v2.as_slice()),
    ]
    .into_iter()
    .find_map(|(version, list)| primary_or_first(list).map(|m| (version, m)))
}

fn primary_or_first(list: &[CvssMetric]) -> Option<&CvssMetric> {
    list.iter()
        .find(|m| m.metric_type.as_deref() == Some("Primary"))
        .or_else(|| list.first())
}

fn apply_metric(
    record: &mut VulnerabilityRecord,
    version: CvssVersion,
    metric: &CvssMetric,
) -> Result<(), Malformed> {
    let data = metric.cvss_data.as_ref();
    let version = data
        .and_then(|d| d.version.as_deref())
        .and_then(CvssVersion::parse)
        .unwrap_or(version);

    record.cvss_version = Some(version);
    record.base_score = check_range("base_score", data.and_then(|d| d.base_score), 10.0)?;
    record.exploitability_score =
        check_range("exploitability_score", metric.exploitability_score, version.max_exploitability())?;
    record.impact_score = check_range("impact_score", metric.impact_score, version.max_impact())?;
    record.vector_string = data.and_then(|d| d.vector_string.clone());
    record.base_severity = data
        .and_then(|d| d.base_severity.clone())
        .or_else(|| metric.base_severity.clone())
        .map(|s| s.to_ascii_uppercase());
    record.attack_vector = data
        .and_then(|d| d.attack_vector.clone().or_else(|| d.access_vector.clone()))
        .map(|s| s.to_ascii_uppercase());
    record.attack_complexity = data
        .and_then(|d| d.attack_complexity.clone().or_else(|| d.access_complexity.clone()))
        .map(|s| s.to_ascii_uppercase());
    Ok(())
}

/// First concrete CWE. NVD placeholders carry no category and count as unknown.
fn primary_weakness(weaknesses: &[Weakness]) -> Option<String> {
    weaknesses
        .iter()
        .flat_map(|w| w.description.iter())
        .filter_map(|d| d.value.as_deref())
        .map(str::trim)
        .find(|v| v.starts_with("CWE-"))
        .map(str::to_string)
}
