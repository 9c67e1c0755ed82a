use serde::Deserialize;
use serde_json::Value;

use crate::models::{ExploitationEvidence, NormalizedRecord, VulnId};
use super::parse_date;
use super::report::Malformed;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KevEntry {
    #[serde(rename = "cveID")]
    cve_id: Option<String>,
    date_added: Option<String>,
    known_ransomware_campaign_use: Option<String>,
}

/// Catalog entry → confirmed exploitation evidence.
pub fn normalize_kev(raw: &Value) -> Result<Vec<NormalizedRecord>, Malformed> {
    let entry: KevEntry = serde_json::from_value(raw.clone())
        .map_err(|e| Malformed::new("bad_shape", e.to_string()))?;
    let id = VulnId::parse_cve(entry.cve_id.as_deref().unwrap_or_default())
        .map_err(|e| Malformed::new("bad_identifier", e.to_string()))?;
    let date_added = entry.date_added.as_deref().map(parse_date).transpose()?;

    let mut evidence = ExploitationEvidence::catalog(id, date_added);
    evidence.known_ransomware_use = entry
        .known_ransomware_campaign_use
        .map(|v| v.trim().eq_ignore_ascii_case("known"));
    Ok(vec![NormalizedRecord::Evidence(evidence)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EvidenceOrigin;
    use serde_json::json;

    #[test]
    fn test_catalog_entry_is_confirmed() {
        let raw = json!({
            "cveID": "CVE-2023-4966",
            "vendorProject": "Citrix",
            "product": "NetScaler",
            "dateAdded": "2023-10-18",
            "knownRansomwareCampaignUse": "Known"
        });
        let out = normalize_kev(&raw).unwrap();
        let NormalizedRecord::Evidence(e) = &out[0] else { panic!() };
        assert_eq!(e.origin, EvidenceOrigin::Catalog);
        assert!(e.confirmed_exploited);
        assert_eq!(e.known_ransomware_use, Some(true));
        assert_eq!(e.date_added.unwrap().to_string(), "2023-10-18");
    }

    #[test]
    fn test_unknown_ransomware_use() {
        let raw = json!({"cveID": "CVE-2020-0001", "knownRansomwareCampaignUse": "Unknown"});
        let NormalizedRecord::Evidence(e) = &normalize_kev(&raw).unwrap()[0] else { panic!() };
        assert_eq!(e.known_ransomware_use, Some(false));
        assert_eq!(e.date_added, None);
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let raw = json!({"cveID": "CVE-2020-0001", "dateAdded": "Oct 18"});
        assert_eq!(normalize_kev(&raw).unwrap_err().reason, "bad_date");
    }
}
