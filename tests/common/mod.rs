#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use vulnforecast::config::{FeatureConfig, TrainingConfig};
use vulnforecast::features::FeatureInput;
use vulnforecast::model::{ModelArtifact, Trainer};
use vulnforecast::models::{
    CvssVersion, ExploitationEvidence, Likelihood, NormalizedRecord, ReconciledDataset, VulnId,
    VulnerabilityRecord,
};
use vulnforecast::reconcile::Reconciler;

pub fn snapshot() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

const RISKY: &str = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H";
const TAME: &str = "CVSS:3.1/AV:L/AC:H/PR:H/UI:R/S:U/C:L/I:N/A:N";

/// Every third identifier is in the catalog and looks dangerous; the rest do not.
pub fn synthetic_dataset(n: usize) -> ReconciledDataset {
    let mut records = Vec::new();
    for i in 0..n {
        let id = VulnId::parse_cve(&format!("CVE-2023-{:05}", i + 1)).unwrap();
        let exploited = i % 3 == 0;
        let jitter = (i % 7) as f64 / 10.0;

        let mut v = VulnerabilityRecord::bare(id.clone());
        v.cvss_version = Some(CvssVersion::V31);
        v.published = Some(snapshot() - Duration::days(30 + i as i64));
        v.last_modified = Some(snapshot() - Duration::days(5));
        v.weakness = Some(if i % 2 == 0 { "CWE-79" } else { "CWE-89" }.into());
        if exploited {
            v.vector_string = Some(RISKY.into());
            v.base_score = Some(9.0 + jitter);
            v.exploitability_score = Some(3.9);
            v.impact_score = Some(5.9);
            v.base_severity = Some("CRITICAL".into());
        } else {
            v.vector_string = Some(TAME.into());
            v.base_score = Some(2.0 + jitter);
            v.exploitability_score = Some(0.5);
            v.impact_score = Some(1.4);
            v.base_severity = Some("LOW".into());
        }
        records.push(NormalizedRecord::Vulnerability(v));

        records.push(NormalizedRecord::Evidence(ExploitationEvidence::score(
            id.clone(),
            Likelihood {
                score: if exploited { 0.7 + jitter / 10.0 } else { 0.01 + jitter / 100.0 },
                percentile: None,
                as_of: NaiveDate::from_ymd_opt(2024, 5, 31),
            },
        )));
        if exploited {
            records.push(NormalizedRecord::Evidence(ExploitationEvidence::catalog(id, None)));
        }
    }
    Reconciler::reconcile(records, snapshot())
}

pub fn trainer() -> Trainer {
    Trainer::new(TrainingConfig::default(), FeatureConfig::default())
}

pub fn trained_artifact() -> ModelArtifact {
    let (artifact, _) = trainer().fit_and_train(&synthetic_dataset(60), 42).unwrap();
    artifact
}

pub fn high_risk() -> FeatureInput {
    FeatureInput {
        vector_string: Some(RISKY.into()),
        base_score: Some(9.8),
        exploitability_score: Some(3.9),
        impact_score: Some(5.9),
        base_severity: Some("CRITICAL".into()),
        weakness: Some("CWE-79".into()),
        likelihood_score: Some(0.9),
        ..Default::default()
    }
}

pub fn low_risk() -> FeatureInput {
    FeatureInput {
        vector_string: Some(TAME.into()),
        base_score: Some(2.1),
        exploitability_score: Some(0.5),
        impact_score: Some(1.4),
        base_severity: Some("LOW".into()),
        likelihood_score: Some(0.01),
        ..Default::default()
    }
}
