//! Join of registry records and exploitation evidence into one labeled record
//! per identifier.
//!
//! Precedence is fixed: for the base record, the registry copy with the latest
//! `last_modified` wins and the other copies fill its gaps. For evidence,
//! `Catalog > Registry > Score`; only catalog evidence confirms exploitation.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{
    EvidenceOrigin, EvidenceSummary, ExploitationEvidence, Label, Likelihood, NormalizedRecord,
    ReconcileReport, ReconciledDataset, ReconciledRecord, VulnId, VulnerabilityRecord,
};

#[derive(Default)]
struct Contributions {
    registry: Vec<VulnerabilityRecord>,
    evidence: Vec<ExploitationEvidence>,
}

pub struct Reconciler;

impl Reconciler {
    /// Reconcile every normalized record into a dataset ordered by identifier.
    pub fn reconcile<I>(records: I, snapshot_at: DateTime<Utc>) -> ReconciledDataset
    where
        I: IntoIterator<Item = NormalizedRecord>,
    {
        let mut by_id: BTreeMap<VulnId, Contributions> = BTreeMap::new();
        let mut report = ReconcileReport::default();

        for record in records {
            match record {
                NormalizedRecord::Vulnerability(v) => {
                    report.registry_records += 1;
                    by_id.entry(v.id.clone()).or_default().registry.push(v);
                }
                NormalizedRecord::Evidence(e) => {
                    report.evidence_records += 1;
                    by_id.entry(e.id.clone()).or_default().evidence.push(e);
                }
            }
        }

        let mut out = Vec::with_capacity(by_id.len());
        for (_, contributions) in by_id {
            let Contributions { registry, evidence } = contributions;
            if registry.is_empty() {
                report.orphaned_evidence_ids += 1;
                continue;
            }
            report.duplicate_registry_records += registry.len() - 1;

            let vulnerability = merge_registry(registry);
            let evidence = summarize_evidence(evidence);
            let label = if evidence.confirmed_exploited {
                report.positives += 1;
                Label::Exploited
            } else {
                report.negatives += 1;
                Label::NotObserved
            };
            out.push(ReconciledRecord { vulnerability, evidence, label });
        }

        info!(
            records = out.len(),
            positives = report.positives,
            negatives = report.negatives,
            duplicates = report.duplicate_registry_records,
            orphaned = report.orphaned_evidence_ids,
            "Reconciled dataset"
        );

        ReconciledDataset { snapshot_at, records: out, report }
    }
}

/// Latest `last_modified` wins (unknown is oldest, ties go to the first seen).
fn merge_registry(copies: Vec<VulnerabilityRecord>) -> VulnerabilityRecord {
    let mut winner_idx = 0;
    for (i, copy) in copies.iter().enumerate().skip(1) {
        if copy.last_modified > copies[winner_idx].last_modified {
            winner_idx = i;
        }
    }

    let mut copies = copies;
    let mut winner = copies.swap_remove(winner_idx);
    for other in &copies {
        winner.fill_gaps_from(other);
    }
    winner
}

fn summarize_evidence(mut evidence: Vec<ExploitationEvidence>) -> EvidenceSummary {
    evidence.sort_by_key(|e| e.origin.rank());

    let catalog: Vec<&ExploitationEvidence> = evidence
        .iter()
        .filter(|e| e.origin == EvidenceOrigin::Catalog)
        .collect();

    let mut origins: Vec<String> = Vec::new();
    for e in &evidence {
        let name = e.origin.as_str();
        if !origins.iter().any(|o| o == name) {
            origins.push(name.to_string());
        }
    }

    EvidenceSummary {
        confirmed_exploited: !catalog.is_empty(),
        evidence_count: evidence.iter().find_map(|e| e.evidence_count),
        likelihood: evidence.iter().filter_map(|e| e.likelihood).reduce(newer_likelihood),
        catalog_date_added: catalog.iter().filter_map(|e| e.date_added).min(),
        known_ransomware_use: catalog.iter().filter_map(|e| e.known_ransomware_use).reduce(|a, b| a || b),
        origins,
    }
}

fn newer_likelihood(a: Likelihood, b: Likelihood) -> Likelihood {
    match b.as_of.cmp(&a.as_of) {
        Ordering::Greater => b,
        Ordering::Less => a,
        Ordering::Equal if b.score.total_cmp(&a.score) == Ordering::Greater => b,
        Ordering::Equal => a,
    }
}
