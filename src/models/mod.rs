pub mod evidence;
pub mod identifier;
pub mod reconciled;
pub mod vulnerability;

pub use evidence::{EvidenceOrigin, ExploitationEvidence, Likelihood};
pub use identifier::VulnId;
pub use reconciled::{
    EvidenceSummary, Label, NormalizedRecord, ReconcileReport, ReconciledDataset, ReconciledRecord,
};
pub use vulnerability::{CvssVersion, VulnerabilityRecord};
