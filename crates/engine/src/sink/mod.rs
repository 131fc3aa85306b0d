//! Machine-readable output of a sync run.
//!
//! Two row schemas:
//! - [`OutcomeRow`] — one per candidate, in processing order
//! - [`RunSummaryRow`] — one per run, written last
//!
//! Backend: NDJSON stream to any `Write` impl (stdout or a file).

pub mod json_stream;

use serde::Serialize;

use crate::orchestrator::{CandidateOutcome, SyncReport};
use crate::resolver::ScanOutcome;

// ---------------------------------------------------------------------------
// Serializable row types
// ---------------------------------------------------------------------------

/// One row per candidate — fully denormalized.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRow {
    pub row_type: &'static str,
    pub album: String,
    pub path: String,
    /// `empty`, `already_exists`, `dry_run`, `created`, `create_failed`.
    pub outcome: &'static str,
    pub asset_count: usize,
    pub fetch_failed: bool,
    pub check_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One row per run — summary counters.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryRow {
    pub row_type: &'static str,
    pub dry_run: bool,
    pub candidates: usize,
    pub excluded_dirs: usize,
    pub unreadable_dirs: usize,
    pub created: usize,
    pub would_create: usize,
    pub already_exists: usize,
    pub empty: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl CandidateOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CandidateOutcome::Empty => "empty",
            CandidateOutcome::AlreadyExists => "already_exists",
            CandidateOutcome::DryRun => "dry_run",
            CandidateOutcome::Created => "created",
            CandidateOutcome::CreateFailed { .. } => "create_failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Builder: Report → Rows
// ---------------------------------------------------------------------------

impl SyncReport {
    /// Flatten the report into sink-ready rows.
    pub fn to_rows(&self, scan: &ScanOutcome) -> (RunSummaryRow, Vec<OutcomeRow>) {
        let summary = RunSummaryRow {
            row_type: "summary",
            dry_run: self.dry_run,
            candidates: self.total(),
            excluded_dirs: scan.excluded.len(),
            unreadable_dirs: scan.unreadable.len(),
            created: self.created(),
            would_create: self.would_create(),
            already_exists: self.already_exists(),
            empty: self.empty(),
            failed: self.failed(),
            elapsed_ms: u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
        };

        let outcomes = self
            .candidates
            .iter()
            .map(|c| OutcomeRow {
                row_type: "candidate",
                album: c.candidate.name.clone(),
                path: c.candidate.path.display().to_string(),
                outcome: c.outcome.label(),
                asset_count: c.asset_count,
                fetch_failed: c.fetch_failed,
                check_failed: c.check_failed,
                error: match &c.outcome {
                    CandidateOutcome::CreateFailed { reason } => Some(reason.clone()),
                    _ => None,
                },
            })
            .collect();

        (summary, outcomes)
    }
}
