//! Human-readable run summary.
//!
//! Renders a [`SyncReport`] (plus the scan that fed it) as a boxed table
//! followed by the candidates that need attention.

use crate::orchestrator::{CandidateOutcome, SyncReport};
use crate::resolver::ScanOutcome;

impl SyncReport {
    /// Render the report as a formatted string.
    pub fn render(&self, scan: &ScanOutcome) -> String {
        let mut out = String::new();

        let title = if self.dry_run {
            "ALBUMSYNC REPORT (DRY RUN)"
        } else {
            "ALBUMSYNC REPORT"
        };

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        line(&mut out, title);
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        row(&mut out, "Candidates:", self.total());
        row(&mut out, "Excluded dirs:", scan.excluded.len());
        row(&mut out, "Unreadable dirs:", scan.unreadable.len());
        if self.dry_run {
            row(&mut out, "Would create:", self.would_create());
        } else {
            row(&mut out, "Created:", self.created());
        }
        row(&mut out, "Already exist:", self.already_exists());
        row(&mut out, "Empty folders:", self.empty());
        row(&mut out, "With failures:", self.failed());
        out.push_str(&format!(
            "║  {:<20}{:>38}  ║\n",
            "Elapsed:",
            format!("{:?}", self.elapsed)
        ));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        let attention: Vec<_> = self
            .candidates
            .iter()
            .filter(|c| c.has_failure())
            .collect();

        if attention.is_empty() && scan.unreadable.is_empty() {
            line(&mut out, "No failures.");
        } else {
            line(&mut out, "NEEDS ATTENTION");
            out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

            for (i, c) in attention.iter().enumerate() {
                let what = match (&c.outcome, c.fetch_failed, c.check_failed) {
                    (CandidateOutcome::CreateFailed { reason }, _, _) => {
                        format!("create failed: {reason}")
                    }
                    (_, true, _) => "asset lookup failed, treated as empty".to_string(),
                    (_, _, true) => "existence check failed, assumed missing".to_string(),
                    _ => "unknown".to_string(),
                };
                line(
                    &mut out,
                    &format!("{}. {} ({})", i + 1, c.candidate.name, c.candidate.path.display()),
                );
                line(&mut out, &format!("   {what}"));
            }

            for path in &scan.unreadable {
                line(&mut out, &format!("- unreadable: {}", path.display()));
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}

const INNER_WIDTH: usize = 60;

fn row(out: &mut String, label: &str, value: usize) {
    out.push_str(&format!("║  {:<20}{:>38}  ║\n", label, value));
}

/// Left-aligned text inside the box. Text wider than the box is cut with `…`.
fn line(out: &mut String, text: &str) {
    let text = if text.chars().count() > INNER_WIDTH {
        let mut cut: String = text.chars().take(INNER_WIDTH - 1).collect();
        cut.push('…');
        cut
    } else {
        text.to_string()
    };
    out.push_str(&format!("║  {:<width$}║\n", text, width = INNER_WIDTH));
}
