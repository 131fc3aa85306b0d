//! Candidate resolution, sync orchestration, run reporting, and output sinks.

pub mod exclusion;
pub mod orchestrator;
pub mod reporter;
pub mod resolver;
pub mod sink;

pub use exclusion::ExclusionSet;
pub use orchestrator::{CandidateOutcome, CandidateReport, Orchestrator, SyncOptions, SyncReport};
pub use resolver::{resolve_candidates, scan_library, ScanOutcome};

use albumsync_core::{LibraryRoot, SyncConfig, SyncResult};
use albumsync_provider::RemoteGateway;

/// Full pipeline for one run: open root -> scan -> sync.
///
/// Returns `Err` only for fatal errors (bad root, bad patterns); remote
/// failures are inside the returned [`SyncReport`].
pub async fn sync_library<G: RemoteGateway + ?Sized>(
    config: &SyncConfig,
    gateway: &G,
    options: SyncOptions,
) -> SyncResult<(ScanOutcome, SyncReport)> {
    let root = LibraryRoot::open(&config.library_root)?;
    let exclusions = ExclusionSet::new(config.exclusion_patterns.iter().cloned())?;

    let scan = scan_library(&root, &exclusions)?;
    let report = Orchestrator::new(gateway, options).run(&scan.candidates).await;

    Ok((scan, report))
}
