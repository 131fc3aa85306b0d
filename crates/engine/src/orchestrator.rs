//! Sync state machine: drives candidates through the remote gateway.
//!
//! Per candidate, strictly in order:
//!
//! ```text
//! FETCH_ASSETS -> (empty? SKIP : CHECK_EXISTS) -> (exists? SKIP : CREATE_OR_DRY_RUN) -> DONE
//! ```
//!
//! Gateway failures never stop the run. A failed asset fetch counts as an
//! empty folder; a failed existence check counts as "does not exist"
//! (fail-open: a duplicate create attempt is preferred over silently
//! skipping an album); a failed create is recorded and the run moves on.

use albumsync_core::{AlbumCandidate, AssetId};
use albumsync_provider::RemoteGateway;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Perform reads and log intended actions, but never create albums.
    pub dry_run: bool,
}

/// Terminal state of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// No assets (or the lookup failed); nothing checked or created.
    Empty,
    /// An album with this name already exists remotely.
    AlreadyExists,
    /// Dry-run: the album would have been created.
    DryRun,
    Created,
    CreateFailed { reason: String },
}

/// What happened to one candidate, including any degraded gateway calls.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub candidate: AlbumCandidate,
    #[serde(flatten)]
    pub outcome: CandidateOutcome,
    pub asset_count: usize,
    /// The asset lookup failed and was treated as empty.
    pub fetch_failed: bool,
    /// The existence check failed and was treated as "does not exist".
    pub check_failed: bool,
}

impl CandidateReport {
    /// Any gateway call for this candidate failed.
    pub fn has_failure(&self) -> bool {
        self.fetch_failed
            || self.check_failed
            || matches!(self.outcome, CandidateOutcome::CreateFailed { .. })
    }
}

/// Per-run result, one entry per candidate in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub candidates: Vec<CandidateReport>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    pub fn count(&self, pred: impl Fn(&CandidateOutcome) -> bool) -> usize {
        self.candidates.iter().filter(|c| pred(&c.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, CandidateOutcome::Created))
    }

    pub fn would_create(&self) -> usize {
        self.count(|o| matches!(o, CandidateOutcome::DryRun))
    }

    pub fn already_exists(&self) -> usize {
        self.count(|o| matches!(o, CandidateOutcome::AlreadyExists))
    }

    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, CandidateOutcome::Empty))
    }

    /// Candidates with at least one failed gateway call.
    pub fn failed(&self) -> usize {
        self.candidates.iter().filter(|c| c.has_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.candidates.iter().any(CandidateReport::has_failure)
    }
}

/// Runs candidates one at a time against a [`RemoteGateway`].
pub struct Orchestrator<'a, G: RemoteGateway + ?Sized> {
    gateway: &'a G,
    options: SyncOptions,
}

impl<'a, G: RemoteGateway + ?Sized> Orchestrator<'a, G> {
    pub fn new(gateway: &'a G, options: SyncOptions) -> Self {
        Self { gateway, options }
    }

    pub async fn run(&self, candidates: &[AlbumCandidate]) -> SyncReport {
        let t0 = Instant::now();
        let total = candidates.len();

        tracing::info!(candidates = total, dry_run = self.options.dry_run, "starting sync");

        let mut report = SyncReport {
            dry_run: self.options.dry_run,
            candidates: Vec::with_capacity(total),
            elapsed: Duration::ZERO,
        };

        for (idx, candidate) in candidates.iter().enumerate() {
            tracing::debug!(
                idx = idx + 1,
                total,
                path = %candidate.path.display(),
                "processing folder"
            );
            report.candidates.push(self.sync_one(candidate).await);
        }

        report.elapsed = t0.elapsed();
        tracing::info!(
            created = report.created(),
            would_create = report.would_create(),
            already_exists = report.already_exists(),
            empty = report.empty(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis(),
            "sync complete"
        );
        report
    }

    async fn sync_one(&self, candidate: &AlbumCandidate) -> CandidateReport {
        let mut report = CandidateReport {
            candidate: candidate.clone(),
            outcome: CandidateOutcome::Empty,
            asset_count: 0,
            fetch_failed: false,
            check_failed: false,
        };

        let asset_ids: Vec<AssetId> = match self.gateway.fetch_assets_for_path(&candidate.path).await
        {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(path = %candidate.path.display(), error = %e, "failed to get assets");
                report.fetch_failed = true;
                Vec::new()
            }
        };
        report.asset_count = asset_ids.len();

        if asset_ids.is_empty() {
            tracing::warn!(path = %candidate.path.display(), "no assets found");
            return report;
        }

        let exists = match self.gateway.album_exists(&candidate.name).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::error!(
                    album = %candidate.name,
                    error = %e,
                    "failed to check existing albums, assuming album does not exist"
                );
                report.check_failed = true;
                false
            }
        };

        if exists {
            tracing::info!(album = %candidate.name, "album already exists");
            report.outcome = CandidateOutcome::AlreadyExists;
            return report;
        }

        if self.options.dry_run {
            tracing::info!(
                album = %candidate.name,
                assets = asset_ids.len(),
                "[dry-run] simulated album creation"
            );
            report.outcome = CandidateOutcome::DryRun;
            return report;
        }

        report.outcome = match self.gateway.create_album(&candidate.name, &asset_ids).await {
            Ok(()) => {
                tracing::info!(album = %candidate.name, assets = asset_ids.len(), "album created");
                CandidateOutcome::Created
            }
            Err(e) => {
                tracing::error!(album = %candidate.name, error = %e, "failed to create album");
                CandidateOutcome::CreateFailed {
                    reason: e.to_string(),
                }
            }
        };
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albumsync_provider::{GatewayError, GatewayResult};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Fetch(PathBuf),
        Exists(String),
        Create(String, usize),
    }

    /// In-memory gateway that records every call.
    #[derive(Default)]
    struct FakeGateway {
        assets: HashMap<PathBuf, Vec<AssetId>>,
        albums: Mutex<HashSet<String>>,
        fail_fetch: HashSet<PathBuf>,
        fail_exists: bool,
        fail_create: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeGateway {
        fn with_assets(mut self, path: &str, n: usize) -> Self {
            let ids = (0..n).map(|i| AssetId(format!("{path}-{i}"))).collect();
            self.assets.insert(PathBuf::from(path), ids);
            self
        }

        fn with_album(self, name: &str) -> Self {
            self.albums.lock().unwrap().insert(name.to_string());
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn creates(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|c| matches!(c, Call::Create(..)))
                .collect()
        }

        fn unavailable() -> GatewayError {
            GatewayError::InvalidInput("service unavailable".into())
        }
    }

    #[async_trait]
    impl RemoteGateway for FakeGateway {
        async fn fetch_assets_for_path(&self, path: &Path) -> GatewayResult<Vec<AssetId>> {
            self.calls.lock().unwrap().push(Call::Fetch(path.to_path_buf()));
            if self.fail_fetch.contains(path) {
                return Err(Self::unavailable());
            }
            Ok(self.assets.get(path).cloned().unwrap_or_default())
        }

        async fn album_exists(&self, name: &str) -> GatewayResult<bool> {
            self.calls.lock().unwrap().push(Call::Exists(name.to_string()));
            if self.fail_exists {
                return Err(Self::unavailable());
            }
            Ok(self.albums.lock().unwrap().contains(name))
        }

        async fn create_album(&self, name: &str, asset_ids: &[AssetId]) -> GatewayResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(name.to_string(), asset_ids.len()));
            if self.fail_create {
                return Err(Self::unavailable());
            }
            self.albums.lock().unwrap().insert(name.to_string());
            Ok(())
        }
    }

    /// Formatted log lines written while the returned subscriber is the default.
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
            let sink = self.clone();
            tracing_subscriber::fmt()
                .with_writer(move || sink.clone())
                .with_ansi(false)
                .without_time()
                .with_target(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish()
        }

        fn lines_at(&self, level: &str) -> Vec<String> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .filter(|l| l.trim_start().starts_with(level))
                .map(str::to_string)
                .collect()
        }
    }

    fn candidates() -> Vec<AlbumCandidate> {
        vec![
            AlbumCandidate::new("A", "/lib/A"),
            AlbumCandidate::new("X", "/lib/B/X"),
            AlbumCandidate::new("Y", "/lib/B/Y"),
        ]
    }

    fn gateway() -> FakeGateway {
        FakeGateway::default()
            .with_assets("/lib/A", 3)
            .with_assets("/lib/B/X", 1)
    }

    #[tokio::test]
    async fn creates_album_with_all_assets() {
        let gw = gateway();
        let report = Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates()[..1])
            .await;

        assert_eq!(
            gw.calls(),
            vec![
                Call::Fetch("/lib/A".into()),
                Call::Exists("A".into()),
                Call::Create("A".into(), 3),
            ]
        );
        assert_eq!(report.candidates[0].outcome, CandidateOutcome::Created);
        assert_eq!(report.candidates[0].asset_count, 3);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn empty_folder_is_never_checked_or_created() {
        let gw = gateway();
        let report = Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates()[2..])
            .await;

        assert_eq!(gw.calls(), vec![Call::Fetch("/lib/B/Y".into())]);
        assert_eq!(report.candidates[0].outcome, CandidateOutcome::Empty);
        assert_eq!(report.empty(), 1);
    }

    #[tokio::test]
    async fn existing_album_is_skipped() {
        let gw = gateway().with_album("X");
        let report = Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates())
            .await;

        assert_eq!(gw.creates(), vec![Call::Create("A".into(), 3)]);
        assert_eq!(report.already_exists(), 1);
        assert_eq!(report.created(), 1);
    }

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let gw = gateway();
        let orchestrator = Orchestrator::new(&gw, SyncOptions::default());

        let first = orchestrator.run(&candidates()).await;
        let creates_after_first = gw.creates().len();
        let second = orchestrator.run(&candidates()).await;

        assert_eq!(first.created(), 2);
        assert_eq!(creates_after_first, 2);
        assert_eq!(gw.creates().len(), 2);
        assert_eq!(second.created(), 0);
        assert_eq!(second.already_exists(), 2);
    }

    #[tokio::test]
    async fn dry_run_reads_the_same_but_never_creates() {
        let live = gateway();
        Orchestrator::new(&live, SyncOptions { dry_run: false })
            .run(&candidates())
            .await;

        let dry = gateway();
        let report = Orchestrator::new(&dry, SyncOptions { dry_run: true })
            .run(&candidates())
            .await;

        let reads = |calls: Vec<Call>| -> Vec<Call> {
            calls
                .into_iter()
                .filter(|c| !matches!(c, Call::Create(..)))
                .collect()
        };
        assert_eq!(reads(live.calls()), reads(dry.calls()));
        assert!(dry.creates().is_empty());
        assert_eq!(report.would_create(), 2);
        assert!(report.dry_run);
    }

    #[tokio::test]
    async fn failed_fetch_degrades_to_empty_and_continues() {
        let mut gw = gateway();
        gw.fail_fetch.insert("/lib/A".into());

        let report = Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates())
            .await;

        assert_eq!(report.candidates[0].outcome, CandidateOutcome::Empty);
        assert!(report.candidates[0].fetch_failed);
        assert_eq!(gw.creates(), vec![Call::Create("X".into(), 1)]);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn failed_existence_check_fails_open() {
        let gw = FakeGateway {
            fail_exists: true,
            ..gateway()
        };

        let report = Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates()[..1])
            .await;

        assert_eq!(gw.creates(), vec![Call::Create("A".into(), 3)]);
        assert!(report.candidates[0].check_failed);
        assert_eq!(report.candidates[0].outcome, CandidateOutcome::Created);
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn failed_create_is_recorded_and_run_continues() {
        let gw = FakeGateway {
            fail_create: true,
            ..gateway()
        };

        let report = Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates())
            .await;

        assert_eq!(gw.creates().len(), 2);
        assert!(matches!(
            report.candidates[1].outcome,
            CandidateOutcome::CreateFailed { .. }
        ));
        assert_eq!(report.failed(), 2);
        assert_eq!(report.total(), 3);
    }

    #[tokio::test]
    async fn no_candidates_is_a_clean_run() {
        let gw = gateway();
        let report = Orchestrator::new(&gw, SyncOptions::default()).run(&[]).await;
        assert!(gw.calls().is_empty());
        assert_eq!(report.total(), 0);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn empty_folder_logs_exactly_one_warning() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let gw = gateway();
        Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates())
            .await;

        let warnings = logs.lines_at("WARN");
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("no assets found"));
        assert!(warnings[0].contains("/lib/B/Y"));
        assert!(logs.lines_at("ERROR").is_empty());
    }

    #[tokio::test]
    async fn outcomes_log_at_their_own_severity() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let gw = FakeGateway {
            fail_create: true,
            ..gateway().with_album("X")
        };
        Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates())
            .await;

        let errors = logs.lines_at("ERROR");
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains("failed to create album"));
        assert!(errors[0].contains("album=A"));

        let warnings = logs.lines_at("WARN");
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("/lib/B/Y"));

        let info = logs.lines_at("INFO");
        assert!(info
            .iter()
            .any(|l| l.contains("album already exists") && l.contains("album=X")));

        let progress: Vec<_> = logs
            .lines_at("DEBUG")
            .into_iter()
            .filter(|l| l.contains("processing folder"))
            .collect();
        assert_eq!(progress.len(), 3);
        assert!(progress[2].contains("idx=3") && progress[2].contains("total=3"));
    }

    #[tokio::test]
    async fn failed_fetch_logs_error_then_empty_warning() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let mut gw = gateway();
        gw.fail_fetch.insert("/lib/A".into());
        Orchestrator::new(&gw, SyncOptions::default())
            .run(&candidates()[..1])
            .await;

        let errors = logs.lines_at("ERROR");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("failed to get assets"));
        assert_eq!(logs.lines_at("WARN").len(), 1);
    }
}
