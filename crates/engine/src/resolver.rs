//! Album candidate resolution from a two-level library tree.
//!
//! Level-1 directories are immediate children of the library root, level-2
//! directories their children. The rules:
//!
//!   1. An excluded level-1 directory drops its whole subtree.
//!   2. A level-1 directory with subdirectories is only a container; each
//!      level-2 directory becomes a candidate.
//!   3. A level-1 directory without subdirectories is itself a candidate.
//!   4. Every candidate is then filtered by name once more, which catches
//!      excluded level-2 names under a kept parent.
//!
//! A level-1 directory whose subdirectories are all excluded produces no
//! candidate; it does not fall back to rule 3.

use crate::exclusion::ExclusionSet;
use albumsync_core::{AlbumCandidate, LibraryRoot, SyncError, SyncResult};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of scanning the library root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    /// Sorted by path.
    pub candidates: Vec<AlbumCandidate>,
    /// Directories dropped by an exclusion pattern (level-1 subtrees and
    /// individual candidates).
    pub excluded: Vec<PathBuf>,
    /// Directories that could not be listed and were skipped.
    pub unreadable: Vec<PathBuf>,
}

/// A directory entry that resolved to a directory (symlinks followed).
#[derive(Debug)]
struct DirEntry {
    name: String,
    path: PathBuf,
}

/// Candidates for `root`, sorted by path.
pub fn resolve_candidates(
    root: &LibraryRoot,
    exclusions: &ExclusionSet,
) -> SyncResult<Vec<AlbumCandidate>> {
    scan_library(root, exclusions).map(|scan| scan.candidates)
}

/// Walk `root` to depth 2 and classify every directory.
///
/// Only a failure to list `root` itself is an error; unreadable
/// subdirectories are logged and recorded in [`ScanOutcome::unreadable`].
pub fn scan_library(root: &LibraryRoot, exclusions: &ExclusionSet) -> SyncResult<ScanOutcome> {
    scan_with(root, exclusions, list_dirs)
}

fn scan_with<L>(
    root: &LibraryRoot,
    exclusions: &ExclusionSet,
    mut list: L,
) -> SyncResult<ScanOutcome>
where
    L: FnMut(&Path) -> io::Result<Vec<DirEntry>>,
{
    tracing::info!(root = %root, patterns = exclusions.len(), "scanning for directories");

    let level1 = list(root.path()).map_err(|source| SyncError::LibraryRoot {
        path: root.path().to_path_buf(),
        source,
    })?;

    let mut scan = ScanOutcome::default();
    let mut found = Vec::new();

    for l1 in level1 {
        if let Some(pattern) = exclusions.matching_pattern(&l1.name) {
            tracing::info!(
                dir = %l1.name,
                pattern,
                "excluding level 1 directory and its contents"
            );
            scan.excluded.push(l1.path);
            continue;
        }

        let level2 = match list(&l1.path) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!(path = %l1.path.display(), error = %e, "could not scan sub-directory");
                scan.unreadable.push(l1.path);
                continue;
            }
        };

        if level2.is_empty() {
            tracing::info!(
                dir = %l1.name,
                "level 1 directory has no subdirectories, treating it as an album"
            );
            found.push(l1);
        } else {
            found.extend(level2);
        }
    }

    for dir in found {
        if let Some(pattern) = exclusions.matching_pattern(&dir.name) {
            tracing::debug!(path = %dir.path.display(), pattern, "excluding candidate");
            scan.excluded.push(dir.path);
            continue;
        }
        scan.candidates.push(AlbumCandidate::new(dir.name, dir.path));
    }

    scan.candidates.sort_by(|a, b| a.path.cmp(&b.path));
    scan.excluded.sort();
    scan.unreadable.sort();

    tracing::info!(
        candidates = scan.candidates.len(),
        excluded = scan.excluded.len(),
        unreadable = scan.unreadable.len(),
        "scan complete"
    );
    Ok(scan)
}

/// Immediate child directories of `dir`, sorted by name.
///
/// Symlinks are followed, so a link to a directory counts as one. Entries
/// that cannot be inspected or whose names are not UTF-8 are skipped.
fn list_dirs(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut dirs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        // `metadata` follows symlinks; a dangling link is simply not a directory.
        let is_dir = fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => dirs.push(DirEntry { name, path }),
            Err(raw) => {
                tracing::warn!(path = %path.display(), name = ?raw, "skipping directory with non UTF-8 name");
            }
        }
    }

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(dirs)
}
