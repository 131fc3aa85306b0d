//! Domain types for the albumsync pipeline.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Library root
// ---------------------------------------------------------------------------

/// Absolute path of the local library, checked once at start-up.
///
/// Construction fails unless the path is absolute, exists, and is a
/// directory, so a run never produces candidates from a bad root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRoot(PathBuf);

impl LibraryRoot {
    pub fn open(path: impl Into<PathBuf>) -> SyncResult<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(SyncError::InvalidInput(format!(
                "library root {} must be an absolute path",
                path.display()
            )));
        }

        let meta = std::fs::metadata(&path).map_err(|source| SyncError::LibraryRoot {
            path: path.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(SyncError::LibraryRoot {
                path,
                source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
            });
        }

        Ok(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for LibraryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// A directory selected to become (or match) a remote album.
///
/// `name` is the album's display name; `path` is the absolute directory
/// used for the asset lookup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlbumCandidate {
    pub name: String,
    pub path: PathBuf,
}

impl AlbumCandidate {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Remote records
// ---------------------------------------------------------------------------

/// Opaque asset identifier issued by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Album as listed by the remote service. Only the name is used; an entry
/// without one still decodes and simply never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAlbum {
    #[serde(rename = "albumName", default)]
    pub album_name: Option<String>,
}

impl RemoteAlbum {
    pub fn name(&self) -> Option<&str> {
        self.album_name.as_deref()
    }
}
