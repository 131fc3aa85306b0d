//! Run configuration.
//!
//! Values come from an optional TOML file and from command-line / environment
//! overrides. Both are parsed into [`FileConfig`] and merged once into an
//! immutable [`SyncConfig`] that is passed into every component.

use crate::error::{SyncError, SyncResult};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Directory names skipped unless the operator configures a different list.
pub const DEFAULT_EXCLUSION_PATTERNS: &[&str] = &[
    ".@__*",
    ".dtrash",
    "@Recycle",
    ".DStore",
    "darktable-presets",
    ".thumbnails",
    ".Trash",
];

/// One configuration layer. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `host:port` of the server, or a full base URL.
    pub host: Option<String>,
    /// `http` unless set. Ignored when `host` already carries a scheme.
    pub scheme: Option<String>,
    pub library_root: Option<PathBuf>,
    pub api_key: Option<String>,
    pub exclusion_patterns: Option<Vec<String>>,
}

impl FileConfig {
    pub fn from_toml_str(s: &str) -> SyncResult<Self> {
        toml::from_str(s).map_err(|e| SyncError::Config(format!("invalid TOML: {e}")))
    }

    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: FileConfig) -> FileConfig {
        FileConfig {
            host: overrides.host.or(self.host),
            scheme: overrides.scheme.or(self.scheme),
            library_root: overrides.library_root.or(self.library_root),
            api_key: overrides.api_key.or(self.api_key),
            exclusion_patterns: overrides.exclusion_patterns.or(self.exclusion_patterns),
        }
    }
}

/// API key wrapper that keeps the secret out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: Url,
    pub library_root: PathBuf,
    pub api_key: ApiKey,
    pub exclusion_patterns: Vec<String>,
}

impl SyncConfig {
    pub fn from_layers(layers: FileConfig) -> SyncResult<Self> {
        let host = non_empty(layers.host, "host")?;
        let api_key = non_empty(layers.api_key, "api_key")?;
        let library_root = layers
            .library_root
            .ok_or_else(|| SyncError::Config("missing required setting `library_root`".into()))?;
        if !library_root.is_absolute() {
            return Err(SyncError::Config(format!(
                "library_root must be absolute, got {}",
                library_root.display()
            )));
        }

        let scheme = layers.scheme.unwrap_or_else(|| "http".to_string());
        let base_url = parse_base_url(&host, &scheme)?;

        let exclusion_patterns = layers.exclusion_patterns.unwrap_or_else(|| {
            DEFAULT_EXCLUSION_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect()
        });

        Ok(Self {
            base_url,
            library_root,
            api_key: ApiKey(api_key),
            exclusion_patterns,
        })
    }
}

fn non_empty(value: Option<String>, key: &str) -> SyncResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SyncError::Config(format!("missing required setting `{key}`")))
}

fn parse_base_url(host: &str, scheme: &str) -> SyncResult<Url> {
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("{scheme}://{host}")
    };
    let url = Url::parse(&raw).map_err(|e| SyncError::Config(format!("invalid host {host:?}: {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(SyncError::Config(format!("invalid host {host:?}")));
    }
    Ok(url)
}
