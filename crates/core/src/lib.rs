//! Domain models, configuration, and error definitions.
//!
//! Foundation crate -- no async or network dependencies.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ApiKey, FileConfig, SyncConfig, DEFAULT_EXCLUSION_PATTERNS};
pub use error::{SyncError, SyncResult};
pub use types::{AlbumCandidate, AssetId, LibraryRoot, RemoteAlbum};
