//! Remote gateway abstraction and the Immich HTTP implementation.

pub mod error;
pub mod immich;

use albumsync_core::AssetId;
use async_trait::async_trait;
use std::path::Path;

pub use error::{GatewayError, GatewayResult};
pub use immich::ImmichGateway;

/// The three remote operations the sync needs.
///
/// Every call is an independent request with no shared session state.
/// Failures come back as [`GatewayError`]; callers decide how to degrade.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Asset IDs the service has indexed under `path`.
    async fn fetch_assets_for_path(&self, path: &Path) -> GatewayResult<Vec<AssetId>>;

    /// Whether an album with exactly this name (case-sensitive) exists.
    async fn album_exists(&self, name: &str) -> GatewayResult<bool>;

    /// Create an album holding `asset_ids`, with an empty description.
    async fn create_album(&self, name: &str, asset_ids: &[AssetId]) -> GatewayResult<()>;
}
