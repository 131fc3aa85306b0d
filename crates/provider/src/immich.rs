//! Gateway backed by the Immich HTTP API.

use crate::error::{GatewayError, GatewayResult};
use crate::RemoteGateway;
use albumsync_core::{AssetId, RemoteAlbum, SyncConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

/// Talks to an Immich server with a static API key.
///
/// ```ignore
/// let gateway = ImmichGateway::new(&config)?;
/// let ids = gateway.fetch_assets_for_path(Path::new("/mnt/photos/2024/Rome")).await?;
/// ```
pub struct ImmichGateway {
    client: reqwest::Client,
    base_url: Url,
}

/// Entry of `GET /api/view/folder`. Only the ID is read.
#[derive(Debug, Deserialize)]
struct FolderAsset {
    id: AssetId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAlbumRequest<'a> {
    album_name: &'a str,
    asset_ids: &'a [AssetId],
    description: &'a str,
}

impl ImmichGateway {
    pub fn new(config: &SyncConfig) -> GatewayResult<Self> {
        let mut key = HeaderValue::from_str(config.api_key.expose())
            .map_err(|_| GatewayError::InvalidInput("API key is not a valid header value".into()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Use a pre-built client. The client must already send the API key.
    pub fn with_client(client: reqwest::Client, mut base_url: Url) -> Self {
        // `Url::join` replaces the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// All albums visible to the API key.
    pub async fn list_albums(&self) -> GatewayResult<Vec<RemoteAlbum>> {
        let url = self.endpoint("api/albums")?;
        tracing::debug!(url = %url, "listing albums");
        let resp = self.client.get(url).send().await?;
        decode(resp).await
    }
}

#[async_trait]
impl RemoteGateway for ImmichGateway {
    async fn fetch_assets_for_path(&self, path: &Path) -> GatewayResult<Vec<AssetId>> {
        let path_str = path.to_str().ok_or_else(|| {
            GatewayError::InvalidInput(format!("path {} is not valid UTF-8", path.display()))
        })?;

        let url = self.endpoint("api/view/folder")?;
        tracing::debug!(url = %url, path = path_str, "fetching folder assets");

        let resp = self
            .client
            .get(url)
            .query(&[("path", path_str)])
            .send()
            .await?;
        let assets: Vec<FolderAsset> = decode(resp).await?;

        Ok(assets.into_iter().map(|a| a.id).collect())
    }

    async fn album_exists(&self, name: &str) -> GatewayResult<bool> {
        let albums = self.list_albums().await?;
        Ok(albums.iter().any(|a| a.name() == Some(name)))
    }

    async fn create_album(&self, name: &str, asset_ids: &[AssetId]) -> GatewayResult<()> {
        let url = self.endpoint("api/albums")?;
        let body = CreateAlbumRequest {
            album_name: name,
            asset_ids,
            description: "",
        };

        tracing::debug!(url = %url, album = name, assets = asset_ids.len(), "creating album");

        let resp = self.client.post(url).json(&body).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> GatewayResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GatewayError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> GatewayResult<T> {
    let resp = check_status(resp).await?;
    let text = resp.text().await?;
    Ok(serde_json::from_str(&text)?)
}
