use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};

use super::spotify::{CatalogApi, MAX_COVER_IMAGE_BYTES};

pub(crate) fn encode_cover(bytes: &[u8]) -> SyncResult<String> {
    if bytes.len() > MAX_COVER_IMAGE_BYTES {
        return Err(SyncError::CoverImage(format!(
            "image is {} KB, the limit is {} KB",
            bytes.len() / 1024,
            MAX_COVER_IMAGE_BYTES / 1024
        )));
    }
    Ok(STANDARD.encode(bytes))
}

pub(crate) fn upload_cover<A: CatalogApi + ?Sized>(
    api: &A,
    playlist_id: &str,
    path: &Path,
) -> SyncResult<()> {
    let bytes = fs::read(path).map_err(|err| {
        SyncError::CoverImage(format!("failed to read {}: {err}", path.display()))
    })?;
    let encoded = encode_cover(&bytes)?;
    api.upload_playlist_cover(playlist_id, &encoded)
        .map_err(|err| SyncError::CoverImage(format!("upload failed: {err}")))
}

pub(crate) fn upload_cover_best_effort<A: CatalogApi + ?Sized>(
    api: &A,
    playlist_id: &str,
    path: &Path,
) -> bool {
    match upload_cover(api, playlist_id, path) {
        Ok(()) => {
            info!(path = %path.display(), "uploaded cover image");
            true
        }
        Err(err) => {
            warn!("skipping cover image: {err}");
            false
        }
    }
}
