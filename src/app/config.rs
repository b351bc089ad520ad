use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::cli::Cli;
use crate::error::{SyncError, SyncResult};
use crate::http::RetryPolicy;
use crate::paths::resolve_path;

use super::catalog::Hints;

pub(crate) const MAX_SEARCH_LIMIT: usize = 50;
pub(crate) const MAX_CHUNK_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub(crate) struct RunConfig {
    pub(crate) bands_file: PathBuf,
    pub(crate) market: String,
    pub(crate) hints: Hints,
    pub(crate) track_limit: usize,
    pub(crate) search_limit: usize,
    pub(crate) chunk_size: usize,
    pub(crate) cover_image: Option<PathBuf>,
    pub(crate) description: String,
    pub(crate) playlist_name: Option<String>,
    pub(crate) name_suffix: String,
    pub(crate) shuffle: bool,
    pub(crate) dry_run: bool,
    pub(crate) force_recreate: bool,
    pub(crate) access_token: String,
    pub(crate) api_base: String,
    pub(crate) retry: RetryPolicy,
}

impl RunConfig {
    pub(crate) fn from_cli(cli: &Cli) -> SyncResult<Self> {
        let bands_raw = cli
            .bands_file
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| config_error("BANDS_FILE_PATH is required"))?;
        let bands_file = resolve_path(bands_raw);
        if !bands_file.exists() {
            return Err(SyncError::DocumentNotFound(bands_file));
        }

        let market = cli.market.trim().to_ascii_uppercase();
        if market.len() != 2 || !market.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(config_error(format!(
                "SPOTIFY_MARKET must be a two-letter country code, got: {}",
                cli.market
            )));
        }

        if cli.top_tracks == 0 {
            return Err(config_error("TOP_TRACKS_PER_ARTIST must be > 0"));
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&cli.search_limit) {
            return Err(config_error(format!(
                "SPOTIFY_SEARCH_LIMIT must be between 1 and {MAX_SEARCH_LIMIT}"
            )));
        }
        if !(1..=MAX_CHUNK_SIZE).contains(&cli.chunk_size) {
            return Err(config_error(format!(
                "SPOTIFY_ADD_CHUNK_SIZE must be between 1 and {MAX_CHUNK_SIZE}"
            )));
        }
        if cli.http_attempts == 0 {
            return Err(config_error("SPOTIFY_HTTP_ATTEMPTS must be > 0"));
        }
        if cli.http_timeout_secs == 0 {
            return Err(config_error("SPOTIFY_HTTP_TIMEOUT_SECS must be > 0"));
        }

        let cover_image = match cli.cover_image.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let path = resolve_path(raw);
                if !path.is_file() {
                    return Err(config_error(format!(
                        "cover image not found: {}",
                        path.display()
                    )));
                }
                Some(path)
            }
            _ => None,
        };

        let access_token = match cli
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            Some(token) => token.to_string(),
            None => read_cached_token(&resolve_path(&cli.token_cache))?.ok_or_else(|| {
                config_error(
                    "no access token: set SPOTIFY_ACCESS_TOKEN or provide a token cache with an access_token field",
                )
            })?,
        };

        Ok(Self {
            bands_file,
            market,
            hints: Hints::new(&cli.not_found_hint, &cli.skipped_hint),
            track_limit: cli.top_tracks,
            search_limit: cli.search_limit,
            chunk_size: cli.chunk_size,
            cover_image,
            description: cli.description.trim().to_string(),
            playlist_name: cli
                .playlist_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            name_suffix: cli.name_suffix.trim().to_string(),
            shuffle: cli.shuffle,
            dry_run: cli.dry_run,
            force_recreate: cli.force_recreate,
            access_token,
            api_base: cli.api_base.trim().trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(
                Duration::from_secs(cli.http_timeout_secs),
                cli.http_attempts,
            ),
        })
    }
}

fn config_error(message: impl Into<String>) -> SyncError {
    SyncError::Configuration(message.into())
}

pub(crate) fn read_cached_token(path: &Path) -> SyncResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|err| {
        config_error(format!(
            "failed to read token cache {}: {err}",
            path.display()
        ))
    })?;
    let parsed: Value = serde_json::from_str(&raw).map_err(|err| {
        config_error(format!(
            "token cache {} is not valid JSON: {err}",
            path.display()
        ))
    })?;
    Ok(parsed
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string))
}
