mod catalog;
mod config;
mod cover;
mod normalize;
mod reconcile;
mod report;
mod resolve;
mod spotify;


use anyhow::Result;
use rand::Rng;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::{SyncError, SyncResult};

use self::catalog::{
    annotate_entries, derive_playlist_name, parse_bands, playlist_url, read_document,
    upsert_playlist_link, write_document,
};
use self::config::RunConfig;
use self::cover::upload_cover_best_effort;
use self::reconcile::{ReconcileSettings, Reconciliation, reconcile};
use self::resolve::{EntryReport, Resolution, ResolveSettings, resolve_entries};
use self::spotify::{CatalogApi, SpotifyClient};

pub fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::from_cli(&cli)?;
    let api = SpotifyClient::new(&config.api_base, &config.access_token, config.retry.clone());

    let outcome = sync(&api, &config, &mut rand::thread_rng(), report::print_progress)?;
    report::print_outcome(&outcome, &config);
    Ok(())
}

#[derive(Debug, Clone)]
pub(crate) struct RunOutcome {
    pub(crate) playlist_name: String,
    pub(crate) resolution: Resolution,
    pub(crate) reconciliation: Option<Reconciliation>,
    pub(crate) playlist_url: Option<String>,
}

impl RunConfig {
    fn resolve_settings(&self) -> ResolveSettings {
        ResolveSettings {
            market: self.market.clone(),
            search_limit: self.search_limit,
            track_limit: self.track_limit,
        }
    }

    fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            chunk_size: self.chunk_size,
            force_recreate: self.force_recreate,
            description: self.description.clone(),
        }
    }
}

/// The document is read once and written once, also when the run aborts after
/// resolution.
pub(crate) fn sync<A, R, F>(
    api: &A,
    config: &RunConfig,
    rng: &mut R,
    on_entry: F,
) -> SyncResult<RunOutcome>
where
    A: CatalogApi + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(usize, usize, &EntryReport),
{
    let text = read_document(&config.bands_file)?;
    let playlist_name = config.playlist_name.clone().unwrap_or_else(|| {
        derive_playlist_name(&text, &config.bands_file, &config.name_suffix)
    });
    let entries = parse_bands(&text, &config.hints);
    info!(entries = entries.len(), playlist = %playlist_name, "parsed band list");

    let mut resolution = resolve_entries(api, &entries, &config.resolve_settings(), on_entry);
    if config.shuffle {
        resolution.tracks.shuffle(rng);
    }

    if config.dry_run {
        return Ok(RunOutcome {
            playlist_name,
            resolution,
            reconciliation: None,
            playlist_url: None,
        });
    }

    let annotated = annotate_entries(&text, &resolution.statuses(), &config.hints);
    let reconciled = if resolution.tracks.is_empty() {
        Err(SyncError::EmptyResultSet)
    } else {
        api.current_user_id()
            .map_err(SyncError::from)
            .and_then(|user_id| {
                reconcile(
                    api,
                    &user_id,
                    &playlist_name,
                    &resolution.tracks,
                    &config.reconcile_settings(),
                )
            })
    };

    let reconciliation = match reconciled {
        Ok(reconciliation) => reconciliation,
        Err(err) => {
            write_document(&config.bands_file, &annotated)?;
            return Err(err);
        }
    };

    info!(
        playlist_id = %reconciliation.playlist.id,
        owner = %reconciliation.playlist.owner_id,
        playlist_tracks = reconciliation.playlist.track_uris.len(),
        action = ?reconciliation.action,
        "playlist reconciled"
    );
    if let Some(cover) = &config.cover_image {
        upload_cover_best_effort(api, &reconciliation.playlist.id, cover);
    }

    let url = playlist_url(&reconciliation.playlist.id);
    if let Err(err) = write_document(&config.bands_file, &upsert_playlist_link(&annotated, &url)) {
        warn!(%url, "playlist is up to date but the document could not be written");
        return Err(err);
    }

    Ok(RunOutcome {
        playlist_name,
        resolution,
        reconciliation: Some(reconciliation),
        playlist_url: Some(url),
    })
}
