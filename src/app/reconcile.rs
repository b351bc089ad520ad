use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

use super::normalize::normalize_playlist_name;
use super::resolve::TrackSet;
use super::spotify::{
    ApiResult, CatalogApi, PLAYLIST_PAGE_SIZE, PlaylistSummary, TRACK_PAGE_SIZE,
};

pub(crate) const REPLACE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReconcileSettings {
    pub(crate) chunk_size: usize,
    pub(crate) force_recreate: bool,
    pub(crate) description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlaylistPlan {
    NoExistingPlaylist,
    ExistingUnchanged {
        playlist: PlaylistSummary,
        track_uris: Vec<String>,
    },
    ExistingNeedsUpdate(PlaylistSummary),
    ForceRecreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReconcileAction {
    Created,
    Updated,
    Unchanged,
    Recreated { removed: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaylistState {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) owner_id: String,
    pub(crate) track_uris: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reconciliation {
    pub(crate) action: ReconcileAction,
    pub(crate) playlist: PlaylistState,
}

pub(crate) fn find_playlist<A: CatalogApi + ?Sized>(
    api: &A,
    user_id: &str,
    name: &str,
) -> ApiResult<Option<PlaylistSummary>> {
    let target = normalize_playlist_name(name);
    let mut offset = 0;
    loop {
        let page = api.list_user_playlists(offset, PLAYLIST_PAGE_SIZE)?;
        if let Some(found) = page
            .playlists
            .into_iter()
            .find(|playlist| is_target(playlist, user_id, &target))
        {
            return Ok(Some(found));
        }
        if page.item_count < PLAYLIST_PAGE_SIZE {
            return Ok(None);
        }
        offset += PLAYLIST_PAGE_SIZE;
    }
}

fn is_target(playlist: &PlaylistSummary, user_id: &str, normalized_name: &str) -> bool {
    playlist.owner_id == user_id && normalize_playlist_name(&playlist.name) == normalized_name
}

pub(crate) fn fetch_track_uris<A: CatalogApi + ?Sized>(
    api: &A,
    playlist_id: &str,
) -> ApiResult<Vec<String>> {
    let mut uris = Vec::new();
    let mut offset = 0;
    loop {
        let page = api.list_playlist_tracks(playlist_id, offset, TRACK_PAGE_SIZE)?;
        uris.extend(page.uris);
        if page.item_count < TRACK_PAGE_SIZE {
            break;
        }
        offset += TRACK_PAGE_SIZE;
    }
    debug!(playlist_id, tracks = uris.len(), "fetched existing tracks");
    Ok(uris)
}

/// Unfollows every same-named playlist the user owns. Scans repeat until a
/// full pass finds nothing new, since removals shift later pages.
pub(crate) fn remove_same_named<A: CatalogApi + ?Sized>(
    api: &A,
    user_id: &str,
    name: &str,
) -> ApiResult<usize> {
    let target = normalize_playlist_name(name);
    let mut removed = HashSet::new();

    loop {
        let mut found_in_pass = false;
        let mut offset = 0;
        loop {
            let page = api.list_user_playlists(offset, PLAYLIST_PAGE_SIZE)?;
            for playlist in &page.playlists {
                if is_target(playlist, user_id, &target) && !removed.contains(&playlist.id) {
                    api.unfollow_playlist(&playlist.id)?;
                    info!(playlist_id = %playlist.id, name = %playlist.name, "removed playlist");
                    removed.insert(playlist.id.clone());
                    found_in_pass = true;
                }
            }
            if page.item_count < PLAYLIST_PAGE_SIZE {
                break;
            }
            offset += PLAYLIST_PAGE_SIZE;
        }
        if !found_in_pass {
            break;
        }
    }

    Ok(removed.len())
}

pub(crate) fn plan<A: CatalogApi + ?Sized>(
    api: &A,
    user_id: &str,
    name: &str,
    desired: &TrackSet,
    force_recreate: bool,
) -> ApiResult<PlaylistPlan> {
    let Some(existing) = find_playlist(api, user_id, name)? else {
        return Ok(PlaylistPlan::NoExistingPlaylist);
    };
    if force_recreate {
        return Ok(PlaylistPlan::ForceRecreate);
    }

    let track_uris = fetch_track_uris(api, &existing.id)?;
    if desired.same_members(&track_uris) {
        Ok(PlaylistPlan::ExistingUnchanged {
            playlist: existing,
            track_uris,
        })
    } else {
        Ok(PlaylistPlan::ExistingNeedsUpdate(existing))
    }
}

pub(crate) fn add_in_chunks<A: CatalogApi + ?Sized>(
    api: &A,
    playlist_id: &str,
    uris: &[String],
    chunk_size: usize,
) -> ApiResult<()> {
    for chunk in uris.chunks(chunk_size.max(1)) {
        api.add_playlist_tracks(playlist_id, chunk)?;
    }
    Ok(())
}

pub(crate) fn replace_then_append<A: CatalogApi + ?Sized>(
    api: &A,
    playlist_id: &str,
    uris: &[String],
    chunk_size: usize,
) -> ApiResult<()> {
    let split = uris.len().min(REPLACE_LIMIT);
    let (head, tail) = uris.split_at(split);
    api.replace_playlist_tracks(playlist_id, head)?;
    add_in_chunks(api, playlist_id, tail, chunk_size)
}

pub(crate) fn reconcile<A: CatalogApi + ?Sized>(
    api: &A,
    user_id: &str,
    name: &str,
    desired: &TrackSet,
    settings: &ReconcileSettings,
) -> SyncResult<Reconciliation> {
    if desired.is_empty() {
        return Err(SyncError::EmptyResultSet);
    }

    let plan = plan(api, user_id, name, desired, settings.force_recreate)?;
    info!(?plan, "reconcile plan");

    let (action, playlist) = match plan {
        PlaylistPlan::ExistingUnchanged {
            playlist,
            track_uris,
        } => (
            ReconcileAction::Unchanged,
            PlaylistState {
                id: playlist.id,
                name: playlist.name,
                owner_id: playlist.owner_id,
                track_uris,
            },
        ),
        PlaylistPlan::ExistingNeedsUpdate(playlist) => {
            replace_then_append(api, &playlist.id, desired.as_slice(), settings.chunk_size)?;
            (
                ReconcileAction::Updated,
                PlaylistState {
                    id: playlist.id,
                    name: playlist.name,
                    owner_id: playlist.owner_id,
                    track_uris: desired.as_slice().to_vec(),
                },
            )
        }
        PlaylistPlan::ForceRecreate => {
            let removed = remove_same_named(api, user_id, name)?;
            let playlist = create_with_tracks(api, user_id, name, desired, settings)?;
            (ReconcileAction::Recreated { removed }, playlist)
        }
        PlaylistPlan::NoExistingPlaylist => {
            let playlist = create_with_tracks(api, user_id, name, desired, settings)?;
            (ReconcileAction::Created, playlist)
        }
    };

    Ok(Reconciliation { action, playlist })
}

fn create_with_tracks<A: CatalogApi + ?Sized>(
    api: &A,
    user_id: &str,
    name: &str,
    desired: &TrackSet,
    settings: &ReconcileSettings,
) -> ApiResult<PlaylistState> {
    let id = api.create_playlist(user_id, name, true, &settings.description)?;
    add_in_chunks(api, &id, desired.as_slice(), settings.chunk_size)?;
    Ok(PlaylistState {
        id,
        name: name.to_string(),
        owner_id: user_id.to_string(),
        track_uris: desired.as_slice().to_vec(),
    })
}
