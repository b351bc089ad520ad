use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use super::catalog::{BandEntry, EntryStatus};
use super::spotify::{ApiResult, CatalogApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolveSettings {
    pub(crate) market: String,
    pub(crate) search_limit: usize,
    pub(crate) track_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedArtist {
    pub(crate) id: String,
    pub(crate) canonical_name: String,
    pub(crate) profile_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArtistLookup {
    Skipped,
    NoExactMatch,
    Found(ResolvedArtist),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryOutcome {
    Matched { tracks: usize },
    NotFoundExact,
    IntentionallySkipped,
    NoTracks,
    LookupFailed(String),
}

impl EntryOutcome {
    pub(crate) fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryReport {
    pub(crate) name: String,
    pub(crate) outcome: EntryOutcome,
    pub(crate) profile_url: Option<String>,
}

impl EntryReport {
    pub(crate) fn status(&self) -> Option<EntryStatus> {
        match &self.outcome {
            EntryOutcome::IntentionallySkipped => Some(EntryStatus::Skipped),
            EntryOutcome::NotFoundExact => Some(EntryStatus::NotFound),
            EntryOutcome::Matched { .. } | EntryOutcome::NoTracks => Some(EntryStatus::Resolved {
                profile_url: self.profile_url.clone(),
            }),
            EntryOutcome::LookupFailed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TrackSet {
    uris: Vec<String>,
    seen: HashSet<String>,
}

impl TrackSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn extend<I>(&mut self, uris: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.uris.len();
        for uri in uris {
            if self.seen.insert(uri.clone()) {
                self.uris.push(uri);
            }
        }
        self.uris.len() - before
    }

    pub(crate) fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.uris.shuffle(rng);
    }

    pub(crate) fn as_slice(&self) -> &[String] {
        &self.uris
    }

    pub(crate) fn len(&self) -> usize {
        self.uris.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    pub(crate) fn same_members(&self, other: &[String]) -> bool {
        let other = other.iter().map(String::as_str).collect::<HashSet<_>>();
        other.len() == self.seen.len() && self.seen.iter().all(|uri| other.contains(uri.as_str()))
    }
}

impl FromIterator<String> for TrackSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

pub(crate) fn resolve_artist<A: CatalogApi + ?Sized>(
    api: &A,
    entry: &BandEntry,
    settings: &ResolveSettings,
) -> ApiResult<ArtistLookup> {
    if entry.intentionally_skipped {
        return Ok(ArtistLookup::Skipped);
    }

    let query = entry.name.trim();
    if query.is_empty() {
        return Ok(ArtistLookup::NoExactMatch);
    }
    let wanted = query.to_lowercase();
    let candidates = api.search_artists(query, settings.search_limit, &settings.market)?;

    Ok(candidates
        .into_iter()
        .take(settings.search_limit)
        .find(|candidate| candidate.name.to_lowercase() == wanted)
        .map(|candidate| {
            ArtistLookup::Found(ResolvedArtist {
                id: candidate.id,
                canonical_name: candidate.name,
                profile_url: candidate.profile_url,
            })
        })
        .unwrap_or(ArtistLookup::NoExactMatch))
}

pub(crate) fn top_tracks<A: CatalogApi + ?Sized>(
    api: &A,
    artist_id: &str,
    limit: usize,
    market: &str,
) -> ApiResult<Vec<String>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let mut seen = HashSet::new();
    Ok(api
        .artist_top_tracks(artist_id, market)?
        .into_iter()
        .filter(|uri| seen.insert(uri.clone()))
        .take(limit)
        .collect())
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Resolution {
    pub(crate) entries: Vec<EntryReport>,
    pub(crate) tracks: TrackSet,
}

impl Resolution {
    pub(crate) fn matched_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.is_matched())
            .count()
    }

    pub(crate) fn unresolved(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|entry| !entry.outcome.is_matched())
    }

    pub(crate) fn statuses(&self) -> HashMap<String, EntryStatus> {
        self.entries
            .iter()
            .filter_map(|entry| Some((entry.name.clone(), entry.status()?)))
            .collect()
    }
}

pub(crate) fn resolve_entries<A, F>(
    api: &A,
    entries: &[BandEntry],
    settings: &ResolveSettings,
    mut on_entry: F,
) -> Resolution
where
    A: CatalogApi + ?Sized,
    F: FnMut(usize, usize, &EntryReport),
{
    let mut resolution = Resolution::default();
    let total = entries.len();

    for (idx, entry) in entries.iter().enumerate() {
        let looked_up = resolve_entry(api, entry, settings, &mut resolution.tracks);
        let (outcome, profile_url) = match looked_up {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(entry = %entry.name, status = ?err.status(), "lookup failed: {err}");
                (EntryOutcome::LookupFailed(err.to_string()), None)
            }
        };
        let report = EntryReport {
            name: entry.name.clone(),
            outcome,
            profile_url,
        };
        on_entry(idx + 1, total, &report);
        resolution.entries.push(report);
    }

    resolution
}

fn resolve_entry<A: CatalogApi + ?Sized>(
    api: &A,
    entry: &BandEntry,
    settings: &ResolveSettings,
    tracks: &mut TrackSet,
) -> ApiResult<(EntryOutcome, Option<String>)> {
    let artist = match resolve_artist(api, entry, settings)? {
        ArtistLookup::Skipped => return Ok((EntryOutcome::IntentionallySkipped, None)),
        ArtistLookup::NoExactMatch => return Ok((EntryOutcome::NotFoundExact, None)),
        ArtistLookup::Found(artist) => artist,
    };
    debug!(entry = %entry.name, artist = %artist.canonical_name, id = %artist.id, "exact match");

    let limit = entry.track_override.unwrap_or(settings.track_limit);
    let artist_tracks = top_tracks(api, &artist.id, limit, &settings.market)?;
    if artist_tracks.is_empty() {
        return Ok((EntryOutcome::NoTracks, artist.profile_url));
    }

    let count = artist_tracks.len();
    tracks.extend(artist_tracks);
    Ok((EntryOutcome::Matched { tracks: count }, artist.profile_url))
}
