//! The markdown band list: one `- Band` bullet per artist, optionally carrying
//! a `(n)` track override and one trailing annotation (a status hint or a
//! `[spotify](...)` profile link).

mod annotate;
mod parse;

use std::fs;
use std::path::Path;

use crate::error::{SyncError, SyncResult};

pub(crate) use annotate::{annotate_entries, upsert_playlist_link};
pub(crate) use parse::{derive_playlist_name, parse_bands};

pub(crate) const ARTIST_URL_PREFIX: &str = "https://open.spotify.com/artist/";
pub(crate) const PLAYLIST_URL_PREFIX: &str = "https://open.spotify.com/playlist/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BandEntry {
    pub(crate) name: String,
    pub(crate) track_override: Option<usize>,
    pub(crate) intentionally_skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryStatus {
    Resolved { profile_url: Option<String> },
    NotFound,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hints {
    pub(crate) not_found: String,
    pub(crate) skipped: String,
}

impl Hints {
    pub(crate) fn new(not_found: &str, skipped: &str) -> Self {
        Self {
            not_found: not_found.trim_start().to_string(),
            skipped: skipped.trim_start().to_string(),
        }
    }

    pub(crate) fn annotation(&self, status: &EntryStatus) -> String {
        match status {
            EntryStatus::Skipped => format_hint(&self.skipped),
            EntryStatus::NotFound => format_hint(&self.not_found),
            EntryStatus::Resolved {
                profile_url: Some(url),
            } if is_artist_profile_url(url) => format!(" [spotify]({url})"),
            EntryStatus::Resolved { .. } => String::new(),
        }
    }
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!(" {hint}")
    }
}

/// Only links of this exact shape are written, so the next run can strip them again.
pub(crate) fn is_artist_profile_url(url: &str) -> bool {
    url.strip_prefix(ARTIST_URL_PREFIX)
        .is_some_and(|id| !id.is_empty() && id.chars().all(|ch| ch.is_ascii_alphanumeric()))
}

pub(crate) fn playlist_url(playlist_id: &str) -> String {
    format!("{PLAYLIST_URL_PREFIX}{playlist_id}")
}

pub(crate) fn read_document(path: &Path) -> SyncResult<String> {
    if !path.exists() {
        return Err(SyncError::DocumentNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| SyncError::DocumentUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_document(path: &Path, text: &str) -> SyncResult<()> {
    fs::write(path, text).map_err(|source| SyncError::DocumentUnwritable {
        path: path.to_path_buf(),
        source,
    })
}
