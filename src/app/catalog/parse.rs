use std::path::Path;

use super::{BandEntry, EntryStatus, Hints, is_artist_profile_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BulletLine<'a> {
    pub(crate) prefix: &'a str,
    pub(crate) text: &'a str,
}

pub(crate) fn split_bullet(line: &str) -> Option<BulletLine<'_>> {
    let indent_len = line.len() - line.trim_start().len();
    let rest = line[indent_len..].strip_prefix('-')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    let prefix_len = line.len() - rest.trim_start().len();
    Some(BulletLine {
        prefix: &line[..prefix_len],
        text,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryText {
    pub(crate) base: String,
    pub(crate) name: String,
    pub(crate) track_override: Option<usize>,
    pub(crate) hint: Option<EntryStatus>,
}

pub(crate) fn parse_entry_text(raw: &str, hints: &Hints) -> EntryText {
    let (without_hint, hint) = strip_status_hint(raw, hints);
    let base = strip_profile_link(without_hint).to_string();
    let (name, track_override) = parse_track_override(&base);
    EntryText {
        name,
        track_override,
        hint,
        base,
    }
}

/// Strips at most one trailing status hint, not-found first.
fn strip_status_hint<'a>(raw: &'a str, hints: &Hints) -> (&'a str, Option<EntryStatus>) {
    let candidates = [
        (hints.not_found.as_str(), EntryStatus::NotFound),
        (hints.skipped.as_str(), EntryStatus::Skipped),
    ];
    for (hint, status) in candidates {
        if hint.is_empty() {
            continue;
        }
        if let Some(stripped) = raw.strip_suffix(hint) {
            let stripped = stripped.strip_suffix(' ').unwrap_or(stripped);
            return (stripped.trim_end(), Some(status));
        }
    }
    (raw, None)
}

pub(crate) fn strip_profile_link(raw: &str) -> &str {
    let mut current = raw.trim_end();
    loop {
        let Some(inner) = current.strip_suffix(')') else {
            return current;
        };
        let Some(open_idx) = inner.rfind("[spotify](") else {
            return current;
        };
        let url = &inner[open_idx + "[spotify](".len()..];
        if !is_artist_profile_url(url) {
            return current;
        }
        current = inner[..open_idx].trim_end();
    }
}

fn parse_track_override(base: &str) -> (String, Option<usize>) {
    let trimmed = base.trim_end();
    let plain = || (trimmed.to_string(), None);

    let Some(inner_end) = trimmed.strip_suffix(')') else {
        return plain();
    };
    let Some(open_idx) = inner_end.rfind('(') else {
        return plain();
    };
    let digits = &inner_end[open_idx + 1..];
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return plain();
    }
    let name = inner_end[..open_idx].trim_end();
    if name.is_empty() {
        return plain();
    }
    match digits.parse::<usize>() {
        Ok(count) => (name.to_string(), Some(count)),
        Err(_) => plain(),
    }
}

pub(crate) fn parse_bands(text: &str, hints: &Hints) -> Vec<BandEntry> {
    text.lines()
        .filter_map(split_bullet)
        .filter_map(|bullet| {
            let entry = parse_entry_text(bullet.text, hints);
            if entry.name.is_empty() {
                return None;
            }
            let intentionally_skipped =
                !hints.skipped.is_empty() && bullet.text.ends_with(&hints.skipped);
            Some(BandEntry {
                name: entry.name,
                track_override: entry.track_override,
                intentionally_skipped,
            })
        })
        .collect()
}

pub(crate) fn derive_playlist_name(text: &str, path: &Path, suffix: &str) -> String {
    let title = text
        .lines()
        .find_map(|line| {
            let rest = line.trim_start().strip_prefix('#')?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let title = rest.trim();
            (!title.is_empty()).then_some(title)
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    if suffix.is_empty() {
        title
    } else {
        format!("{title} - {suffix}")
    }
}
