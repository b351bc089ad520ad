use std::collections::HashMap;

use tracing::debug;

use super::parse::{parse_entry_text, split_bullet};
use super::{EntryStatus, Hints, PLAYLIST_URL_PREFIX};

const PLAYLIST_LINK_LABEL: &str = "Spotify Playlist";

pub(crate) fn annotate_entries(
    text: &str,
    statuses: &HashMap<String, EntryStatus>,
    hints: &Hints,
) -> String {
    let mut lines = Vec::new();
    for line in text.lines() {
        let Some(bullet) = split_bullet(line) else {
            lines.push(line.to_string());
            continue;
        };

        let entry = parse_entry_text(bullet.text, hints);
        if entry.name.is_empty() {
            lines.push(line.to_string());
            continue;
        }
        let status = statuses.get(&entry.name);
        let previous = entry.hint.clone().unwrap_or(EntryStatus::Resolved { profile_url: None });
        if let Some(status) = status
            && !same_kind(&previous, status)
        {
            debug!(entry = %entry.name, from = ?previous, to = ?status, "annotation changed");
        }

        let annotation = status
            .map(|status| hints.annotation(status))
            .unwrap_or_default();
        lines.push(format!("{}{}{}", bullet.prefix, entry.base, annotation));
    }
    join_lines(&lines)
}

fn same_kind(left: &EntryStatus, right: &EntryStatus) -> bool {
    std::mem::discriminant(left) == std::mem::discriminant(right)
}

pub(crate) fn upsert_playlist_link(text: &str, url: &str) -> String {
    let link_line = format!("[{PLAYLIST_LINK_LABEL}]({url})");
    let mut lines = text.lines().map(str::to_string).collect::<Vec<_>>();

    match lines.iter().position(|line| is_playlist_link_line(line)) {
        Some(idx) => lines[idx] = link_line,
        None => {
            lines.push(String::new());
            lines.push(link_line);
        }
    }
    join_lines(&lines)
}

fn is_playlist_link_line(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(inner) = trimmed.strip_suffix(')') else {
        return false;
    };
    if !trimmed.starts_with('[') {
        return false;
    }
    let marker = format!("]({PLAYLIST_URL_PREFIX}");
    let Some(marker_idx) = inner.rfind(&marker) else {
        return false;
    };
    let id = &inner[marker_idx + marker.len()..];
    !id.is_empty() && id.chars().all(|ch| ch.is_alphanumeric() || ch == '_')
}

fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
