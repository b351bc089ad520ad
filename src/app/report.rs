use super::RunOutcome;
use super::config::RunConfig;
use super::reconcile::ReconcileAction;
use super::resolve::{EntryOutcome, EntryReport};

pub(crate) fn print_progress(idx: usize, total: usize, report: &EntryReport) {
    println!("  {}", progress_line(idx, total, report));
}

pub(crate) fn progress_line(idx: usize, total: usize, report: &EntryReport) -> String {
    let status = match &report.outcome {
        EntryOutcome::Matched { tracks } => {
            return format!("[{idx}/{total}] {} ✓ {tracks} tracks", report.name);
        }
        EntryOutcome::IntentionallySkipped => "skipped",
        EntryOutcome::NotFoundExact => "not found",
        EntryOutcome::NoTracks => "no tracks",
        EntryOutcome::LookupFailed(_) => "lookup failed",
    };
    format!("[{idx}/{total}] {} — {status}", report.name)
}

pub(crate) fn unresolved_reason(outcome: &EntryOutcome) -> String {
    match outcome {
        EntryOutcome::IntentionallySkipped => "intentionally skipped".to_string(),
        EntryOutcome::NotFoundExact => "no exact match".to_string(),
        EntryOutcome::NoTracks => "no top tracks in market".to_string(),
        EntryOutcome::LookupFailed(err) => format!("lookup failed: {err}"),
        EntryOutcome::Matched { .. } => "matched".to_string(),
    }
}

fn action_label(action: ReconcileAction) -> String {
    match action {
        ReconcileAction::Created => "Created playlist".to_string(),
        ReconcileAction::Updated => "Updated playlist".to_string(),
        ReconcileAction::Unchanged => "Playlist unchanged".to_string(),
        ReconcileAction::Recreated { removed } => {
            format!("Recreated playlist (removed {removed} existing)")
        }
    }
}

pub(crate) fn summary_line(outcome: &RunOutcome) -> String {
    let resolution = &outcome.resolution;
    format!(
        "Summary: {}/{} artists matched, {} tracks",
        resolution.matched_count(),
        resolution.entries.len(),
        resolution.tracks.len()
    )
}

pub(crate) fn print_outcome(outcome: &RunOutcome, config: &RunConfig) {
    let resolution = &outcome.resolution;
    let total = resolution.entries.len();
    let matched = resolution.matched_count();

    match &outcome.reconciliation {
        None => {
            println!("\n--- DRY RUN (no changes will be made) ---\n");
            println!("Playlist name: {}", outcome.playlist_name);
            println!("Total tracks:  {} (deduplicated)", resolution.tracks.len());
            if config.shuffle {
                println!("Shuffle:       on");
            }
            if let Some(cover) = &config.cover_image {
                println!("Cover image:   {}", cover.display());
            }
            println!("\nMatched {matched} / {total} artists");
        }
        Some(reconciliation) => {
            println!(
                "\n{}: {}",
                action_label(reconciliation.action),
                reconciliation.playlist.name
            );
            if let Some(url) = &outcome.playlist_url {
                println!("URL: {url}");
            }
            println!("\n{}", summary_line(outcome));
        }
    }

    let unresolved = resolution.unresolved().collect::<Vec<_>>();
    if !unresolved.is_empty() {
        println!("\nArtists not resolved automatically:");
        for entry in unresolved {
            println!("  - {} ({})", entry.name, unresolved_reason(&entry.outcome));
        }
    }
}
