use clap::{ArgAction, Parser};

fn parse_flag(raw: &str) -> Result<bool, String> {
    Ok(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "bandsync",
    version,
    about = "Sync a markdown band list into a Spotify playlist of top tracks"
)]
pub struct Cli {
    /// Markdown file with one `- Band` bullet per artist
    #[arg(long, env = "BANDS_FILE_PATH")]
    pub bands_file: Option<String>,

    #[arg(long, env = "SPOTIFY_MARKET", default_value = "DE")]
    pub market: String,

    #[arg(
        long,
        env = "NOT_FOUND_HINT_TEXT",
        default_value = "_(not added: no exact Spotify artist match)_"
    )]
    pub not_found_hint: String,

    #[arg(
        long,
        env = "SKIPPED_HINT_TEXT",
        default_value = "_(not added: intentionally skipped)_"
    )]
    pub skipped_hint: String,

    /// Tracks taken per artist unless the entry carries a `(n)` override
    #[arg(long, env = "TOP_TRACKS_PER_ARTIST", default_value_t = 5)]
    pub top_tracks: usize,

    /// Search results inspected for an exact name match
    #[arg(long, env = "SPOTIFY_SEARCH_LIMIT", default_value_t = 5)]
    pub search_limit: usize,

    #[arg(long, env = "SPOTIFY_ADD_CHUNK_SIZE", default_value_t = 100)]
    pub chunk_size: usize,

    /// JPEG uploaded as playlist cover (max 256 KB)
    #[arg(long, env = "PLAYLIST_COVER_IMAGE")]
    pub cover_image: Option<String>,

    #[arg(long, env = "PLAYLIST_DESCRIPTION", default_value = "")]
    pub description: String,

    /// Use this playlist name instead of deriving it from the document heading
    #[arg(long, env = "PLAYLIST_NAME")]
    pub playlist_name: Option<String>,

    #[arg(long, env = "PLAYLIST_NAME_SUFFIX", default_value = "Top 5 je Band")]
    pub name_suffix: String,

    #[arg(
        long,
        env = "SHUFFLE_TRACKS",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub shuffle: bool,

    /// Resolve and aggregate only; no playlist changes, no document rewrite
    #[arg(
        long,
        env = "DRY_RUN",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub dry_run: bool,

    /// Delete every same-named playlist before creating a fresh one
    #[arg(
        long,
        env = "FORCE_RECREATE",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub force_recreate: bool,

    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// JSON token cache holding an `access_token` field
    #[arg(long, env = "SPOTIFY_TOKEN_CACHE_PATH", default_value = ".spotify_cache")]
    pub token_cache: String,

    #[arg(long, env = "SPOTIFY_API_BASE", default_value = "https://api.spotify.com/v1")]
    pub api_base: String,

    #[arg(long, env = "SPOTIFY_HTTP_ATTEMPTS", default_value_t = 3)]
    pub http_attempts: usize,

    #[arg(long, env = "SPOTIFY_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,
}
