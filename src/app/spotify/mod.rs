mod client;

pub(crate) use client::SpotifyClient;

use crate::error::ApiError;

pub(crate) type ApiResult<T> = Result<T, ApiError>;

pub(crate) const PLAYLIST_PAGE_SIZE: usize = 50;
pub(crate) const TRACK_PAGE_SIZE: usize = 100;
pub(crate) const MAX_COVER_IMAGE_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArtistCandidate {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) profile_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaylistSummary {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) owner_id: String,
}

/// One page of the user's playlists. `item_count` includes null entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PlaylistPage {
    pub(crate) playlists: Vec<PlaylistSummary>,
    pub(crate) item_count: usize,
}

/// One page of playlist items. `item_count` counts every returned item,
/// including entries whose track is gone, so paging can tell a short page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TrackPage {
    pub(crate) uris: Vec<String>,
    pub(crate) item_count: usize,
}

pub(crate) trait CatalogApi {
    fn current_user_id(&self) -> ApiResult<String>;

    fn search_artists(
        &self,
        query: &str,
        limit: usize,
        market: &str,
    ) -> ApiResult<Vec<ArtistCandidate>>;

    fn artist_top_tracks(&self, artist_id: &str, market: &str) -> ApiResult<Vec<String>>;

    fn list_user_playlists(&self, offset: usize, limit: usize) -> ApiResult<PlaylistPage>;

    fn create_playlist(
        &self,
        owner_id: &str,
        name: &str,
        public: bool,
        description: &str,
    ) -> ApiResult<String>;

    fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> ApiResult<()>;

    fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> ApiResult<()>;

    fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> ApiResult<TrackPage>;

    fn unfollow_playlist(&self, playlist_id: &str) -> ApiResult<()>;

    fn upload_playlist_cover(&self, playlist_id: &str, jpeg_base64: &str) -> ApiResult<()>;
}
