use serde_json::{Value, json};
use tracing::debug;

use crate::error::ApiError;
use crate::http::{Body, HttpRequest, Method, RetryPolicy, send_with_retries};

use super::{ApiResult, ArtistCandidate, CatalogApi, PlaylistPage, PlaylistSummary, TrackPage};

#[derive(Debug, Clone)]
pub(crate) struct SpotifyClient {
    api_base: String,
    token: String,
    retry: RetryPolicy,
}

impl SpotifyClient {
    pub(crate) fn new(api_base: &str, token: &str, retry: RetryPolicy) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            retry,
        }
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Body<'_>>,
    ) -> ApiResult<String> {
        let url = format!("{}{}", self.api_base, path);
        debug!(method = ?method, %url, "catalog request");
        send_with_retries(
            &HttpRequest {
                method,
                url: &url,
                bearer: Some(&self.token),
                query,
                body,
            },
            &self.retry,
        )
    }

    fn send_json(&self, method: Method, path: &str, payload: &Value) -> ApiResult<String> {
        let payload = payload.to_string();
        self.send(
            method,
            path,
            &[],
            Some(Body {
                content_type: "application/json",
                payload: &payload,
            }),
        )
    }
}

fn query(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}

impl CatalogApi for SpotifyClient {
    fn current_user_id(&self) -> ApiResult<String> {
        let raw = self.send(Method::Get, "/me", &[], None)?;
        parse_user_id(&raw)
    }

    fn search_artists(
        &self,
        query_text: &str,
        limit: usize,
        market: &str,
    ) -> ApiResult<Vec<ArtistCandidate>> {
        let params = query(&[
            ("q", format!("artist:{query_text}")),
            ("type", "artist".to_string()),
            ("limit", limit.to_string()),
            ("market", market.to_string()),
        ]);
        let raw = self.send(Method::Get, "/search", &params, None)?;
        parse_artist_candidates(&raw)
    }

    fn artist_top_tracks(&self, artist_id: &str, market: &str) -> ApiResult<Vec<String>> {
        let params = query(&[("market", market.to_string())]);
        let raw = self.send(
            Method::Get,
            &format!("/artists/{artist_id}/top-tracks"),
            &params,
            None,
        )?;
        parse_top_track_uris(&raw)
    }

    fn list_user_playlists(&self, offset: usize, limit: usize) -> ApiResult<PlaylistPage> {
        let params = query(&[("limit", limit.to_string()), ("offset", offset.to_string())]);
        let raw = self.send(Method::Get, "/me/playlists", &params, None)?;
        parse_playlist_page(&raw)
    }

    fn create_playlist(
        &self,
        owner_id: &str,
        name: &str,
        public: bool,
        description: &str,
    ) -> ApiResult<String> {
        let payload = json!({
            "name": name,
            "public": public,
            "description": description,
        });
        let raw = self.send_json(Method::Post, &format!("/users/{owner_id}/playlists"), &payload)?;
        parse_created_playlist_id(&raw)
    }

    fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> ApiResult<()> {
        self.send_json(
            Method::Put,
            &format!("/playlists/{playlist_id}/tracks"),
            &json!({ "uris": uris }),
        )?;
        Ok(())
    }

    fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> ApiResult<()> {
        self.send_json(
            Method::Post,
            &format!("/playlists/{playlist_id}/tracks"),
            &json!({ "uris": uris }),
        )?;
        Ok(())
    }

    fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> ApiResult<TrackPage> {
        let params = query(&[
            ("fields", "items(track(uri))".to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]);
        let raw = self.send(
            Method::Get,
            &format!("/playlists/{playlist_id}/tracks"),
            &params,
            None,
        )?;
        parse_track_page(&raw)
    }

    fn unfollow_playlist(&self, playlist_id: &str) -> ApiResult<()> {
        self.send(
            Method::Delete,
            &format!("/playlists/{playlist_id}/followers"),
            &[],
            None,
        )?;
        Ok(())
    }

    fn upload_playlist_cover(&self, playlist_id: &str, jpeg_base64: &str) -> ApiResult<()> {
        self.send(
            Method::Put,
            &format!("/playlists/{playlist_id}/images"),
            &[],
            Some(Body {
                content_type: "image/jpeg",
                payload: jpeg_base64,
            }),
        )?;
        Ok(())
    }
}

fn parse_value(raw: &str, endpoint: &str) -> ApiResult<Value> {
    serde_json::from_str(raw)
        .map_err(|err| ApiError::malformed(endpoint, format!("invalid JSON: {err}")))
}

fn required_str<'a>(value: &'a Value, pointer: &str, endpoint: &str) -> ApiResult<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::malformed(endpoint, format!("missing field {pointer}")))
}

fn required_array<'a>(value: &'a Value, pointer: &str, endpoint: &str) -> ApiResult<&'a [Value]> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| ApiError::malformed(endpoint, format!("missing array {pointer}")))
}

fn parse_user_id(raw: &str) -> ApiResult<String> {
    let parsed = parse_value(raw, "me")?;
    Ok(required_str(&parsed, "/id", "me")?.to_string())
}

fn parse_artist_candidates(raw: &str) -> ApiResult<Vec<ArtistCandidate>> {
    const ENDPOINT: &str = "search";
    let parsed = parse_value(raw, ENDPOINT)?;
    required_array(&parsed, "/artists/items", ENDPOINT)?
        .iter()
        .map(|artist| {
            Ok(ArtistCandidate {
                id: required_str(artist, "/id", ENDPOINT)?.to_string(),
                name: required_str(artist, "/name", ENDPOINT)?.to_string(),
                profile_url: artist
                    .pointer("/external_urls/spotify")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string),
            })
        })
        .collect()
}

fn parse_top_track_uris(raw: &str) -> ApiResult<Vec<String>> {
    const ENDPOINT: &str = "artist top tracks";
    let parsed = parse_value(raw, ENDPOINT)?;
    required_array(&parsed, "/tracks", ENDPOINT)?
        .iter()
        .map(|track| Ok(required_str(track, "/uri", ENDPOINT)?.to_string()))
        .collect()
}

fn parse_playlist_page(raw: &str) -> ApiResult<PlaylistPage> {
    const ENDPOINT: &str = "current user playlists";
    let parsed = parse_value(raw, ENDPOINT)?;
    let items = required_array(&parsed, "/items", ENDPOINT)?;
    let playlists = items
        .iter()
        .filter(|item| !item.is_null())
        .map(|item| {
            Ok(PlaylistSummary {
                id: required_str(item, "/id", ENDPOINT)?.to_string(),
                name: item
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                owner_id: required_str(item, "/owner/id", ENDPOINT)?.to_string(),
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(PlaylistPage {
        playlists,
        item_count: items.len(),
    })
}

fn parse_track_page(raw: &str) -> ApiResult<TrackPage> {
    const ENDPOINT: &str = "playlist tracks";
    let parsed = parse_value(raw, ENDPOINT)?;
    let items = required_array(&parsed, "/items", ENDPOINT)?;
    let mut uris = Vec::with_capacity(items.len());
    for item in items {
        // Removed or unavailable tracks come back as `"track": null`.
        match item.get("track") {
            None | Some(Value::Null) => continue,
            Some(track) => uris.push(required_str(track, "/uri", ENDPOINT)?.to_string()),
        }
    }
    Ok(TrackPage {
        uris,
        item_count: items.len(),
    })
}

fn parse_created_playlist_id(raw: &str) -> ApiResult<String> {
    let parsed = parse_value(raw, "create playlist")?;
    Ok(required_str(&parsed, "/id", "create playlist")?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::{Behavior, TestServer, fast_policy};

    #[test]
    fn artist_candidates_require_id_and_name() {
        let raw = r#"{"artists":{"items":[
            {"id":"a1","name":"Alpha","external_urls":{"spotify":"https://open.spotify.com/artist/a1"}},
            {"id":"a2","name":"Alpha Wolf","external_urls":{}}
        ]}}"#;
        let candidates = parse_artist_candidates(raw).expect("valid payload");
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0].profile_url.as_deref(),
            Some("https://open.spotify.com/artist/a1")
        );
        assert_eq!(candidates[1].profile_url, None);

        let missing_name = r#"{"artists":{"items":[{"id":"a1"}]}}"#;
        let err = parse_artist_candidates(missing_name).expect_err("name is required");
        assert!(err.to_string().contains("/name"), "unexpected error: {err}");
    }

    #[test]
    fn track_page_counts_null_tracks() {
        let raw = r#"{"items":[{"track":{"uri":"spotify:track:1"}},{"track":null},{"track":{"uri":"spotify:track:2"}}]}"#;
        let page = parse_track_page(raw).expect("valid payload");
        assert_eq!(page.uris, vec!["spotify:track:1", "spotify:track:2"]);
        assert_eq!(page.item_count, 3);
    }

    #[test]
    fn playlist_page_requires_owner() {
        let ok = r#"{"items":[{"id":"p1","name":"Fest","owner":{"id":"me"}},null]}"#;
        let page = parse_playlist_page(ok).expect("valid payload");
        assert_eq!(page.item_count, 2);
        assert_eq!(page.playlists[0].owner_id, "me");

        let missing_owner = r#"{"items":[{"id":"p1","name":"Fest"}]}"#;
        assert!(parse_playlist_page(missing_owner).is_err());
    }

    #[test]
    fn top_tracks_reject_non_json() {
        let err = parse_top_track_uris("<html>").expect_err("not JSON");
        assert!(matches!(err, ApiError::Malformed { .. }));
    }

    #[test]
    fn client_sends_search_query_with_market() {
        let server = TestServer::spawn(vec![Behavior::Respond(
            200,
            r#"{"artists":{"items":[{"id":"x","name":"Motörhead"}]}}"#.to_string(),
        )]);
        let client = SpotifyClient::new(&server.base_url, "tok", fast_policy(1));

        let candidates = client
            .search_artists("Motörhead", 5, "DE")
            .expect("search should succeed");
        assert_eq!(candidates[0].id, "x");

        let requests = server.requests();
        let raw = requests.first().expect("one request recorded");
        assert!(raw.starts_with("GET /search?"), "unexpected request: {raw}");
        assert!(raw.contains("market=DE"));
        assert!(raw.contains("type=artist"));
        assert!(raw.contains("Bearer tok"));
    }
}
