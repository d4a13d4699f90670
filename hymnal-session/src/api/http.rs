//! HTTP implementation of the remote API on reqwest

use futures::FutureExt;
use hymnal_common::model::PlayStartedEvent;
use hymnal_common::{FavoriteRecord, HomeFeed, Track, TrackId, UserId};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{ApiEnvelope, ApiFuture, RemoteApi};
use crate::config::{ApiConfig, EndpointPaths};
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("hymnal/", env!("CARGO_PKG_VERSION"));

/// Catalog/favorites backend client
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
    paths: EndpointPaths,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddFavoriteBody<'a> {
    track_id: &'a TrackId,
}

impl HttpApi {
    /// Create new client from the `[api]` config section
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid api.base_url {:?}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "api.base_url {:?} cannot be used as a base URL",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            paths: config.paths.clone(),
        })
    }

    /// Segments of a configured path, with `{user}` filled in
    fn segments(path: &str, user: Option<&UserId>) -> Vec<String> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match (segment, user) {
                ("{user}", Some(user)) => user.as_str().to_string(),
                _ => segment.to_string(),
            })
            .collect()
    }

    /// Base URL joined with percent-encoded path segments
    fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a request now, send it when the returned future is polled
    fn call<B, T>(&self, method: Method, segments: Vec<String>, body: Option<&B>) -> ApiFuture<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Send + 'static,
    {
        let request = self.endpoint(&segments).map(|url| {
            let builder = self.client.request(method, url);
            match body {
                Some(body) => builder.json(body),
                None => builder,
            }
        });

        async move {
            let request = request?;
            let response = request.send().await?;
            let status = response.status();
            debug!(url = %response.url(), status = %status, "API response");

            let bytes = response.bytes().await?;
            match serde_json::from_slice::<ApiEnvelope<T>>(&bytes) {
                Ok(envelope) => envelope.into_result(),
                Err(_) if !status.is_success() => {
                    Err(Error::Api(format!("HTTP {}", status.as_u16())))
                }
                Err(e) => Err(Error::Api(format!("Malformed response body: {}", e))),
            }
        }
        .boxed()
    }
}

impl RemoteApi for HttpApi {
    fn fetch_tracks(&self) -> ApiFuture<Vec<Track>> {
        let segments = Self::segments(&self.paths.tracks, None);
        self.call::<(), _>(Method::GET, segments, None)
    }

    fn fetch_favorites(&self, user: &UserId) -> ApiFuture<Vec<FavoriteRecord>> {
        let segments = Self::segments(&self.paths.favorites, Some(user));
        self.call::<(), _>(Method::GET, segments, None)
    }

    fn add_favorite(&self, user: &UserId, track: &TrackId) -> ApiFuture<()> {
        let body = AddFavoriteBody { track_id: track };
        let segments = Self::segments(&self.paths.favorites, Some(user));
        let fut = self.call::<_, serde_json::Value>(Method::POST, segments, Some(&body));
        fut.map(|r| r.map(|_| ())).boxed()
    }

    fn remove_favorite(&self, user: &UserId, track: &TrackId) -> ApiFuture<()> {
        let mut segments = Self::segments(&self.paths.favorites, Some(user));
        segments.push(track.as_str().to_string());
        let fut = self.call::<(), serde_json::Value>(Method::DELETE, segments, None);
        fut.map(|r| r.map(|_| ())).boxed()
    }

    fn post_play_started(&self, event: PlayStartedEvent) -> ApiFuture<()> {
        let segments = Self::segments(&self.paths.plays, None);
        let fut = self.call::<_, serde_json::Value>(Method::POST, segments, Some(&event));
        fut.map(|r| r.map(|_| ())).boxed()
    }

    fn fetch_home_feed(&self) -> ApiFuture<HomeFeed> {
        let segments = Self::segments(&self.paths.home, None);
        self.call::<(), _>(Method::GET, segments, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(&ApiConfig {
            base_url: base.to_string(),
            request_timeout_ms: 1000,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_configured_paths_fill_in_user() {
        let config = ApiConfig {
            base_url: "http://localhost:8080/api".to_string(),
            paths: EndpointPaths {
                favorites: "v2/members/{user}/starred".to_string(),
                ..EndpointPaths::default()
            },
            ..ApiConfig::default()
        };
        let api = HttpApi::new(&config).unwrap();

        let segments = HttpApi::segments(&api.paths.favorites, Some(&UserId::new("a b")));
        let url = api.endpoint(&segments).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v2/members/a%20b/starred");

        let segments = HttpApi::segments(&api.paths.tracks, None);
        assert_eq!(
            api.endpoint(&segments).unwrap().as_str(),
            "http://localhost:8080/api/hymns"
        );
    }

    #[test]
    fn test_leading_and_trailing_slashes_in_paths_are_ignored() {
        assert_eq!(HttpApi::segments("/home/", None), vec!["home".to_string()]);
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let api = api("http://localhost:8080/api");
        let url = api.endpoint(&["users", "u-1", "favorites"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users/u-1/favorites");
    }

    #[test]
    fn test_endpoint_handles_trailing_slash() {
        let api = api("http://localhost:8080/api/");
        let url = api.endpoint(&["home"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/home");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let api = api("http://localhost:8080/api");
        let url = api.endpoint(&["users", "a b/c", "favorites"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users/a%20b%2Fc/favorites");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = HttpApi::new(&ApiConfig {
            base_url: "not a url".to_string(),
            request_timeout_ms: 1000,
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));

        let result = HttpApi::new(&ApiConfig {
            base_url: "mailto:someone@example.com".to_string(),
            request_timeout_ms: 1000,
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
