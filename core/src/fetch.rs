/*
    spotify-taste-rs | Rust client for your Spotify profile, top tracks and taste.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::config::Config;
use crate::models::{DataKind, Payload};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Url;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Not logged in. Please login with Spotify first.")]
    NotAuthenticated,
    #[error("HTTP error {status}")]
    Http { status: u16 },
    #[error("{0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    Parse(String),
}

impl FetchError {
    /// The single console line reported for a failed fetch of `kind`.
    pub fn console_message(&self, kind: DataKind) -> String {
        match self {
            FetchError::NotAuthenticated => format!("Error: {}", self),
            _ => format!("Error fetching {}: {}", kind, self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransportError(pub String);

/// One GET round trip. Timeouts, TLS and connection reuse are the transport's business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("spotify-taste/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.without_url().to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// Serves canned payloads for every data endpoint after a short delay, so the
/// client can be exercised without the gateway.
pub struct MockTransport {
    delay: Duration,
}

impl MockTransport {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn sample(kind: DataKind) -> Value {
        match kind {
            DataKind::Profile => json!({
                "profile": {
                    "display_name": "Spotify User",
                    "followers": { "total": 42 },
                    "email": "user@example.com",
                    "country": "US",
                    "images": [{ "url": "https://via.placeholder.com/100" }]
                }
            }),
            DataKind::Tracks => {
                let items: Vec<Value> = (1..=5)
                    .map(|i| {
                        json!({
                            "name": format!("Track {}", i),
                            "artists": [{ "name": format!("Artist {}", i) }],
                            "album": { "name": format!("Album {}", i), "images": [{ "url": "" }] }
                        })
                    })
                    .collect();
                json!({ "topTracks": { "items": items } })
            }
            DataKind::Analysis => json!({
                "analysis": {
                    "genres": {
                        "pop": 35,
                        "rock": 25,
                        "indie": 20,
                        "hip hop": 10,
                        "electronic": 10
                    },
                    "audioFeatures": {
                        "danceability": 72,
                        "energy": 65,
                        "valence": 58
                    }
                }
            }),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        tokio::time::sleep(self.delay).await;

        let kind = DataKind::ALL
            .into_iter()
            .find(|k| url.path().ends_with(k.endpoint_path()));

        Ok(match kind {
            Some(kind) => HttpResponse {
                status: 200,
                body: Self::sample(kind).to_string(),
            },
            None => HttpResponse {
                status: 404,
                body: String::new(),
            },
        })
    }
}

/// Issues the single request backing each data kind.
#[derive(Clone)]
pub struct DataFetcher {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl DataFetcher {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Endpoint for `kind` with the token attached as the `access_token` query parameter.
    pub fn endpoint_url(&self, kind: DataKind, access_token: &str) -> Url {
        let mut url = self.config.endpoint(kind.endpoint_path());
        url.query_pairs_mut().append_pair("access_token", access_token);
        url
    }

    /// Fetches the raw JSON body for `kind`. No retries.
    pub async fn fetch_json(&self, kind: DataKind, access_token: &str) -> Result<Value, FetchError> {
        let url = self.endpoint_url(kind, access_token);
        debug!("GET {} (token attached)", self.config.endpoint(kind.endpoint_path()));

        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| FetchError::Network(e.0))?;

        if !response.is_success() {
            warn!("{} endpoint answered HTTP {}", kind, response.status);
            return Err(FetchError::Http {
                status: response.status,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Fetches and decodes `kind`. A body of the wrong shape is a parse error.
    pub async fn fetch(&self, kind: DataKind, access_token: &str) -> Result<Payload, FetchError> {
        let value = self.fetch_json(kind, access_token).await?;
        Payload::from_value(kind, value).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
