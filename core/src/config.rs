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

use reqwest::Url;
use std::path::PathBuf;
use thiserror::Error;

/// Gateway that hosts the authorization flow and the data endpoints.
pub const DEFAULT_API_BASE_URL: &str = "https://ac1ofznmkj.execute-api.us-east-2.amazonaws.com/prod";

/// Token file used when `SPOTIFY_TASTE_TOKEN_PATH` is not set.
pub const DEFAULT_TOKEN_PATH: &str = ".spotify_taste_tokens.json";

pub const API_URL_ENV: &str = "SPOTIFY_TASTE_API_URL";
pub const TOKEN_PATH_ENV: &str = "SPOTIFY_TASTE_TOKEN_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid API base URL '{0}': {1}")]
    InvalidBaseUrl(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub token_path: PathBuf,
}

impl Config {
    pub fn new(api_base_url: &str, token_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let parsed = Url::parse(api_base_url.trim())
            .map_err(|e| ConfigError::InvalidBaseUrl(api_base_url.to_string(), e.to_string()))?;

        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(
                api_base_url.to_string(),
                "URL cannot be used as a base".to_string(),
            ));
        }

        Ok(Self {
            api_base_url: parsed,
            token_path: token_path.into(),
        })
    }

    /// Reads `SPOTIFY_TASTE_API_URL` and `SPOTIFY_TASTE_TOKEN_PATH`, falling back
    /// to the defaults for anything unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = non_empty_var(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let path = non_empty_var(TOKEN_PATH_ENV).unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string());
        Self::new(&base, path)
    }

    /// Resolves `path` beneath the base URL, keeping any path prefix the base carries
    /// (e.g. the `/prod` stage of the gateway).
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.api_base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    pub fn auth_url(&self) -> Url {
        self.endpoint("auth")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
