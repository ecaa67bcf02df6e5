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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fetchable data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Profile,
    Tracks,
    Analysis,
}

impl DataKind {
    pub const ALL: [DataKind; 3] = [DataKind::Profile, DataKind::Tracks, DataKind::Analysis];

    /// Path of the gateway endpoint serving this kind.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            DataKind::Profile => "user-profile",
            DataKind::Tracks => "top-tracks",
            DataKind::Analysis => "analyze-music",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Profile => "profile",
            DataKind::Tracks => "tracks",
            DataKind::Analysis => "analysis",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataKindError {
    #[error("Unknown data kind '{0}'")]
    Unknown(String),
}

impl FromStr for DataKind {
    type Err = DataKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" => Ok(DataKind::Profile),
            "tracks" | "top-tracks" => Ok(DataKind::Tracks),
            "analysis" => Ok(DataKind::Analysis),
            other => Err(DataKindError::Unknown(other.to_string())),
        }
    }
}

/// `{"profile": {...}}` as returned by the profile endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Profile {
    pub fn followers_total(&self) -> Option<u64> {
        self.followers.as_ref().and_then(|f| f.total)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: Option<u64>,
}

/// `{"topTracks": {"items": [...]}}` as returned by the top-tracks endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracksResponse {
    #[serde(default, rename = "topTracks")]
    pub top_tracks: Option<TrackPage>,
}

impl TracksResponse {
    pub fn items(&self) -> &[Track] {
        self.top_tracks
            .as_ref()
            .map(|page| page.items.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<NamedItem>,
    #[serde(default)]
    pub album: Option<NamedItem>,
}

impl Track {
    pub fn artist_names(&self) -> Vec<&str> {
        self.artists.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn album_name(&self) -> &str {
        self.album.as_ref().map(|a| a.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedItem {
    #[serde(default)]
    pub name: String,
}

/// `{"analysis": {...}}` as returned by the analysis endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub analysis: Option<Analysis>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// Genre name to percentage, in the order the endpoint sent them.
    #[serde(default)]
    pub genres: serde_json::Map<String, Value>,
    #[serde(default, alias = "topArtists")]
    pub top_artists: Option<Vec<ArtistPopularity>>,
    #[serde(default, rename = "audioFeatures")]
    pub audio_features: Option<AudioFeatures>,
}

impl Analysis {
    /// Genres with a numeric percentage, in document order. Non-numeric entries are skipped.
    pub fn genre_shares(&self) -> Vec<(&str, f64)> {
        self.genres
            .iter()
            .filter_map(|(name, pct)| pct.as_f64().map(|p| (name.as_str(), p)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtistPopularity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioFeatures {
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub danceability: Option<f64>,
    #[serde(default)]
    pub valence: Option<f64>,
}

/// A decoded response body for one data kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Profile(ProfileResponse),
    Tracks(TracksResponse),
    Analysis(AnalysisResponse),
}

impl Payload {
    /// Interprets `value` as the shape served for `kind`.
    pub fn from_value(kind: DataKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            DataKind::Profile => Payload::Profile(serde_json::from_value(value)?),
            DataKind::Tracks => Payload::Tracks(serde_json::from_value(value)?),
            DataKind::Analysis => Payload::Analysis(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> DataKind {
        match self {
            Payload::Profile(_) => DataKind::Profile,
            Payload::Tracks(_) => DataKind::Tracks,
            Payload::Analysis(_) => DataKind::Analysis,
        }
    }
}
