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

pub mod auth;
pub mod config;
pub mod console;
pub mod fetch;
pub mod markup;
pub mod models;
pub mod query;
pub mod render;
pub mod session;
pub mod tokens;

#[cfg(test)]
mod testing;

// Re-export key items for convenience
pub use auth::{AuthError, Navigator, StatusRegion};
pub use config::{Config, ConfigError};
pub use console::{ConsoleEntry, ConsoleLog, EntryBody};
pub use fetch::{DataFetcher, FetchError, MockTransport, ReqwestTransport, Transport};
pub use models::{DataKind, DataKindError, Payload};
pub use query::QueryParams;
pub use reqwest::Url;
pub use render::{render, Fragment};
pub use session::{BootstrapOutcome, Session};
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
