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

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "spotify_access_token";
pub const REFRESH_TOKEN_KEY: &str = "spotify_refresh_token";

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Failed to write token file '{0}': {1}")]
    Write(PathBuf, io::Error),
    #[error("Failed to remove token file '{0}': {1}")]
    Remove(PathBuf, io::Error),
    #[error("Failed to serialize tokens: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The stored credentials. Tokens are opaque and never inspected.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn is_logged_in(&self) -> bool {
        self.access.is_some()
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("TokenPair")
            .field("access", &redact(&self.access))
            .field("refresh", &redact(&self.refresh))
            .finish()
    }
}

/// Durable storage for the access/refresh token pair.
///
/// `get` never fails. `set` and `clear` always update what `get` returns for the
/// rest of the session, even when persisting the change fails.
pub trait TokenStore: Send {
    fn get(&self) -> TokenPair;

    /// Stores `access` and, when supplied, `refresh`. A missing `refresh` leaves
    /// any previously stored refresh token alone.
    fn set(&mut self, access: &str, refresh: Option<&str>) -> Result<(), TokenStoreError>;

    fn clear(&mut self) -> Result<(), TokenStoreError>;
}

/// Session-only store, used by tests and by `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: BTreeMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> TokenPair {
        pair_from_entries(&self.entries)
    }

    fn set(&mut self, access: &str, refresh: Option<&str>) -> Result<(), TokenStoreError> {
        write_entries(&mut self.entries, access, refresh);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), TokenStoreError> {
        self.entries.clear();
        Ok(())
    }
}

/// Key-value JSON file holding the two token entries under fixed names.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileTokenStore {
    /// Loads the store from `path`. A missing file is an empty store; a file that
    /// cannot be read or parsed is reported and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring corrupt token file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read token file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        debug!(
            "Opened token store at {} ({} entries)",
            path.display(),
            entries.len()
        );
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), TokenStoreError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TokenStoreError::Write(self.path.clone(), e))?;
        }
        fs::write(&self.path, json).map_err(|e| TokenStoreError::Write(self.path.clone(), e))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> TokenPair {
        pair_from_entries(&self.entries)
    }

    fn set(&mut self, access: &str, refresh: Option<&str>) -> Result<(), TokenStoreError> {
        write_entries(&mut self.entries, access, refresh);
        self.persist()
    }

    fn clear(&mut self) -> Result<(), TokenStoreError> {
        self.entries.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStoreError::Remove(self.path.clone(), e)),
        }
    }
}

fn pair_from_entries(entries: &BTreeMap<String, String>) -> TokenPair {
    TokenPair {
        access: entries.get(ACCESS_TOKEN_KEY).cloned(),
        refresh: entries.get(REFRESH_TOKEN_KEY).cloned(),
    }
}

fn write_entries(entries: &mut BTreeMap<String, String>, access: &str, refresh: Option<&str>) {
    entries.insert(ACCESS_TOKEN_KEY.to_string(), access.to_string());
    if let Some(refresh) = refresh {
        entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh.to_string());
    }
}
