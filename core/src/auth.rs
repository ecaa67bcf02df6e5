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

use crate::session::Session;
use crate::tokens::TokenStoreError;
use log::{info, warn};
use reqwest::Url;
use thiserror::Error;

pub const STATUS_DEFAULT: &str = "Not logged in";
pub const STATUS_CONNECTING: &str = "Connecting to Spotify...";
pub const STATUS_LOGGED_OUT: &str = "Logged out.";
pub const LOGOUT_MESSAGE: &str = "Logged out. Your tokens have been cleared.";

#[derive(Error, Debug)]
pub enum AuthError {
    /// The authorization endpoint redirected back with `?error=...`.
    #[error("Authentication error: {0}")]
    Redirect(String),
    #[error("Could not update saved tokens: {0}")]
    Store(#[from] TokenStoreError),
}

/// Where the client "is" and how it moves: the current location, full
/// navigations away (login) and in-place rewrites of the visible location.
pub trait Navigator: Send {
    fn location(&self) -> String;

    /// Leaves the client for `url`. Not cancellable.
    fn navigate(&mut self, url: &Url);

    /// Replaces the visible location without navigating.
    fn replace_location(&mut self, url: &str);
}

/// The status line and whether the data actions are offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegion {
    pub text: String,
    pub actions_visible: bool,
}

impl Default for StatusRegion {
    fn default() -> Self {
        Self {
            text: STATUS_DEFAULT.to_string(),
            actions_visible: false,
        }
    }
}

impl Session {
    /// Sends the user to the gateway's authorization entry point. Tokens are
    /// untouched; they arrive later through the redirect handled by `bootstrap`.
    pub fn login(&mut self) {
        let url = self.fetcher.config().auth_url();
        info!("Redirecting to authorization endpoint {}", url);
        self.status.text = STATUS_CONNECTING.to_string();
        self.navigator.navigate(&url);
    }

    /// Forgets the stored tokens and hides the data actions. Calling it again
    /// yields the same state and message.
    pub fn logout(&mut self) {
        if let Err(e) = self.tokens.clear() {
            let err = AuthError::from(e);
            warn!("{}", err);
            self.console.push_message(format!("Warning: {}", err));
        }
        self.status.text = STATUS_LOGGED_OUT.to_string();
        self.status.actions_visible = false;
        self.console.push_message(LOGOUT_MESSAGE);
        info!("Logged out");
    }
}
