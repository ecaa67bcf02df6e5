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

use crate::auth::{AuthError, Navigator, StatusRegion};
use crate::console::ConsoleLog;
use crate::fetch::{DataFetcher, FetchError};
use crate::models::{DataKind, Payload};
use crate::query::{strip_query, QueryParams};
use crate::render::render;
use crate::tokens::{TokenPair, TokenStore};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use std::fmt;

pub const STATUS_LOGGED_IN: &str = "Logged in successfully!";
pub const STATUS_ALREADY_LOGGED_IN: &str = "Already logged in!";
pub const LOGIN_MESSAGE: &str =
    "Successfully logged in with Spotify! Use the data actions to fetch your data.";
pub const RESUMED_MESSAGE: &str =
    "You're already logged in! Use the data actions to fetch your data.";

/// How the session started, decided once from the location it was opened at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The authorization endpoint reported an error. Wins over any token.
    AuthError(String),
    /// Tokens arrived with the redirect and were stored.
    FreshLogin,
    /// No tokens in the location, but a stored access token exists.
    ResumedSession,
    Anonymous,
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapOutcome::AuthError(e) => write!(f, "authentication error ({})", e),
            BootstrapOutcome::FreshLogin => f.write_str("fresh login"),
            BootstrapOutcome::ResumedSession => f.write_str("resumed session"),
            BootstrapOutcome::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// The client context: token storage, the fetcher, the navigator, the status
/// region and the console log. Built once at startup and never rebuilt.
pub struct Session {
    pub(crate) tokens: Box<dyn TokenStore>,
    pub(crate) fetcher: DataFetcher,
    pub(crate) navigator: Box<dyn Navigator>,
    pub(crate) console: ConsoleLog,
    pub(crate) status: StatusRegion,
    outcome: Option<BootstrapOutcome>,
}

impl Session {
    pub fn new(
        tokens: Box<dyn TokenStore>,
        fetcher: DataFetcher,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        Self {
            tokens,
            fetcher,
            navigator,
            console: ConsoleLog::new(),
            status: StatusRegion::default(),
            outcome: None,
        }
    }

    pub fn with_console(mut self, console: ConsoleLog) -> Self {
        self.console = console;
        self
    }

    pub fn status(&self) -> &StatusRegion {
        &self.status
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    pub fn tokens(&self) -> TokenPair {
        self.tokens.get()
    }

    pub fn location(&self) -> String {
        self.navigator.location()
    }

    pub fn outcome(&self) -> Option<&BootstrapOutcome> {
        self.outcome.as_ref()
    }

    /// Decides the initial state from the current location. Only the first call
    /// does any work; later calls return the same outcome.
    pub fn bootstrap(&mut self) -> BootstrapOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let location = self.navigator.location();
        let params = QueryParams::extract(&location);
        debug!("Bootstrapping from {:?}", params);

        let outcome = if let Some(error) = params.error {
            self.start_with_error(error)
        } else if let Some(access) = params.access_token {
            self.start_fresh_login(&location, &access, params.refresh_token.as_deref())
        } else if self.tokens.get().is_logged_in() {
            self.status.text = STATUS_ALREADY_LOGGED_IN.to_string();
            self.status.actions_visible = true;
            self.console.push_message(RESUMED_MESSAGE);
            BootstrapOutcome::ResumedSession
        } else {
            BootstrapOutcome::Anonymous
        };

        info!("Session started: {}", outcome);
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn start_with_error(&mut self, error: String) -> BootstrapOutcome {
        let err = AuthError::Redirect(error.clone());
        warn!("{}", err);
        self.status.text = format!("Error: {}", error);
        self.console.push_message(err.to_string());
        BootstrapOutcome::AuthError(error)
    }

    fn start_fresh_login(
        &mut self,
        location: &str,
        access: &str,
        refresh: Option<&str>,
    ) -> BootstrapOutcome {
        if let Err(e) = self.tokens.set(access, refresh) {
            let err = AuthError::from(e);
            warn!("{}", err);
            self.console.push_message(format!("Warning: {}", err));
        }

        self.status.text = STATUS_LOGGED_IN.to_string();
        self.status.actions_visible = true;
        self.console.push_message(LOGIN_MESSAGE);

        // Keep tokens out of history, shared links and referrers.
        self.navigator.replace_location(&strip_query(location));
        BootstrapOutcome::FreshLogin
    }

    /// Fetches `kind` and appends the rendered result, or the failure, to the log.
    ///
    /// Without a stored access token this returns `NotAuthenticated` before any
    /// request is made. Dropping the returned future abandons the request.
    pub async fn fetch(&mut self, kind: DataKind) -> Result<Payload, FetchError> {
        let Some(token) = self.tokens.get().access else {
            return Err(self.not_authenticated(kind));
        };

        self.console.push_message(fetching_message(kind));
        let result = self.fetcher.fetch(kind, &token).await;
        record_outcome(&mut self.console, kind, &result);
        result
    }

    /// Fetches every kind at once. Results are logged in the order they complete,
    /// which need not be the order they were requested in.
    pub async fn fetch_all(&mut self) -> Vec<(DataKind, Result<Payload, FetchError>)> {
        let Some(token) = self.tokens.get().access else {
            let err = self.not_authenticated(DataKind::Profile);
            return DataKind::ALL.into_iter().map(|k| (k, Err(err.clone()))).collect();
        };

        for kind in DataKind::ALL {
            self.console.push_message(fetching_message(kind));
        }

        let fetcher = &self.fetcher;
        let token = token.as_str();
        let mut pending: FuturesUnordered<_> = DataKind::ALL
            .into_iter()
            .map(|kind| async move { (kind, fetcher.fetch(kind, token).await) })
            .collect();

        let mut results = Vec::with_capacity(DataKind::ALL.len());
        while let Some((kind, result)) = pending.next().await {
            record_outcome(&mut self.console, kind, &result);
            results.push((kind, result));
        }
        results
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
    }

    fn not_authenticated(&mut self, kind: DataKind) -> FetchError {
        let err = FetchError::NotAuthenticated;
        self.console.push_message(err.console_message(kind));
        err
    }
}

fn fetching_message(kind: DataKind) -> String {
    format!("Fetching your {} data...", kind)
}

fn record_outcome(console: &mut ConsoleLog, kind: DataKind, result: &Result<Payload, FetchError>) {
    match result {
        Ok(payload) => console.push_fragment(render(payload)),
        Err(e) => {
            warn!("Fetching {} failed: {}", kind, e);
            console.push_message(e.console_message(kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::STATUS_DEFAULT;
    use crate::config::Config;
    use crate::console::{ConsoleLog, EntryBody};
    use crate::fetch::HttpResponse;
    use crate::testing::{RecordingNavigator, StubTransport};
    use crate::tokens::{FileTokenStore, MemoryTokenStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn build(location: &str, tokens: MemoryTokenStore, transport: Arc<StubTransport>) -> (Session, RecordingNavigator) {
        build_with_store(location, Box::new(tokens), transport)
    }

    fn build_with_store(
        location: &str,
        tokens: Box<dyn TokenStore>,
        transport: Arc<StubTransport>,
    ) -> (Session, RecordingNavigator) {
        let nav = RecordingNavigator::at(location);
        let config = Config::new("https://api.example.com/prod", "unused.json").unwrap();
        let fetcher = DataFetcher::new(config, transport);
        let session = Session::new(tokens, fetcher, Box::new(nav.clone()));
        (session, nav)
    }

    fn fixed_clock() -> String {
        "09:30:00".to_string()
    }

    fn logged_in_store() -> MemoryTokenStore {
        let mut tokens = MemoryTokenStore::new();
        tokens.set("ABC123", None).unwrap();
        tokens
    }

    fn messages(session: &Session) -> Vec<String> {
        session
            .console()
            .entries()
            .filter_map(|e| e.message().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_fresh_login_end_to_end() {
        let (session, nav) = build(
            "http://localhost:8080/?access_token=ABC123",
            MemoryTokenStore::new(),
            Arc::new(StubTransport::ok("{}")),
        );
        let mut session = session.with_console(ConsoleLog::with_clock(fixed_clock));
        assert!(session.outcome().is_none());

        assert_eq!(session.bootstrap(), BootstrapOutcome::FreshLogin);
        assert_eq!(session.outcome(), Some(&BootstrapOutcome::FreshLogin));
        assert_eq!(session.status().text, "Logged in successfully!");
        assert!(session.status().actions_visible);
        assert_eq!(session.console().len(), 1);
        assert_eq!(session.console().latest().unwrap().timestamp, "09:30:00");
        assert_eq!(session.tokens().access.as_deref(), Some("ABC123"));
        assert!(session.tokens().refresh.is_none());
        assert_eq!(nav.current(), "http://localhost:8080/");
        assert_eq!(session.location(), "http://localhost:8080/");
    }

    #[test]
    fn test_fresh_login_survives_unwritable_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _nav) = build_with_store(
            "/?access_token=ABC123",
            Box::new(FileTokenStore::open(dir.path())),
            Arc::new(StubTransport::ok("{}")),
        );

        assert_eq!(session.bootstrap(), BootstrapOutcome::FreshLogin);
        assert_eq!(session.tokens().access.as_deref(), Some("ABC123"));
        assert!(session.status().actions_visible);
        assert_eq!(session.location(), "/");

        let logged = messages(&session);
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0], LOGIN_MESSAGE);
        assert!(logged[1].starts_with("Warning: Could not update saved tokens: Failed to write token file"));
    }

    #[test]
    fn test_fresh_login_stores_refresh_token() {
        let (mut session, nav) = build(
            "/callback?access_token=A&refresh_token=R&state=1",
            MemoryTokenStore::new(),
            Arc::new(StubTransport::ok("{}")),
        );

        session.bootstrap();
        assert_eq!(session.tokens().refresh.as_deref(), Some("R"));
        assert_eq!(nav.current(), "/callback");
    }

    #[test]
    fn test_auth_error_end_to_end() {
        let (mut session, nav) = build(
            "http://localhost:8080/?error=access_denied",
            MemoryTokenStore::new(),
            Arc::new(StubTransport::ok("{}")),
        );

        let outcome = session.bootstrap();
        assert_eq!(outcome, BootstrapOutcome::AuthError("access_denied".to_string()));
        assert!(session.status().text.contains("access_denied"));
        assert!(!session.status().actions_visible);
        assert!(!session.tokens().is_logged_in());
        assert_eq!(messages(&session), vec!["Authentication error: access_denied"]);
        assert_eq!(nav.current(), "http://localhost:8080/?error=access_denied");
    }

    #[test]
    fn test_error_wins_over_token_and_leaves_store_untouched() {
        let mut tokens = MemoryTokenStore::new();
        tokens.set("OLD", Some("OLD_REFRESH")).unwrap();
        let (mut session, nav) = build(
            "/?access_token=NEW&refresh_token=NEW_R&error=server_error",
            tokens,
            Arc::new(StubTransport::ok("{}")),
        );

        assert!(matches!(session.bootstrap(), BootstrapOutcome::AuthError(_)));
        assert_eq!(session.tokens().access.as_deref(), Some("OLD"));
        assert_eq!(session.tokens().refresh.as_deref(), Some("OLD_REFRESH"));
        assert!(nav.current().contains("access_token=NEW"));
    }

    #[test]
    fn test_resumed_session() {
        let (mut session, nav) = build("http://localhost/", logged_in_store(), Arc::new(StubTransport::ok("{}")));

        assert_eq!(session.bootstrap(), BootstrapOutcome::ResumedSession);
        assert_eq!(session.status().text, STATUS_ALREADY_LOGGED_IN);
        assert!(session.status().actions_visible);
        assert_eq!(messages(&session), vec![RESUMED_MESSAGE]);
        assert_eq!(nav.current(), "http://localhost/");
    }

    #[test]
    fn test_anonymous_leaves_defaults() {
        let (mut session, _nav) = build("http://localhost/?foo=bar", MemoryTokenStore::new(), Arc::new(StubTransport::ok("{}")));

        assert_eq!(session.bootstrap(), BootstrapOutcome::Anonymous);
        assert_eq!(session.status().text, STATUS_DEFAULT);
        assert!(!session.status().actions_visible);
        assert!(session.console().is_empty());
    }

    #[test]
    fn test_bootstrap_runs_once() {
        let (mut session, _nav) = build("/?access_token=ABC123", MemoryTokenStore::new(), Arc::new(StubTransport::ok("{}")));

        session.bootstrap();
        session.logout();
        assert_eq!(session.bootstrap(), BootstrapOutcome::FreshLogin);
        assert!(!session.tokens().is_logged_in());
        assert_eq!(session.console().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_without_token_makes_no_request() {
        let transport = Arc::new(StubTransport::ok("{}"));
        let (mut session, _nav) = build("http://localhost/", MemoryTokenStore::new(), transport.clone());

        for kind in DataKind::ALL {
            let err = session.fetch(kind).await.unwrap_err();
            assert_eq!(err, FetchError::NotAuthenticated);
        }

        assert_eq!(transport.calls(), 0);
        assert_eq!(session.console().len(), 3);
        assert_eq!(
            messages(&session)[0],
            "Error: Not logged in. Please login with Spotify first."
        );
    }

    #[tokio::test]
    async fn test_fetch_logs_progress_then_rendered_result() {
        let transport = Arc::new(StubTransport::ok(
            r#"{"topTracks": {"items": [{"name": "Song", "artists": [{"name": "A"}], "album": {"name": "B"}}]}}"#,
        ));
        let (mut session, _nav) = build("http://localhost/", logged_in_store(), transport.clone());

        session.fetch(DataKind::Tracks).await.unwrap();

        let entries: Vec<_> = session.console().entries().collect();
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0].body, EntryBody::Fragment(f) if f.heading == "Your Top Tracks"));
        assert_eq!(entries[1].message(), Some("Fetching your tracks data..."));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_logs_once_and_keeps_state() {
        let transport = Arc::new(StubTransport::status(500));
        let (mut session, _nav) = build("http://localhost/", logged_in_store(), transport);
        session.bootstrap();
        let status_before = session.status().clone();

        let err = session.fetch(DataKind::Profile).await.unwrap_err();

        assert_eq!(err, FetchError::Http { status: 500 });
        assert_eq!(
            messages(&session)[..2],
            [
                "Error fetching profile: HTTP error 500".to_string(),
                "Fetching your profile data...".to_string()
            ]
        );
        assert_eq!(session.console().len(), 3);
        assert_eq!(session.status(), &status_before);
        assert_eq!(session.tokens().access.as_deref(), Some("ABC123"));
    }

    async fn assert_failure_logged_once(transport: StubTransport, kind: DataKind) -> (FetchError, String) {
        let (mut session, _nav) = build("http://localhost/", logged_in_store(), Arc::new(transport));
        session.bootstrap();
        let status_before = session.status().clone();
        let len_before = session.console().len();

        let err = session.fetch(kind).await.unwrap_err();

        // "Fetching..." plus exactly one failure entry.
        assert_eq!(session.console().len(), len_before + 2);
        assert_eq!(session.status(), &status_before);
        assert_eq!(session.tokens().access.as_deref(), Some("ABC123"));
        (err, messages(&session)[0].clone())
    }

    #[tokio::test]
    async fn test_network_failure_logs_once_and_keeps_state() {
        let (err, logged) =
            assert_failure_logged_once(StubTransport::failing("connection reset"), DataKind::Analysis).await;

        assert_eq!(err, FetchError::Network("connection reset".to_string()));
        assert_eq!(logged, "Error fetching analysis: connection reset");
    }

    #[tokio::test]
    async fn test_parse_failure_logs_once_and_keeps_state() {
        let (err, logged) = assert_failure_logged_once(StubTransport::ok("not json"), DataKind::Tracks).await;

        assert!(matches!(err, FetchError::Parse(_)));
        assert!(logged.starts_with("Error fetching tracks: Malformed response:"));
    }

    #[tokio::test]
    async fn test_fetch_all_logs_in_completion_order() {
        let transport = Arc::new(StubTransport::with(|url| {
            let (delay, body) = if url.path().ends_with("user-profile") {
                (60, r#"{"profile": {"display_name": "Me"}}"#)
            } else if url.path().ends_with("top-tracks") {
                (30, r#"{"topTracks": {"items": []}}"#)
            } else {
                (0, r#"{"analysis": {"genres": {"pop": 100}}}"#)
            };
            (
                Duration::from_millis(delay),
                Ok(HttpResponse {
                    status: 200,
                    body: body.to_string(),
                }),
            )
        }));
        let (mut session, _nav) = build("http://localhost/", logged_in_store(), transport.clone());

        let results = session.fetch_all().await;

        let order: Vec<_> = results.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec![DataKind::Analysis, DataKind::Tracks, DataKind::Profile]);
        assert_eq!(transport.calls(), 3);

        let headings: Vec<_> = session
            .console()
            .entries()
            .filter_map(|e| match &e.body {
                EntryBody::Fragment(f) => Some(f.heading.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            vec!["Spotify Profile Data", "Your Top Tracks", "Your Music Analysis"]
        );
    }

    #[tokio::test]
    async fn test_fetch_all_without_token() {
        let transport = Arc::new(StubTransport::ok("{}"));
        let (mut session, _nav) = build("http://localhost/", MemoryTokenStore::new(), transport.clone());

        let results = session.fetch_all().await;
        assert_eq!(results.len(), 3);
        assert!(results
            .iter()
            .all(|(_, r)| matches!(r, Err(FetchError::NotAuthenticated))));
        assert_eq!(transport.calls(), 0);
        assert_eq!(session.console().len(), 1);
    }
}
