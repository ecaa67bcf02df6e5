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

//! Test doubles shared by the unit tests.

use crate::auth::Navigator;
use crate::fetch::{HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&Url) -> (Duration, Result<HttpResponse, TransportError>) + Send + Sync;

pub struct StubTransport {
    responder: Box<Responder>,
    calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

impl StubTransport {
    pub fn with<F>(responder: F) -> Self
    where
        F: Fn(&Url) -> (Duration, Result<HttpResponse, TransportError>) + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn ok(body: &str) -> Self {
        let body = body.to_string();
        Self::with(move |_| {
            (
                Duration::ZERO,
                Ok(HttpResponse {
                    status: 200,
                    body: body.clone(),
                }),
            )
        })
    }

    pub fn status(status: u16) -> Self {
        Self::with(move |_| {
            (
                Duration::ZERO,
                Ok(HttpResponse {
                    status,
                    body: String::new(),
                }),
            )
        })
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::with(move |_| (Duration::ZERO, Err(TransportError(message.clone()))))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());
        let (delay, result) = (self.responder)(url);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

/// Records navigations instead of opening a browser.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    pub location: Arc<Mutex<String>>,
    pub visited: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn at(location: &str) -> Self {
        let nav = Self::default();
        *nav.location.lock().unwrap() = location.to_string();
        nav
    }

    pub fn current(&self) -> String {
        self.location.lock().unwrap().clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn location(&self) -> String {
        self.current()
    }

    fn navigate(&mut self, url: &Url) {
        self.visited.lock().unwrap().push(url.to_string());
    }

    fn replace_location(&mut self, url: &str) {
        *self.location.lock().unwrap() = url.to_string();
    }
}
