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

use crate::render::Fragment;
use std::collections::VecDeque;
use std::fmt;

pub const CLEARED_MESSAGE: &str = "Console cleared.";

#[derive(Debug, Clone, PartialEq)]
pub enum EntryBody {
    Message(String),
    Fragment(Fragment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleEntry {
    pub timestamp: String,
    pub body: EntryBody,
}

impl ConsoleEntry {
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            EntryBody::Message(text) => Some(text.as_str()),
            EntryBody::Fragment(_) => None,
        }
    }
}

impl fmt::Display for ConsoleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            EntryBody::Message(text) => writeln!(f, "[{}] {}", self.timestamp, text),
            EntryBody::Fragment(fragment) => {
                writeln!(f, "[{}]", self.timestamp)?;
                write!(f, "{}", fragment)
            }
        }
    }
}

fn local_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Newest-first log of status messages and rendered results.
///
/// Entries are only ever prepended; `clear` swaps the whole log for a single
/// "Console cleared." entry.
pub struct ConsoleLog {
    entries: VecDeque<ConsoleEntry>,
    clock: fn() -> String,
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConsoleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLog")
            .field("entries", &self.entries)
            .finish()
    }
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::with_clock(local_time)
    }

    pub fn with_clock(clock: fn() -> String) -> Self {
        Self {
            entries: VecDeque::new(),
            clock,
        }
    }

    pub fn push_message(&mut self, text: impl Into<String>) {
        self.push(EntryBody::Message(text.into()));
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        self.push(EntryBody::Fragment(fragment));
    }

    fn push(&mut self, body: EntryBody) {
        self.entries.push_front(ConsoleEntry {
            timestamp: (self.clock)(),
            body,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.push_message(CLEARED_MESSAGE);
    }

    /// Entries newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ConsoleEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
