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

//! Pure mapping from decoded payloads to a small render tree: a heading followed
//! by titled tables. Presentation layers turn the tree into text or markup.

use crate::models::{Analysis, AnalysisResponse, Payload, ProfileResponse, TracksResponse};
use std::cmp::Ordering;
use std::fmt;

pub const MAX_TRACK_ROWS: usize = 10;
pub const MAX_GENRE_ROWS: usize = 10;

pub const NO_DATA: &str = "No data available";
pub const NOT_AVAILABLE: &str = "Not available";

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub heading: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: Option<String>,
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column headings; empty for label/value tables.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Labeled { label: String, value: String },
    Cells(Vec<String>),
    NoData(String),
}

impl Table {
    fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push_cells<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(Row::Cells(cells.into_iter().map(Into::into).collect()));
    }

    fn push_labeled(&mut self, label: &str, value: impl Into<String>) {
        self.rows.push(Row::Labeled {
            label: label.to_string(),
            value: value.into(),
        });
    }

    /// Guarantees the table never renders empty.
    fn or_no_data(mut self) -> Self {
        if self.rows.is_empty() {
            self.rows.push(Row::NoData(NO_DATA.to_string()));
        }
        self
    }

    /// Number of data rows, not counting a "no data" placeholder.
    pub fn data_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| !matches!(r, Row::NoData(_)))
            .count()
    }
}

pub fn render(payload: &Payload) -> Fragment {
    match payload {
        Payload::Profile(p) => render_profile(p),
        Payload::Tracks(t) => render_tracks(t),
        Payload::Analysis(a) => render_analysis(a),
    }
}

pub fn render_profile(resp: &ProfileResponse) -> Fragment {
    let mut table = Table::default();

    if let Some(profile) = &resp.profile {
        table.push_labeled(
            "Display Name",
            profile.display_name.as_deref().unwrap_or(NOT_AVAILABLE),
        );
        table.push_labeled(
            "Followers",
            profile
                .followers_total()
                .map(|n| n.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        );
        table.push_labeled("Email", non_empty(profile.email.as_deref()));
        table.push_labeled("Country", non_empty(profile.country.as_deref()));
    }

    Fragment {
        heading: "Spotify Profile Data".to_string(),
        sections: vec![Section {
            title: None,
            table: table.or_no_data(),
        }],
    }
}

pub fn render_tracks(resp: &TracksResponse) -> Fragment {
    let mut table = Table::with_columns(&["#", "Track", "Artist", "Album"]);

    for (i, track) in resp.items().iter().take(MAX_TRACK_ROWS).enumerate() {
        table.push_cells([
            (i + 1).to_string(),
            track.name.clone(),
            track.artist_names().join(", "),
            track.album_name().to_string(),
        ]);
    }

    Fragment {
        heading: "Your Top Tracks".to_string(),
        sections: vec![Section {
            title: None,
            table: table.or_no_data(),
        }],
    }
}

pub fn render_analysis(resp: &AnalysisResponse) -> Fragment {
    let empty = Analysis::default();
    let analysis = resp.analysis.as_ref().unwrap_or(&empty);

    let mut genres = Table::with_columns(&["Genre", "Percentage"]);
    for (name, pct) in top_genres(analysis) {
        genres.push_cells([name.to_string(), format!("{}%", format_number(pct))]);
    }

    let mut sections = vec![Section {
        title: Some("Top Genres".to_string()),
        table: genres.or_no_data(),
    }];

    if let Some(artists) = &analysis.top_artists {
        let mut table = Table::with_columns(&["Artist", "Popularity"]);
        for artist in artists {
            table.push_cells([
                artist.name.clone(),
                artist
                    .popularity
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ]);
        }
        sections.push(Section {
            title: Some("Top Artists".to_string()),
            table: table.or_no_data(),
        });
    }

    if let Some(features) = &analysis.audio_features {
        let mut table = Table::with_columns(&["Feature", "Score"]);
        let scores = [
            ("Energy", features.energy),
            ("Danceability", features.danceability),
            ("Positivity (Valence)", features.valence),
        ];
        for (label, score) in scores {
            if let Some(score) = score {
                table.push_cells([label.to_string(), format!("{}%", format_number(score))]);
            }
        }
        sections.push(Section {
            title: Some("Audio Features".to_string()),
            table: table.or_no_data(),
        });
    }

    Fragment {
        heading: "Your Music Analysis".to_string(),
        sections,
    }
}

/// Genres by share, highest first. Equal shares keep the order the endpoint sent.
fn top_genres(analysis: &Analysis) -> Vec<(&str, f64)> {
    let mut genres = analysis.genre_shares();
    genres.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    genres.truncate(MAX_GENRE_ROWS);
    genres
}

fn non_empty(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NOT_AVAILABLE)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        writeln!(f, "{}", "=".repeat(self.heading.chars().count()))?;
        for section in &self.sections {
            if let Some(title) = &section.title {
                writeln!(f)?;
                writeln!(f, "{}", title)?;
            }
            write!(f, "{}", section.table)?;
        }
        Ok(())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid: Vec<Vec<&str>> = self
            .rows
            .iter()
            .filter_map(|row| match row {
                Row::Labeled { label, value } => Some(vec![label.as_str(), value.as_str()]),
                Row::Cells(cells) => Some(cells.iter().map(String::as_str).collect()),
                Row::NoData(_) => None,
            })
            .collect();

        let header: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let cols = grid
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; cols];
        for line in grid.iter().chain(std::iter::once(&header)) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        if !header.is_empty() {
            write_line(f, &header, &widths)?;
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            writeln!(f, "{}", rule.join("-+-"))?;
        }

        let mut grid_rows = grid.iter();
        for row in &self.rows {
            match row {
                Row::NoData(message) => writeln!(f, "({})", message)?,
                _ => {
                    if let Some(line) = grid_rows.next() {
                        write_line(f, line, &widths)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[&str], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    writeln!(f, "{}", padded.join(" | ").trim_end())
}
