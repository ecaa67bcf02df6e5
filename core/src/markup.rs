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

//! HTML presentation of rendered fragments and console entries, using the
//! `console-entry` / `data-table` classes the web front end styles.

use crate::console::{ConsoleEntry, EntryBody};
use crate::render::{Fragment, Row, Table};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn fragment_to_html(fragment: &Fragment) -> String {
    let mut html = format!("<h3>{}</h3>", escape(&fragment.heading));
    for section in &fragment.sections {
        if let Some(title) = &section.title {
            html.push_str(&format!("<h4>{}</h4>", escape(title)));
        }
        html.push_str(&table_to_html(&section.table));
    }
    html
}

fn table_to_html(table: &Table) -> String {
    let mut html = String::from("<table class=\"data-table\">");
    let span = table.columns.len().max(2);

    if !table.columns.is_empty() {
        html.push_str("<tr>");
        for column in &table.columns {
            html.push_str(&format!("<th>{}</th>", escape(column)));
        }
        html.push_str("</tr>");
    }

    for row in &table.rows {
        match row {
            Row::Labeled { label, value } => html.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                escape(label),
                escape(value)
            )),
            Row::Cells(cells) => {
                html.push_str("<tr>");
                for cell in cells {
                    html.push_str(&format!("<td>{}</td>", escape(cell)));
                }
                html.push_str("</tr>");
            }
            Row::NoData(message) => html.push_str(&format!(
                "<tr><td colspan=\"{}\" class=\"no-data\">{}</td></tr>",
                span,
                escape(message)
            )),
        }
    }

    html.push_str("</table>");
    html
}

pub fn entry_to_html(entry: &ConsoleEntry) -> String {
    let body = match &entry.body {
        EntryBody::Message(text) => escape(text),
        EntryBody::Fragment(fragment) => fragment_to_html(fragment),
    };
    format!(
        "<div class=\"console-entry\"><div class=\"timestamp\">{}</div>{}</div>",
        escape(&entry.timestamp),
        body
    )
}

/// The whole log, newest entry first.
pub fn console_to_html<'a>(entries: impl IntoIterator<Item = &'a ConsoleEntry>) -> String {
    entries.into_iter().map(entry_to_html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Section;

    #[test]
    fn test_escape_blocks_markup_injection() {
        assert_eq!(
            escape("<script>alert('x')</script> & \"q\""),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; &quot;q&quot;"
        );
    }

    #[test]
    fn test_fragment_markup_uses_data_table() {
        let fragment = Fragment {
            heading: "Spotify Profile Data".to_string(),
            sections: vec![Section {
                title: None,
                table: Table {
                    columns: Vec::new(),
                    rows: vec![Row::Labeled {
                        label: "Display Name".to_string(),
                        value: "<b>me</b>".to_string(),
                    }],
                },
            }],
        };

        assert_eq!(
            fragment_to_html(&fragment),
            "<h3>Spotify Profile Data</h3><table class=\"data-table\">\
             <tr><th>Display Name</th><td>&lt;b&gt;me&lt;/b&gt;</td></tr></table>"
        );
    }

    #[test]
    fn test_entry_markup_wraps_message_with_timestamp() {
        let entry = ConsoleEntry {
            timestamp: "10:00:00".to_string(),
            body: EntryBody::Message("Console cleared.".to_string()),
        };
        assert_eq!(
            entry_to_html(&entry),
            "<div class=\"console-entry\"><div class=\"timestamp\">10:00:00</div>Console cleared.</div>"
        );
    }

    #[test]
    fn test_no_data_row_spans_columns() {
        let table = Table {
            columns: vec!["#".into(), "Track".into(), "Artist".into(), "Album".into()],
            rows: vec![Row::NoData("No data available".to_string())],
        };
        assert!(table_to_html(&table).contains("<td colspan=\"4\" class=\"no-data\">No data available</td>"));
    }
}
