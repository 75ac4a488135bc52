//! Rendering of the record store for people: a console grid table and the
//! HTML page served at `/read`.

use crate::record::RecordStore;

/// Page template for the HTML view.
const READ_TEMPLATE: &str = include_str!("../templates/read.html");

/// Header of the first table column.
const TIMESTAMP_HEADER: &str = "Timestamp";

/// Render the store as a grid table.
///
/// The first column is the record timestamp, followed by one column per field
/// name. Columns are the union of all field names in first-seen order; a
/// record without a given field shows an empty cell.
#[must_use]
pub fn render_table(store: &RecordStore) -> String {
    let columns = store.columns();

    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
    header.push(TIMESTAMP_HEADER);
    header.extend(columns.iter().copied());

    let rows: Vec<Vec<&str>> = store
        .iter()
        .map(|(key, record)| {
            let mut row = Vec::with_capacity(header.len());
            row.push(key);
            row.extend(columns.iter().map(|c| record.get(c).unwrap_or("")));
            row
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_rule(&mut out, &widths, '-');
    push_row(&mut out, &widths, &header);
    push_rule(&mut out, &widths, '=');
    for row in &rows {
        push_row(&mut out, &widths, row);
        push_rule(&mut out, &widths, '-');
    }
    out
}

fn push_rule(out: &mut String, widths: &[usize], fill: char) {
    out.push('+');
    for width in widths {
        out.extend(std::iter::repeat(fill).take(width + 2));
        out.push('+');
    }
    out.push('\n');
}

fn push_row(out: &mut String, widths: &[usize], cells: &[&str]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width - cell.chars().count();
        out.push_str(&format!(" {cell}{} |", " ".repeat(pad)));
    }
    out.push('\n');
}

/// Render the store into the `/read` page.
///
/// Each record becomes one row holding its timestamp and its fields as
/// `name: value` lines. All stored text is HTML-escaped.
#[must_use]
pub fn render_html(store: &RecordStore) -> String {
    let mut rows = String::new();

    if store.is_empty() {
        rows.push_str("                <tr><td colspan=\"2\">No messages yet</td></tr>\n");
    }

    for (key, record) in store.iter() {
        rows.push_str("                <tr>\n");
        rows.push_str(&format!(
            "                    <td class=\"timestamp\">{}</td>\n",
            escape_html(key)
        ));
        rows.push_str("                    <td>\n");
        for (name, value) in record.iter() {
            rows.push_str(&format!(
                "                        <div><strong>{}:</strong> {}</div>\n",
                escape_html(name),
                escape_html(value)
            ));
        }
        rows.push_str("                    </td>\n");
        rows.push_str("                </tr>\n");
    }

    READ_TEMPLATE
        .replace("{{count}}", &store.len().to_string())
        .replace("{{rows}}", rows.trim_end_matches('\n'))
}

/// Escape text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
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
