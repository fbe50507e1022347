//! Minimal HTML table extraction for the police `.xls` exports.
//!
//! The exports are HTML documents with a single `<table>`; the first row
//! carries the column names. Only the first table of a document is read.

use std::sync::OnceLock;

use regex::Regex;

/// Headers and text cells of one HTML table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").expect("regex is valid"))
}

fn row_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<tr\b[^>]*>").expect("regex is valid"))
}

fn cell_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<t[dh]\b[^>]*>").expect("regex is valid"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("regex is valid"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("regex is valid")
    })
}

/// Parse the first `<table>` in `html`.
///
/// Returns `None` when the document has no table or the table has no rows.
/// Unclosed `<tr>`/`<td>` elements are tolerated.
pub fn parse_first_table(html: &str) -> Option<HtmlTable> {
    let body = table_re().captures(html)?.get(1)?.as_str();

    let mut rows = row_start_re()
        .split(body)
        .skip(1)
        .map(parse_row)
        .filter(|cells| !cells.is_empty());

    let headers = rows.next()?;
    Some(HtmlTable {
        headers,
        rows: rows.collect(),
    })
}

fn parse_row(fragment: &str) -> Vec<String> {
    cell_start_re()
        .split(fragment)
        .skip(1)
        .map(cell_text)
        .collect()
}

/// Strip markup, decode entities and collapse whitespace.
fn cell_text(fragment: &str) -> String {
    let without_tags = tag_re().replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let hex = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"));
            let decoded = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "nbsp" => Some(' '),
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
