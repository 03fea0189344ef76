//! Output template rendering.
//!
//! Supports the subset of yt-dlp's `%(field)s` syntax needed to predict where a
//! download lands: `%(name)s`, `%(name)d` and the `%%` escape. Fields that are
//! missing or null render as `NA`, and path separators inside field values are
//! replaced so a value can never introduce a directory.

use crate::info::MediaInfo;
use serde_json::Value;

/// Placeholder for missing fields.
pub const MISSING_FIELD: &str = "NA";

/// Extension placeholder appended to explicit filenames.
pub const EXT_PLACEHOLDER: &str = "%(ext)s";

/// Render `template` against `info`.
pub fn render(template: &str, info: &MediaInfo) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("%%") {
            out.push('%');
            rest = tail;
            continue;
        }

        match parse_field(rest) {
            Some((name, conversion, consumed)) => {
                out.push_str(&format_field(info.get(name), conversion));
                rest = &rest[consumed..];
            }
            None => {
                out.push('%');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parse `%(name)<flags><conv>` at the start of `s`.
///
/// Returns the field name, conversion character and bytes consumed.
fn parse_field(s: &str) -> Option<(&str, char, usize)> {
    let body = s.strip_prefix("%(")?;
    let close = body.find(')')?;
    let name = &body[..close];

    let after = &body[close + 1..];
    let (offset, conversion) = after.char_indices().find(|(_, c)| c.is_ascii_alphabetic())?;

    // only width/precision/flag characters may sit between `)` and the conversion
    if !after[..offset]
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | ' ' | '#'))
    {
        return None;
    }

    let consumed = 2 + close + 1 + offset + conversion.len_utf8();
    Some((name, conversion, consumed))
}

fn format_field(value: Option<&Value>, conversion: char) -> String {
    let raw = match value {
        None => return MISSING_FIELD.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if conversion == 'd' => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|i| i.to_string())
            .unwrap_or_else(|| n.to_string()),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    };

    raw.replace(['/', '\\'], "_")
}
