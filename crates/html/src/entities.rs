//! HTML entity decoding
//!
//! Handles named entities like &amp;, &lt;, &gt; and numeric references.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// Map of HTML entity names to their character values
static ENTITIES: LazyLock<FxHashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = FxHashMap::default();

    m.insert("amp", "&");
    m.insert("lt", "<");
    m.insert("gt", ">");
    m.insert("quot", "\"");
    m.insert("apos", "'");
    m.insert("nbsp", "\u{00A0}");
    m.insert("copy", "\u{00A9}");
    m.insert("reg", "\u{00AE}");
    m.insert("deg", "\u{00B0}");
    m.insert("middot", "\u{00B7}");
    m.insert("laquo", "\u{00AB}");
    m.insert("raquo", "\u{00BB}");
    m.insert("times", "\u{00D7}");
    m.insert("ndash", "\u{2013}");
    m.insert("mdash", "\u{2014}");
    m.insert("hellip", "\u{2026}");
    m.insert("euro", "\u{20AC}");
    m.insert("trade", "\u{2122}");

    m
});

/// Decode a named entity (without `&` and `;`)
pub fn decode_entity(name: &str) -> Option<&'static str> {
    ENTITIES.get(name).copied()
}

/// Decode a numeric reference body such as `#65` or `#x41`
pub fn decode_numeric(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    match code {
        0 => Some('\u{FFFD}'),
        _ => char::from_u32(code).or(Some('\u{FFFD}')),
    }
}
