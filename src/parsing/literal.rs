//! # Scalar Literal Helpers
//!
//! Small text utilities shared by the codecs: null and boolean vocabularies,
//! one-layer unquoting, backslash escapes, bracket stripping and UUID text.
//!
//! ## Quoting Rules
//!
//! | Input          | `unquote`   | `unescape(unquote(..))` |
//! |----------------|-------------|-------------------------|
//! | `'abc'`        | `abc`       | `abc`                   |
//! | `"a\"b"`       | `a\"b`      | `a"b`                   |
//! | `'abc`         | `'abc`      | n/a (not quoted)        |
//! | `abc`          | `abc`       | n/a (not quoted)        |
//!
//! Nested text renders quoting kinds with single quotes and escapes `\` and
//! `'`, so the two directions agree.

use std::borrow::Cow;

use eyre::{bail, Result};
use uuid::Uuid;

use crate::config::NULL_LITERALS;
use crate::error::CodecError;

/// Empty text or `null`/`NULL`: the row takes the kind's zero value.
pub fn is_zero_literal(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t == "null" || t == "NULL"
}

/// Any spelling of SQL NULL a Nullable column accepts.
pub fn is_null_literal(text: &str) -> bool {
    let t = text.trim();
    NULL_LITERALS.contains(&t)
}

/// Returns the inner text and whether a symmetric quote layer was removed.
pub fn strip_quotes(text: &str) -> (&str, bool) {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if matches!(first, b'\'' | b'"' | b'`') && bytes[bytes.len() - 1] == first {
            return (&text[1..text.len() - 1], true);
        }
    }
    (text, false)
}

pub fn unquote(text: &str) -> &str {
    strip_quotes(text).0
}

/// Resolve backslash escapes. Unknown escapes keep the escaped character.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// Render `text` as a single-quoted literal suitable for nested output.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Strip an unquoted string literal to its payload: one quote layer removed
/// and, when quoted, escapes resolved.
pub fn string_payload(text: &str) -> Cow<'_, str> {
    match strip_quotes(text) {
        (inner, true) => unescape(inner),
        (inner, false) => Cow::Borrowed(inner),
    }
}

pub fn parse_bool(text: &str) -> Result<bool> {
    let t = unquote(text.trim());
    let value = match t.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "y" | "yes" | "on" | "enable" | "enabled" => true,
        "0" | "false" | "f" | "n" | "no" | "off" | "disable" | "disabled" => false,
        _ => bail!(CodecError::parse("Bool", text)),
    };
    Ok(value)
}

/// Remove a required `open`…`close` pair around `text`.
pub fn strip_brackets(text: &str, open: char, close: char) -> Result<&str> {
    let t = text.trim();
    match t.strip_prefix(open).and_then(|s| s.strip_suffix(close)) {
        Some(inner) => Ok(inner),
        None => bail!(CodecError::shape(format!(
            "expected '{}…{}' around '{}'",
            open, close, text
        ))),
    }
}

pub fn parse_uuid(text: &str) -> Result<Uuid> {
    let t = unquote(text.trim());
    match Uuid::parse_str(t) {
        Ok(uuid) => Ok(uuid),
        Err(_) => bail!(CodecError::parse("UUID", text)),
    }
}
