//! # Bracket- and Quote-Aware Field Splitting
//!
//! Container literals (`[1, [2, 3]]`, `{'a': (1, 'x,y')}`) and descriptor
//! argument lists (`Map(String, Tuple(a Int8, b String))`) are split on a
//! separator byte that only counts at nesting depth zero and outside quotes.
//!
//! ## Rules
//!
//! | Construct          | Effect                                          |
//! |--------------------|-------------------------------------------------|
//! | `( [ {`            | depth + 1                                       |
//! | `) ] }`            | depth - 1 (below zero is an error)              |
//! | `'…'` `"…"` `` `…` `` | separators and brackets inside are ignored   |
//! | `\x`               | `x` loses any special meaning; both bytes kept  |
//!
//! Every field is trimmed of surrounding whitespace. An input that is empty
//! or all whitespace yields no fields at all; `"a,"` yields `["a", ""]`.
//!
//! ## Entry Points
//!
//! - [`split_fields`]: split everything in one call
//! - [`FieldSplitter`]: step one field at a time, with access to the unsplit
//!   remainder between steps
//!
//! Both share one scanner, so they agree on trimming and escapes.
//!
//! ## Usage
//!
//! ```rust
//! use colwire::parsing::{split_fields, FieldSplitter};
//!
//! let fields = split_fields("1, 'a,b', [2, 3]", b',').unwrap();
//! assert_eq!(fields.as_slice(), &["1", "'a,b'", "[2, 3]"]);
//!
//! let mut splitter = FieldSplitter::new("k : v", b':');
//! assert_eq!(splitter.next().unwrap().unwrap(), "k");
//! assert_eq!(splitter.remainder(), Some(" v"));
//! ```

use eyre::{bail, Result};
use smallvec::SmallVec;

use crate::error::CodecError;

/// Fields of one split; most literals have only a handful.
pub type Fields<'a> = SmallVec<[&'a str; 8]>;

/// Scan one field starting at `start`. Returns the exclusive end of the field
/// and the start of the next one, if a separator was found.
fn scan_field(input: &str, start: usize, sep: u8) -> Result<(usize, Option<usize>)> {
    let bytes = input.as_bytes();
    let mut depth: usize = 0;
    let mut quote: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        bail!(CodecError::shape(format!(
                            "unbalanced '{}' at offset {} in '{}'",
                            b as char, i, input
                        )));
                    }
                    depth -= 1;
                }
                _ if b == sep && depth == 0 => return Ok((i, Some(i + 1))),
                _ => {}
            },
        }
        i += 1;
    }

    if let Some(q) = quote {
        bail!(CodecError::shape(format!(
            "unterminated {} quote in '{}'",
            q as char, input
        )));
    }
    if depth != 0 {
        bail!(CodecError::shape(format!(
            "{} unclosed bracket(s) in '{}'",
            depth, input
        )));
    }
    Ok((bytes.len(), None))
}

/// Split `input` on top-level occurrences of `sep`.
pub fn split_fields(input: &str, sep: u8) -> Result<Fields<'_>> {
    let mut fields = Fields::new();
    for field in FieldSplitter::new(input, sep) {
        fields.push(field?);
    }
    Ok(fields)
}

/// Step-once splitter over top-level fields.
#[derive(Debug, Clone)]
pub struct FieldSplitter<'a> {
    input: &'a str,
    sep: u8,
    pos: Option<usize>,
}

impl<'a> FieldSplitter<'a> {
    pub fn new(input: &'a str, sep: u8) -> Self {
        let pos = if input.trim().is_empty() { None } else { Some(0) };
        Self { input, sep, pos }
    }

    /// The not-yet-split tail of the input, or `None` once exhausted.
    pub fn remainder(&self) -> Option<&'a str> {
        self.pos.map(|p| &self.input[p..])
    }
}

impl<'a> Iterator for FieldSplitter<'a> {
    type Item = Result<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos?;
        match scan_field(self.input, start, self.sep) {
            Ok((end, next)) => {
                self.pos = next;
                Some(Ok(self.input[start..end].trim()))
            }
            Err(e) => {
                self.pos = None;
                Some(Err(e))
            }
        }
    }
}

/// Count top-level fields without collecting them.
pub fn count_fields(input: &str, sep: u8) -> Result<usize> {
    let mut count = 0;
    for field in FieldSplitter::new(input, sep) {
        field?;
        count += 1;
    }
    Ok(count)
}
