//! # Text Parsing Utilities
//!
//! Shared text handling for descriptors and literals.
//!
//! ## Module Structure
//!
//! - `tokenizer`: bracket/quote/escape-aware field splitting
//! - `literal`: quoting, null and boolean vocabularies, UUID text
//! - `datetime`: temporal layout sniffing and time-of-day text
//!
//! ## Error Handling
//!
//! Every parser returns `eyre::Result` whose root is a typed
//! [`CodecError`](crate::error::CodecError), so a caller can tell a malformed
//! literal (`Parse`) from unbalanced brackets (`Shape`):
//!
//! ```text
//! "cannot parse 'maybe' as Bool"
//! "malformed literal: 1 unclosed bracket(s) in '[1, 2'"
//! ```

pub mod datetime;
pub mod literal;
pub mod tokenizer;

pub use datetime::{format_time_of_day, time_of_day_to_seconds, TemporalFormat};
pub use literal::{
    is_null_literal, is_zero_literal, parse_bool, parse_uuid, quote, string_payload,
    strip_brackets, strip_quotes, unescape, unquote,
};
pub use tokenizer::{count_fields, split_fields, FieldSplitter, Fields};
