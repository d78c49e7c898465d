//! # Codec Errors
//!
//! Every fallible operation returns `eyre::Result`. Row-level failures carry a
//! typed [`CodecError`] at the root of the report so callers can classify them
//! with `downcast_ref`, while context layers added on the way up stay readable.
//!
//! Batch operations (`fill_from_texts`, `fill_from_values`) return a
//! [`FillResult`]: the number of rows written on success, or a [`BatchError`]
//! recording how many leading rows were fully committed and which input row
//! failed.
//!
//! ## Error Kinds
//!
//! | Kind           | Raised when                                              |
//! |----------------|----------------------------------------------------------|
//! | `TypeMismatch` | a value's variant or width does not match the column     |
//! | `Parse`        | text does not match the kind's literal grammar           |
//! | `Overflow`     | a magnitude exceeds the declared width or precision      |
//! | `Descriptor`   | the type descriptor itself is malformed or unsupported   |
//! | `Shape`        | wrong arity, missing or unbalanced brackets              |
//!
//! ## Committed vs. Failing Row
//!
//! For scalar codecs `committed == row`: every row before the failing one was
//! written. Containers may commit fewer rows than the failing index (a tuple
//! whose first element column fails has committed nothing), so both numbers
//! are reported.

use std::fmt;

use crate::types::DescriptorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    Parse,
    Overflow,
    Descriptor,
    Shape,
}

/// Typed root cause of a row-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    TypeMismatch { expected: String, found: String },
    Parse { kind: &'static str, input: String },
    Overflow { detail: String },
    Shape { detail: String },
}

impl CodecError {
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        CodecError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn parse(kind: &'static str, input: impl Into<String>) -> Self {
        CodecError::Parse {
            kind,
            input: input.into(),
        }
    }

    pub fn overflow(detail: impl Into<String>) -> Self {
        CodecError::Overflow {
            detail: detail.into(),
        }
    }

    pub fn shape(detail: impl Into<String>) -> Self {
        CodecError::Shape {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CodecError::Parse { .. } => ErrorKind::Parse,
            CodecError::Overflow { .. } => ErrorKind::Overflow,
            CodecError::Shape { .. } => ErrorKind::Shape,
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, got {}", expected, found)
            }
            CodecError::Parse { kind, input } => write!(f, "cannot parse '{}' as {}", input, kind),
            CodecError::Overflow { detail } => write!(f, "value out of range: {}", detail),
            CodecError::Shape { detail } => write!(f, "malformed literal: {}", detail),
        }
    }
}

impl std::error::Error for CodecError {}

/// Outcome of a batch fill: rows written, or where and why it stopped.
pub type FillResult = std::result::Result<usize, BatchError>;

#[derive(Debug)]
pub struct BatchError {
    /// Leading rows fully written before the failure.
    pub committed: usize,
    /// Input row that failed, in the caller's index space.
    pub row: usize,
    source: eyre::Report,
}

impl BatchError {
    pub fn new(committed: usize, row: usize, source: eyre::Report) -> Self {
        Self {
            committed,
            row,
            source,
        }
    }

    /// Failure at `row` with every earlier row committed.
    pub fn at_row(row: usize, source: eyre::Report) -> Self {
        Self::new(row, row, source)
    }

    /// Classify the failure by the first typed error in the report chain.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.source.chain().find_map(|e| {
            if let Some(codec) = e.downcast_ref::<CodecError>() {
                Some(codec.kind())
            } else if e.downcast_ref::<DescriptorError>().is_some() {
                Some(ErrorKind::Descriptor)
            } else {
                None
            }
        })
    }

    pub fn report(&self) -> &eyre::Report {
        &self.source
    }

    pub fn into_report(self) -> eyre::Report {
        self.source
    }

    /// Re-express this failure in an enclosing codec's row space.
    pub fn remap(self, committed: usize, row: usize, context: String) -> Self {
        Self {
            committed,
            row,
            source: self.source.wrap_err(context),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} ({} committed): {:#}",
            self.row, self.committed, self.source
        )
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}
