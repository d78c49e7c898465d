//! # Tuple Columns
//!
//! `Tuple(T1, …, Tn)` stores one element codec per position, each holding
//! every row. The wire form is the element columns one after another.
//!
//! Text rows are `(a, b)` or `[a, b]` with exactly `n` fields; an empty or
//! `NULL` row takes the zero value in every position.
//!
//! ## Partial Failures
//!
//! Positions are filled one at a time over all rows. A failure in the last
//! position leaves every earlier row complete, so `committed == row`. A
//! failure in any earlier position leaves later positions unfilled, so
//! nothing is reported as committed.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use eyre::{bail, Result};
use smallvec::SmallVec;

use super::array::finish;
use super::{check_batch_len, join_rendered, ColumnCodec};
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, CodecError, FillResult};
use crate::parsing::{is_zero_literal, split_fields, strip_brackets, Fields};
use crate::types::{CodecContext, ColumnBlueprint, Value};

fn tuple_fields(text: &str, arity: usize) -> Result<Fields<'_>> {
    if is_zero_literal(text) {
        return Ok(Fields::from_elem("", arity));
    }
    let inner = if text.trim_start().starts_with('[') {
        strip_brackets(text, '[', ']')?
    } else {
        strip_brackets(text, '(', ')')?
    };
    let fields = split_fields(inner, b',')?;
    if fields.len() != arity {
        bail!(CodecError::shape(format!(
            "expected {} tuple elements, found {} in '{}'",
            arity,
            fields.len(),
            text
        )));
    }
    Ok(fields)
}

#[derive(Debug)]
pub struct TupleColumn {
    rows: usize,
    elements: Vec<Box<dyn ColumnCodec>>,
    blueprints: Vec<ColumnBlueprint>,
    ctx: CodecContext,
}

impl TupleColumn {
    pub fn new(rows: usize, blueprints: &[ColumnBlueprint], ctx: &CodecContext) -> Self {
        Self {
            rows,
            elements: blueprints.iter().map(|bp| bp.instantiate(rows, ctx)).collect(),
            blueprints: blueprints.to_vec(),
            ctx: ctx.clone(),
        }
    }

    pub fn arity(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, position: usize) -> &dyn ColumnCodec {
        self.elements[position].as_ref()
    }

    /// Fill every position from per-position inputs covering the same rows.
    fn install<T>(
        &mut self,
        columns: &[&[T]],
        fill: impl Fn(&mut dyn ColumnCodec, &[T]) -> FillResult,
    ) -> Option<BatchError> {
        let last = self.elements.len().saturating_sub(1);
        for (position, &inputs) in columns.iter().enumerate() {
            let mut codec = self.blueprints[position].instantiate(self.rows, &self.ctx);
            let filled = fill(codec.as_mut(), inputs);
            self.elements[position] = codec;
            if let Err(err) = filled {
                let committed = if position == last { err.row } else { 0 };
                let row = err.row;
                return Some(err.remap(committed, row, format!("tuple element {}", position)));
            }
        }
        None
    }
}

impl ColumnCodec for TupleColumn {
    fn row_count(&self) -> usize {
        self.rows
    }

    fn wire_row_bytes(&self) -> usize {
        self.elements
            .iter()
            .fold(0, |total, element| total.saturating_add(element.wire_row_bytes()))
    }

    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        for element in &mut self.elements {
            element.read_from(decoder)?;
        }
        Ok(())
    }

    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        for element in &self.elements {
            element.write_to(encoder)?;
        }
        Ok(())
    }

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult {
        check_batch_len(texts.len(), self.rows)?;
        let arity = self.arity();
        let bump = Bump::new();
        let mut columns: SmallVec<[BumpVec<&str>; 4]> = (0..arity)
            .map(|_| BumpVec::with_capacity_in(texts.len(), &bump))
            .collect();
        let mut failure = None;
        for (row, &text) in texts.iter().enumerate() {
            match tuple_fields(text, arity) {
                Ok(fields) => {
                    for (column, field) in columns.iter_mut().zip(fields) {
                        column.push(field);
                    }
                }
                Err(e) => {
                    failure = Some(BatchError::at_row(row, e));
                    break;
                }
            }
        }

        let slices: SmallVec<[&[&str]; 4]> = columns.iter().map(|c| &c[..]).collect();
        let element_failure = self.install(&slices[..], |codec, items| codec.fill_from_texts(items));
        finish(texts.len(), element_failure.or(failure))
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.rows)?;
        let arity = self.arity();
        let mut columns: Vec<Vec<Value>> = (0..arity)
            .map(|_| Vec::with_capacity(values.len()))
            .collect();
        let mut failure = None;
        for (row, value) in values.iter().enumerate() {
            let items = match value {
                Value::Null => {
                    for column in &mut columns {
                        column.push(Value::Null);
                    }
                    continue;
                }
                Value::Tuple(items) | Value::Array(items) => items,
                other => {
                    let err = CodecError::mismatch("Tuple", other.kind().to_string());
                    failure = Some(BatchError::at_row(row, eyre::Report::new(err)));
                    break;
                }
            };
            if items.len() != arity {
                let err = CodecError::shape(format!(
                    "expected {} tuple elements, found {}",
                    arity,
                    items.len()
                ));
                failure = Some(BatchError::at_row(row, eyre::Report::new(err)));
                break;
            }
            for (column, item) in columns.iter_mut().zip(items) {
                column.push(item.clone());
            }
        }

        let slices: SmallVec<[&[Value]; 4]> = columns.iter().map(|c| &c[..]).collect();
        let element_failure = self.install(&slices[..], |codec, items| codec.fill_from_values(items));
        finish(values.len(), element_failure.or(failure))
    }

    fn value(&self, row: usize) -> Value {
        Value::Tuple(self.elements.iter().map(|e| e.value(row)).collect())
    }

    fn text(&self, row: usize) -> String {
        join_rendered('(', ')', self.elements.iter().map(|e| e.nested_text(row)))
    }

    fn zero_value(&self) -> Value {
        Value::Tuple(self.elements.iter().map(|e| e.zero_value()).collect())
    }

    fn zero_text(&self) -> String {
        join_rendered('(', ')', self.elements.iter().map(|e| e.nested_zero_text()))
    }
}
