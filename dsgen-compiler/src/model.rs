// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Software model of the generated `stream_read_<W>` and
//! `stream_write_<W>` routines.
//!
//! The model executes the same word placement as the emitted C++
//! against the primitives of `dsgen_runtime`, which makes it
//! possible to check the bit layout of the generated code without
//! an HLS toolchain.

use crate::backends::common::packing::Placement;
use crate::layout::{Field, Type};
use dsgen_runtime::{ApUint, AxisWord, DecodeError, RangeError, Stream};

/// Value held by a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Value of a signed integer field.
    Int(i128),
    /// Value of an unsigned integer or enum field.
    UInt(u128),
    Float(f32),
}

/// Type of model errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("field `{field}` cannot hold the value {value:?}")]
    KindMismatch { field: String, value: Value },
    #[error("expected {expected} field values, got {actual}")]
    ValueCount { expected: usize, actual: usize },
    #[error("received a {actual}-bit word, expected {expected} bits")]
    WordWidthMismatch { expected: usize, actual: usize },
}

fn to_bits(field: &Field, value: Value) -> Result<u128, Error> {
    match (&field.ty, value) {
        (Type::Integer { signed: true, .. }, Value::Int(value)) => Ok(value as u128),
        (Type::Integer { signed: false, .. } | Type::Enum(_), Value::UInt(value)) => Ok(value),
        (Type::Float, Value::Float(value)) => Ok(value.to_bits() as u128),
        _ => Err(Error::KindMismatch { field: field.id.clone(), value }),
    }
}

fn from_bits(ty: &Type, bits: u128) -> Value {
    match ty {
        Type::Integer { width, signed: true } => {
            let sign = *width < 128 && (bits >> (width - 1)) & 1 == 1;
            if sign {
                Value::Int((bits | !((1u128 << width) - 1)) as i128)
            } else {
                Value::Int(bits as i128)
            }
        }
        Type::Integer { signed: false, .. } | Type::Enum(_) => Value::UInt(bits),
        Type::Float => Value::Float(f32::from_bits(bits as u32)),
    }
}

/// Model of `stream_write_<W>`: push the words carrying `values`,
/// given in declaration order, to `out`.
pub fn write(
    placement: &Placement<&Field>,
    values: &[Value],
    out: &mut Stream<AxisWord>,
    tlast: bool,
) -> Result<(), Error> {
    let expected = placement.slots().count();
    if values.len() != expected {
        return Err(Error::ValueCount { expected, actual: values.len() });
    }

    let word_width = placement.word_width;
    let mut values = values.iter();
    for (index, word) in placement.iter().enumerate() {
        let mut w = AxisWord::new(word_width);
        w.keep = ApUint::ones(word_width.div_ceil(8));
        w.strb = ApUint::ones(word_width.div_ceil(8));
        for (slot, value) in word.slots.iter().zip(values.by_ref()) {
            let bits = to_bits(slot.symbol, *value)?;
            w.data.set_range(slot.offset + slot.width - 1, slot.offset, bits)?;
        }
        w.last = if index + 1 == placement.len() { tlast } else { false };
        out.write(w);
    }
    Ok(())
}

/// Model of `stream_read_<W>`: pop the words of one record from
/// `input` and return the field values in declaration order with
/// the `last` flag of the final word.
pub fn read(
    placement: &Placement<&Field>,
    input: &mut Stream<AxisWord>,
) -> Result<(Vec<Value>, bool), Error> {
    let mut values = vec![];
    let mut tlast = true;
    for word in placement.iter() {
        let w = input.read()?;
        if w.width() != placement.word_width {
            return Err(Error::WordWidthMismatch {
                expected: placement.word_width,
                actual: w.width(),
            });
        }
        for slot in &word.slots {
            let bits = w.data.range(slot.offset + slot.width - 1, slot.offset)?;
            values.push(from_bits(&slot.symbol.ty, bits));
        }
        tlast = w.last;
    }
    Ok((values, tlast))
}
