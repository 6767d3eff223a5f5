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

//! Record layout model.
//!
//! A [`Record`] is an ordered list of [`Field`]s, each bound to a
//! bit-precise [`Type`]. Records are built with [`Record::append`] and
//! are treated as frozen by the backends.

use serde::Serialize;
use std::rc::Rc;

pub use crate::ast::CommentStyle;

/// Type of layout validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid width {width} for {what}, the width must be positive")]
    InvalidWidth { what: String, width: usize },
    #[error("value {value} of `{enum_id}::{tag_id}` does not fit in {width} bits")]
    EnumValueOverflow { enum_id: String, tag_id: String, value: usize, width: usize },
    #[error("field `{field}` has width {width} bits, which exceeds bus width {word_width} bits")]
    FieldTooWide { field: String, width: usize, word_width: usize },
    #[error("slice of {width} bits at offset {offset} exceeds the {word_width}-bit word")]
    SliceOverflow { width: usize, offset: usize, word_width: usize },
    #[error("no stream bus widths configured for `{record}`")]
    NoWidthsConfigured { record: String },
}

/// Enum entry as supplied to [`EnumType::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumEntry {
    /// Bare label, assigned the next auto value.
    Label(String),
    /// Label with an explicit value. Subsequent bare labels
    /// continue from `value + 1`.
    Value(String, usize),
}

impl From<&str> for EnumEntry {
    fn from(id: &str) -> Self {
        EnumEntry::Label(id.to_owned())
    }
}

impl From<(&str, usize)> for EnumEntry {
    fn from((id, value): (&str, usize)) -> Self {
        EnumEntry::Value(id.to_owned(), value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: String,
    pub value: usize,
}

/// Enumeration with resolved tag values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumType {
    pub id: String,
    pub tags: Vec<Tag>,
    pub width: usize,
}

/// Bit-precise value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    /// `ap_int<width>` or `ap_uint<width>`.
    Integer { width: usize, signed: bool },
    /// IEEE-754 single precision value.
    Float,
    Enum(Rc<EnumType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub description: Option<String>,
    pub comment_style: CommentStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub fields: Vec<Field>,
}

/// Minimum number of bits needed to represent `value`, at least one.
pub fn min_width(value: usize) -> usize {
    std::cmp::max(1, (usize::BITS - value.leading_zeros()) as usize)
}

/// Non-zero bus widths in order of first occurrence.
pub fn distinct_widths(widths: &[usize]) -> Vec<usize> {
    let mut unique = Vec::with_capacity(widths.len());
    for &width in widths {
        if width != 0 && !unique.contains(&width) {
            unique.push(width);
        }
    }
    unique
}

/// Validate a list of bus widths and remove duplicates,
/// preserving the order of first occurrence.
pub fn word_widths(widths: &[usize]) -> Result<Vec<usize>, Vec<Error>> {
    let errors: Vec<_> = widths
        .iter()
        .filter(|width| **width == 0)
        .map(|&width| Error::InvalidWidth { what: "bus width".to_owned(), width })
        .collect();
    if errors.is_empty() {
        Ok(distinct_widths(widths))
    } else {
        Err(errors)
    }
}

impl EnumType {
    /// Resolve the tag values of an enumeration.
    ///
    /// When `width` is omitted it is derived from the largest
    /// assigned value.
    pub fn new<E: Into<EnumEntry>>(
        id: &str,
        entries: impl IntoIterator<Item = E>,
        width: Option<usize>,
    ) -> Result<EnumType, Error> {
        let mut tags = vec![];
        let mut next_value = 0;
        for entry in entries {
            let (id, value) = match entry.into() {
                EnumEntry::Label(id) => (id, next_value),
                EnumEntry::Value(id, value) => (id, value),
            };
            next_value = value.saturating_add(1);
            tags.push(Tag { id, value });
        }

        let max_value = tags.iter().map(|tag| tag.value).max().unwrap_or(0);
        let width = match width {
            None => min_width(max_value),
            Some(0) => {
                return Err(Error::InvalidWidth { what: format!("enum `{}`", id), width: 0 })
            }
            Some(width) => width,
        };

        if width < usize::BITS as usize {
            if let Some(tag) = tags.iter().find(|tag| tag.value >> width != 0) {
                return Err(Error::EnumValueOverflow {
                    enum_id: id.to_owned(),
                    tag_id: tag.id.clone(),
                    value: tag.value,
                    width,
                });
            }
        }

        Ok(EnumType { id: id.to_owned(), tags, width })
    }
}

impl Type {
    pub fn integer(width: usize, signed: bool) -> Result<Type, Error> {
        if width == 0 {
            Err(Error::InvalidWidth { what: "integer type".to_owned(), width })
        } else {
            Ok(Type::Integer { width, signed })
        }
    }

    pub fn unsigned(width: usize) -> Result<Type, Error> {
        Type::integer(width, false)
    }

    pub fn signed(width: usize) -> Result<Type, Error> {
        Type::integer(width, true)
    }

    pub fn float() -> Type {
        Type::Float
    }

    pub fn enumeration(enum_type: EnumType) -> Type {
        Type::Enum(Rc::new(enum_type))
    }

    /// Width of the type in bits.
    pub fn width(&self) -> usize {
        match self {
            Type::Integer { width, .. } => *width,
            Type::Float => 32,
            Type::Enum(enum_type) => enum_type.width,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Type::Integer { signed: true, .. })
    }
}

impl Field {
    pub fn new(id: &str, ty: Type) -> Field {
        Field { id: id.to_owned(), ty, description: None, comment_style: CommentStyle::Inline }
    }

    pub fn with_description(self, description: &str) -> Field {
        Field { description: Some(description.to_owned()), ..self }
    }

    pub fn with_comment_style(self, comment_style: CommentStyle) -> Field {
        Field { comment_style, ..self }
    }

    pub fn width(&self) -> usize {
        self.ty.width()
    }
}

impl Record {
    pub fn new(id: &str) -> Record {
        Record { id: id.to_owned(), fields: vec![] }
    }

    /// Append a field. Fields are packed in the order they are appended.
    pub fn append(&mut self, field: Field) -> &mut Record {
        self.fields.push(field);
        self
    }

    /// Return the list of fields wider than `word_width`.
    pub fn check_word_width(&self, word_width: usize) -> Vec<Error> {
        self.fields
            .iter()
            .filter(|field| field.width() > word_width)
            .map(|field| Error::FieldTooWide {
                field: field.id.clone(),
                width: field.width(),
                word_width,
            })
            .collect()
    }

    /// Validate a list of bus widths together with every field
    /// against each distinct width, in the order of `widths`.
    pub fn check_word_widths(&self, widths: &[usize]) -> Vec<Error> {
        let mut errors = vec![];
        for (index, &width) in widths.iter().enumerate() {
            if width == 0 {
                errors.push(Error::InvalidWidth { what: "bus width".to_owned(), width });
            } else if !widths[..index].contains(&width) {
                errors.extend(self.check_word_width(width));
            }
        }
        errors
    }

    /// Total number of bits used by the fields.
    pub fn bit_width(&self) -> usize {
        self.fields.iter().map(Field::width).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn enum_auto_values() {
        let enum_type = EnumType::new("E", ["A", "B", "C"], None).unwrap();
        assert_eq!(enum_type.width, 2);
        assert_eq!(
            enum_type.tags.iter().map(|tag| tag.value).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn enum_explicit_value_resets_counter() {
        let entries: Vec<EnumEntry> = vec!["A".into(), ("B", 10).into(), "C".into()];
        let enum_type = EnumType::new("E", entries, None).unwrap();
        assert_eq!(enum_type.width, 4);
        assert_eq!(
            enum_type.tags,
            vec![
                Tag { id: "A".to_owned(), value: 0 },
                Tag { id: "B".to_owned(), value: 10 },
                Tag { id: "C".to_owned(), value: 11 },
            ]
        );
    }

    #[test]
    fn enum_width_covers_largest_value() {
        // The auto counter ends at 3, the largest value needs 3 bits.
        let entries: Vec<EnumEntry> = vec![("A", 5).into(), ("B", 2).into()];
        let enum_type = EnumType::new("E", entries, None).unwrap();
        assert_eq!(enum_type.width, 3);
    }

    #[test]
    fn enum_single_label() {
        let enum_type = EnumType::new("E", ["A"], None).unwrap();
        assert_eq!(enum_type.width, 1);
    }

    #[test]
    fn enum_explicit_width() {
        let enum_type = EnumType::new("E", ["A", "B"], Some(8)).unwrap();
        assert_eq!(enum_type.width, 8);
        assert_eq!(
            EnumType::new("E", ["A", "B"], Some(0)),
            Err(Error::InvalidWidth { what: "enum `E`".to_owned(), width: 0 })
        );
        let entries: Vec<EnumEntry> = vec!["A".into(), ("B", 4).into()];
        assert_eq!(
            EnumType::new("E", entries, Some(2)),
            Err(Error::EnumValueOverflow {
                enum_id: "E".to_owned(),
                tag_id: "B".to_owned(),
                value: 4,
                width: 2
            })
        );
    }

    #[test]
    fn integer_width_must_be_positive() {
        assert_eq!(
            Type::unsigned(0),
            Err(Error::InvalidWidth { what: "integer type".to_owned(), width: 0 })
        );
        assert_eq!(Type::signed(12).map(|ty| ty.width()), Ok(12));
        assert!(Type::signed(12).unwrap().is_signed());
        assert_eq!(Type::float().width(), 32);
    }

    #[test]
    fn check_word_width_reports_every_field() {
        let mut record = Record::new("R");
        record
            .append(Field::new("a", Type::unsigned(40).unwrap()))
            .append(Field::new("b", Type::unsigned(8).unwrap()))
            .append(Field::new("c", Type::float()));
        assert_eq!(
            record.check_word_width(16),
            vec![
                Error::FieldTooWide { field: "a".to_owned(), width: 40, word_width: 16 },
                Error::FieldTooWide { field: "c".to_owned(), width: 32, word_width: 16 },
            ]
        );
        assert!(record.check_word_width(64).is_empty());
        assert_eq!(record.bit_width(), 80);
    }

    #[test]
    fn check_word_widths_reports_zero_and_narrow_widths() {
        let mut record = Record::new("R");
        record.append(Field::new("a", Type::unsigned(24).unwrap()));
        assert_eq!(
            record.check_word_widths(&[16, 0, 16, 8, 32]),
            vec![
                Error::FieldTooWide { field: "a".to_owned(), width: 24, word_width: 16 },
                Error::InvalidWidth { what: "bus width".to_owned(), width: 0 },
                Error::FieldTooWide { field: "a".to_owned(), width: 24, word_width: 8 },
            ]
        );
        assert!(record.check_word_widths(&[32, 64]).is_empty());
    }

    #[test]
    fn word_widths_are_an_ordered_set() {
        assert_eq!(word_widths(&[64, 32, 64, 128]), Ok(vec![64, 32, 128]));
        assert_eq!(distinct_widths(&[0, 64, 32, 0, 64]), vec![64, 32]);
        assert_eq!(
            word_widths(&[32, 0]),
            Err(vec![Error::InvalidWidth { what: "bus width".to_owned(), width: 0 }])
        );
    }

    #[test]
    fn min_width_values() {
        assert_eq!(min_width(0), 1);
        assert_eq!(min_width(1), 1);
        assert_eq!(min_width(2), 2);
        assert_eq!(min_width(11), 4);
        assert_eq!(min_width(255), 8);
        assert_eq!(min_width(256), 9);
    }
}
