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

//! Per-type C++ snippets: declared representation, slice reads and
//! writes, and auxiliary declarations.

use crate::layout::{EnumType, Error, Field, Type};

/// Declared C++ type of a value.
pub fn type_repr(ty: &Type) -> String {
    match ty {
        Type::Integer { width, signed: true } => format!("ap_int<{}>", width),
        Type::Integer { width, signed: false } => format!("ap_uint<{}>", width),
        Type::Float => "float".to_owned(),
        Type::Enum(enum_type) => format!("ap_uint<{}>", enum_type.width),
    }
}

fn check_slice(ty: &Type, word_width: usize, offset: usize) -> Result<(), Error> {
    if offset + ty.width() > word_width {
        Err(Error::SliceOverflow { width: ty.width(), offset, word_width })
    } else {
        Ok(())
    }
}

fn slice(ty: &Type, word: &str, offset: usize) -> String {
    format!("{}.range({}, {})", word, offset + ty.width() - 1, offset)
}

fn fills_word(ty: &Type, word_width: usize, offset: usize) -> bool {
    ty.width() == word_width && offset == 0
}

/// Generate the expression reading a value of type `ty` from the
/// bits `[offset + width - 1, offset]` of `word`.
pub fn decode(ty: &Type, word: &str, word_width: usize, offset: usize) -> Result<String, Error> {
    check_slice(ty, word_width, offset)?;
    Ok(match ty {
        Type::Integer { .. } | Type::Enum(_) if fills_word(ty, word_width, offset) => {
            word.to_owned()
        }
        Type::Integer { .. } | Type::Enum(_) => slice(ty, word, offset),
        Type::Float => format!(
            "[&] {{ union {{ float f; uint32_t u; }} conv; conv.u = {}.to_uint(); return conv.f; }}()",
            slice(ty, word, offset)
        ),
    })
}

/// Generate the statement writing `value` of type `ty` into the
/// bits `[offset + width - 1, offset]` of `word`.
pub fn encode(
    ty: &Type,
    value: &str,
    word: &str,
    word_width: usize,
    offset: usize,
) -> Result<String, Error> {
    check_slice(ty, word_width, offset)?;
    Ok(match ty {
        Type::Integer { .. } | Type::Enum(_) if fills_word(ty, word_width, offset) => {
            format!("{} = {};", word, value)
        }
        Type::Integer { .. } | Type::Enum(_) => format!("{} = {};", slice(ty, word, offset), value),
        Type::Float => format!(
            "{{ union {{ float f; uint32_t u; }} conv; conv.f = {}; {} = conv.u; }}",
            value,
            slice(ty, word, offset)
        ),
    })
}

/// Declaration that must precede the fields using `ty`, if any.
pub fn auxiliary_declaration(ty: &Type) -> Option<String> {
    match ty {
        Type::Enum(enum_type) => Some(enum_declaration(enum_type)),
        Type::Integer { .. } | Type::Float => None,
    }
}

/// Narrowest unsigned C++ type holding every tag value.
fn enum_underlying_type(enum_type: &EnumType) -> &'static str {
    if enum_type.tags.iter().all(|tag| u32::try_from(tag.value).is_ok()) {
        "unsigned int"
    } else {
        "unsigned long long"
    }
}

fn enum_declaration(enum_type: &EnumType) -> String {
    let enumerators: Vec<_> = enum_type
        .tags
        .iter()
        .map(|tag| match i64::try_from(tag.value) {
            Ok(_) => format!("{} = {}", tag.id, tag.value),
            Err(_) => format!("{} = {}ULL", tag.id, tag.value),
        })
        .collect();
    format!(
        "enum {} : {} {{\n    {}\n}};",
        enum_type.id,
        enum_underlying_type(enum_type),
        enumerators.join(",\n    ")
    )
}

/// Member declaration of a field, with its description if any.
pub fn field_declaration(field: &Field) -> String {
    let decl = format!("{} {};", type_repr(&field.ty), field.id);
    match (&field.description, field.comment_style) {
        (Some(description), crate::layout::CommentStyle::Above) => {
            format!("// {}\n{}", description, decl)
        }
        (Some(description), crate::layout::CommentStyle::Inline) => {
            format!("{} // {}", decl, description)
        }
        (None, _) => decl,
    }
}
