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

//! Vitis HLS C++ backend.
//!
//! Each record becomes a class with one `stream_read_<W>` /
//! `stream_write_<W>` pair per configured bus width, the generic
//! `stream_read` / `stream_write` dispatchers, `operator==` and
//! `to_string()`.

use crate::backends::common::packing::pack_record;
use crate::layout::{self, Error, Record};

pub mod preamble;
pub mod stream;
pub mod types;

pub use preamble::{default_file_name, header, include_guard};

/// Result of the generation of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Class definition.
    pub code: String,
    /// Bus widths the class supports, in dispatch order.
    pub widths: Vec<usize>,
}

fn indent(s: &str, level: usize) -> String {
    let prefix = "    ".repeat(level);
    s.lines()
        .map(|line| if line.is_empty() { line.to_string() } else { format!("{}{}", prefix, line) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate the class definition of `record` for the selected bus
/// widths.
///
/// Every field is validated against every width before any code is
/// produced; all violations are returned together. Duplicate widths
/// are ignored. An empty list of widths is valid: the dispatchers are
/// then emitted as build-time failures.
pub fn generate(record: &Record, widths: &[usize]) -> Result<Output, Vec<Error>> {
    let errors = record.check_word_widths(widths);
    if !errors.is_empty() {
        return Err(errors);
    }
    let widths = layout::distinct_widths(widths);

    let mut sections = vec![];

    let mut auxiliary_declarations: Vec<String> = vec![];
    for field in &record.fields {
        if let Some(decl) = types::auxiliary_declaration(&field.ty) {
            if !auxiliary_declarations.contains(&decl) {
                auxiliary_declarations.push(decl);
            }
        }
    }
    sections.extend(auxiliary_declarations);

    if !record.fields.is_empty() {
        let field_declarations: Vec<_> = record.fields.iter().map(types::field_declaration).collect();
        sections.push(field_declarations.join("\n"));
    }

    for width in &widths {
        let placement = pack_record(record, *width)?;
        sections.push(stream::generate_stream_read(record, &placement).map_err(|err| vec![err])?);
        sections.push(stream::generate_stream_write(record, &placement).map_err(|err| vec![err])?);
    }

    let (read_dispatch, write_dispatch) = stream::generate_stream_dispatch(record, &widths);
    sections.push(read_dispatch);
    sections.push(write_dispatch);
    sections.push(generate_equality_operators(record));
    sections.push(generate_string_method(record));

    let code = format!(
        "class {} {{\npublic:\n\n{}\n}};\n",
        record.id,
        sections.iter().map(|section| indent(section, 1)).collect::<Vec<_>>().join("\n\n")
    );
    Ok(Output { code, widths })
}

/// Generate `operator==` and `operator!=`. Two records are equal when
/// all their fields are equal.
fn generate_equality_operators(record: &Record) -> String {
    let comparisons = if record.fields.is_empty() {
        "true".to_owned()
    } else {
        record
            .fields
            .iter()
            .map(|field| format!("(this->{0} == other.{0})", field.id))
            .collect::<Vec<_>>()
            .join(" && ")
    };
    format!(
        r#"bool operator==(const {id}& other) const {{
    return {comparisons};
}}

bool operator!=(const {id}& other) const {{
    return !(*this == other);
}}"#,
        id = record.id,
        comparisons = comparisons
    )
}

/// Generate `to_string()`, formatting the record as
/// `{a: <a>, b: <b>}` in declaration order.
fn generate_string_method(record: &Record) -> String {
    let mut body = vec![
        "std::ostringstream oss;".to_owned(),
        "oss << \"{\";".to_owned(),
    ];
    for (index, field) in record.fields.iter().enumerate() {
        let separator = if index + 1 < record.fields.len() { " << \", \"" } else { "" };
        body.push(format!("oss << \"{0}: \" << this->{0}{1};", field.id, separator));
    }
    body.push("oss << \"}\";".to_owned());
    body.push("return oss.str();".to_owned());
    format!("std::string to_string() const {{\n{}\n}}", indent(&body.join("\n"), 1))
}
