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

//! Semantic checks of the description, and lowering into the
//! layout model.

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files;
use codespan_reporting::term;
use codespan_reporting::term::termcolor;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::*;
use crate::layout;

/// List of unique errors reported as analyzer diagnostics.
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    DuplicateDeclIdentifier = 1,
    DuplicateFieldIdentifier = 2,
    UndeclaredTypeIdentifier = 3,
    InvalidTypeIdentifier = 4,
    DuplicateTagIdentifier = 5,
    InvalidWidth = 6,
    EnumValueOverflow = 7,
    FieldTooWide = 8,
    EmptyRecord = 9,
    NoWidthsConfigured = 10,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "E{}", *self as u16)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        format!("{}", code)
    }
}

/// Aggregate analyzer diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic<FileId>>,
}

/// Gather information about the full AST.
#[derive(Debug)]
pub struct Scope<'d> {
    /// Reference to the source file.
    pub file: &'d File,
    /// Collection of Enum and Record declarations.
    pub typedef: HashMap<String, &'d Decl>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic<FileId>) {
        self.diagnostics.push(diagnostic)
    }

    fn err_or<T>(self, value: T) -> Result<T, Diagnostics> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn emit(
        &self,
        sources: &SourceDatabase,
        writer: &mut dyn termcolor::WriteColor,
    ) -> Result<(), files::Error> {
        let config = term::Config::default();
        for d in self.diagnostics.iter() {
            term::emit(writer, &config, sources, d)?;
        }
        Ok(())
    }
}

impl<'d> Scope<'d> {
    pub fn new(file: &'d File) -> Result<Scope<'d>, Diagnostics> {
        // Gather top-level declarations.
        let mut scope: Scope = Scope { file, typedef: Default::default() };
        let mut diagnostics: Diagnostics = Default::default();
        for decl in &file.declarations {
            let id = decl.id();
            if let Some(prev) = scope.typedef.insert(id.to_string(), decl) {
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::DuplicateDeclIdentifier)
                        .with_message(format!(
                            "redeclaration of {} identifier `{}`",
                            decl.kind(),
                            id
                        ))
                        .with_labels(vec![
                            decl.loc.primary(),
                            prev.loc
                                .secondary()
                                .with_message(format!("`{id}` is first declared here")),
                        ]),
                )
            }
        }

        // Return failure if any diagnostic is raised.
        diagnostics.err_or(scope)
    }
}

/// Check field identifiers.
/// Raises error diagnostics for the following cases:
///      - duplicate field identifier
fn check_field_identifiers(file: &File) -> Result<(), Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    for decl in &file.declarations {
        let mut local_scope = HashMap::new();
        for field in decl.fields() {
            if let Some(prev) = local_scope.insert(field.id.as_str(), field) {
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::DuplicateFieldIdentifier)
                        .with_message(format!(
                            "redeclaration of field identifier `{}` in record `{}`",
                            field.id,
                            decl.id()
                        ))
                        .with_labels(vec![
                            field.loc.primary(),
                            prev.loc
                                .secondary()
                                .with_message(format!("`{}` is first declared here", field.id)),
                        ]),
                )
            }
        }
    }

    diagnostics.err_or(())
}

/// Check enum declarations.
/// Raises error diagnostics for the following cases:
///      - duplicate tag identifier
fn check_enum_declarations(file: &File) -> Result<(), Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    for decl in &file.declarations {
        let DeclDesc::Enum { entries, .. } = &decl.desc else { continue };
        let mut tags_by_id: HashMap<&str, &SourceRange> = HashMap::new();
        for entry in entries {
            if let Some(prev) = tags_by_id.insert(entry.id(), entry.loc()) {
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::DuplicateTagIdentifier)
                        .with_message(format!("duplicate tag identifier `{}`", entry.id()))
                        .with_labels(vec![
                            entry.loc().primary(),
                            prev.secondary()
                                .with_message(format!("`{}` is first declared here", entry.id())),
                        ]),
                )
            }
        }
    }

    diagnostics.err_or(())
}

/// Check field types.
/// Raises error diagnostics for the following cases:
///      - undeclared type identifier
///      - type identifier does not reference an enum
///      - integer type with a null width
fn check_field_types(file: &File, scope: &Scope) -> Result<(), Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    for decl in &file.declarations {
        for field in decl.fields() {
            match &field.ty {
                TypeRef::Typedef { type_id } => match scope.typedef.get(type_id) {
                    None => diagnostics.push(
                        Diagnostic::error()
                            .with_code(ErrorCode::UndeclaredTypeIdentifier)
                            .with_message(format!(
                                "undeclared type identifier `{}` for field `{}`",
                                type_id, field.id
                            ))
                            .with_labels(vec![field.loc.primary()])
                            .with_notes(vec![
                                "hint: expected uN, iN, f32 or an enum identifier".to_owned()
                            ]),
                    ),
                    Some(type_decl) if !matches!(type_decl.desc, DeclDesc::Enum { .. }) => {
                        diagnostics.push(
                            Diagnostic::error()
                                .with_code(ErrorCode::InvalidTypeIdentifier)
                                .with_message(format!(
                                    "invalid type identifier `{}` for field `{}`",
                                    type_id, field.id
                                ))
                                .with_labels(vec![
                                    field.loc.primary(),
                                    type_decl.loc.secondary().with_message(format!(
                                        "`{}` is declared here as a {}",
                                        type_id,
                                        type_decl.kind()
                                    )),
                                ])
                                .with_notes(vec!["hint: expected enum identifier".to_owned()]),
                        )
                    }
                    Some(_) => (),
                },
                TypeRef::Integer { width: 0, .. } => diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::InvalidWidth)
                        .with_message(format!("invalid width 0 for field `{}`", field.id))
                        .with_labels(vec![field.loc.primary()])
                        .with_notes(vec!["hint: integer widths must be positive".to_owned()]),
                ),
                TypeRef::Integer { .. } | TypeRef::Float => (),
            }
        }
    }

    diagnostics.err_or(())
}

/// Resolve the enum declarations into enum types.
/// Raises error diagnostics for the following cases:
///      - enum declared with a null width
///      - tag value that does not fit in the declared width
fn lower_enums(file: &File) -> Result<HashMap<String, Rc<layout::EnumType>>, Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    let mut enums = HashMap::new();
    for decl in &file.declarations {
        let DeclDesc::Enum { id, entries, width } = &decl.desc else { continue };
        let resolved = layout::EnumType::new(
            id,
            entries.iter().map(|entry| match entry {
                Entry::Label { id, .. } => layout::EnumEntry::Label(id.clone()),
                Entry::Value { id, value, .. } => layout::EnumEntry::Value(id.clone(), *value),
            }),
            *width,
        );
        match resolved {
            Ok(enum_type) => {
                enums.insert(id.clone(), Rc::new(enum_type));
            }
            Err(err) => {
                let (code, loc) = match &err {
                    layout::Error::EnumValueOverflow { tag_id, .. } => (
                        ErrorCode::EnumValueOverflow,
                        entries
                            .iter()
                            .find(|entry| entry.id() == tag_id.as_str())
                            .map_or(&decl.loc, Entry::loc),
                    ),
                    _ => (ErrorCode::InvalidWidth, &decl.loc),
                };
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(code)
                        .with_message(err.to_string())
                        .with_labels(vec![loc.primary()]),
                )
            }
        }
    }

    diagnostics.err_or(enums)
}

/// Lower the record declarations into record layouts.
fn lower_records(
    file: &File,
    enums: &HashMap<String, Rc<layout::EnumType>>,
) -> Result<Vec<layout::Record>, Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    let mut records = vec![];
    for decl in file.records() {
        let mut record = layout::Record::new(decl.id());
        for field in decl.fields() {
            let ty = match &field.ty {
                TypeRef::Integer { width, signed } => layout::Type::integer(*width, *signed),
                TypeRef::Float => Ok(layout::Type::float()),
                TypeRef::Typedef { type_id } => match enums.get(type_id) {
                    Some(enum_type) => Ok(layout::Type::Enum(enum_type.clone())),
                    None => {
                        diagnostics.push(
                            Diagnostic::error()
                                .with_code(ErrorCode::UndeclaredTypeIdentifier)
                                .with_message(format!("undeclared enum identifier `{}`", type_id))
                                .with_labels(vec![field.loc.primary()]),
                        );
                        continue;
                    }
                },
            };
            match ty {
                Ok(ty) => {
                    record.append(layout::Field {
                        id: field.id.clone(),
                        ty,
                        description: field.description.clone(),
                        comment_style: field.comment_style,
                    });
                }
                Err(err) => diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::InvalidWidth)
                        .with_message(err.to_string())
                        .with_labels(vec![field.loc.primary()]),
                ),
            }
        }
        records.push(record);
    }

    diagnostics.err_or(records)
}

/// Check the description and lower its records into layouts.
///
/// The records are returned in declaration order. Enum types are
/// shared between the fields that reference them.
pub fn analyze(file: &File) -> Result<Vec<layout::Record>, Diagnostics> {
    let scope = Scope::new(file)?;
    check_field_identifiers(file)?;
    check_enum_declarations(file)?;
    check_field_types(file, &scope)?;
    let enums = lower_enums(file)?;
    lower_records(file, &enums)
}

/// Check the records against the selected bus widths.
/// Raises error diagnostics for the following cases:
///      - null bus width
///      - field wider than one of the bus widths
///
/// Returns the validated bus widths, duplicates removed.
pub fn check_bus_widths(
    file: &File,
    records: &[layout::Record],
    widths: &[usize],
) -> Result<Vec<usize>, Diagnostics> {
    let mut diagnostics: Diagnostics = Default::default();
    if let Err(errors) = layout::word_widths(widths) {
        for err in errors {
            diagnostics.push(
                Diagnostic::error().with_code(ErrorCode::InvalidWidth).with_message(err.to_string()),
            )
        }
    }
    let widths = layout::distinct_widths(widths);

    for (decl, record) in file.records().zip(records) {
        for width in &widths {
            for err in record.check_word_width(*width) {
                let layout::Error::FieldTooWide { ref field, .. } = err else { continue };
                let loc = decl.fields().find(|f| &f.id == field).map(|f| &f.loc);
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::FieldTooWide)
                        .with_message(err.to_string())
                        .with_labels(vec![
                            loc.unwrap_or(&decl.loc).primary(),
                            decl.loc.secondary().with_message(format!(
                                "`{}` is declared here",
                                decl.id()
                            )),
                        ])
                        .with_notes(vec![format!(
                            "hint: fields are never split across transfer words, \
                             use a bus width of at least {} bits",
                            record.fields.iter().map(layout::Field::width).max().unwrap_or(0)
                        )]),
                )
            }
        }
    }

    diagnostics.err_or(widths)
}

/// Collect the warnings raised for the selected bus widths.
/// Raises warning diagnostics for the following cases:
///      - record without fields
///      - no bus width selected
pub fn warnings(file: &File, widths: &[usize]) -> Diagnostics {
    let mut diagnostics: Diagnostics = Default::default();
    for decl in file.records() {
        if decl.fields().next().is_none() {
            diagnostics.push(
                Diagnostic::warning()
                    .with_code(ErrorCode::EmptyRecord)
                    .with_message(format!("record `{}` has no fields", decl.id()))
                    .with_labels(vec![decl.loc.primary()])
                    .with_notes(vec![
                        "the generated routines do not transfer any word".to_owned()
                    ]),
            )
        }
        if widths.is_empty() {
            let err = layout::Error::NoWidthsConfigured { record: decl.id().to_owned() };
            diagnostics.push(
                Diagnostic::warning()
                    .with_code(ErrorCode::NoWidthsConfigured)
                    .with_message(err.to_string())
                    .with_labels(vec![decl.loc.primary()])
                    .with_notes(vec![
                        "the generated dispatchers fail to build for any stream type".to_owned()
                    ]),
            )
        }
    }
    diagnostics
}
