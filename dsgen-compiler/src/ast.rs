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

use codespan_reporting::diagnostic;
use codespan_reporting::files;
use serde::Serialize;
use std::fmt;

/// File identifier.
/// References a source file in the source database.
pub type FileId = usize;

/// Source database.
/// Stores the source file contents for reference.
pub type SourceDatabase = files::SimpleFiles<String, String>;

#[derive(Debug, Default, Copy, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLocation {
    /// Byte offset into the file (counted from zero).
    pub offset: usize,
    /// Line number (counted from zero).
    pub line: usize,
    /// Column number (counted from zero)
    pub column: usize,
}

#[derive(Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub file: FileId,
    pub start: SourceLocation,
    pub end: SourceLocation,
}

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "kind", rename = "comment")]
pub struct Comment {
    pub loc: SourceRange,
    pub text: String,
}

/// Enum entry as written in the description.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "kind")]
pub enum Entry {
    /// Bare label, assigned the next auto value.
    #[serde(rename = "label")]
    Label { id: String, loc: SourceRange },
    /// Label with an explicit value.
    #[serde(rename = "value")]
    Value { id: String, value: usize, loc: SourceRange },
}

/// Placement of the field description in the generated declaration.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStyle {
    #[default]
    Inline,
    Above,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum TypeRef {
    #[serde(rename = "integer")]
    Integer { width: usize, signed: bool },
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "typedef")]
    Typedef { type_id: String },
}

#[derive(Debug, Serialize, Clone)]
pub struct Field {
    pub loc: SourceRange,
    pub id: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub description: Option<String>,
    pub comment_style: CommentStyle,
}

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "kind")]
pub enum DeclDesc {
    #[serde(rename = "enum_declaration")]
    Enum { id: String, entries: Vec<Entry>, width: Option<usize> },
    #[serde(rename = "record_declaration")]
    Record { id: String, fields: Vec<Field> },
}

#[derive(Debug, Serialize, Clone)]
pub struct Decl {
    pub loc: SourceRange,
    #[serde(flatten)]
    pub desc: DeclDesc,
}

#[derive(Debug, Serialize, Clone)]
pub struct File {
    pub file: FileId,
    pub comments: Vec<Comment>,
    pub declarations: Vec<Decl>,
}

impl SourceLocation {
    /// Construct a new source location.
    ///
    /// The `line_starts` indicates the byte offsets where new lines
    /// start in the file. The first element should thus be `0` since
    /// every file has at least one line starting at offset `0`.
    pub fn new(offset: usize, line_starts: &[usize]) -> SourceLocation {
        let mut loc = SourceLocation { offset, line: 0, column: offset };
        for (line, start) in line_starts.iter().enumerate() {
            if *start > offset {
                break;
            }
            loc = SourceLocation { offset, line, column: offset - start };
        }
        loc
    }
}

impl SourceRange {
    pub fn primary(&self) -> diagnostic::Label<FileId> {
        diagnostic::Label::primary(self.file, self.start.offset..self.end.offset)
    }
    pub fn secondary(&self) -> diagnostic::Label<FileId> {
        diagnostic::Label::secondary(self.file, self.start.offset..self.end.offset)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}:{}-{}", self.start.line, self.start.column, self.end.column)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

impl fmt::Debug for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRange").finish_non_exhaustive()
    }
}

impl Eq for Entry {}
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out loc.
        match (self, other) {
            (Entry::Label { id: lhs, .. }, Entry::Label { id: rhs, .. }) => lhs == rhs,
            (
                Entry::Value { id: lhs_id, value: lhs_value, .. },
                Entry::Value { id: rhs_id, value: rhs_value, .. },
            ) => lhs_id == rhs_id && lhs_value == rhs_value,
            _ => false,
        }
    }
}

impl Entry {
    pub fn id(&self) -> &str {
        match self {
            Entry::Label { id, .. } | Entry::Value { id, .. } => id,
        }
    }

    pub fn loc(&self) -> &SourceRange {
        match self {
            Entry::Label { loc, .. } | Entry::Value { loc, .. } => loc,
        }
    }
}

impl Eq for File {}
impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out comments.
        self.declarations == other.declarations
    }
}

impl File {
    pub fn new(file: FileId) -> File {
        File { comments: vec![], declarations: vec![], file }
    }

    /// Iterate over the record declarations.
    pub fn records(&self) -> impl Iterator<Item = &Decl> {
        self.declarations.iter().filter(|decl| matches!(decl.desc, DeclDesc::Record { .. }))
    }
}

impl Eq for Decl {}
impl PartialEq for Decl {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out loc.
        match (&self.desc, &other.desc) {
            (
                DeclDesc::Enum { id: lhs_id, entries: lhs_entries, width: lhs_width },
                DeclDesc::Enum { id: rhs_id, entries: rhs_entries, width: rhs_width },
            ) => lhs_id == rhs_id && lhs_entries == rhs_entries && lhs_width == rhs_width,
            (
                DeclDesc::Record { id: lhs_id, fields: lhs_fields },
                DeclDesc::Record { id: rhs_id, fields: rhs_fields },
            ) => lhs_id == rhs_id && lhs_fields == rhs_fields,
            _ => false,
        }
    }
}

impl Decl {
    pub fn id(&self) -> &str {
        match &self.desc {
            DeclDesc::Enum { id, .. } | DeclDesc::Record { id, .. } => id,
        }
    }

    pub fn fields(&self) -> std::slice::Iter<'_, Field> {
        match &self.desc {
            DeclDesc::Record { fields, .. } => fields.iter(),
            DeclDesc::Enum { .. } => [].iter(),
        }
    }

    pub fn kind(&self) -> &str {
        match &self.desc {
            DeclDesc::Enum { .. } => "enum",
            DeclDesc::Record { .. } => "record",
        }
    }
}

impl Eq for Field {}
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out loc.
        self.id == other.id
            && self.ty == other.ty
            && self.description == other.description
            && self.comment_style == other.comment_style
    }
}
