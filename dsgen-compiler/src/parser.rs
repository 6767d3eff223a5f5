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

use crate::ast;
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files;
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Token};
use std::iter::{Filter, Peekable};

// Generate the description language parser.
//
// TODO:
// - use silent atomic rules for keywords like
//   ENUM = @{ "enum" ~ WHITESPACE }
//   currently not implemented in pest:
//   https://github.com/pest-parser/pest/issues/520
#[derive(pest_derive::Parser)]
#[grammar_inline = r#"
WHITESPACE = _{ " " | "\n" | "\r" | "\t" }
COMMENT = { block_comment | line_comment }

block_comment = { "/*" ~ (!"*/" ~ ANY)* ~ "*/" }
line_comment = { "//" ~ (!"\n" ~ ANY)* }

alpha = { 'a'..'z' | 'A'..'Z' }
digit = { '0'..'9' }
hexdigit = { digit | 'a'..'f' | 'A'..'F' }
alphanum = { alpha | digit | "_" }

identifier = @{ alpha ~ alphanum* }
intvalue = @{ digit+ }
hexvalue = @{ ("0x"|"0X") ~ hexdigit+ }
integer = @{ hexvalue | intvalue }
string = @{ "\"" ~ (!"\"" ~ ANY)* ~ "\"" }

ENUM = @{ "enum" ~ WHITESPACE }
RECORD = @{ "record" ~ WHITESPACE }

enum_value = { identifier ~ "=" ~ integer }
enum_label = { identifier }
enum_entry = { enum_value | enum_label }
enum_entry_list = { enum_entry ~ ("," ~ enum_entry)* ~ ","? }
enum_declaration = {
    ENUM ~ identifier ~ (":" ~ integer)? ~ "{" ~
        enum_entry_list? ~
    "}"
}

int_type = @{ ("u" | "i") ~ intvalue ~ !alphanum }
float_type = @{ "f32" ~ !alphanum }
type_ref = { float_type | int_type | identifier }

comment_style = { "above" | "inline" }
field_comment = { comment_style? ~ string }
field = { identifier ~ ":" ~ type_ref ~ field_comment? }
field_list = { field ~ ("," ~ field)* ~ ","? }

record_declaration = {
    RECORD ~ identifier ~ "{" ~
        field_list? ~
    "}"
}

declaration = _{
    enum_declaration |
    record_declaration
}

file = {
    SOI ~
    declaration* ~
    EOI
}
"#]
pub struct DsgParser;

type Node<'i> = Pair<'i, Rule>;
type NodeIterator<'i> = Peekable<Filter<Pairs<'i, Rule>, fn(&Node<'i>) -> bool>>;
struct Context<'a> {
    file: ast::FileId,
    line_starts: &'a Vec<usize>,
}

trait Helpers<'i> {
    fn children(self) -> NodeIterator<'i>;
    fn as_loc(&self, context: &Context) -> ast::SourceRange;
    fn as_string(&self) -> String;
    fn as_usize(&self) -> Result<usize, String>;
}

impl<'i> Helpers<'i> for Node<'i> {
    fn children(self) -> NodeIterator<'i> {
        self.into_inner().filter((|n| n.as_rule() != Rule::COMMENT) as fn(&Self) -> bool).peekable()
    }

    fn as_loc(&self, context: &Context) -> ast::SourceRange {
        let span = self.as_span();
        ast::SourceRange {
            file: context.file,
            start: ast::SourceLocation::new(span.start_pos().pos(), context.line_starts),
            end: ast::SourceLocation::new(span.end_pos().pos(), context.line_starts),
        }
    }

    fn as_string(&self) -> String {
        self.as_str().to_owned()
    }

    fn as_usize(&self) -> Result<usize, String> {
        let text = self.as_str();
        if let Some(num) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            usize::from_str_radix(num, 16)
                .map_err(|_| format!("cannot convert '{}' to usize", self.as_str()))
        } else {
            text.parse::<usize>().map_err(|_| format!("cannot convert '{}' to usize", self.as_str()))
        }
    }
}

fn err_unexpected_rule<T>(expected: Rule, found: Rule) -> Result<T, String> {
    Err(format!("expected rule {:?}, got {:?}", expected, found))
}

fn err_missing_rule<T>(expected: Rule) -> Result<T, String> {
    Err(format!("expected rule {:?}, got nothing", expected))
}

fn expect<'i>(iter: &mut impl Iterator<Item = Node<'i>>, rule: Rule) -> Result<Node<'i>, String> {
    match iter.next() {
        Some(node) if node.as_rule() == rule => Ok(node),
        Some(node) => err_unexpected_rule(rule, node.as_rule()),
        None => err_missing_rule(rule),
    }
}

fn maybe<'i>(iter: &mut NodeIterator<'i>, rule: Rule) -> Option<Node<'i>> {
    iter.next_if(|n| n.as_rule() == rule)
}

fn parse_identifier(iter: &mut NodeIterator<'_>) -> Result<String, String> {
    expect(iter, Rule::identifier).map(|n| n.as_string())
}

fn parse_integer(iter: &mut NodeIterator<'_>) -> Result<usize, String> {
    expect(iter, Rule::integer).and_then(|n| n.as_usize())
}

fn parse_integer_opt(iter: &mut NodeIterator<'_>) -> Result<Option<usize>, String> {
    maybe(iter, Rule::integer).map(|n| n.as_usize()).transpose()
}

fn parse_string<'i>(iter: &mut impl Iterator<Item = Node<'i>>) -> Result<String, String> {
    expect(iter, Rule::string)
        .map(|n| n.as_str())
        .and_then(|s| s.strip_prefix('"').ok_or_else(|| "expected \" prefix".to_owned()))
        .and_then(|s| s.strip_suffix('"').ok_or_else(|| "expected \" suffix".to_owned()))
        .map(|s| s.to_owned())
}

fn parse_enum_entry(node: Node<'_>, context: &Context) -> Result<ast::Entry, String> {
    if node.as_rule() != Rule::enum_entry {
        return err_unexpected_rule(Rule::enum_entry, node.as_rule());
    }
    match node.children().next() {
        Some(node) if node.as_rule() == Rule::enum_value => {
            let loc = node.as_loc(context);
            let mut children = node.children();
            let id = parse_identifier(&mut children)?;
            let value = parse_integer(&mut children)?;
            Ok(ast::Entry::Value { id, value, loc })
        }
        Some(node) if node.as_rule() == Rule::enum_label => {
            let loc = node.as_loc(context);
            let id = parse_identifier(&mut node.children())?;
            Ok(ast::Entry::Label { id, loc })
        }
        Some(node) => Err(format!(
            "expected rule {:?} or {:?}, got {:?}",
            Rule::enum_value,
            Rule::enum_label,
            node.as_rule()
        )),
        None => Err(format!(
            "expected rule {:?} or {:?}, got nothing",
            Rule::enum_value,
            Rule::enum_label
        )),
    }
}

fn parse_enum_entry_list_opt(
    iter: &mut NodeIterator<'_>,
    context: &Context,
) -> Result<Vec<ast::Entry>, String> {
    maybe(iter, Rule::enum_entry_list)
        .map_or(Ok(vec![]), |n| n.children().map(|n| parse_enum_entry(n, context)).collect())
}

fn parse_type_ref(iter: &mut NodeIterator<'_>) -> Result<ast::TypeRef, String> {
    let node = expect(iter, Rule::type_ref)?;
    match node.children().next() {
        Some(n) if n.as_rule() == Rule::float_type => Ok(ast::TypeRef::Float),
        Some(n) if n.as_rule() == Rule::int_type => {
            let text = n.as_str();
            let signed = text.starts_with('i');
            let width = text[1..]
                .parse::<usize>()
                .map_err(|_| format!("cannot convert '{}' to an integer type", text))?;
            Ok(ast::TypeRef::Integer { width, signed })
        }
        Some(n) if n.as_rule() == Rule::identifier => {
            Ok(ast::TypeRef::Typedef { type_id: n.as_string() })
        }
        Some(n) => err_unexpected_rule(Rule::identifier, n.as_rule()),
        None => err_missing_rule(Rule::identifier),
    }
}

fn parse_field_comment_opt(
    iter: &mut NodeIterator<'_>,
) -> Result<(Option<String>, ast::CommentStyle), String> {
    let Some(node) = maybe(iter, Rule::field_comment) else {
        return Ok((None, ast::CommentStyle::Inline));
    };
    let mut children = node.children();
    let comment_style = match maybe(&mut children, Rule::comment_style) {
        Some(n) if n.as_str() == "above" => ast::CommentStyle::Above,
        _ => ast::CommentStyle::Inline,
    };
    let description = parse_string(&mut children)?;
    Ok((Some(description), comment_style))
}

fn parse_field(node: Node<'_>, context: &Context) -> Result<ast::Field, String> {
    if node.as_rule() != Rule::field {
        return err_unexpected_rule(Rule::field, node.as_rule());
    }
    let loc = node.as_loc(context);
    let mut children = node.children();
    let id = parse_identifier(&mut children)?;
    let ty = parse_type_ref(&mut children)?;
    let (description, comment_style) = parse_field_comment_opt(&mut children)?;
    Ok(ast::Field {
        loc,
        id,
        ty,
        description,
        comment_style,
    })
}

fn parse_field_list_opt(
    iter: &mut NodeIterator,
    context: &Context,
) -> Result<Vec<ast::Field>, String> {
    maybe(iter, Rule::field_list)
        .map_or(Ok(vec![]), |n| n.children().map(|n| parse_field(n, context)).collect())
}

fn parse_toplevel(root: Node<'_>, context: &Context) -> Result<ast::File, String> {
    let mut file = ast::File::new(context.file);

    let mut comment_start = vec![];
    for token in root.clone().tokens() {
        match token {
            Token::Start { rule: Rule::COMMENT, pos } => comment_start.push(pos),
            Token::End { rule: Rule::COMMENT, pos } => {
                let start_pos =
                    comment_start.pop().ok_or_else(|| "unbalanced comment tokens".to_owned())?;
                file.comments.push(ast::Comment {
                    loc: ast::SourceRange {
                        file: context.file,
                        start: ast::SourceLocation::new(start_pos.pos(), context.line_starts),
                        end: ast::SourceLocation::new(pos.pos(), context.line_starts),
                    },
                    text: start_pos.span(&pos).as_str().to_owned(),
                })
            }
            _ => (),
        }
    }

    for node in root.children() {
        let loc = node.as_loc(context);
        let rule = node.as_rule();
        match rule {
            Rule::enum_declaration => {
                let mut children = node.children();
                expect(&mut children, Rule::ENUM)?;
                let id = parse_identifier(&mut children)?;
                let width = parse_integer_opt(&mut children)?;
                let entries = parse_enum_entry_list_opt(&mut children, context)?;
                file.declarations.push(ast::Decl {
                    loc,
                    desc: ast::DeclDesc::Enum { id, entries, width },
                })
            }
            Rule::record_declaration => {
                let mut children = node.children();
                expect(&mut children, Rule::RECORD)?;
                let id = parse_identifier(&mut children)?;
                let fields = parse_field_list_opt(&mut children, context)?;
                file.declarations.push(ast::Decl {
                    loc,
                    desc: ast::DeclDesc::Record { id, fields },
                })
            }
            Rule::EOI => (),
            _ => return Err(format!("unexpected top level rule {:?}", rule)),
        }
    }
    Ok(file)
}

/// Parse a description from a string.
///
/// The file is added to the compilation database under the provided
/// name.
pub fn parse_inline(
    sources: &mut ast::SourceDatabase,
    name: &str,
    source: String,
) -> Result<ast::File, Diagnostic<ast::FileId>> {
    let root = DsgParser::parse(Rule::file, &source)
        .map_err(|e| {
            Diagnostic::error()
                .with_message(format!("failed to parse input file '{}': {}", name, e))
        })?
        .next()
        .ok_or_else(|| {
            Diagnostic::error().with_message(format!("failed to parse input file '{}'", name))
        })?;
    let line_starts: Vec<_> = files::line_starts(&source).collect();
    let file = sources.add(name.to_owned(), source.clone());
    parse_toplevel(root, &Context { file, line_starts: &line_starts })
        .map_err(|e| Diagnostic::error().with_message(e))
}

/// Parse a new source file.
///
/// The source file is fully read and added to the compilation
/// database. Returns the constructed AST, or a descriptive error
/// message in case of syntax error.
pub fn parse_file(
    sources: &mut ast::SourceDatabase,
    name: &str,
) -> Result<ast::File, Diagnostic<ast::FileId>> {
    let source = std::fs::read_to_string(name).map_err(|e| {
        Diagnostic::error().with_message(format!("failed to read input file '{}': {}", name, e))
    })?;
    parse_inline(sources, name, source)
}
