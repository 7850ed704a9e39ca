//! Syntax documents and the byte-span edit primitive.
//!
//! A [`SyntaxDoc`] owns a C# source text, its tree-sitter tree, and the file
//! name the text will be written under. Every rewrite operation compiles down
//! to a list of [`Edit`]s computed against one tree; [`SyntaxDoc::apply`]
//! splices them into the text and re-parses, so the next operation always
//! sees a fresh tree of the previous operation's output.

use std::cmp::Reverse;

use tree_sitter::{Node, Parser, Tree};

use crate::error::RewriteError;

/// Node kinds that declare a named type.
pub const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "record_struct_declaration",
    "delegate_declaration",
];

/// Type declarations that can carry members, bases and modifiers like `partial`.
pub const COMPOSITE_TYPES: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
    "record_struct_declaration",
];

pub const NAMESPACE_DECLARATIONS: &[&str] =
    &["namespace_declaration", "file_scoped_namespace_declaration"];

/// Declarations that own a parameter list.
pub const CALLABLES: &[&str] = &[
    "method_declaration",
    "constructor_declaration",
    "local_function_statement",
    "delegate_declaration",
    "operator_declaration",
];

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// Replace `start..end` of the source with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    pub fn replace(node: Node<'_>, text: impl Into<String>) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SyntaxDoc
// ---------------------------------------------------------------------------

/// A parsed C# file.
pub struct SyntaxDoc {
    source: String,
    tree: Tree,
    file_name: String,
}

impl std::fmt::Debug for SyntaxDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxDoc")
            .field("file_name", &self.file_name)
            .field("len", &self.source.len())
            .finish()
    }
}

impl SyntaxDoc {
    /// Parse `source` as C#.
    pub fn parse(file_name: impl Into<String>, source: impl Into<String>) -> Result<Self, RewriteError> {
        let file_name = file_name.into();
        let source = source.into();
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_c_sharp::LANGUAGE.into())?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| RewriteError::Parse { file: file_name.clone() })?;
        Ok(Self {
            source,
            tree,
            file_name,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// Output file name (base name only).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = file_name.into();
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// `true` when the parser had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.root().has_error()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    /// Text of the node's `name` field.
    pub fn name_of(&self, node: Node<'_>) -> Option<&str> {
        node.child_by_field_name("name").map(|n| self.text(n))
    }

    /// Every named node, pre-order.
    pub fn nodes(&self) -> Vec<Node<'_>> {
        self.walk(true)
    }

    /// Every node including anonymous tokens, pre-order.
    pub fn all_nodes(&self) -> Vec<Node<'_>> {
        self.walk(false)
    }

    pub fn nodes_of_kind(&self, kinds: &[&str]) -> Vec<Node<'_>> {
        self.nodes()
            .into_iter()
            .filter(|n| kinds.contains(&n.kind()))
            .collect()
    }

    /// Identifier tokens whose text is exactly `text`.
    pub fn identifiers(&self, text: &str) -> Vec<Node<'_>> {
        self.nodes()
            .into_iter()
            .filter(|n| n.kind() == "identifier" && self.text(*n) == text)
            .collect()
    }

    fn walk(&self, named_only: bool) -> Vec<Node<'_>> {
        let mut out = Vec::new();
        let mut cursor = self.tree.walk();
        loop {
            let node = cursor.node();
            if !named_only || node.is_named() {
                out.push(node);
            }
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return out;
                }
            }
        }
    }

    /// Splice `edits` into the source and re-parse.
    ///
    /// Edits are ordered by start offset, outermost first; an edit that
    /// overlaps an earlier kept edit is dropped. Zero-width inserts at the
    /// same offset keep their submission order.
    pub fn apply(self, mut edits: Vec<Edit>) -> Result<Self, RewriteError> {
        if edits.is_empty() {
            return Ok(self);
        }
        edits.sort_by_key(|e| (e.start, Reverse(e.end)));

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0usize;
        let mut last_end = 0usize;
        let mut applied = 0usize;
        for edit in &edits {
            if edit.start < last_end || edit.end > self.source.len() {
                tracing::trace!(start = edit.start, end = edit.end, "dropping overlapping edit");
                continue;
            }
            out.push_str(&self.source[cursor..edit.start]);
            out.push_str(&edit.text);
            cursor = edit.end;
            last_end = edit.end;
            applied += 1;
        }
        out.push_str(&self.source[cursor..]);
        tracing::trace!(file = %self.file_name, applied, "applied edits");
        SyntaxDoc::parse(self.file_name, out)
    }
}

// ---------------------------------------------------------------------------
// Node helpers
// ---------------------------------------------------------------------------

/// Named children of `node`.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children of `node`, including anonymous tokens.
pub fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// `true` when `child` is `parent`'s `field`.
pub fn is_field(parent: Node<'_>, field: &str, child: Node<'_>) -> bool {
    parent
        .child_by_field_name(field)
        .is_some_and(|n| n.id() == child.id())
}

/// `true` when `node` names the declaration that contains it.
pub fn is_declaration_name(node: Node<'_>) -> bool {
    node.parent().is_some_and(|p| is_field(p, "name", node))
}

/// `true` when `inner` lies within `outer`'s byte range.
pub fn contains(outer: Node<'_>, inner: Node<'_>) -> bool {
    outer.start_byte() <= inner.start_byte() && inner.end_byte() <= outer.end_byte()
}

/// Nearest ancestor of one of `kinds`.
pub fn ancestor<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Declared type of a member: the `type` field, or `returns` for methods.
pub fn declared_type(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("type")
        .or_else(|| node.child_by_field_name("returns"))
}

/// `true` for type declarations directly under the compilation unit or a
/// namespace.
pub fn is_top_level(node: Node<'_>) -> bool {
    match node.parent() {
        None => false,
        Some(parent) => match parent.kind() {
            "compilation_unit" | "file_scoped_namespace_declaration" => true,
            "declaration_list" => parent
                .parent()
                .is_some_and(|gp| gp.kind() == "namespace_declaration"),
            _ => false,
        },
    }
}

/// Text of every `modifier` child.
pub fn modifiers<'d>(doc: &'d SyntaxDoc, node: Node<'_>) -> Vec<&'d str> {
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "modifier")
        .map(|c| doc.text(c))
        .collect()
}

/// Number of parameters a callable declares.
pub fn parameter_count(node: Node<'_>) -> usize {
    node.child_by_field_name("parameters")
        .map(|list| {
            named_children(list)
                .into_iter()
                .filter(|c| c.kind() == "parameter")
                .count()
        })
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Leading whitespace of the line containing `pos`.
pub fn indent_at(source: &str, pos: usize) -> &str {
    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line = &source[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Span to delete when removing `start..end`.
///
/// When the rest of the line is blank the whole line goes (including its
/// indentation); otherwise only trailing spaces after the removed text.
pub fn removal_span(source: &str, start: usize, end: usize) -> (usize, usize) {
    let rest = &source[end..];
    let line_end = rest.find('\n').map_or(source.len(), |i| end + i + 1);
    if source[end..line_end].trim().is_empty() {
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let before_blank = source[line_start..start].trim().is_empty();
        return (if before_blank { line_start } else { start }, line_end);
    }
    let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    (start, end + spaces)
}

/// Whitespace-insensitive form used to compare code fragments.
///
/// Runs of whitespace collapse away, except a single space between two
/// identifier characters.
pub fn normalize_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let prev_word = out.chars().last().is_some_and(is_word_char);
            if prev_word && is_word_char(ch) {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '@'
}

/// C# regular string literal for `value`.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
