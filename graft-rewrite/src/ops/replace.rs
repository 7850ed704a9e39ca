//! Text-level replacements anchored on syntax nodes.

use regex::Regex;

use crate::error::RewriteError;
use crate::syntax::{is_declaration_name, normalize_code, removal_span, Edit, SyntaxDoc};

const HEADER_CLOSE: &str = "// </auto-generated>";

/// Replace literals whose source text is exactly `from`.
///
/// `from` is compared against the literal as written, quotes included.
pub(crate) fn replace_literal(doc: SyntaxDoc, from: &str, to: &str) -> Result<SyntaxDoc, RewriteError> {
    let edits = doc
        .nodes()
        .into_iter()
        .filter(|n| n.kind().ends_with("_literal") && doc.text(*n) == from)
        .map(|n| Edit::replace(n, to))
        .collect();
    doc.apply(edits)
}

/// Regex-replace inside comments. A comment left with no text is deleted.
/// The provenance header is never touched.
pub(crate) fn replace_comment(doc: SyntaxDoc, pattern: &str, replacement: &str) -> Result<SyntaxDoc, RewriteError> {
    let regex = Regex::new(pattern).map_err(|e| RewriteError::InvalidParameters {
        kind: "replace-comment",
        message: e.to_string(),
    })?;
    let header_end = header_end(doc.source());
    let mut edits = Vec::new();
    for comment in doc.nodes_of_kind(&["comment"]) {
        if comment.start_byte() < header_end {
            continue;
        }
        let text = doc.text(comment);
        if !regex.is_match(text) {
            continue;
        }
        let replaced = regex.replace_all(text, replacement);
        if is_empty_comment(&replaced) {
            let (start, end) = removal_span(doc.source(), comment.start_byte(), comment.end_byte());
            edits.push(Edit::delete(start, end));
        } else {
            edits.push(Edit::replace(comment, replaced.into_owned()));
        }
    }
    doc.apply(edits)
}

fn header_end(source: &str) -> usize {
    if !source.trim_start().starts_with("// <auto-generated>") {
        return 0;
    }
    source.find(HEADER_CLOSE).map_or(0, |i| i + HEADER_CLOSE.len())
}

fn is_empty_comment(text: &str) -> bool {
    let body = text
        .trim()
        .trim_start_matches('/')
        .trim_start_matches('*')
        .trim_end_matches('/')
        .trim_end_matches('*');
    body.trim().is_empty()
}

/// Replace expressions whose whitespace-normalised text equals `pattern`.
/// The outermost match wins.
pub(crate) fn replace_expression(doc: SyntaxDoc, pattern: &str, replacement: &str) -> Result<SyntaxDoc, RewriteError> {
    let wanted = normalize_code(pattern);
    if wanted.is_empty() {
        return Err(RewriteError::InvalidParameters {
            kind: "replace-expression",
            message: "'pattern' must not be empty".into(),
        });
    }
    let edits = doc
        .nodes()
        .into_iter()
        .filter(|n| is_expression(*n))
        .filter(|n| normalize_code(doc.text(*n)) == wanted)
        .map(|n| Edit::replace(n, replacement))
        .collect();
    doc.apply(edits)
}

fn is_expression(node: tree_sitter::Node<'_>) -> bool {
    let kind = node.kind();
    kind.ends_with("_expression")
        || kind.ends_with("_literal")
        || (kind == "identifier" && !is_declaration_name(node))
}

/// Replace statements whose whitespace-normalised text equals `pattern`
/// (trailing `;` optional). An empty replacement deletes the statement.
pub(crate) fn replace_statement(doc: SyntaxDoc, pattern: &str, replacement: &str) -> Result<SyntaxDoc, RewriteError> {
    let wanted = normalize_code(pattern);
    let wanted = wanted.trim_end_matches(';');
    if wanted.is_empty() {
        return Err(RewriteError::InvalidParameters {
            kind: "replace-statement",
            message: "'pattern' must not be empty".into(),
        });
    }
    let edits = doc
        .nodes()
        .into_iter()
        .filter(|n| n.kind().ends_with("_statement") && n.kind() != "local_function_statement")
        .filter(|n| normalize_code(doc.text(*n)).trim_end_matches(';') == wanted)
        .map(|n| {
            if replacement.trim().is_empty() {
                let (start, end) = removal_span(doc.source(), n.start_byte(), n.end_byte());
                Edit::delete(start, end)
            } else {
                Edit::replace(n, replacement)
            }
        })
        .collect();
    doc.apply(edits)
}
