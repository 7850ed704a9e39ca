//! `retarget-namespace`, `remap-namespace` and `remap-namespaces`.

use std::collections::BTreeMap;

use tree_sitter::Node;

use crate::error::RewriteError;
use crate::syntax::{ancestor, is_field, named_children, Edit, SyntaxDoc, NAMESPACE_DECLARATIONS};

/// Point the file's outermost namespace declarations at `namespace`.
pub(crate) fn retarget(doc: SyntaxDoc, namespace: &str) -> Result<SyntaxDoc, RewriteError> {
    let edits = doc
        .nodes_of_kind(NAMESPACE_DECLARATIONS)
        .into_iter()
        .filter(|ns| ancestor(*ns, NAMESPACE_DECLARATIONS).is_none())
        .filter_map(|ns| ns.child_by_field_name("name"))
        .filter(|name| doc.text(*name) != namespace)
        .map(|name| Edit::replace(name, namespace))
        .collect();
    doc.apply(edits)
}

/// Rewrite namespace references from `from` (or its children) to `to`.
pub(crate) fn remap(doc: SyntaxDoc, from: &str, to: &str) -> Result<SyntaxDoc, RewriteError> {
    remap_pairs(doc, "remap-namespace", &[(from, to)])
}

/// Apply every `from -> to` entry of `map` in a single pass.
pub(crate) fn remap_table(doc: SyntaxDoc, map: &BTreeMap<String, String>) -> Result<SyntaxDoc, RewriteError> {
    let pairs: Vec<(&str, &str)> = map
        .iter()
        .filter(|(from, to)| from != to)
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect();
    remap_pairs(doc, "remap-namespaces", &pairs)
}

/// Covers using directives, qualified type names and dotted member-access
/// chains that spell out a namespace. Names of namespace declarations are
/// left to `retarget-namespace`.
///
/// Every reference is matched against all pairs at once and takes the
/// longest matching `from`, so one entry's output is never fed to another.
fn remap_pairs(doc: SyntaxDoc, kind: &'static str, pairs: &[(&str, &str)]) -> Result<SyntaxDoc, RewriteError> {
    if pairs.iter().any(|(from, _)| from.is_empty()) {
        return Err(RewriteError::InvalidParameters {
            kind,
            message: "'from' must not be empty".into(),
        });
    }
    if pairs.is_empty() {
        return Ok(doc);
    }
    let mut edits = Vec::new();

    for node in doc.nodes() {
        match node.kind() {
            "qualified_name" => {
                if node.parent().is_some_and(|p| p.kind() == "qualified_name") || names_namespace(node) {
                    continue;
                }
                let text: String = doc.text(node).split_whitespace().collect();
                if let Some(replacement) = remapped(pairs, &text) {
                    edits.push(Edit::replace(node, replacement));
                }
            }
            "identifier" => {
                let is_using_target = node.parent().is_some_and(|p| {
                    p.kind() == "using_directive"
                        && named_children(p).last().is_some_and(|last| last.id() == node.id())
                });
                if is_using_target {
                    if let Some(replacement) = remapped(pairs, doc.text(node)) {
                        edits.push(Edit::replace(node, replacement));
                    }
                }
            }
            "member_access_expression" => {
                let text: String = doc.text(node).split_whitespace().collect();
                if let Some((_, to)) = pairs.iter().find(|(from, _)| from.contains('.') && *from == text) {
                    edits.push(Edit::replace(node, *to));
                }
            }
            _ => {}
        }
    }
    doc.apply(edits)
}

/// `text` rewritten by the longest `from` that equals it or is a
/// dot-delimited prefix of it.
fn remapped(pairs: &[(&str, &str)], text: &str) -> Option<String> {
    pairs
        .iter()
        .filter_map(|(from, to)| {
            if text == *from {
                return Some((from.len(), to.to_string()));
            }
            let rest = text.strip_prefix(from)?.strip_prefix('.')?;
            Some((from.len(), format!("{to}.{rest}")))
        })
        .max_by_key(|(len, _)| *len)
        .map(|(_, replacement)| replacement)
}

fn names_namespace(node: Node<'_>) -> bool {
    node.parent()
        .is_some_and(|p| NAMESPACE_DECLARATIONS.contains(&p.kind()) && is_field(p, "name", node))
}
