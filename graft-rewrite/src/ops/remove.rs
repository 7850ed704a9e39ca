//! Declaration removal.

use tree_sitter::Node;

use super::in_type_scope;
use crate::error::RewriteError;
use crate::syntax::{
    named_children, parameter_count, removal_span, Edit, SyntaxDoc, CALLABLES, TYPE_DECLARATIONS,
};

pub(crate) fn remove_type(doc: SyntaxDoc, name: &str) -> Result<SyntaxDoc, RewriteError> {
    let edits = doc
        .nodes_of_kind(TYPE_DECLARATIONS)
        .into_iter()
        .filter(|decl| doc.name_of(*decl) == Some(name))
        .map(|decl| remove_declaration(&doc, decl))
        .collect();
    doc.apply(edits)
}

pub(crate) fn remove_property(doc: SyntaxDoc, in_type: Option<&str>, name: &str) -> Result<SyntaxDoc, RewriteError> {
    let edits = doc
        .nodes_of_kind(&["property_declaration"])
        .into_iter()
        .filter(|decl| doc.name_of(*decl) == Some(name) && in_type_scope(&doc, *decl, in_type))
        .map(|decl| remove_declaration(&doc, decl))
        .collect();
    doc.apply(edits)
}

pub(crate) fn remove_method(
    doc: SyntaxDoc,
    in_type: Option<&str>,
    name: &str,
    parameters: Option<usize>,
) -> Result<SyntaxDoc, RewriteError> {
    let edits = doc
        .nodes_of_kind(&["method_declaration"])
        .into_iter()
        .filter(|decl| doc.name_of(*decl) == Some(name) && in_type_scope(&doc, *decl, in_type))
        .filter(|decl| parameters.map_or(true, |n| parameter_count(*decl) == n))
        .map(|decl| remove_declaration(&doc, decl))
        .collect();
    doc.apply(edits)
}

/// Remove a field; a declarator sharing its declaration with others is
/// removed from the list instead.
pub(crate) fn remove_field(doc: SyntaxDoc, in_type: Option<&str>, name: &str) -> Result<SyntaxDoc, RewriteError> {
    let mut edits = Vec::new();
    for field in doc.nodes_of_kind(&["field_declaration", "event_field_declaration"]) {
        if !in_type_scope(&doc, field, in_type) {
            continue;
        }
        let Some(declaration) = named_children(field)
            .into_iter()
            .find(|c| c.kind() == "variable_declaration")
        else {
            continue;
        };
        let declarators: Vec<Node<'_>> = named_children(declaration)
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        let Some(idx) = declarators.iter().position(|d| doc.name_of(*d) == Some(name)) else {
            continue;
        };
        if declarators.len() == 1 {
            edits.push(remove_declaration(&doc, field));
        } else {
            edits.push(remove_list_item(&declarators, idx));
        }
    }
    doc.apply(edits)
}

pub(crate) fn remove_constructor(
    doc: SyntaxDoc,
    in_type: Option<&str>,
    parameters: Option<usize>,
) -> Result<SyntaxDoc, RewriteError> {
    let edits = doc
        .nodes_of_kind(&["constructor_declaration"])
        .into_iter()
        .filter(|decl| in_type_scope(&doc, *decl, in_type))
        .filter(|decl| parameters.map_or(true, |n| parameter_count(*decl) == n))
        .map(|decl| remove_declaration(&doc, decl))
        .collect();
    doc.apply(edits)
}

/// Remove a parameter from every declaration of `method`.
///
/// Call sites are left alone.
pub(crate) fn remove_parameter(doc: SyntaxDoc, method: &str, name: &str) -> Result<SyntaxDoc, RewriteError> {
    let mut edits = Vec::new();
    for callable in doc.nodes_of_kind(CALLABLES) {
        if doc.name_of(callable) != Some(method) {
            continue;
        }
        let Some(list) = callable.child_by_field_name("parameters") else { continue };
        let params: Vec<Node<'_>> = named_children(list)
            .into_iter()
            .filter(|c| c.kind() == "parameter")
            .collect();
        if let Some(idx) = params.iter().position(|p| doc.name_of(*p) == Some(name)) {
            edits.push(remove_list_item(&params, idx));
        }
    }
    doc.apply(edits)
}

/// Remove a generic parameter and its `where` clause.
pub(crate) fn remove_generic_parameter(
    doc: SyntaxDoc,
    in_type: Option<&str>,
    name: &str,
) -> Result<SyntaxDoc, RewriteError> {
    let mut edits = Vec::new();
    for list in doc.nodes_of_kind(&["type_parameter_list"]) {
        let Some(owner) = list.parent() else { continue };
        let owner_matches = match in_type {
            None => true,
            Some(t) => doc.name_of(owner) == Some(t) || in_type_scope(&doc, owner, in_type),
        };
        if !owner_matches {
            continue;
        }
        let params: Vec<Node<'_>> = named_children(list)
            .into_iter()
            .filter(|c| c.kind() == "type_parameter")
            .collect();
        let Some(idx) = params.iter().position(|p| doc.name_of(*p) == Some(name)) else {
            continue;
        };
        if params.len() == 1 {
            edits.push(Edit::delete(list.start_byte(), list.end_byte()));
        } else {
            edits.push(remove_list_item(&params, idx));
        }
        for clause in named_children(owner)
            .into_iter()
            .filter(|c| c.kind() == "type_parameter_constraints_clause")
        {
            let target = named_children(clause).into_iter().next();
            if target.is_some_and(|t| doc.text(t) == name) {
                let start = clause.prev_sibling().map_or(clause.start_byte(), |p| p.end_byte());
                edits.push(Edit::delete(start, clause.end_byte()));
            }
        }
    }
    doc.apply(edits)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Delete a declaration with its leading `///` doc comments and, when it
/// sits on its own lines, the lines themselves.
pub(crate) fn remove_declaration(doc: &SyntaxDoc, decl: Node<'_>) -> Edit {
    let source = doc.source();
    let mut start = decl.start_byte();
    let mut prev = decl.prev_sibling();
    while let Some(comment) = prev {
        let gap = &source[comment.end_byte()..start];
        let contiguous = gap.trim().is_empty() && gap.matches('\n').count() <= 1;
        if comment.kind() != "comment" || !doc.text(comment).starts_with("///") || !contiguous {
            break;
        }
        start = comment.start_byte();
        prev = comment.prev_sibling();
    }
    let (start, end) = removal_span(source, start, decl.end_byte());
    Edit::delete(start, end)
}

/// Delete `items[idx]` from a comma-separated list along with one separator.
pub(crate) fn remove_list_item(items: &[Node<'_>], idx: usize) -> Edit {
    if idx + 1 < items.len() {
        Edit::delete(items[idx].start_byte(), items[idx + 1].start_byte())
    } else if idx > 0 {
        Edit::delete(items[idx - 1].end_byte(), items[idx].end_byte())
    } else {
        Edit::delete(items[idx].start_byte(), items[idx].end_byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SyntaxDoc {
        SyntaxDoc::parse("Widget.cs", src).unwrap()
    }

    const WIDGET: &str = "namespace A\n{\n    public class Widget\n    {\n        /// <summary>Legacy.</summary>\n        public void Dispose() { }\n        public void Dispose(bool disposing) { }\n        public int Count { get; set; }\n        private int _a, _b;\n        public Widget() { }\n        public Widget(int a) { }\n    }\n}\n";

    #[test]
    fn remove_method_by_arity_takes_doc_comment_and_line() {
        let doc = remove_method(parse(WIDGET), Some("Widget"), "Dispose", Some(0)).unwrap();
        assert!(!doc.source().contains("Legacy"));
        assert!(!doc.source().contains("Dispose() { }"));
        assert!(doc.source().contains("        public void Dispose(bool disposing) { }\n"));
    }

    #[test]
    fn remove_one_of_several_declarators() {
        let doc = remove_field(parse(WIDGET), None, "_a").unwrap();
        assert!(doc.source().contains("private int _b;"));
    }

    #[test]
    fn remove_property_and_constructor() {
        let doc = remove_property(parse(WIDGET), None, "Count").unwrap();
        let doc = remove_constructor(doc, Some("Widget"), Some(1)).unwrap();
        assert!(!doc.source().contains("Count"));
        assert!(!doc.source().contains("Widget(int a)"));
        assert!(doc.source().contains("public Widget() { }"));
    }

    #[test]
    fn remove_parameter_from_declaration() {
        let src = "namespace A { class W { void M(int a, string b, bool c) {} } }";
        let doc = remove_parameter(parse(src), "M", "b").unwrap();
        assert!(doc.source().contains("void M(int a, bool c)"));
        let doc = remove_parameter(doc, "M", "c").unwrap();
        assert!(doc.source().contains("void M(int a)"));
    }

    #[test]
    fn remove_generic_parameter_and_constraint() {
        let src = "namespace A { class Box<T> where T : class { } }";
        let doc = SyntaxDoc::parse("Box.cs", src).unwrap();
        let doc = remove_generic_parameter(doc, Some("Box"), "T").unwrap();
        assert!(doc.source().contains("class Box { }"), "got: {}", doc.source());
    }

    #[test]
    fn remove_type_drops_declaration() {
        let src = "namespace A\n{\n    class Keep { }\n    class Drop { }\n}\n";
        let doc = remove_type(parse(src), "Drop").unwrap();
        assert_eq!(doc.source(), "namespace A\n{\n    class Keep { }\n}\n");
    }
}
