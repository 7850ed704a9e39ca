//! Operations that add to or strip from declarations: attributes, base
//! interfaces, usings, `partial`, members, generic parameters, nullability.

use tree_sitter::Node;

use super::remove::remove_list_item;
use super::{require_non_empty, target_types};
use crate::error::RewriteError;
use crate::syntax::{
    children, declared_type, indent_at, modifiers, named_children, normalize_code, removal_span, Edit,
    SyntaxDoc, COMPOSITE_TYPES, TYPE_DECLARATIONS,
};

const MEMBER_INDENT: &str = "    ";

const ATTRIBUTABLE: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "record_struct_declaration",
    "delegate_declaration",
    "method_declaration",
    "property_declaration",
    "field_declaration",
    "event_field_declaration",
    "event_declaration",
    "constructor_declaration",
    "enum_member_declaration",
];

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

pub(crate) fn add_attribute(doc: SyntaxDoc, target: Option<&str>, attribute: &str) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("add-attribute", "attribute", attribute)?;
    let wanted = attribute_name(attribute);
    let targets = match target {
        None => target_types(&doc, TYPE_DECLARATIONS, None),
        Some(name) => doc
            .nodes_of_kind(ATTRIBUTABLE)
            .into_iter()
            .filter(|decl| declares(&doc, *decl, name))
            .collect(),
    };
    let edits = targets
        .into_iter()
        .filter(|decl| {
            !attributes_of(*decl)
                .into_iter()
                .any(|a| doc.name_of(a).is_some_and(|n| attribute_name(n) == wanted))
        })
        .map(|decl| {
            let indent = indent_at(doc.source(), decl.start_byte());
            Edit::insert(decl.start_byte(), format!("[{attribute}]\n{indent}"))
        })
        .collect();
    doc.apply(edits)
}

pub(crate) fn remove_attribute(doc: SyntaxDoc, target: Option<&str>, name: &str) -> Result<SyntaxDoc, RewriteError> {
    let wanted = attribute_name(name);
    let mut edits = Vec::new();
    for list in doc.nodes_of_kind(&["attribute_list"]) {
        let Some(decl) = list.parent() else { continue };
        if target.is_some_and(|t| !declares(&doc, decl, t)) {
            continue;
        }
        let attributes: Vec<Node<'_>> = named_children(list)
            .into_iter()
            .filter(|c| c.kind() == "attribute")
            .collect();
        let Some(idx) = attributes
            .iter()
            .position(|a| doc.name_of(*a).is_some_and(|n| attribute_name(n) == wanted))
        else {
            continue;
        };
        if attributes.len() == 1 {
            let (start, end) = removal_span(doc.source(), list.start_byte(), list.end_byte());
            edits.push(Edit::delete(start, end));
        } else {
            edits.push(remove_list_item(&attributes, idx));
        }
    }
    doc.apply(edits)
}

/// `Obsolete("x")`, `System.ObsoleteAttribute` and `Obsolete` all name `Obsolete`.
fn attribute_name(text: &str) -> &str {
    let name = text.split('(').next().unwrap_or(text).trim();
    let name = name.rsplit('.').next().unwrap_or(name);
    name.strip_suffix("Attribute").filter(|n| !n.is_empty()).unwrap_or(name)
}

fn attributes_of(decl: Node<'_>) -> Vec<Node<'_>> {
    named_children(decl)
        .into_iter()
        .filter(|c| c.kind() == "attribute_list")
        .flat_map(named_children)
        .filter(|c| c.kind() == "attribute")
        .collect()
}

/// `true` when `decl` declares `name`; field declarations match any of
/// their declarators.
fn declares(doc: &SyntaxDoc, decl: Node<'_>, name: &str) -> bool {
    match decl.kind() {
        "field_declaration" | "event_field_declaration" => named_children(decl)
            .into_iter()
            .filter(|c| c.kind() == "variable_declaration")
            .flat_map(named_children)
            .any(|d| d.kind() == "variable_declarator" && doc.name_of(d) == Some(name)),
        _ => doc.name_of(decl) == Some(name),
    }
}

// ---------------------------------------------------------------------------
// Base interfaces
// ---------------------------------------------------------------------------

pub(crate) fn add_interface(doc: SyntaxDoc, in_type: Option<&str>, interface: &str) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("add-interface", "interface", interface)?;
    let wanted = base_name(interface);
    let mut edits = Vec::new();
    for decl in target_types(&doc, COMPOSITE_TYPES, in_type) {
        match child_of_kind(decl, "base_list") {
            Some(bases) => {
                let present = named_children(bases)
                    .into_iter()
                    .any(|b| base_name(doc.text(b)) == wanted);
                if !present {
                    edits.push(Edit::insert(bases.end_byte(), format!(", {interface}")));
                }
            }
            None => {
                if let Some(anchor) = header_end(decl) {
                    edits.push(Edit::insert(anchor, format!(" : {interface}")));
                }
            }
        }
    }
    doc.apply(edits)
}

pub(crate) fn remove_interface(doc: SyntaxDoc, in_type: Option<&str>, interface: &str) -> Result<SyntaxDoc, RewriteError> {
    let wanted = base_name(interface);
    let mut edits = Vec::new();
    for decl in target_types(&doc, COMPOSITE_TYPES, in_type) {
        let Some(bases) = child_of_kind(decl, "base_list") else { continue };
        let items = named_children(bases);
        let Some(idx) = items.iter().position(|b| base_name(doc.text(*b)) == wanted) else {
            continue;
        };
        if items.len() == 1 {
            let start = bases.prev_sibling().map_or(bases.start_byte(), |p| p.end_byte());
            edits.push(Edit::delete(start, bases.end_byte()));
        } else {
            edits.push(remove_list_item(&items, idx));
        }
    }
    doc.apply(edits)
}

/// `IList<T>` and `Base(x)` compare by `IList` and `Base`.
fn base_name(text: &str) -> String {
    text.split(['<', '('])
        .next()
        .unwrap_or(text)
        .split_whitespace()
        .collect()
}

/// End of the declaration header: name, type parameters, primary constructor.
fn header_end(decl: Node<'_>) -> Option<usize> {
    let name_end = decl.child_by_field_name("name")?.end_byte();
    Some(
        named_children(decl)
            .into_iter()
            .filter(|c| matches!(c.kind(), "type_parameter_list" | "parameter_list"))
            .map(|c| c.end_byte())
            .fold(name_end, usize::max),
    )
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

// ---------------------------------------------------------------------------
// Usings
// ---------------------------------------------------------------------------

pub(crate) fn add_using(doc: SyntaxDoc, namespace: &str) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("add-using", "namespace", namespace)?;
    if doc
        .nodes_of_kind(&["using_directive"])
        .into_iter()
        .any(|u| is_plain_using(&doc, u, namespace))
    {
        return Ok(doc);
    }
    let root = doc.root();
    let top_level: Vec<Node<'_>> = named_children(root)
        .into_iter()
        .filter(|c| c.kind() == "using_directive")
        .collect();
    let edit = match top_level.last() {
        Some(last) => Edit::insert(last.end_byte(), format!("\nusing {namespace};")),
        None => match named_children(root).into_iter().find(|c| c.kind() != "comment") {
            Some(first) => Edit::insert(first.start_byte(), format!("using {namespace};\n\n")),
            None => Edit::insert(doc.source().len(), format!("using {namespace};\n")),
        },
    };
    doc.apply(vec![edit])
}

pub(crate) fn remove_using(doc: SyntaxDoc, namespace: &str) -> Result<SyntaxDoc, RewriteError> {
    let edits = doc
        .nodes_of_kind(&["using_directive"])
        .into_iter()
        .filter(|u| is_plain_using(&doc, *u, namespace))
        .map(|u| {
            let (start, end) = removal_span(doc.source(), u.start_byte(), u.end_byte());
            Edit::delete(start, end)
        })
        .collect();
    doc.apply(edits)
}

/// `using X;` or `global using X;`, not aliases or `using static`.
fn is_plain_using(doc: &SyntaxDoc, directive: Node<'_>, namespace: &str) -> bool {
    let text = normalize_code(doc.text(directive));
    let target = normalize_code(namespace);
    text == format!("using {target};") || text == format!("global using {target};")
}

// ---------------------------------------------------------------------------
// Type shape
// ---------------------------------------------------------------------------

pub(crate) fn make_partial(doc: SyntaxDoc, in_type: Option<&str>) -> Result<SyntaxDoc, RewriteError> {
    let edits = target_types(&doc, COMPOSITE_TYPES, in_type)
        .into_iter()
        .filter(|decl| !modifiers(&doc, *decl).contains(&"partial"))
        .filter_map(|decl| {
            children(decl)
                .into_iter()
                .find(|c| !c.is_named() && matches!(c.kind(), "class" | "struct" | "interface" | "record"))
        })
        .map(|keyword| Edit::insert(keyword.start_byte(), "partial "))
        .collect();
    doc.apply(edits)
}

/// Append `code` as the last member of each target type body.
pub(crate) fn add_member(doc: SyntaxDoc, in_type: Option<&str>, code: &str) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("add-member", "code", code)?;
    let source = doc.source();
    let mut edits = Vec::new();
    for decl in target_types(&doc, COMPOSITE_TYPES, in_type) {
        let Some(body) = child_of_kind(decl, "declaration_list") else {
            tracing::warn!(file = doc.file_name(), "add-member: type has no body");
            continue;
        };
        let close = body.end_byte() - 1;
        let line_start = source[..close].rfind('\n').map_or(0, |i| i + 1);
        if source[line_start..close].trim().is_empty() {
            let indent = format!("{}{MEMBER_INDENT}", &source[line_start..close]);
            edits.push(Edit::insert(line_start, format!("{}\n", indent_block(code, &indent))));
        } else {
            let outer = indent_at(source, decl.start_byte());
            let indent = format!("{outer}{MEMBER_INDENT}");
            edits.push(Edit::insert(close, format!("\n{}\n{outer}", indent_block(code, &indent))));
        }
    }
    doc.apply(edits)
}

/// Dedent `code` and re-indent every non-blank line with `indent`.
fn indent_block(code: &str, indent: &str) -> String {
    let lines: Vec<&str> = code.trim_matches('\n').trim_end().lines().collect();
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{}", &l[common..])
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn add_generic_parameter(
    doc: SyntaxDoc,
    in_type: Option<&str>,
    name: &str,
    constraint: Option<&str>,
) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("add-generic-parameter", "name", name)?;
    let mut edits = Vec::new();
    for decl in target_types(&doc, COMPOSITE_TYPES, in_type) {
        match child_of_kind(decl, "type_parameter_list") {
            Some(list) => {
                let present = named_children(list)
                    .into_iter()
                    .any(|p| doc.name_of(p) == Some(name));
                if present {
                    continue;
                }
                edits.push(Edit::insert(list.end_byte() - 1, format!(", {name}")));
            }
            None => {
                let Some(type_name) = decl.child_by_field_name("name") else { continue };
                edits.push(Edit::insert(type_name.end_byte(), format!("<{name}>")));
            }
        }
        if let Some(constraint) = constraint {
            let anchor = child_of_kind(decl, "declaration_list").and_then(|b| b.prev_sibling());
            if let Some(anchor) = anchor {
                edits.push(Edit::insert(anchor.end_byte(), format!(" where {name} : {constraint}")));
            }
        }
    }
    doc.apply(edits)
}

const TYPED_DECLARATIONS: &[&str] = &[
    "parameter",
    "property_declaration",
    "variable_declaration",
    "method_declaration",
    "local_function_statement",
    "delegate_declaration",
    "indexer_declaration",
];

/// Add or strip the nullable annotation.
pub(crate) fn toggle_nullable(doc: SyntaxDoc, name: Option<&str>, enabled: bool) -> Result<SyntaxDoc, RewriteError> {
    let edits: Vec<Edit> = if enabled {
        let name = name.ok_or_else(|| RewriteError::InvalidParameters {
            kind: "toggle-nullable",
            message: "'name' is required when enabling".into(),
        })?;
        doc.nodes_of_kind(TYPED_DECLARATIONS)
            .into_iter()
            .filter_map(declared_type)
            .filter(|t| t.kind() != "nullable_type" && normalize_code(doc.text(*t)) == normalize_code(name))
            .map(|t| Edit::replace(t, format!("{}?", doc.text(t))))
            .collect()
    } else {
        doc.nodes_of_kind(&["nullable_type"])
            .into_iter()
            .filter_map(|n| named_children(n).into_iter().next().map(|inner| (n, inner)))
            .filter(|(_, inner)| name.map_or(true, |w| normalize_code(doc.text(*inner)) == normalize_code(w)))
            .map(|(n, inner)| Edit::replace(n, doc.text(inner)))
            .collect()
    };
    doc.apply(edits)
}
