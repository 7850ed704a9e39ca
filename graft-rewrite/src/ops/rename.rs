//! Renames and type qualification.

use graft_core::naming::renamed_file_name;
use tree_sitter::Node;

use super::{in_type_scope, require_non_empty};
use crate::error::RewriteError;
use crate::syntax::{
    ancestor, contains, is_declaration_name, is_field, named_children, Edit, SyntaxDoc, CALLABLES,
    TYPE_DECLARATIONS,
};

/// Member kinds that `rename_member` can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Member {
    Property,
    Method,
    Field,
}

impl Member {
    fn declares(self, decl: Node<'_>) -> bool {
        match self {
            Member::Property => decl.kind() == "property_declaration",
            Member::Method => decl.kind() == "method_declaration",
            Member::Field => {
                decl.kind() == "variable_declarator"
                    && decl
                        .parent()
                        .and_then(|v| v.parent())
                        .is_some_and(|f| matches!(f.kind(), "field_declaration" | "event_field_declaration"))
            }
        }
    }
}

/// Rename a type, every reference to it, and the file when it belongs to
/// the type.
pub(crate) fn rename_type(doc: SyntaxDoc, from: &str, to: &str) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("rename-type", "to", to)?;
    let renamed_file = renamed_file_name(doc.file_name(), from, to);
    let edits = doc
        .identifiers(from)
        .into_iter()
        .filter(|id| is_type_position(*id))
        .map(|id| Edit::replace(id, to))
        .collect();
    let mut doc = doc.apply(edits)?;
    if let Some(file_name) = renamed_file {
        tracing::debug!(from = doc.file_name(), to = %file_name, "renaming output file");
        doc.set_file_name(file_name);
    }
    Ok(doc)
}

pub(crate) fn rename_identifier(doc: SyntaxDoc, from: &str, to: &str) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("rename-identifier", "to", to)?;
    let edits = doc.identifiers(from).into_iter().map(|id| Edit::replace(id, to)).collect();
    doc.apply(edits)
}

/// Rename a property, method or field declared in `in_type` and its uses.
///
/// A use is `this.x`, `base.x` or `Type.x` where `Type` declares the member,
/// or a bare `x` inside the declaring type that no enclosing parameter or
/// local binds. Accesses through any other receiver are left alone.
pub(crate) fn rename_member(
    doc: SyntaxDoc,
    member: Member,
    in_type: Option<&str>,
    from: &str,
    to: &str,
) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("rename-member", "to", to)?;
    let declared: Vec<Node<'_>> = doc
        .identifiers(from)
        .into_iter()
        .filter(|id| is_declaration_name(*id))
        .filter(|id| {
            id.parent()
                .is_some_and(|decl| member.declares(decl) && in_type_scope(&doc, decl, in_type))
        })
        .collect();
    let owners: Vec<Node<'_>> = declared.iter().filter_map(|id| ancestor(*id, TYPE_DECLARATIONS)).collect();
    let owner_names: Vec<&str> = owners.iter().filter_map(|o| doc.name_of(*o)).collect();
    let inside_owner = |id: Node<'_>| owners.iter().any(|o| contains(*o, id));

    let mut edits: Vec<Edit> = declared.iter().map(|id| Edit::replace(*id, to)).collect();
    for id in doc.identifiers(from) {
        if is_declaration_name(id) {
            continue;
        }
        let renamed = match member_receiver(id) {
            Some(receiver) => {
                let text = doc.text(receiver);
                if matches!(text, "this" | "base") {
                    inside_owner(id)
                } else {
                    let last = text.rsplit('.').next().unwrap_or(text).trim();
                    owner_names.contains(&last)
                }
            }
            None => is_value_reference(id) && inside_owner(id) && !is_shadowed(&doc, id, from),
        };
        if renamed {
            edits.push(Edit::replace(id, to));
        }
    }
    doc.apply(edits)
}

/// Receiver of `recv.id` or `recv.id<T>`; `?.id` has no usable receiver and
/// yields the binding itself.
fn member_receiver(id: Node<'_>) -> Option<Node<'_>> {
    let name = match id.parent() {
        Some(p) if p.kind() == "generic_name" => p,
        _ => id,
    };
    let parent = name.parent()?;
    match parent.kind() {
        "member_access_expression" if is_field(parent, "name", name) => parent.child_by_field_name("expression"),
        "member_binding_expression" => Some(parent),
        _ => None,
    }
}

/// `true` when a parameter or local between `id` and its type declaration
/// declares `name`.
fn is_shadowed(doc: &SyntaxDoc, id: Node<'_>, name: &str) -> bool {
    let mut current = id.parent();
    while let Some(scope) = current {
        if TYPE_DECLARATIONS.contains(&scope.kind()) {
            return false;
        }
        if binds(doc, scope, name) {
            return true;
        }
        current = scope.parent();
    }
    false
}

fn binds(doc: &SyntaxDoc, scope: Node<'_>, name: &str) -> bool {
    if let Some(params) = scope.child_by_field_name("parameters") {
        // `x => ...` declares its only parameter as a bare identifier.
        let hit = if params.kind() == "identifier" {
            doc.text(params) == name
        } else {
            named_children(params)
                .into_iter()
                .any(|p| p.kind() == "parameter" && doc.name_of(p) == Some(name))
        };
        if hit {
            return true;
        }
    }
    if scope
        .child_by_field_name("left")
        .is_some_and(|left| left.kind() == "identifier" && doc.text(left) == name)
    {
        return true;
    }
    named_children(scope).into_iter().any(|child| declares_local(doc, child, name))
}

fn declares_local(doc: &SyntaxDoc, node: Node<'_>, name: &str) -> bool {
    match node.kind() {
        "local_declaration_statement" => named_children(node).into_iter().any(|c| declares_local(doc, c, name)),
        "variable_declaration" => named_children(node)
            .into_iter()
            .any(|d| d.kind() == "variable_declarator" && doc.name_of(d) == Some(name)),
        "catch_declaration" => doc.name_of(node) == Some(name),
        _ => false,
    }
}

/// Rename a parameter of `method` (any callable when absent) and its uses in
/// that callable.
pub(crate) fn rename_parameter(
    doc: SyntaxDoc,
    method: Option<&str>,
    from: &str,
    to: &str,
) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("rename-parameter", "to", to)?;
    let mut edits = Vec::new();
    for param in doc.nodes_of_kind(&["parameter"]) {
        if doc.name_of(param) != Some(from) {
            continue;
        }
        let Some(callable) = ancestor(param, CALLABLES) else { continue };
        if method.is_some_and(|m| doc.name_of(callable) != Some(m)) {
            continue;
        }
        if let Some(name) = param.child_by_field_name("name") {
            edits.push(Edit::replace(name, to));
        }
        edits.extend(
            doc.identifiers(from)
                .into_iter()
                .filter(|id| contains(callable, *id) && is_value_reference(*id))
                .map(|id| Edit::replace(id, to)),
        );
    }
    doc.apply(edits)
}

/// Rename a generic type parameter throughout the declaration that owns it.
pub(crate) fn rename_generic_parameter(
    doc: SyntaxDoc,
    in_type: Option<&str>,
    from: &str,
    to: &str,
) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("rename-generic-parameter", "to", to)?;
    let mut edits = Vec::new();
    for param in doc.nodes_of_kind(&["type_parameter"]) {
        if doc.name_of(param) != Some(from) {
            continue;
        }
        let Some(owner) = param.parent().and_then(|list| list.parent()) else { continue };
        let owned_by_type = TYPE_DECLARATIONS.contains(&owner.kind()) && doc.name_of(owner) == in_type;
        if in_type.is_some() && !owned_by_type && !in_type_scope(&doc, owner, in_type) {
            continue;
        }
        edits.extend(
            doc.identifiers(from)
                .into_iter()
                .filter(|id| contains(owner, *id) && is_generic_use(*id))
                .map(|id| Edit::replace(id, to)),
        );
    }
    doc.apply(edits)
}

/// Prefix unqualified type references to `name` with `qualified`'s namespace.
///
/// `qualified` is the full name (`System.IO.Stream` for `Stream`).
pub(crate) fn qualify_type(doc: SyntaxDoc, name: &str, qualified: &str) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("qualify-type", "qualified", qualified)?;
    let edits = doc
        .identifiers(name)
        .into_iter()
        .filter(|id| is_unqualified_type_use(*id))
        .map(|id| Edit::replace(id, qualified))
        .collect();
    doc.apply(edits)
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

const MEMBER_DECLARATIONS: &[&str] = &[
    "method_declaration",
    "property_declaration",
    "variable_declarator",
    "parameter",
    "enum_member_declaration",
    "local_function_statement",
    "type_parameter",
    "event_declaration",
    "argument",
];

const NAMESPACE_POSITIONS: &[&str] = &[
    "using_directive",
    "namespace_declaration",
    "file_scoped_namespace_declaration",
];

/// An identifier that can name a type: declarations, constructors, type
/// annotations, static access. Member names and namespaces are excluded.
fn is_type_position(id: Node<'_>) -> bool {
    let Some(parent) = id.parent() else { return false };
    match parent.kind() {
        "member_access_expression" => !is_field(parent, "name", id),
        "member_binding_expression" => false,
        kind if NAMESPACE_POSITIONS.contains(&kind) => false,
        kind if MEMBER_DECLARATIONS.contains(&kind) => !is_field(parent, "name", id),
        _ => true,
    }
}

/// An identifier used as a value or member: not a declaration name and not a
/// type annotation.
fn is_value_reference(id: Node<'_>) -> bool {
    let Some(parent) = id.parent() else { return false };
    match parent.kind() {
        "member_access_expression" => true,
        "member_binding_expression" => true,
        "generic_name" => parent.parent().is_some_and(|gp| {
            gp.kind() == "invocation_expression"
                || (gp.kind() == "member_access_expression" && is_field(gp, "name", parent))
        }),
        "qualified_name" | "type_parameter" | "attribute" | "type_argument_list" | "base_list" => false,
        kind if NAMESPACE_POSITIONS.contains(&kind) => false,
        _ => {
            !is_declaration_name(id)
                && !is_field(parent, "type", id)
                && !is_field(parent, "returns", id)
        }
    }
}

fn is_generic_use(id: Node<'_>) -> bool {
    let Some(parent) = id.parent() else { return false };
    if parent.kind() == "member_access_expression" && is_field(parent, "name", id) {
        return false;
    }
    !is_declaration_name(id) || matches!(parent.kind(), "type_parameter" | "type_parameter_constraints_clause")
}

fn is_unqualified_type_use(id: Node<'_>) -> bool {
    let Some(parent) = id.parent() else { return false };
    if ancestor(id, &["using_directive"]).is_some() {
        return false;
    }
    match parent.kind() {
        "qualified_name" => !is_field(parent, "name", id),
        "member_access_expression" => is_field(parent, "expression", id),
        "member_binding_expression" => false,
        kind if NAMESPACE_POSITIONS.contains(&kind) => false,
        _ => !is_declaration_name(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SyntaxDoc {
        SyntaxDoc::parse("Widget.cs", src).unwrap()
    }

    #[test]
    fn rename_type_covers_declaration_constructor_and_uses() {
        let src = "namespace A {\n    public class Widget {\n        public Widget() {}\n        public static Widget Create() => new Widget();\n        public int Widget2;\n    }\n}\n";
        let doc = rename_type(parse(src), "Widget", "Gadget").unwrap();
        assert_eq!(doc.source().matches("Gadget").count(), 4);
        assert!(doc.source().contains("Widget2"));
        assert_eq!(doc.file_name(), "Gadget.cs");
    }

    #[test]
    fn rename_type_keeps_member_names() {
        let src = "namespace A { class Holder { public Widget Widget { get; } void M() { var w = this.Widget; } } }";
        let doc = SyntaxDoc::parse("Holder.cs", src).unwrap();
        let doc = rename_type(doc, "Widget", "Gadget").unwrap();
        assert!(doc.source().contains("public Gadget Widget"));
        assert!(doc.source().contains("this.Widget"));
        assert_eq!(doc.file_name(), "Holder.cs");
    }

    #[test]
    fn rename_field_updates_accesses() {
        let src = "namespace A { class Widget { int _count; void M() { _count++; this._count = 2; } } }";
        let doc = rename_member(parse(src), Member::Field, Some("Widget"), "_count", "_total").unwrap();
        assert_eq!(doc.source().matches("_total").count(), 3);
        assert!(!doc.source().contains("_count"));
    }

    #[test]
    fn rename_method_updates_calls() {
        let src = "namespace A { class Widget { void Run() {} void M() { Run(); this.Run(); } } }";
        let doc = rename_member(parse(src), Member::Method, None, "Run", "Execute").unwrap();
        assert_eq!(doc.source().matches("Execute").count(), 3);
    }

    #[test]
    fn rename_parameter_is_scoped_to_its_method() {
        let src = "namespace A { class Widget { void M(int count) { Use(count); } void N(int count) { Use(count); } } }";
        let doc = rename_parameter(parse(src), Some("M"), "count", "n").unwrap();
        assert!(doc.source().contains("void M(int n) { Use(n); }"));
        assert!(doc.source().contains("void N(int count) { Use(count); }"));
    }

    #[test]
    fn rename_generic_parameter_in_type() {
        let src = "namespace A { class Box<T> where T : class { T Value; T Get() => Value; } }";
        let doc = SyntaxDoc::parse("Box.cs", src).unwrap();
        let doc = rename_generic_parameter(doc, Some("Box"), "T", "TItem").unwrap();
        assert!(doc.source().contains("class Box<TItem> where TItem : class"));
        assert!(doc.source().contains("TItem Value;"));
        assert!(doc.source().contains("TItem Get()"));
    }

    #[test]
    fn qualify_type_skips_already_qualified() {
        let src = "namespace A { class Widget { Stream a; System.IO.Stream b; } }";
        let doc = qualify_type(parse(src), "Stream", "System.IO.Stream").unwrap();
        assert!(doc.source().contains("System.IO.Stream a;"));
        assert!(doc.source().contains("System.IO.Stream b;"));
        assert!(!doc.source().contains("System.IO.System.IO"));
    }

    #[test]
    fn rename_field_leaves_shadowing_parameters_and_locals() {
        let src = "namespace N { class A { int count; void M(int count) { Use(count); this.count = count; } void N() { var count = 1; Use(count); } void O() { Use(count); } } }";
        let doc = rename_member(parse(src), Member::Field, Some("A"), "count", "total").unwrap();
        assert!(doc.source().contains("int total;"));
        assert!(doc.source().contains("void M(int count) { Use(count); this.total = count; }"));
        assert!(doc.source().contains("void N() { var count = 1; Use(count); }"));
        assert!(doc.source().contains("void O() { Use(total); }"));
    }

    #[test]
    fn rename_member_ignores_other_receivers_and_types() {
        let src = "namespace A { class Widget { public static int Count; } class Other { int Count; void M(Widget w) { Use(Widget.Count, w.Count, Count); } } }";
        let doc = rename_member(parse(src), Member::Field, Some("Widget"), "Count", "Total").unwrap();
        assert!(doc.source().contains("public static int Total;"));
        assert!(doc.source().contains("int Count; void M"));
        assert!(doc.source().contains("Use(Widget.Total, w.Count, Count);"));
    }
}
