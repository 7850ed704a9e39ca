//! `property-to-methods`.
//!
//! A property becomes a getter method and, when it has a `set` or `init`
//! accessor, a setter method. Auto-properties get a private backing field.
//! Call sites are not rewritten.

use tree_sitter::Node;

use super::{in_type_scope, require_non_empty};
use crate::error::RewriteError;
use crate::syntax::{ancestor, children, indent_at, modifiers, named_children, Edit, SyntaxDoc, TYPE_DECLARATIONS};

const ACCESS_MODIFIERS: &[&str] = &["public", "private", "protected", "internal"];

pub(crate) fn to_methods(
    doc: SyntaxDoc,
    in_type: Option<&str>,
    property: &str,
    getter: Option<&str>,
    setter: Option<&str>,
) -> Result<SyntaxDoc, RewriteError> {
    require_non_empty("property-to-methods", "property", property)?;
    let getter = getter.map_or_else(|| format!("Get{property}"), str::to_string);
    let setter = setter.map_or_else(|| format!("Set{property}"), str::to_string);

    let edits = doc
        .nodes_of_kind(&["property_declaration"])
        .into_iter()
        .filter(|decl| doc.name_of(*decl) == Some(property) && in_type_scope(&doc, *decl, in_type))
        .filter_map(|decl| {
            let names = MethodNames {
                property,
                getter: &getter,
                setter: &setter,
            };
            let members = expand(&doc, decl, &names)?;
            let indent = indent_at(doc.source(), decl.start_byte());
            Some(Edit::replace(decl, members.join(&format!("\n{indent}"))))
        })
        .collect();
    doc.apply(edits)
}

struct MethodNames<'a> {
    property: &'a str,
    getter: &'a str,
    setter: &'a str,
}

struct Accessor<'t> {
    keyword: String,
    modifiers: Vec<String>,
    body: Option<Node<'t>>,
}

/// Generated member declarations for one property, or `None` when the
/// property has neither an expression body nor an accessor list.
fn expand(doc: &SyntaxDoc, decl: Node<'_>, names: &MethodNames<'_>) -> Option<Vec<String>> {
    let ty = doc.text(decl.child_by_field_name("type")?);
    let property_modifiers: Vec<&str> = modifiers(doc, decl);
    let mods = property_modifiers.join(" ");

    let children_of_decl = named_children(decl);
    if let Some(arrow) = children_of_decl.iter().find(|c| c.kind() == "arrow_expression_clause") {
        return Some(vec![format!("{} {}() {};", prefix(&mods, ty), names.getter, doc.text(*arrow))]);
    }

    let accessor_list = children_of_decl.iter().find(|c| c.kind() == "accessor_list")?;
    let accessors: Vec<Accessor<'_>> = named_children(*accessor_list)
        .into_iter()
        .filter(|c| c.kind() == "accessor_declaration")
        .map(|a| accessor(doc, a))
        .collect();

    let is_abstract = property_modifiers.iter().any(|m| matches!(*m, "abstract" | "extern"))
        || ancestor(decl, TYPE_DECLARATIONS).is_some_and(|t| t.kind() == "interface_declaration");
    let is_auto = !is_abstract && accessors.iter().all(|a| a.body.is_none());
    let field = backing_field(names.property);

    let mut out = Vec::new();
    if is_auto {
        let is_static = property_modifiers.contains(&"static");
        let initializer = decl
            .child_by_field_name("value")
            .map(|v| format!(" = {}", doc.text(v)))
            .unwrap_or_default();
        let static_kw = if is_static { "static " } else { "" };
        out.push(format!("private {static_kw}{ty} {field}{initializer};"));
    }

    for accessor in &accessors {
        let method_mods = accessor_modifiers(&property_modifiers, &accessor.modifiers);
        let body = accessor.body.map(|b| doc.text(b));
        match accessor.keyword.as_str() {
            "get" => {
                let head = format!("{} {}()", prefix(&method_mods, ty), names.getter);
                out.push(match body {
                    _ if is_abstract => format!("{head};"),
                    None => format!("{head} {{ return {field}; }}"),
                    Some(b) if b.starts_with("=>") => format!("{head} {b};"),
                    Some(b) => format!("{head} {b}"),
                });
            }
            "set" | "init" => {
                let head = format!("{} {}({ty} value)", prefix(&method_mods, "void"), names.setter);
                out.push(match body {
                    _ if is_abstract => format!("{head};"),
                    None => format!("{head} {{ {field} = value; }}"),
                    Some(b) if b.starts_with("=>") => format!("{head} {b};"),
                    Some(b) => format!("{head} {b}"),
                });
            }
            _ => {}
        }
    }
    Some(out)
}

fn accessor<'t>(doc: &SyntaxDoc, node: Node<'t>) -> Accessor<'t> {
    let keyword = node
        .child_by_field_name("name")
        .map(|n| doc.text(n).to_string())
        .or_else(|| {
            children(node)
                .into_iter()
                .find(|c| matches!(c.kind(), "get" | "set" | "init"))
                .map(|c| c.kind().to_string())
        })
        .unwrap_or_default();
    let body = named_children(node)
        .into_iter()
        .find(|c| matches!(c.kind(), "block" | "arrow_expression_clause"));
    Accessor {
        keyword,
        modifiers: modifiers(doc, node).into_iter().map(str::to_string).collect(),
        body,
    }
}

/// Accessor-level access modifiers replace the property's; everything else
/// (`static`, `virtual`, ...) is kept.
fn accessor_modifiers(property: &[&str], accessor: &[String]) -> String {
    if accessor.is_empty() {
        return property.join(" ");
    }
    let kept = property.iter().filter(|m| !ACCESS_MODIFIERS.contains(m)).copied();
    accessor.iter().map(String::as_str).chain(kept).collect::<Vec<_>>().join(" ")
}

fn prefix(mods: &str, ty: &str) -> String {
    if mods.is_empty() {
        ty.to_string()
    } else {
        format!("{mods} {ty}")
    }
}

/// `Count` is backed by `_count`.
fn backing_field(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("_{}{}", first.to_lowercase(), chars.as_str()),
        None => "_value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str, property: &str) -> String {
        let doc = SyntaxDoc::parse("W.cs", src).unwrap();
        to_methods(doc, None, property, None, None).unwrap().into_source()
    }

    #[test]
    fn auto_property_gets_backing_field() {
        let out = run("class W\n{\n    public int Count { get; private set; } = 3;\n}\n", "Count");
        assert!(out.contains("    private int _count = 3;\n"), "got:\n{out}");
        assert!(out.contains("    public int GetCount() { return _count; }\n"), "got:\n{out}");
        assert!(out.contains("    private void SetCount(int value) { _count = value; }"), "got:\n{out}");
    }

    #[test]
    fn expression_bodied_property() {
        let out = run("class W { public string Name => \"w\"; }", "Name");
        assert!(out.contains("public string GetName() => \"w\";"), "got:\n{out}");
        assert!(!out.contains("SetName"));
    }

    #[test]
    fn explicit_accessor_bodies_are_kept() {
        let out = run(
            "class W { int _v; public int Value { get { return _v; } set => _v = value; } }",
            "Value",
        );
        assert!(out.contains("public int GetValue() { return _v; }"), "got:\n{out}");
        assert!(out.contains("public void SetValue(int value) => _v = value;"), "got:\n{out}");
    }

    #[test]
    fn interface_property_becomes_signatures() {
        let out = run("interface IW { int Count { get; } }", "Count");
        assert!(out.contains("int GetCount();"), "got:\n{out}");
        assert!(!out.contains("_count"));
    }

    #[test]
    fn backing_field_naming() {
        assert_eq!(backing_field("Count"), "_count");
        assert_eq!(backing_field("URL"), "_uRL");
    }
}
