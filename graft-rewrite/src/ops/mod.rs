//! The rewrite-operation catalog.
//!
//! [`apply`] is the single dispatch point: one exhaustive `match` over
//! [`RewriteOp`], so adding a variant without an implementation fails to
//! compile. Each operation module computes [`Edit`](crate::syntax::Edit)s
//! against the current tree and hands them to [`SyntaxDoc::apply`].

mod asyncness;
mod decorate;
mod header;
mod namespace;
mod property;
mod remove;
mod rename;
mod replace;
mod resources;

use graft_core::{RewriteOp, Rewriter};
use tree_sitter::Node;

use crate::context::FileContext;
use crate::error::RewriteError;
use crate::syntax::{ancestor, is_top_level, SyntaxDoc, TYPE_DECLARATIONS};

/// Run one registry entry against `doc`.
///
/// Entries whose alias predicate rejects the file's alias are skipped.
pub fn apply(doc: SyntaxDoc, rewriter: &Rewriter, ctx: &FileContext) -> Result<SyntaxDoc, RewriteError> {
    if !rewriter.applies_to(ctx.alias()) {
        tracing::trace!(kind = rewriter.op.kind(), file = doc.file_name(), "skipped by alias");
        return Ok(doc);
    }
    tracing::debug!(kind = rewriter.op.kind(), file = doc.file_name(), "apply rewrite");
    apply_op(doc, &rewriter.op, ctx)
}

/// Run `rewriters` in order, each over the previous output.
pub fn apply_all(mut doc: SyntaxDoc, rewriters: &[Rewriter], ctx: &FileContext) -> Result<SyntaxDoc, RewriteError> {
    for rewriter in rewriters {
        doc = apply(doc, rewriter, ctx)?;
    }
    Ok(doc)
}

/// Run one operation, ignoring alias restrictions.
pub fn apply_op(doc: SyntaxDoc, op: &RewriteOp, ctx: &FileContext) -> Result<SyntaxDoc, RewriteError> {
    match op {
        RewriteOp::RetargetNamespace { namespace } => namespace::retarget(doc, namespace),
        RewriteOp::RemapNamespace { from, to } => namespace::remap(doc, from, to),
        RewriteOp::RemapNamespaces { map } => namespace::remap_table(doc, map),
        RewriteOp::InjectHeader { header } => header::inject(doc, header),
        RewriteOp::InlineResources { bundle } => resources::inline(doc, bundle, ctx),
        RewriteOp::RenameType { from, to } => rename::rename_type(doc, from, to),
        RewriteOp::RenameIdentifier { from, to } => rename::rename_identifier(doc, from, to),
        RewriteOp::RenameProperty { in_type: t, from, to } => {
            rename::rename_member(doc, rename::Member::Property, t.as_deref(), from, to)
        }
        RewriteOp::RenameMethod { in_type: t, from, to } => {
            rename::rename_member(doc, rename::Member::Method, t.as_deref(), from, to)
        }
        RewriteOp::RenameField { in_type: t, from, to } => {
            rename::rename_member(doc, rename::Member::Field, t.as_deref(), from, to)
        }
        RewriteOp::RenameParameter { method, from, to } => {
            rename::rename_parameter(doc, method.as_deref(), from, to)
        }
        RewriteOp::RenameGenericParameter { in_type: t, from, to } => {
            rename::rename_generic_parameter(doc, t.as_deref(), from, to)
        }
        RewriteOp::RemoveType { name } => remove::remove_type(doc, name),
        RewriteOp::RemoveProperty { in_type: t, name } => remove::remove_property(doc, t.as_deref(), name),
        RewriteOp::RemoveMethod { in_type: t, name, parameters } => {
            remove::remove_method(doc, t.as_deref(), name, *parameters)
        }
        RewriteOp::RemoveField { in_type: t, name } => remove::remove_field(doc, t.as_deref(), name),
        RewriteOp::RemoveConstructor { in_type: t, parameters } => {
            remove::remove_constructor(doc, t.as_deref(), *parameters)
        }
        RewriteOp::RemoveParameter { method, name } => remove::remove_parameter(doc, method, name),
        RewriteOp::RemoveGenericParameter { in_type: t, name } => {
            remove::remove_generic_parameter(doc, t.as_deref(), name)
        }
        RewriteOp::AddAttribute { target, attribute } => {
            decorate::add_attribute(doc, target.as_deref(), attribute)
        }
        RewriteOp::RemoveAttribute { target, name } => {
            decorate::remove_attribute(doc, target.as_deref(), name)
        }
        RewriteOp::AddInterface { in_type: t, interface } => decorate::add_interface(doc, t.as_deref(), interface),
        RewriteOp::RemoveInterface { in_type: t, interface } => {
            decorate::remove_interface(doc, t.as_deref(), interface)
        }
        RewriteOp::AddUsing { namespace } => decorate::add_using(doc, namespace),
        RewriteOp::RemoveUsing { namespace } => decorate::remove_using(doc, namespace),
        RewriteOp::QualifyType { name, qualified } => rename::qualify_type(doc, name, qualified),
        RewriteOp::PropertyToMethods { in_type: t, property, getter, setter } => {
            property::to_methods(doc, t.as_deref(), property, getter.as_deref(), setter.as_deref())
        }
        RewriteOp::ReplaceLiteral { from, to } => replace::replace_literal(doc, from, to),
        RewriteOp::ReplaceComment { pattern, replacement } => replace::replace_comment(doc, pattern, replacement),
        RewriteOp::ReplaceExpression { pattern, replacement } => {
            replace::replace_expression(doc, pattern, replacement)
        }
        RewriteOp::ReplaceStatement { pattern, replacement } => {
            replace::replace_statement(doc, pattern, replacement)
        }
        RewriteOp::AddGenericParameter { in_type: t, name, constraint } => {
            decorate::add_generic_parameter(doc, t.as_deref(), name, constraint.as_deref())
        }
        RewriteOp::ToggleNullable { name, enabled } => decorate::toggle_nullable(doc, name.as_deref(), *enabled),
        RewriteOp::MakePartial { in_type: t } => decorate::make_partial(doc, t.as_deref()),
        RewriteOp::AddMember { in_type: t, code } => decorate::add_member(doc, t.as_deref(), code),
        RewriteOp::StripAsync => asyncness::strip_async(doc),
    }
}

// ---------------------------------------------------------------------------
// Scope helpers shared by the operation modules
// ---------------------------------------------------------------------------

/// Declarations of `kinds` named `in_type`; when absent, every top-level one.
pub(crate) fn target_types<'d>(doc: &'d SyntaxDoc, kinds: &[&str], in_type: Option<&str>) -> Vec<Node<'d>> {
    doc.nodes_of_kind(kinds)
        .into_iter()
        .filter(|decl| match in_type {
            Some(name) => doc.name_of(*decl) == Some(name),
            None => is_top_level(*decl),
        })
        .collect()
}

/// `true` when `node` is a member of the type named `in_type`, or always
/// when no type is given.
pub(crate) fn in_type_scope(doc: &SyntaxDoc, node: Node<'_>, in_type: Option<&str>) -> bool {
    match in_type {
        None => true,
        Some(name) => ancestor(node, TYPE_DECLARATIONS).and_then(|t| doc.name_of(t)) == Some(name),
    }
}

pub(crate) fn require_non_empty(kind: &'static str, field: &str, value: &str) -> Result<(), RewriteError> {
    if value.trim().is_empty() {
        return Err(RewriteError::InvalidParameters {
            kind,
            message: format!("'{field}' must not be empty"),
        });
    }
    Ok(())
}
