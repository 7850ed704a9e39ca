//! `inline-resources`.

use crate::context::{FileContext, ResourceMap};
use crate::error::RewriteError;
use crate::syntax::{string_literal, Edit, SyntaxDoc};

/// Replace `<bundle>.<Key>` (optionally namespace-qualified) with the
/// bundle's literal value. Unknown keys stay as written.
pub(crate) fn inline(doc: SyntaxDoc, bundle: &str, ctx: &FileContext) -> Result<SyntaxDoc, RewriteError> {
    let resources = ctx.resources.as_deref().ok_or_else(|| RewriteError::MissingBundle {
        bundle: bundle.to_string(),
    })?;
    let edits = inline_edits(&doc, bundle, resources);
    doc.apply(edits)
}

fn inline_edits(doc: &SyntaxDoc, bundle: &str, resources: &ResourceMap) -> Vec<Edit> {
    let qualified_suffix = format!(".{bundle}");
    doc.nodes_of_kind(&["member_access_expression"])
        .into_iter()
        .filter_map(|access| {
            let owner: String = doc
                .text(access.child_by_field_name("expression")?)
                .split_whitespace()
                .collect();
            if owner != bundle && !owner.ends_with(&qualified_suffix) {
                return None;
            }
            let key = doc.text(access.child_by_field_name("name")?);
            let value = resources.get(key)?;
            Some(Edit::replace(access, string_literal(value)))
        })
        .collect()
}
