//! Namespace and primary-type discovery.

use graft_core::naming::is_file_type;

use crate::error::RewriteError;
use crate::syntax::{SyntaxDoc, NAMESPACE_DECLARATIONS, TYPE_DECLARATIONS};

/// What a parsed file declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// First namespace declared in the file.
    pub namespace: String,
    /// First type declaration whose name belongs to the file name.
    pub primary_type: Option<String>,
}

/// Inspect `doc` for its namespace and primary type.
///
/// Fails with [`RewriteError::NoNamespace`] when the file declares no
/// namespace; such files cannot be placed in the target tree.
pub fn discover(doc: &SyntaxDoc) -> Result<Discovery, RewriteError> {
    let namespace = doc
        .nodes_of_kind(NAMESPACE_DECLARATIONS)
        .into_iter()
        .find_map(|ns| ns.child_by_field_name("name"))
        .map(|name| doc.text(name).split_whitespace().collect::<String>())
        .ok_or_else(|| RewriteError::NoNamespace {
            file: doc.file_name().to_string(),
        })?;

    let primary_type = doc
        .nodes_of_kind(TYPE_DECLARATIONS)
        .into_iter()
        .filter_map(|decl| doc.name_of(decl))
        .find(|name| is_file_type(doc.file_name(), name))
        .map(str::to_string);

    Ok(Discovery {
        namespace,
        primary_type,
    })
}
