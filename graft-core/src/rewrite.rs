//! Declarative schema of the rewrite-operation catalog.
//!
//! The catalog is closed: every operation the pipeline can run is one
//! [`RewriteOp`] variant, keyed by a `kind` discriminator in the registry
//! document. Application lives in `graft-rewrite`; this module only owns the
//! persisted shape so registry load/save never depends on the parser.
//!
//! A registry entry is either a bare string naming a parameterless variant
//!
//! ```yaml
//! rewriters:
//!   - strip-async
//! ```
//!
//! or a tagged map, optionally restricted to some aliases:
//!
//! ```yaml
//! rewriters:
//!   - kind: rename-type
//!     from: Widget
//!     to: Gadget
//!     alias: "!sync"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::matcher::{alias_matches, AliasPredicate};
use crate::provenance::ProvenanceHeader;

/// One tree-to-tree transformation and its parameters.
///
/// `type` fields (`in_type`) restrict an operation to members of the named
/// type declaration. Absent means every type declaration in the file, except
/// that operations adding to a type (bases, members, `partial`, generic
/// parameters) only touch top-level declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RewriteOp {
    /// Point the file's own namespace declaration at `namespace`.
    RetargetNamespace { namespace: String },
    /// Rewrite references (usings, qualified names) from one namespace to another.
    RemapNamespace { from: String, to: String },
    /// Apply a whole namespace map in one pass. Each reference takes the
    /// longest matching key and is rewritten at most once.
    RemapNamespaces { map: BTreeMap<String, String> },
    /// Prepend the provenance comment block.
    InjectHeader { header: ProvenanceHeader },
    /// Replace `<bundle>.<Key>` accesses with literals from the file's resolved bundle.
    InlineResources { bundle: String },
    /// Rename a type, its references and, when the file belongs to it, the file.
    RenameType { from: String, to: String },
    /// Rename every identifier token with the given text.
    RenameIdentifier { from: String, to: String },
    RenameProperty {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        from: String,
        to: String,
    },
    RenameMethod {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        from: String,
        to: String,
    },
    RenameField {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        from: String,
        to: String,
    },
    /// Rename a parameter and its uses inside the declaring method body.
    RenameParameter {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        from: String,
        to: String,
    },
    RenameGenericParameter {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        from: String,
        to: String,
    },
    RemoveType { name: String },
    RemoveProperty {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        name: String,
    },
    /// Remove a method; `parameters` narrows overloads by arity.
    RemoveMethod {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<usize>,
    },
    RemoveField {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        name: String,
    },
    RemoveConstructor {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<usize>,
    },
    RemoveParameter { method: String, name: String },
    RemoveGenericParameter {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        name: String,
    },
    /// Add `[attribute]` to the named declaration (type or member).
    AddAttribute {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        attribute: String,
    },
    RemoveAttribute {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        name: String,
    },
    AddInterface {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        interface: String,
    },
    RemoveInterface {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        interface: String,
    },
    AddUsing { namespace: String },
    RemoveUsing { namespace: String },
    /// Replace unqualified references to `name` with `qualified`.
    QualifyType { name: String, qualified: String },
    /// Turn a property into a getter/setter method pair.
    PropertyToMethods {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        property: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        getter: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        setter: Option<String>,
    },
    ReplaceLiteral { from: String, to: String },
    /// Regex replacement inside comments; an emptied comment is removed.
    ReplaceComment { pattern: String, replacement: String },
    /// Replace expressions whose whitespace-normalised text equals `pattern`.
    ReplaceExpression { pattern: String, replacement: String },
    /// Replace statements whose whitespace-normalised text equals `pattern`;
    /// an empty replacement deletes the statement.
    ReplaceStatement { pattern: String, replacement: String },
    AddGenericParameter {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraint: Option<String>,
    },
    /// `enabled: true` annotates declared types named `name` as nullable;
    /// `enabled: false` strips `?` (from every nullable type when `name` is absent).
    ToggleNullable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        enabled: bool,
    },
    MakePartial {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
    },
    /// Append raw member source to a type body.
    AddMember {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        in_type: Option<String>,
        code: String,
    },
    /// Remove async-call syntax and unwrap task-like types.
    StripAsync,
}

impl RewriteOp {
    /// The discriminator as written in the registry.
    pub fn kind(&self) -> &'static str {
        match self {
            RewriteOp::RetargetNamespace { .. } => "retarget-namespace",
            RewriteOp::RemapNamespace { .. } => "remap-namespace",
            RewriteOp::RemapNamespaces { .. } => "remap-namespaces",
            RewriteOp::InjectHeader { .. } => "inject-header",
            RewriteOp::InlineResources { .. } => "inline-resources",
            RewriteOp::RenameType { .. } => "rename-type",
            RewriteOp::RenameIdentifier { .. } => "rename-identifier",
            RewriteOp::RenameProperty { .. } => "rename-property",
            RewriteOp::RenameMethod { .. } => "rename-method",
            RewriteOp::RenameField { .. } => "rename-field",
            RewriteOp::RenameParameter { .. } => "rename-parameter",
            RewriteOp::RenameGenericParameter { .. } => "rename-generic-parameter",
            RewriteOp::RemoveType { .. } => "remove-type",
            RewriteOp::RemoveProperty { .. } => "remove-property",
            RewriteOp::RemoveMethod { .. } => "remove-method",
            RewriteOp::RemoveField { .. } => "remove-field",
            RewriteOp::RemoveConstructor { .. } => "remove-constructor",
            RewriteOp::RemoveParameter { .. } => "remove-parameter",
            RewriteOp::RemoveGenericParameter { .. } => "remove-generic-parameter",
            RewriteOp::AddAttribute { .. } => "add-attribute",
            RewriteOp::RemoveAttribute { .. } => "remove-attribute",
            RewriteOp::AddInterface { .. } => "add-interface",
            RewriteOp::RemoveInterface { .. } => "remove-interface",
            RewriteOp::AddUsing { .. } => "add-using",
            RewriteOp::RemoveUsing { .. } => "remove-using",
            RewriteOp::QualifyType { .. } => "qualify-type",
            RewriteOp::PropertyToMethods { .. } => "property-to-methods",
            RewriteOp::ReplaceLiteral { .. } => "replace-literal",
            RewriteOp::ReplaceComment { .. } => "replace-comment",
            RewriteOp::ReplaceExpression { .. } => "replace-expression",
            RewriteOp::ReplaceStatement { .. } => "replace-statement",
            RewriteOp::AddGenericParameter { .. } => "add-generic-parameter",
            RewriteOp::ToggleNullable { .. } => "toggle-nullable",
            RewriteOp::MakePartial { .. } => "make-partial",
            RewriteOp::AddMember { .. } => "add-member",
            RewriteOp::StripAsync => "strip-async",
        }
    }

    /// Parse a bare-string shorthand.
    pub fn from_shorthand(name: &str) -> Result<Self, RegistryError> {
        match name {
            "strip-async" => Ok(RewriteOp::StripAsync),
            "make-partial" => Ok(RewriteOp::MakePartial { in_type: None }),
            other => Err(RegistryError::UnknownShorthand(other.to_string())),
        }
    }

    /// `true` when the operation can be written as a bare string.
    pub fn is_shorthand(&self) -> bool {
        matches!(
            self,
            RewriteOp::StripAsync | RewriteOp::MakePartial { in_type: None }
        )
    }
}

/// A registry entry: one operation plus an optional alias restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RewriterRepr", into = "RewriterRepr")]
pub struct Rewriter {
    pub op: RewriteOp,
    pub alias: Option<AliasPredicate>,
}

impl Rewriter {
    pub fn new(op: RewriteOp) -> Self {
        Self { op, alias: None }
    }

    /// `true` when this entry should run for a file with `alias`.
    pub fn applies_to(&self, alias: Option<&str>) -> bool {
        alias_matches(self.alias.as_ref(), alias)
    }
}

impl From<RewriteOp> for Rewriter {
    fn from(op: RewriteOp) -> Self {
        Self::new(op)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RewriterRepr {
    Shorthand(String),
    Tagged(TaggedRewriter),
}

#[derive(Serialize, Deserialize)]
struct TaggedRewriter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<AliasPredicate>,
    #[serde(flatten)]
    op: RewriteOp,
}

impl TryFrom<RewriterRepr> for Rewriter {
    type Error = RegistryError;

    fn try_from(repr: RewriterRepr) -> Result<Self, Self::Error> {
        match repr {
            RewriterRepr::Shorthand(name) => Ok(Rewriter::new(RewriteOp::from_shorthand(&name)?)),
            RewriterRepr::Tagged(TaggedRewriter { alias, op }) => Ok(Rewriter { op, alias }),
        }
    }
}

impl From<Rewriter> for RewriterRepr {
    fn from(rewriter: Rewriter) -> Self {
        if rewriter.alias.is_none() && rewriter.op.is_shorthand() {
            return RewriterRepr::Shorthand(rewriter.op.kind().to_string());
        }
        RewriterRepr::Tagged(TaggedRewriter {
            alias: rewriter.alias,
            op: rewriter.op,
        })
    }
}
