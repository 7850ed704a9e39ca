//! graft rewrite engine: C# syntax trees and the rewrite-operation catalog.
//!
//! - [`syntax`]: [`SyntaxDoc`] and the [`Edit`] primitive
//! - [`discover`]: namespace and primary-type discovery
//! - [`ops`]: [`apply`] / [`apply_all`] over [`graft_core::RewriteOp`]
//! - [`context`]: per-file alias and resource bundle
//! - [`error`]: [`RewriteError`]

pub mod context;
pub mod discover;
pub mod error;
pub mod ops;
pub mod syntax;

pub use context::{FileContext, ResourceMap};
pub use discover::{discover, Discovery};
pub use error::RewriteError;
pub use ops::{apply, apply_all, apply_op};
pub use syntax::{Edit, SyntaxDoc};
