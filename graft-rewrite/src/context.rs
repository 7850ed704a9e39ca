//! Per-file inputs that operations read but never mutate.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Key/value entries of one resource bundle.
pub type ResourceMap = BTreeMap<String, String>;

/// What the rewriter knows about the file being transformed.
#[derive(Debug, Clone, Default)]
pub struct FileContext {
    /// The file's alias, if it was imported under one.
    pub alias: Option<String>,
    /// Bundle resolved for the file's directory, shared between files.
    pub resources: Option<Arc<ResourceMap>>,
}

impl FileContext {
    pub fn new(alias: Option<String>) -> Self {
        Self {
            alias,
            resources: None,
        }
    }

    pub fn with_resources(mut self, resources: Arc<ResourceMap>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}
