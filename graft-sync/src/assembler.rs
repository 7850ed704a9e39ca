//! Pipeline assembly: the ordered rewriter list for one file.

use std::collections::BTreeMap;

use graft_core::{ImportRegistry, ProvenanceHeader, RewriteOp, Rewriter};
use graft_rewrite::FileContext;

use crate::error::SyncError;
use crate::resources::ResourceResolver;
use crate::settings::FileImportSettings;

/// Rewriters to run, in order, plus the context they run with.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub rewriters: Vec<Rewriter>,
    pub context: FileContext,
}

/// Build the pipeline for one file. Precedence, first applied first:
///
/// 1. retarget the file's namespace declaration
/// 2. the whole namespace map as one remap pass
/// 3. the provenance header
/// 4. resource inlining, when a bundle governs the file's directory
/// 5. the pinned record's rewriters for `(path, alias)`
/// 6. rewriters of every matching rule set, in registry order
pub fn assemble(
    settings: &FileImportSettings,
    registry: &ImportRegistry,
    remote_prefix: &str,
    branch: &str,
    resources: &ResourceResolver<'_>,
) -> Result<Pipeline, SyncError> {
    let path = settings.source_path.as_str();
    let alias = settings.alias.as_deref();
    let mut rewriters = vec![Rewriter::new(RewriteOp::RetargetNamespace {
        namespace: settings.target_namespace.clone(),
    })];

    let map: BTreeMap<String, String> = registry
        .namespace_map
        .iter()
        .filter(|(from, to)| from != to)
        .map(|(from, to)| (from.clone(), to.clone()))
        .collect();
    if !map.is_empty() {
        rewriters.push(Rewriter::new(RewriteOp::RemapNamespaces { map }));
    }

    rewriters.push(Rewriter::new(RewriteOp::InjectHeader {
        header: ProvenanceHeader::new(remote_prefix, branch, path, &settings.source_hash, alias),
    }));

    let mut context = FileContext::new(settings.alias.clone());
    if let Some(bundle) = resources.resolve(path)? {
        tracing::debug!("{} uses resource bundle {}", path, bundle.path);
        context = context.with_resources(bundle.entries);
        rewriters.push(Rewriter::new(RewriteOp::InlineResources { bundle: bundle.name }));
    }

    if let Some(record) = registry.find_record(path, alias)? {
        rewriters.extend(record.rewriters.iter().cloned());
    }

    for rule_set in registry.matching_rule_sets(path, alias)? {
        rewriters.extend(rule_set.rewriters.iter().cloned());
    }

    Ok(Pipeline { rewriters, context })
}
