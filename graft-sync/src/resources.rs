//! Resource bundle discovery and lazy resolution.
//!
//! Bundles are located once per run from the branch listing. Content is
//! fetched and decoded the first time any file resolves to a bundle; the
//! per-bundle `OnceCell` makes concurrent first access compute once and
//! every other caller wait for that result. A failed load is cached too:
//! the bundle is read at most once per run and every file that resolves to
//! it sees the same error.

use std::collections::BTreeMap;
use std::sync::Arc;

use graft_core::naming::file_stem;
use graft_rewrite::ResourceMap;
use once_cell::sync::OnceCell;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::SyncError;
use crate::source::{BlobEntry, RevisionSource};

#[derive(Debug)]
struct Bundle {
    path: String,
    name: String,
    cell: OnceCell<Result<Arc<ResourceMap>, String>>,
}

/// A bundle matched to a source file.
#[derive(Debug, Clone)]
pub struct ResolvedBundle {
    /// File stem, the identifier code uses to reach the bundle.
    pub name: String,
    pub path: String,
    pub entries: Arc<ResourceMap>,
}

/// Maps bundle directories to their lazily decoded contents.
pub struct ResourceResolver<'s> {
    source: &'s dyn RevisionSource,
    branch: String,
    bundles: BTreeMap<String, Bundle>,
}

impl<'s> ResourceResolver<'s> {
    /// Collect the neutral-culture bundles in `listing`.
    ///
    /// `Strings.resx` is neutral; `Strings.de.resx` is a translation and is
    /// ignored. One bundle per directory: the first in path order wins.
    pub fn discover(
        source: &'s dyn RevisionSource,
        branch: &str,
        listing: &[BlobEntry],
        suffix: &str,
    ) -> Self {
        let mut bundles: BTreeMap<String, Bundle> = BTreeMap::new();
        let mut paths: Vec<&str> = listing
            .iter()
            .filter(|e| e.is_blob() && e.path.ends_with(suffix))
            .map(|e| e.path.as_str())
            .collect();
        paths.sort_unstable();

        for path in paths {
            let (dir, file) = split_dir(path);
            let name = &file[..file.len() - suffix.len()];
            if name.is_empty() || name.contains('.') {
                continue;
            }
            if let Some(existing) = bundles.get(dir) {
                tracing::warn!("ignoring bundle {} (directory already uses {})", path, existing.path);
                continue;
            }
            bundles.insert(
                dir.to_string(),
                Bundle {
                    path: path.to_string(),
                    name: name.to_string(),
                    cell: OnceCell::new(),
                },
            );
        }
        tracing::debug!(count = bundles.len(), "resource bundles discovered");

        Self {
            source,
            branch: branch.to_string(),
            bundles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Directory of the bundle that governs `path`: the deepest bundle
    /// directory that is a whole-segment prefix of it.
    pub fn bundle_dir_for(&self, path: &str) -> Option<&str> {
        let (mut dir, _) = split_dir(path);
        loop {
            if let Some((key, _)) = self.bundles.get_key_value(dir) {
                return Some(key.as_str());
            }
            if dir.is_empty() {
                return None;
            }
            dir = split_dir(dir).0;
        }
    }

    /// Resolve and, on first use, fetch the bundle governing `path`.
    pub fn resolve(&self, path: &str) -> Result<Option<ResolvedBundle>, SyncError> {
        let Some(dir) = self.bundle_dir_for(path) else {
            return Ok(None);
        };
        let Some(bundle) = self.bundles.get(dir) else {
            return Ok(None);
        };
        let loaded = bundle.cell.get_or_init(|| {
            tracing::debug!("loading resource bundle {}", bundle.path);
            let text = self.source.read(&self.branch, &bundle.path).map_err(|e| e.to_string())?;
            parse_resx(&bundle.path, &text).map(Arc::new).map_err(|e| e.to_string())
        });
        let entries = loaded.as_ref().map_err(|message| SyncError::Resource {
            path: bundle.path.clone(),
            message: message.clone(),
        })?;
        Ok(Some(ResolvedBundle {
            name: bundle.name.clone(),
            path: bundle.path.clone(),
            entries: Arc::clone(entries),
        }))
    }
}

/// `("a/b", "C.cs")` for `"a/b/C.cs"`; the root directory is `""`.
fn split_dir(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", path),
    }
}

// ---------------------------------------------------------------------------
// .resx decoding
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Entry {
    name: String,
    typed: bool,
    value: Option<String>,
}

/// Decode the string entries of a `.resx` document.
pub fn parse_resx(path: &str, text: &str) -> Result<ResourceMap, SyncError> {
    let fail = |message: String| SyncError::Resource {
        path: path.to_string(),
        message,
    };
    let mut reader = Reader::from_str(text);
    let mut map = ResourceMap::new();
    let mut entry: Option<Entry> = None;
    let mut in_value = false;

    loop {
        match reader.read_event().map_err(|e| fail(e.to_string()))? {
            Event::Start(e) => match e.name().as_ref() {
                b"data" => {
                    let name = match e.try_get_attribute("name").map_err(|e| fail(e.to_string()))? {
                        Some(attr) => attr.unescape_value().map_err(|e| fail(e.to_string()))?.into_owned(),
                        None => String::new(),
                    };
                    let typed = e
                        .try_get_attribute("type")
                        .map_err(|e| fail(e.to_string()))?
                        .is_some();
                    entry = Some(Entry {
                        name,
                        typed,
                        value: None,
                    });
                }
                b"value" if entry.is_some() => in_value = true,
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"value" => {
                if let Some(entry) = entry.as_mut() {
                    entry.value = Some(String::new());
                }
            }
            Event::Text(t) if in_value => {
                let text = t.unescape().map_err(|e| fail(e.to_string()))?;
                if let Some(entry) = entry.as_mut() {
                    entry.value.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::CData(c) if in_value => {
                let raw = c.into_inner();
                if let Some(entry) = entry.as_mut() {
                    entry
                        .value
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"value" => {
                    in_value = false;
                    if let Some(entry) = entry.as_mut() {
                        entry.value.get_or_insert_with(String::new);
                    }
                }
                b"data" => {
                    if let Some(done) = entry.take() {
                        match done.value {
                            Some(value) if !done.typed && !done.name.is_empty() => {
                                map.insert(done.name, value);
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use rayon::prelude::*;

    use super::*;
    use crate::source::MemorySource;

    /// Wraps a source and counts reads.
    struct CountingSource {
        inner: MemorySource,
        reads: AtomicUsize,
    }

    impl CountingSource {
        fn new(inner: MemorySource) -> Self {
            Self {
                inner,
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl RevisionSource for CountingSource {
        fn list(&self, branch: &str) -> Result<Vec<BlobEntry>, SyncError> {
            self.inner.list(branch)
        }

        fn read(&self, branch: &str, path: &str) -> Result<String, SyncError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            // Widen the window in which other callers arrive mid-load.
            std::thread::sleep(Duration::from_millis(20));
            self.inner.read(branch, path)
        }
    }

    const RESX: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <resheader name="resmimetype"><value>text/microsoft-resx</value></resheader>
  <data name="Greeting" xml:space="preserve">
    <value>Hello &amp; welcome</value>
    <comment>shown on start</comment>
  </data>
  <data name="Empty"><value /></data>
  <data name="Icon" type="System.Resources.ResXFileRef, System.Windows.Forms">
    <value>icon.png;System.Byte[]</value>
  </data>
</root>
"#;

    fn bundle(name: &str) -> String {
        RESX.replace("Greeting", name)
    }

    #[test]
    fn resx_string_entries_decode() {
        let map = parse_resx("Strings.resx", RESX).unwrap();
        assert_eq!(map.get("Greeting").map(String::as_str), Some("Hello & welcome"));
        assert_eq!(map.get("Empty").map(String::as_str), Some(""));
        assert!(!map.contains_key("Icon"));
        assert!(!map.contains_key("resmimetype"));
    }

    #[test]
    fn malformed_resx_is_a_resource_error() {
        let err = parse_resx("Bad.resx", "<root><data name=\"A\"><value>x</data></root>").unwrap_err();
        assert!(matches!(err, SyncError::Resource { .. }), "got: {err}");
    }

    #[test]
    fn deepest_bundle_directory_wins() {
        let source = MemorySource::new()
            .with_file("main", "a/Strings.resx", "1", &bundle("Outer"))
            .with_file("main", "a/b/Strings.resx", "2", &bundle("Inner"))
            .with_file("main", "a/b/c/File.cs", "3", "namespace A {}");
        let listing = source.list("main").unwrap();
        let resolver = ResourceResolver::discover(&source, "main", &listing, ".resx");

        assert_eq!(resolver.bundle_dir_for("a/b/c/File.cs"), Some("a/b"));
        assert_eq!(resolver.bundle_dir_for("a/x/File.cs"), Some("a"));
        assert_eq!(resolver.bundle_dir_for("ab/File.cs"), None);
        assert_eq!(resolver.bundle_dir_for("File.cs"), None);

        let resolved = resolver.resolve("a/b/c/File.cs").unwrap().expect("bundle");
        assert_eq!(resolved.name, "Strings");
        assert_eq!(resolved.path, "a/b/Strings.resx");
        assert!(resolved.entries.contains_key("Inner"));
    }

    #[test]
    fn culture_variants_are_not_bundles() {
        let source = MemorySource::new()
            .with_file("main", "a/Strings.de.resx", "1", RESX)
            .with_file("main", "a/File.cs", "2", "namespace A {}");
        let listing = source.list("main").unwrap();
        let resolver = ResourceResolver::discover(&source, "main", &listing, ".resx");
        assert!(resolver.is_empty());
        assert!(resolver.resolve("a/File.cs").unwrap().is_none());
    }

    #[test]
    fn bundle_is_shared_between_files() {
        let source = MemorySource::new()
            .with_file("main", "Strings.resx", "1", RESX)
            .with_file("main", "x/A.cs", "2", "")
            .with_file("main", "y/B.cs", "3", "");
        let listing = source.list("main").unwrap();
        let resolver = ResourceResolver::discover(&source, "main", &listing, ".resx");
        let a = resolver.resolve("x/A.cs").unwrap().expect("bundle");
        let b = resolver.resolve("y/B.cs").unwrap().expect("bundle");
        assert!(Arc::ptr_eq(&a.entries, &b.entries));
    }

    #[test]
    fn unreadable_bundle_fails_resolution() {
        let source = MemorySource::new()
            .with_unreadable("main", "Strings.resx", "1")
            .with_file("main", "A.cs", "2", "");
        let listing = source.list("main").unwrap();
        let resolver = ResourceResolver::discover(&source, "main", &listing, ".resx");
        assert!(resolver.resolve("A.cs").is_err());
    }

    #[test]
    fn concurrent_first_use_reads_the_bundle_once() {
        let mut inner = MemorySource::new().with_file("main", "Strings.resx", "1", RESX);
        for i in 0..32 {
            inner.insert("main", &format!("src/F{i}.cs"), &i.to_string(), Some(String::new()));
        }
        let source = CountingSource::new(inner);
        let listing = source.list("main").unwrap();
        let resolver = ResourceResolver::discover(&source, "main", &listing, ".resx");

        let resolved: Vec<ResolvedBundle> = (0..32)
            .into_par_iter()
            .map(|i| resolver.resolve(&format!("src/F{i}.cs")).unwrap().expect("bundle"))
            .collect();

        assert_eq!(source.reads(), 1);
        assert!(resolved.iter().all(|b| Arc::ptr_eq(&b.entries, &resolved[0].entries)));
    }

    #[test]
    fn failed_bundle_load_is_not_retried() {
        let source = CountingSource::new(
            MemorySource::new()
                .with_unreadable("main", "Strings.resx", "1")
                .with_file("main", "A.cs", "2", "")
                .with_file("main", "B.cs", "3", ""),
        );
        let listing = source.list("main").unwrap();
        let resolver = ResourceResolver::discover(&source, "main", &listing, ".resx");

        let errors: Vec<SyncError> = ["A.cs", "B.cs", "A.cs"]
            .into_par_iter()
            .map(|path| resolver.resolve(path).unwrap_err())
            .collect();

        assert_eq!(source.reads(), 1);
        for err in &errors {
            assert!(matches!(err, SyncError::Resource { path, .. } if path == "Strings.resx"), "got: {err}");
        }
    }
}
