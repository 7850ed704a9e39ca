//! Provenance header codec.
//!
//! Every generated file starts with a comment block that records where it
//! came from. Scanning prior output for these blocks is the only way to
//! recover `(source path, alias, hash)` for recency-based reimport.
//!
//! ```text
//! // <auto-generated>
//! //   This file was imported by graft. Edit the import rules, not this file.
//! //   source: https://example.org/repo/blob/main/Foo/Bar.cs
//! //   hash: abc123
//! //   alias: sync
//! // </auto-generated>
//! ```

use serde::{Deserialize, Serialize};

const OPEN: &str = "// <auto-generated>";
const CLOSE: &str = "// </auto-generated>";
const NOTICE: &str = "This file was imported by graft. Edit the import rules, not this file.";

/// Link from a generated file back to its upstream origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceHeader {
    pub source_path: String,
    pub remote_url: String,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ProvenanceHeader {
    /// Build a header for `path` imported from `branch` under `remote_prefix`.
    pub fn new(
        remote_prefix: &str,
        branch: &str,
        path: &str,
        content_hash: &str,
        alias: Option<&str>,
    ) -> Self {
        Self {
            source_path: path.to_string(),
            remote_url: remote_url(remote_prefix, branch, path),
            content_hash: content_hash.to_string(),
            alias: alias.map(str::to_string),
        }
    }

    /// Render the comment block, newline-terminated.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push_str(OPEN);
        out.push('\n');
        out.push_str(&format!("//   {NOTICE}\n"));
        out.push_str(&format!("//   source: {}\n", self.remote_url));
        out.push_str(&format!("//   hash: {}\n", self.content_hash));
        if let Some(alias) = &self.alias {
            out.push_str(&format!("//   alias: {alias}\n"));
        }
        out.push_str(CLOSE);
        out.push('\n');
        out
    }

    /// Parse the leading header of a generated file.
    ///
    /// `source_path` is left empty; recover it with [`source_path_under`]
    /// once the remote prefix and branch are known.
    pub fn decode(text: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim).skip_while(|l| l.is_empty());
        if lines.next()? != OPEN {
            return None;
        }
        let mut remote_url = None;
        let mut content_hash = None;
        let mut alias = None;
        for line in lines {
            if line == CLOSE {
                return Some(Self {
                    source_path: String::new(),
                    remote_url: remote_url?,
                    content_hash: content_hash?,
                    alias,
                });
            }
            let body = line.strip_prefix("//")?.trim();
            if let Some((key, value)) = body.split_once(": ") {
                match key {
                    "source" => remote_url = Some(value.trim().to_string()),
                    "hash" => content_hash = Some(value.trim().to_string()),
                    "alias" => alias = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }
        None
    }
}

/// `remotePrefix/branch/path` with single separators.
pub fn remote_url(remote_prefix: &str, branch: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        remote_prefix.trim_end_matches('/'),
        branch.trim_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Recover the repository-relative path from a remote URL, if the URL lives
/// under `remote_prefix/branch/`.
pub fn source_path_under(url: &str, remote_prefix: &str, branch: &str) -> Option<String> {
    let base = remote_url(remote_prefix, branch, "");
    let rest = url.strip_prefix(&base)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_keeps_alias_and_hash() {
        let header = ProvenanceHeader::new("https://git.example/repo/blob/", "main", "Foo/Bar.cs", "abc123", Some("sync"));
        let text = format!("{}namespace Foo {{}}\n", header.encode());
        let decoded = ProvenanceHeader::decode(&text).expect("decode");
        assert_eq!(decoded.remote_url, "https://git.example/repo/blob/main/Foo/Bar.cs");
        assert_eq!(decoded.content_hash, "abc123");
        assert_eq!(decoded.alias.as_deref(), Some("sync"));
    }

    #[test]
    fn decode_rejects_plain_sources() {
        assert!(ProvenanceHeader::decode("// just a comment\nnamespace Foo {}\n").is_none());
    }

    #[test]
    fn decode_requires_closing_marker() {
        let text = "// <auto-generated>\n//   source: x/main/A.cs\n//   hash: 1\n";
        assert!(ProvenanceHeader::decode(text).is_none());
    }

    #[test]
    fn source_path_requires_matching_branch() {
        let url = "https://git.example/r/main/Foo/Bar.cs";
        assert_eq!(
            source_path_under(url, "https://git.example/r", "main").as_deref(),
            Some("Foo/Bar.cs")
        );
        assert_eq!(source_path_under(url, "https://git.example/r", "dev"), None);
    }
}
