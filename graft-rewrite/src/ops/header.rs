//! `inject-header`.

use graft_core::ProvenanceHeader;

use crate::error::RewriteError;
use crate::syntax::{Edit, SyntaxDoc};

pub(crate) fn inject(doc: SyntaxDoc, header: &ProvenanceHeader) -> Result<SyntaxDoc, RewriteError> {
    let mut block = header.encode();
    if !doc.source().starts_with('\n') {
        block.push('\n');
    }
    doc.apply(vec![Edit::insert(0, block)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_precedes_source_and_decodes() {
        let header = ProvenanceHeader::new("https://h/blob", "main", "Foo/Bar.cs", "abc123", None);
        let doc = SyntaxDoc::parse("Bar.cs", "namespace Foo {}\n").unwrap();
        let doc = inject(doc, &header).unwrap();
        assert!(doc.source().starts_with("// <auto-generated>"));
        assert!(doc.source().ends_with("// </auto-generated>\n\nnamespace Foo {}\n"));
        let decoded = ProvenanceHeader::decode(doc.source()).unwrap();
        assert_eq!(decoded.content_hash, "abc123");
    }
}
