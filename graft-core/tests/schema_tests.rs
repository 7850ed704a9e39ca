//! Registry schema decoding: rewriter shorthand, tagged entries, alias
//! predicates, and a hand-written registry document.
//!
//! Each `#[case]` is isolated: no shared state.

use graft_core::{
    matcher::alias_matches, AliasPredicate, ImportRegistry, RewriteOp, Rewriter,
};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Alias truth table
// ---------------------------------------------------------------------------

fn one(term: &str) -> Option<AliasPredicate> {
    Some(AliasPredicate::One(term.to_string()))
}

fn many(terms: &[&str]) -> Option<AliasPredicate> {
    Some(AliasPredicate::Many(terms.iter().map(|t| t.to_string()).collect()))
}

#[rstest]
#[case(None, None, true)]
#[case(None, Some("sync"), true)]
#[case(None, Some("other"), true)]
#[case(one("sync"), Some("sync"), true)]
#[case(one("sync"), Some("async"), false)]
#[case(one("sync"), None, false)]
#[case(one("!sync"), Some("sync"), false)]
#[case(one("!sync"), Some("async"), true)]
#[case(one("!sync"), None, true)]
#[case(many(&["sync", "async"]), Some("sync"), true)]
#[case(many(&["sync", "async"]), Some("async"), true)]
#[case(many(&["sync", "async"]), Some("other"), false)]
#[case(many(&["sync", "async"]), None, false)]
#[case(many(&["!sync", "!async"]), Some("sync"), false)]
#[case(many(&["!sync", "!async"]), Some("async"), false)]
#[case(many(&["!sync", "!async"]), Some("other"), true)]
#[case(many(&["!sync", "!async"]), None, true)]
fn alias_truth_table(
    #[case] predicate: Option<AliasPredicate>,
    #[case] alias: Option<&str>,
    #[case] expected: bool,
) {
    assert_eq!(
        alias_matches(predicate.as_ref(), alias),
        expected,
        "predicate {predicate:?} against {alias:?}"
    );
}

// ---------------------------------------------------------------------------
// Rewriter entries
// ---------------------------------------------------------------------------

#[rstest]
#[case("strip-async", RewriteOp::StripAsync)]
#[case("make-partial", RewriteOp::MakePartial { in_type: None })]
fn bare_string_shorthand_decodes(#[case] yaml: &str, #[case] expected: RewriteOp) {
    let rewriter: Rewriter = serde_yaml::from_str(yaml).expect("decode");
    assert_eq!(rewriter.op, expected);
    assert!(rewriter.alias.is_none());
}

#[test]
fn unknown_shorthand_is_rejected() {
    let err = serde_yaml::from_str::<Rewriter>("rename-type").unwrap_err();
    assert!(err.to_string().contains("rename-type"), "got: {err}");
}

#[rstest]
#[case(
    "kind: rename-type\nfrom: Widget\nto: Gadget\n",
    RewriteOp::RenameType { from: "Widget".into(), to: "Gadget".into() }
)]
#[case(
    "kind: remove-method\ntype: Widget\nname: Dispose\nparameters: 0\n",
    RewriteOp::RemoveMethod { in_type: Some("Widget".into()), name: "Dispose".into(), parameters: Some(0) }
)]
#[case(
    "kind: toggle-nullable\nenabled: false\n",
    RewriteOp::ToggleNullable { name: None, enabled: false }
)]
#[case(
    "kind: make-partial\ntype: Widget\n",
    RewriteOp::MakePartial { in_type: Some("Widget".into()) }
)]
#[case(
    "kind: remap-namespaces\nmap:\n  Foo: Target.Foo\n  Foo.Bar: Target.Other\n",
    RewriteOp::RemapNamespaces {
        map: [("Foo", "Target.Foo"), ("Foo.Bar", "Target.Other")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
)]
#[case("kind: strip-async\n", RewriteOp::StripAsync)]
fn tagged_entries_decode(#[case] yaml: &str, #[case] expected: RewriteOp) {
    let rewriter: Rewriter = serde_yaml::from_str(yaml).expect("decode");
    assert_eq!(rewriter.op, expected);
}

#[test]
fn tagged_entry_carries_alias_predicate() {
    let yaml = "kind: strip-async\nalias: [\"!sync\", \"!legacy\"]\n";
    let rewriter: Rewriter = serde_yaml::from_str(yaml).expect("decode");
    assert_eq!(rewriter.op, RewriteOp::StripAsync);
    assert!(!rewriter.applies_to(Some("sync")));
    assert!(rewriter.applies_to(Some("async")));
}

#[test]
fn parameterless_entries_serialize_as_bare_strings() {
    let yaml = serde_yaml::to_string(&Rewriter::new(RewriteOp::StripAsync)).expect("encode");
    assert_eq!(yaml.trim(), "strip-async");

    let mut restricted = Rewriter::new(RewriteOp::StripAsync);
    restricted.alias = Some(AliasPredicate::One("async".into()));
    let yaml = serde_yaml::to_string(&restricted).expect("encode");
    assert!(yaml.contains("kind: strip-async"), "got: {yaml}");
    assert!(yaml.contains("alias: async"), "got: {yaml}");
}

// ---------------------------------------------------------------------------
// Whole documents
// ---------------------------------------------------------------------------

const HAND_WRITTEN: &str = r#"
namespaceMap:
  Upstream.Core: Target.Core
fileRecords:
  - path: src/Core/Widget.cs
    namespace: Target.Widgets
    rewriters:
      - strip-async
  - path: src/Core/Client.cs
    alias: sync
ruleSets:
  - include: "src/**/*.cs"
    excludes: ["src/Tests/**"]
    aliases: ["!sync"]
    rewriters:
      - kind: add-using
        namespace: System.Linq
"#;

#[test]
fn hand_written_document_decodes_and_normalizes() {
    let mut reg: ImportRegistry = serde_yaml::from_str(HAND_WRITTEN).expect("decode");
    reg.normalize();

    assert_eq!(reg.namespace_map.get("Upstream.Core").map(String::as_str), Some("Target.Core"));
    assert_eq!(reg.file_records[0].path, "src/Core/Client.cs", "records sorted by path");
    assert_eq!(reg.file_records[1].namespace_override.as_deref(), Some("Target.Widgets"));
    assert_eq!(reg.file_records[1].rewriters[0].op, RewriteOp::StripAsync);
    assert_eq!(reg.rule_sets.len(), 2, "default bucket appended");
    assert!(reg.rule_sets[1].is_default());

    let rule_set = &reg.rule_sets[0];
    assert!(rule_set.matches("src/Core/Widget.cs", None).unwrap());
    assert!(!rule_set.matches("src/Core/Widget.cs", Some("sync")).unwrap());
    assert!(!rule_set.matches("src/Tests/WidgetTests.cs", None).unwrap());
}

#[test]
fn registry_roundtrip_preserves_rewriters() {
    let mut reg: ImportRegistry = serde_yaml::from_str(HAND_WRITTEN).expect("decode");
    reg.normalize();
    let yaml = serde_yaml::to_string(&reg).expect("encode");
    let back: ImportRegistry = serde_yaml::from_str(&yaml).expect("decode again");
    assert_eq!(reg, back);
}
