//! Path and alias predicates shared by candidate selection and rule targeting.
//!
//! Path patterns are shell-style globs (`glob::Pattern`) matched against
//! repository-relative paths with `/` separators. `*` is allowed to cross
//! directory boundaries, so `*` on its own selects every file.
//!
//! Alias predicates follow a small truth table:
//!
//! | predicate             | matches                                  |
//! |-----------------------|------------------------------------------|
//! | absent                | every alias, including no alias          |
//! | `sync`                | only `sync`                              |
//! | `!sync`               | everything except `sync`                 |
//! | `[sync, async]`       | `sync` or `async`                        |
//! | `[!sync, !async]`     | values that are neither                  |

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Compile a shell-style pattern.
pub fn compile(pattern: &str) -> Result<Pattern, RegistryError> {
    Pattern::new(pattern).map_err(|source| RegistryError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Match a repository-relative path against a compiled pattern.
pub fn path_matches(pattern: &Pattern, path: &str) -> bool {
    pattern.matches_with(path, MatchOptions::new())
}

/// `true` when `path` matches at least one include and no exclude.
///
/// An empty include list matches nothing.
pub fn included(includes: &[String], excludes: &[String], path: &str) -> Result<bool, RegistryError> {
    let mut hit = false;
    for include in includes {
        if path_matches(&compile(include)?, path) {
            hit = true;
            break;
        }
    }
    if !hit {
        return Ok(false);
    }
    for exclude in excludes {
        if path_matches(&compile(exclude)?, path) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// One-or-many alias terms; a leading `!` negates a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasPredicate {
    One(String),
    Many(Vec<String>),
}

impl AliasPredicate {
    fn terms(&self) -> &[String] {
        match self {
            AliasPredicate::One(term) => std::slice::from_ref(term),
            AliasPredicate::Many(terms) => terms,
        }
    }

    /// Evaluate the predicate against a file's alias.
    ///
    /// Positive terms are OR-ed; negative terms must all hold.
    pub fn matches(&self, alias: Option<&str>) -> bool {
        let mut positives = 0usize;
        let mut positive_hit = false;
        for term in self.terms() {
            match term.strip_prefix('!') {
                Some(negated) => {
                    if alias == Some(negated) {
                        return false;
                    }
                }
                None => {
                    positives += 1;
                    if alias == Some(term.as_str()) {
                        positive_hit = true;
                    }
                }
            }
        }
        positives == 0 || positive_hit
    }
}

/// Evaluate an optional predicate; absent matches every alias.
pub fn alias_matches(predicate: Option<&AliasPredicate>, alias: Option<&str>) -> bool {
    predicate.map_or(true, |p| p.matches(alias))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_crosses_directories() {
        let pattern = compile("*").unwrap();
        assert!(path_matches(&pattern, "Foo/Bar.cs"));
    }

    #[test]
    fn excludes_win_over_includes() {
        let includes = vec!["Src/**/*.cs".to_string()];
        let excludes = vec!["Src/Tests/**".to_string()];
        assert!(included(&includes, &excludes, "Src/Core/A.cs").unwrap());
        assert!(!included(&includes, &excludes, "Src/Tests/A.cs").unwrap());
    }

    #[test]
    fn empty_include_list_matches_nothing() {
        assert!(!included(&[], &[], "A.cs").unwrap());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = compile("[").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPattern { .. }));
    }
}
