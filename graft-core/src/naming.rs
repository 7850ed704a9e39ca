//! The "is this the file's type" predicate.
//!
//! A declared type belongs to a file when the file's base name (without its
//! extension) is the identifier itself, or a dot-delimited composite whose
//! segments include it (`Parser.Tokens.cs` belongs to `Parser` and `Tokens`).
//! Discovery uses it to pick a file's primary type and `rename-type` uses it
//! to decide whether the output file is renamed too.

/// Strip the last extension from a file name.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

/// `true` when `identifier` is structurally derived from `file_name`.
pub fn is_file_type(file_name: &str, identifier: &str) -> bool {
    if identifier.is_empty() {
        return false;
    }
    let stem = file_stem(file_name);
    stem == identifier || stem.split('.').any(|segment| segment == identifier)
}

/// File name after renaming `from` to `to`, or `None` when the file does not
/// belong to `from`.
pub fn renamed_file_name(file_name: &str, from: &str, to: &str) -> Option<String> {
    if !is_file_type(file_name, from) {
        return None;
    }
    let stem = file_stem(file_name);
    let extension = &file_name[stem.len()..];
    let renamed: Vec<&str> = stem
        .split('.')
        .map(|segment| if segment == from { to } else { segment })
        .collect();
    Some(format!("{}{}", renamed.join("."), extension))
}
