//! Documentation path taxonomy
//!
//! Decides whether a changed path is documentation worth syncing. Matches on
//! extension (Markdown, plain text), on well-known file names
//! (README, CONTRIBUTING, SETUP, INSTALL, ONBOARDING) and on any `docs`
//! directory segment. All matches are case-insensitive.

use once_cell::sync::Lazy;
use regex::RegexSet;

static DOC_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\.(md|markdown)$",
        r"(?i)\.txt$",
        r"(?i)(^|/)(readme|contributing|setup|install|onboarding)(\.(rst|adoc|org))?$",
        r"(?i)(^|/)docs/",
    ])
    .expect("documentation patterns are valid")
});

/// Whether `path` looks like documentation
#[must_use]
pub fn is_documentation_file(path: &str) -> bool {
    DOC_PATTERNS.is_match(path)
}

/// Whether any of `changed_files` is documentation
#[must_use]
pub fn should_sync<S: AsRef<str>>(changed_files: &[S]) -> bool {
    changed_files.iter().any(|f| is_documentation_file(f.as_ref()))
}

/// The documentation files among `changed_files`, in input order
#[must_use]
pub fn documentation_files<S: AsRef<str>>(changed_files: &[S]) -> Vec<&str> {
    changed_files
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| is_documentation_file(f))
        .collect()
}
