//! Abbreviation table
//!
//! Short aliases such as `gh:org/repo` expand into full template locations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Substitution slot inside an abbreviation pattern
pub const SLOT: &str = "{0}";

/// Built-in abbreviations, lowest precedence
pub const BUILTIN_ABBREVIATIONS: [(&str, &str); 4] = [
    ("gh", "https://github.com/{0}.git"),
    ("gl", "https://gitlab.com/{0}.git"),
    ("bb", "https://bitbucket.org/{0}"),
    ("st", "https://github.com/stencil-templates/templates.git#{0}"),
];

/// Mapping from short name to location pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbbreviationTable(IndexMap<String, String>);

impl AbbreviationTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Table holding only the built-in entries
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN_ABBREVIATIONS.iter().copied().collect()
    }

    /// Insert or replace one abbreviation
    pub fn insert(&mut self, name: impl Into<String>, pattern: impl Into<String>) {
        self.0.insert(name.into(), pattern.into());
    }

    /// Layer `overrides` on top; overrides win on key collision
    #[must_use]
    pub fn merged<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, pattern) in overrides {
            self.insert(name, pattern);
        }
        self
    }

    /// Pattern for `name`
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries sorted by name, for listing
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        entries.sort_unstable();
        entries
    }

    /// Expand `reference` against this table
    ///
    /// - exact name: the pattern, slot emptied
    /// - `name:rest` with a known `name`: the pattern, slot filled with `rest`
    /// - anything else is returned unchanged
    #[must_use]
    pub fn expand(&self, reference: &str) -> String {
        if let Some(pattern) = self.get(reference) {
            return pattern.replace(SLOT, "");
        }
        if let Some((prefix, rest)) = reference.split_once(':') {
            if let Some(pattern) = self.get(prefix) {
                return pattern.replace(SLOT, rest);
            }
        }
        reference.to_string()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AbbreviationTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new().merged(iter)
    }
}

/// Expand `reference` against `table`
#[inline]
#[must_use]
pub fn expand_abbreviation(reference: &str, table: &AbbreviationTable) -> String {
    table.expand(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn expands_prefixed_alias() {
        let table = AbbreviationTable::builtin();
        assert_eq!(
            expand_abbreviation("gh:acme/service-template", &table),
            "https://github.com/acme/service-template.git"
        );
        assert_eq!(
            table.expand("st:python/app"),
            "https://github.com/stencil-templates/templates.git#python/app"
        );
    }

    #[test]
    fn exact_alias_empties_slot() {
        let table = AbbreviationTable::new().merged([("corp", "https://git.corp/tpl.git#{0}")]);
        assert_eq!(table.expand("corp"), "https://git.corp/tpl.git#");
    }

    #[test]
    fn unknown_reference_is_unchanged() {
        let table = AbbreviationTable::builtin();
        assert_eq!(table.expand("https://example.com/t.git"), "https://example.com/t.git");
        assert_eq!(table.expand("./local/template"), "./local/template");
        assert_eq!(table.expand("zz:thing"), "zz:thing");
    }

    #[test]
    fn overrides_win_on_collision() {
        let table = AbbreviationTable::builtin()
            .merged([("gh", "https://mirror.local/{0}.git")])
            .merged([("gh", "https://override.local/{0}")]);
        assert_eq!(table.expand("gh:x"), "https://override.local/x");
        assert_eq!(table.len(), BUILTIN_ABBREVIATIONS.len());
    }

    #[test]
    fn sorted_listing() {
        let table = AbbreviationTable::builtin();
        let names: Vec<_> = table.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["bb", "gh", "gl", "st"]);
    }

    proptest! {
        #[test]
        fn prop_references_without_known_prefix_are_untouched(reference in "[a-z/._-]{0,24}") {
            let table = AbbreviationTable::new().merged([("qq", "https://q/{0}")]);
            prop_assume!(reference != "qq");
            prop_assert_eq!(table.expand(&reference), reference);
        }

        #[test]
        fn prop_prefixed_alias_fills_slot(rest in "[a-z0-9/_-]{1,24}") {
            let table = AbbreviationTable::new().merged([("qq", "https://q/{0}.git")]);
            prop_assert_eq!(table.expand(&format!("qq:{rest}")), format!("https://q/{rest}.git"));
        }
    }
}
