//! Declension paradigms as suffix-substitution tables.
//!
//! A paradigm is a named list of rules. Each rule strips a suffix from the
//! lemma to find the stem, then appends one ending per inflected form. The
//! expander is purely derivational: no dictionary lookups, no failure mode
//! beyond "paradigm not recognized", which yields an empty set.
//!
//! # How it works
//! 1. Resolve the template name, dropping a trailing accent-class segment
//!    (`el-nM-ος-οι-3` → `el-nM-ος-οι`).
//! 2. Apply every rule whose suffix ends the lemma.
//! 3. Collect the surface forms, never emitting the lemma itself.
//!
//! # Example
//! ```
//! use lexis_paradigm::ParadigmTable;
//!
//! let table = ParadigmTable::builtin();
//! assert!(table.is_declension_template("el-nM-ος-οι-1"));
//!
//! let forms = table.expand("δρόμος", "el-nM-ος-οι-1");
//! assert!(forms.contains("δρόμου"));
//! assert!(forms.contains("δρόμους"));
//! assert!(table.expand("δρόμος", "el-verb").is_empty());
//! ```
//!
//! For a runnable demo, see `cargo run -p lexis-paradigm --example expand -- <lemma> <template>`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

type RawRule = (&'static str, &'static [&'static str]);

/// Built-in Modern Greek noun and adjective patterns. Endings that shift the
/// accent are left out; the source's explicit forms cover those.
const BUILTIN: &[(&str, &[RawRule])] = &[
    (
        "el-nM-ος-οι",
        &[
            ("ος", &["ου", "ο", "ε", "οι", "ων", "ους"]),
            ("ός", &["ού", "ό", "έ", "οί", "ών", "ούς"]),
        ],
    ),
    ("el-nM-ας-ες", &[("ας", &["α", "ες", "ων"])]),
    ("el-nM-ης-ες", &[("ης", &["η", "ες"]), ("ής", &["ή", "ές", "ών"])]),
    ("el-nF-α-ες", &[("α", &["ας", "ες"]), ("ά", &["άς", "ές", "ών"])]),
    ("el-nF-η-ες", &[("η", &["ης", "ες"]), ("ή", &["ής", "ές", "ών"])]),
    ("el-nN-ο-α", &[("ο", &["ου", "α", "ων"]), ("ό", &["ού", "ά", "ών"])]),
    ("el-nN-ι-ια", &[("ι", &["ια"]), ("ί", &["ιού", "ιά", "ιών"])]),
    (
        "el-adj-ος-η-ο",
        &[
            ("ος", &["ου", "ο", "ε", "οι", "ων", "ους", "η", "ης", "ες"]),
            ("ός", &["ού", "ό", "έ", "οί", "ών", "ούς", "ή", "ής", "ές"]),
        ],
    ),
    (
        "el-adj-ος-α-ο",
        &[
            ("ος", &["ου", "ο", "ε", "οι", "ων", "ους", "α", "ας", "ες"]),
            ("ός", &["ού", "ό", "έ", "οί", "ών", "ούς", "ά", "άς", "ές"]),
        ],
    ),
];

/// One suffix substitution: `stem = lemma - strip`, forms are `stem + append[i]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParadigmRule {
    pub strip: String,
    pub append: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Paradigm {
    pub name: String,
    pub rules: Vec<ParadigmRule>,
}

/// Forms produced by one paradigm, with the paradigm kept for diagnostics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Expansion<'a> {
    pub paradigm: &'a str,
    pub forms: BTreeSet<String>,
}

/// Read-only table of named paradigms.
#[derive(Clone, Debug, Default)]
pub struct ParadigmTable {
    paradigms: BTreeMap<String, Paradigm>,
}

impl ParadigmTable {
    pub fn builtin() -> Self {
        let paradigms = BUILTIN
            .iter()
            .map(|(name, rules)| {
                let rules = rules
                    .iter()
                    .map(|(strip, append)| ParadigmRule {
                        strip: (*strip).to_string(),
                        append: append.iter().map(|s| (*s).to_string()).collect(),
                    })
                    .collect();
                (
                    (*name).to_string(),
                    Paradigm {
                        name: (*name).to_string(),
                        rules,
                    },
                )
            })
            .collect();
        Self { paradigms }
    }

    /// Load a table from a JSON file of `{"name": [["strip", "ending", ...], ...]}`.
    ///
    /// A missing file falls back to [`ParadigmTable::builtin`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::builtin());
        }
        let text =
            fs::read_to_string(path).with_context(|| format!("read paradigms {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse paradigms {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<Vec<String>>> =
            serde_json::from_str(text).context("paradigm table is not a JSON object of rule lists")?;
        let mut paradigms = BTreeMap::new();
        for (name, raw_rules) in raw {
            let mut rules = Vec::with_capacity(raw_rules.len());
            for (idx, raw_rule) in raw_rules.into_iter().enumerate() {
                let mut parts = raw_rule.into_iter();
                let Some(strip) = parts.next() else {
                    bail!("paradigm {name}: rule {} is empty", idx + 1);
                };
                let append: Vec<String> = parts.collect();
                if append.is_empty() {
                    bail!("paradigm {name}: rule {} has no endings", idx + 1);
                }
                rules.push(ParadigmRule { strip, append });
            }
            paradigms.insert(name.clone(), Paradigm { name, rules });
        }
        Ok(Self { paradigms })
    }

    pub fn len(&self) -> usize {
        self.paradigms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paradigms.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.paradigms.keys().map(String::as_str)
    }

    /// Resolve a template name to a known paradigm.
    pub fn resolve(&self, template: &str) -> Option<&Paradigm> {
        let template = template.trim();
        if let Some(p) = self.paradigms.get(template) {
            return Some(p);
        }
        let (base, class) = template.rsplit_once('-')?;
        if class.starts_with(|c: char| c.is_ascii_digit()) {
            self.paradigms.get(base)
        } else {
            None
        }
    }

    pub fn is_declension_template(&self, template: &str) -> bool {
        self.resolve(template).is_some()
    }

    /// Expand `lemma` through the named paradigm; `None` if unknown or no rule fits.
    pub fn expansion(&self, lemma: &str, template: &str) -> Option<Expansion<'_>> {
        let paradigm = self.resolve(template)?;
        let lemma = lemma.trim();
        let mut forms = BTreeSet::new();
        for rule in &paradigm.rules {
            if let Some(stem) = lemma.strip_suffix(rule.strip.as_str())
                && !stem.is_empty()
            {
                for ending in &rule.append {
                    let form = format!("{stem}{ending}");
                    if form != lemma {
                        forms.insert(form);
                    }
                }
            }
        }
        (!forms.is_empty()).then_some(Expansion {
            paradigm: paradigm.name.as_str(),
            forms,
        })
    }

    /// Surface forms only; empty when nothing applies.
    pub fn expand(&self, lemma: &str, template: &str) -> BTreeSet<String> {
        self.expansion(lemma, template)
            .map(|e| e.forms)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_accent_class_suffixes() {
        let table = ParadigmTable::builtin();
        assert!(table.is_declension_template("el-nF-η-ες"));
        assert!(table.is_declension_template("el-nF-η-ες-2b"));
        assert!(!table.is_declension_template("el-nF-η-ες-x"));
        assert!(!table.is_declension_template("el-noun"));
        assert!(!table.is_declension_template(""));
    }

    #[test]
    fn expands_accented_and_unaccented_endings() {
        let table = ParadigmTable::builtin();
        let agapi = table.expand("αγάπη", "el-nF-η-ες-1");
        assert_eq!(
            agapi,
            BTreeSet::from(["αγάπες".to_string(), "αγάπης".to_string()])
        );

        let archi = table.expand("αρχή", "el-nF-η-ες");
        assert!(archi.contains("αρχών"));
        assert!(!archi.contains("αρχή"));
    }

    #[test]
    fn unknown_or_non_matching_yields_empty() {
        let table = ParadigmTable::builtin();
        assert!(table.expand("αγάπη", "el-nM-ος-οι").is_empty());
        assert!(table.expand("αγάπη", "no-such-paradigm").is_empty());
        assert!(table.expansion("η", "el-nF-η-ες").is_none());
    }

    #[test]
    fn records_expansion_provenance() {
        let table = ParadigmTable::builtin();
        let exp = table.expansion("παιδί", "el-nN-ι-ια-3").expect("expansion");
        assert_eq!(exp.paradigm, "el-nN-ι-ια");
        assert!(exp.forms.contains("παιδιά"));
    }

    #[test]
    fn parses_json_tables() {
        let table =
            ParadigmTable::from_json_str(r#"{"el-test": [["ος", "ου", "οι"]]}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.expand("λόγος", "el-test").len(), 2);

        assert!(ParadigmTable::from_json_str(r#"{"bad": [[]]}"#).is_err());
        assert!(ParadigmTable::from_json_str(r#"{"bad": [["ος"]]}"#).is_err());
        assert!(ParadigmTable::from_json_str("[1, 2]").is_err());
    }
}
