use std::collections::BTreeSet;
use std::fmt;

/// Definition used when an explicit headword yields no gloss at all.
pub const PLACEHOLDER_DEFINITION: &str = "no definition available";

/// `(headword, pos)` pair uniquely identifying a [`HeadwordEntry`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EntryKey {
    pub headword: String,
    pub pos: String,
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.headword, self.pos)
    }
}

/// Canonical per-headword, per-part-of-speech dictionary entry.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeadwordEntry {
    pub headword: String,
    pub pos: String,
    /// Ordered set: first appearance wins, duplicates dropped.
    pub definitions: Vec<String>,
    pub etymology: Option<String>,
    pub inflections: BTreeSet<String>,
    /// Set when any inflection came from a paradigm rather than the source.
    pub expanded_from_paradigm: bool,
}

impl HeadwordEntry {
    pub fn new(headword: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            headword: headword.into(),
            pos: pos.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey {
            headword: self.headword.clone(),
            pos: self.pos.clone(),
        }
    }

    /// Append a definition unless an identical one is already present.
    pub fn add_definition(&mut self, definition: impl Into<String>) -> bool {
        let definition = definition.into();
        if self.definitions.contains(&definition) {
            return false;
        }
        self.definitions.push(definition);
        true
    }

    /// Keep the first non-empty etymology; later values never overwrite it.
    pub fn offer_etymology(&mut self, etymology: Option<&str>) {
        if self.etymology.is_some() {
            return;
        }
        if let Some(text) = etymology.map(str::trim).filter(|t| !t.is_empty()) {
            self.etymology = Some(text.to_string());
        }
    }

    /// Add an inflected form. The headword itself is never its own inflection.
    pub fn add_inflection(&mut self, form: impl Into<String>) -> bool {
        let form = form.into();
        if form.is_empty() || form == self.headword {
            return false;
        }
        self.inflections.insert(form)
    }

    /// True if any definition is more than the placeholder.
    pub fn has_real_definition(&self) -> bool {
        self.definitions.iter().any(|d| d != PLACEHOLDER_DEFINITION)
    }

    /// Fold `other` (same key) into `self`.
    ///
    /// The placeholder definition only survives while no real definition exists.
    pub fn merge(&mut self, other: HeadwordEntry) {
        debug_assert_eq!(self.headword, other.headword);
        debug_assert_eq!(self.pos, other.pos);
        if other.has_real_definition() {
            self.definitions.retain(|d| d != PLACEHOLDER_DEFINITION);
        }
        for definition in other.definitions {
            if definition == PLACEHOLDER_DEFINITION && self.has_real_definition() {
                continue;
            }
            self.add_definition(definition);
        }
        self.offer_etymology(other.etymology.as_deref());
        for form in other.inflections {
            self.add_inflection(form);
        }
        self.expanded_from_paradigm |= other.expanded_from_paradigm;
    }
}
