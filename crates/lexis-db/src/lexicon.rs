use std::collections::BTreeMap;

use lexis_types::HeadwordEntry;

/// Frozen headword table: headword → sibling entries, one per part of speech,
/// in order of first arrival.
///
/// Only the aggregator mutates a lexicon; once handed out it is read-only.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    entries: BTreeMap<String, Vec<HeadwordEntry>>,
}

impl Lexicon {
    pub(crate) fn merge(&mut self, entry: HeadwordEntry) {
        let siblings = self.entries.entry(entry.headword.clone()).or_default();
        match siblings.iter_mut().find(|e| e.pos == entry.pos) {
            Some(existing) => existing.merge(entry),
            None => siblings.push(entry),
        }
    }

    pub(crate) fn get_mut(&mut self, headword: &str) -> Option<&mut Vec<HeadwordEntry>> {
        self.entries.get_mut(headword)
    }

    pub fn get(&self, headword: &str) -> Option<&[HeadwordEntry]> {
        self.entries.get(headword).map(Vec::as_slice)
    }

    pub fn entry(&self, headword: &str, pos: &str) -> Option<&HeadwordEntry> {
        self.get(headword)?.iter().find(|e| e.pos == pos)
    }

    pub fn contains(&self, headword: &str) -> bool {
        self.entries.contains_key(headword)
    }

    /// Number of distinct headwords.
    pub fn headword_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of `(headword, pos)` entries.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn headwords(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[HeadwordEntry])> + '_ {
        self.entries
            .iter()
            .map(|(headword, entries)| (headword.as_str(), entries.as_slice()))
    }
}

impl FromIterator<HeadwordEntry> for Lexicon {
    fn from_iter<I: IntoIterator<Item = HeadwordEntry>>(iter: I) -> Self {
        let mut lexicon = Lexicon::default();
        for entry in iter {
            lexicon.merge(entry);
        }
        lexicon
    }
}
