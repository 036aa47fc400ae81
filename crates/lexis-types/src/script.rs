//! Alphabet description and the accent-stripping normalizer built on it.
//!
//! Sort keys are lower-cased, canonically decomposed, stripped of combining
//! marks, folded through a small per-alphabet table (`ς` → `σ`), and reduced
//! to target-script letters, Latin letters and digits. Every input has a key;
//! pathological input yields an empty key, which orders last.

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const GREEK_LETTERS: &str = "αβγδεζηθικλμνξοπρστυφχψω";

/// Immutable description of the target alphabet.
#[derive(Clone, Debug)]
pub struct Alphabet {
    letters: Vec<char>,
    language_codes: Vec<String>,
    language_names: Vec<String>,
    script_ranges: Vec<RangeInclusive<char>>,
    folds: Vec<(char, char)>,
}

impl Alphabet {
    /// Build an alphabet from its ordered lower-case base letters and the
    /// Unicode ranges that make up its script.
    pub fn new(letters: &str, script_ranges: Vec<RangeInclusive<char>>) -> Self {
        Self {
            letters: letters.chars().collect(),
            language_codes: Vec::new(),
            language_names: Vec::new(),
            script_ranges,
            folds: Vec::new(),
        }
    }

    pub fn with_language(mut self, code: &str, name: &str) -> Self {
        self.language_codes.push(code.to_ascii_lowercase());
        self.language_names.push(name.to_lowercase());
        self
    }

    /// Map a letter variant onto its base letter after decomposition.
    pub fn with_fold(mut self, from: char, to: char) -> Self {
        self.folds.push((from, to));
        self
    }

    /// Modern Greek, monotonic and polytonic.
    pub fn greek() -> Self {
        Self::new(
            GREEK_LETTERS,
            vec!['\u{0370}'..='\u{03FF}', '\u{1F00}'..='\u{1FFF}'],
        )
        .with_language("el", "Greek")
        .with_fold('ς', 'σ')
        .with_fold('ϐ', 'β')
        .with_fold('ϑ', 'θ')
        .with_fold('ϕ', 'φ')
        .with_fold('ϰ', 'κ')
        .with_fold('ϱ', 'ρ')
        .with_fold('ϲ', 'σ')
    }

    /// Base letters in collation order.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    /// Match either identifier case-insensitively. Absent tags match nothing.
    pub fn matches_language(&self, code: Option<&str>, name: Option<&str>) -> bool {
        let code_hit = code.is_some_and(|c| {
            let c = c.trim().to_ascii_lowercase();
            self.language_codes.iter().any(|known| *known == c)
        });
        let name_hit = name.is_some_and(|n| {
            let n = n.trim().to_lowercase();
            self.language_names.iter().any(|known| *known == n)
        });
        code_hit || name_hit
    }

    /// Alphabetic character inside one of the script's ranges.
    pub fn is_script_char(&self, c: char) -> bool {
        c.is_alphabetic() && self.script_ranges.iter().any(|r| r.contains(&c))
    }

    pub fn has_script_char(&self, word: &str) -> bool {
        word.chars().any(|c| self.is_script_char(c))
    }

    /// Letters that belong to some other script.
    pub fn foreign_letters<'a>(&'a self, word: &'a str) -> impl Iterator<Item = char> + 'a {
        word.chars()
            .filter(move |c| c.is_alphabetic() && !self.is_script_char(*c))
    }

    pub fn has_foreign_letters(&self, word: &str) -> bool {
        self.foreign_letters(word).next().is_some()
    }

    fn fold(&self, c: char) -> char {
        self.folds
            .iter()
            .find_map(|(from, to)| (*from == c).then_some(*to))
            .unwrap_or(c)
    }

    /// Accent-stripped, case-normalized key used for ordering and grouping.
    pub fn sort_key(&self, word: &str) -> String {
        let mut key = String::with_capacity(word.len());
        for c in word.nfd() {
            if is_combining_mark(c) {
                continue;
            }
            for lower in c.to_lowercase() {
                let folded = self.fold(lower);
                if self.is_script_char(folded) || is_latin_letter(folded) || folded.is_ascii_digit()
                {
                    key.push(folded);
                }
            }
        }
        key
    }

    /// First character of the sort key, if any survives normalization.
    pub fn classify(&self, word: &str) -> Option<char> {
        self.sort_key(word).chars().next()
    }

    /// Position of a (normalized) letter in the alphabet.
    pub fn letter_index(&self, c: char) -> Option<usize> {
        let folded = c.to_lowercase().next().map(|l| self.fold(l))?;
        self.letters.iter().position(|l| *l == folded)
    }
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_lowercase() || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
}

/// Order two sort keys, placing empty keys after everything else.
pub fn key_order(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.cmp(b),
    }
}

/// Capitalized, upper-case and lower-case spellings that differ from `word`.
pub fn case_variants(word: &str) -> Vec<String> {
    let lower = word.to_lowercase();
    let upper = word.to_uppercase();
    let mut chars = lower.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };

    let mut out: Vec<String> = Vec::with_capacity(3);
    for candidate in [capitalized, upper, lower] {
        if !candidate.is_empty() && candidate != word && !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}
