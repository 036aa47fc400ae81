use lexis_types::{Alphabet, RawRecord};

/// Part-of-speech fragments that mark non-lexical entries. Matched as
/// case-insensitive substrings because source labels are free text.
const POS_DENY_LIST: &[&str] = &[
    "prefix",
    "suffix",
    "infix",
    "interfix",
    "affix",
    "combining form",
    "clitic",
    "particle",
    "diacritic",
    "punctuation",
    "symbol",
    "letter",
    "abbrev",
    "initialism",
    "contraction",
];

/// One-letter words that are real lexemes (articles, conjunctions, interjections).
const SINGLE_LETTER_WORDS: &[&str] = &["ο", "η", "ή", "α", "ω", "ε"];

/// Latin letters tolerated as standalone tokens (`βιταμίνη C`, `ακτίνες X`).
const FOREIGN_LETTER_EXCEPTIONS: &[char] = &['A', 'B', 'C', 'D', 'E', 'K', 'X'];

/// Immutable filter configuration.
#[derive(Clone, Debug)]
pub struct FilterConfig {
    pub pos_deny_list: Vec<String>,
    pub single_letter_words: Vec<String>,
    pub foreign_letter_exceptions: Vec<char>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pos_deny_list: POS_DENY_LIST.iter().map(|s| (*s).to_string()).collect(),
            single_letter_words: SINGLE_LETTER_WORDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            foreign_letter_exceptions: FOREIGN_LETTER_EXCEPTIONS.to_vec(),
        }
    }
}

/// Why a record was turned away.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Rejection {
    EmptyWord,
    Language,
    BoundMorpheme,
    SingleCharacter,
    NoScriptCharacter,
    ForeignScript,
    PartOfSpeech,
}

/// Pure predicate deciding whether a raw record is in scope.
#[derive(Clone, Debug)]
pub struct RecordFilter {
    alphabet: Alphabet,
    config: FilterConfig,
}

impl RecordFilter {
    pub fn new(alphabet: Alphabet, config: FilterConfig) -> Self {
        Self { alphabet, config }
    }

    pub fn greek() -> Self {
        Self::new(Alphabet::greek(), FilterConfig::default())
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn accept(&self, record: &RawRecord) -> bool {
        self.rejection(record).is_none()
    }

    /// First failing check, or `None` when the record is accepted.
    pub fn rejection(&self, record: &RawRecord) -> Option<Rejection> {
        let word = record.word.trim();
        if word.is_empty() {
            return Some(Rejection::EmptyWord);
        }

        let tagged = record.lang_code.is_some() || record.lang.is_some();
        if tagged
            && !self
                .alphabet
                .matches_language(record.lang_code.as_deref(), record.lang.as_deref())
        {
            return Some(Rejection::Language);
        }

        if is_bound_morpheme(word) {
            return Some(Rejection::BoundMorpheme);
        }

        if word.chars().count() == 1 && !self.config.single_letter_words.iter().any(|w| w == word)
        {
            return Some(Rejection::SingleCharacter);
        }

        if !self.alphabet.has_script_char(word) {
            return Some(Rejection::NoScriptCharacter);
        }

        if !self.foreign_letters_allowed(word) {
            return Some(Rejection::ForeignScript);
        }

        if self.pos_denied(&record.pos) {
            return Some(Rejection::PartOfSpeech);
        }

        None
    }

    fn foreign_letters_allowed(&self, word: &str) -> bool {
        word.split(|c: char| c.is_whitespace() || c == '-')
            .filter(|token| self.alphabet.has_foreign_letters(token))
            .all(|token| {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => self.config.foreign_letter_exceptions.contains(&c),
                    _ => false,
                }
            })
    }

    fn pos_denied(&self, pos: &str) -> bool {
        let label = normalize_pos(pos);
        self.config
            .pos_deny_list
            .iter()
            .any(|denied| label.contains(denied.as_str()))
    }
}

/// Hyphen-led or hyphen-trailed strings are affixes, not words.
pub fn is_bound_morpheme(word: &str) -> bool {
    let word = word.trim();
    word.starts_with('-') || word.ends_with('-')
}

fn normalize_pos(pos: &str) -> String {
    pos.to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
