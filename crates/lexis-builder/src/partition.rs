use std::collections::HashSet;
use std::fmt;

use bitvec::prelude::*;
use lexis_db::{Lexicon, sample_size};
use lexis_types::{Alphabet, HeadwordEntry, key_order};
use thiserror::Error;
use tracing::debug;

type BitSet = BitVec<usize, Lsb0>;

/// Ordered, non-overlapping groups of letters. Anything no group claims
/// (digits, Latin letters, empty keys) lands in the last group, so every
/// key has exactly one home.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LetterScheme {
    groups: Vec<Vec<char>>,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SchemeError {
    #[error("letter scheme has no groups")]
    Empty,
    #[error("letter group {0} is empty")]
    EmptyGroup(usize),
    #[error("letter {0:?} appears in more than one group")]
    Overlap(char),
    #[error("letter {0:?} is not in the alphabet")]
    UnknownLetter(char),
}

impl LetterScheme {
    pub fn new(groups: Vec<Vec<char>>) -> Result<Self, SchemeError> {
        if groups.is_empty() {
            return Err(SchemeError::Empty);
        }
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(groups.len());
        for (idx, group) in groups.into_iter().enumerate() {
            if group.is_empty() {
                return Err(SchemeError::EmptyGroup(idx));
            }
            let mut letters = Vec::with_capacity(group.len());
            for c in group {
                let lower = c.to_lowercase().next().unwrap_or(c);
                if !seen.insert(lower) {
                    return Err(SchemeError::Overlap(c));
                }
                letters.push(lower);
            }
            normalized.push(letters);
        }
        Ok(Self { groups: normalized })
    }

    /// Like [`LetterScheme::new`], but every letter must belong to `alphabet`
    /// and is folded to its canonical form (`ς` becomes `σ`).
    pub fn for_alphabet(groups: Vec<Vec<char>>, alphabet: &Alphabet) -> Result<Self, SchemeError> {
        let folded = groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|c| {
                        alphabet
                            .letter_index(c)
                            .map(|idx| alphabet.letters()[idx])
                            .ok_or(SchemeError::UnknownLetter(c))
                    })
                    .collect::<Result<Vec<char>, SchemeError>>()
            })
            .collect::<Result<Vec<_>, SchemeError>>()?;
        Self::new(folded)
    }

    /// One group per string, each character a member letter.
    pub fn from_strs(groups: &[&str]) -> Result<Self, SchemeError> {
        Self::new(groups.iter().map(|g| g.chars().collect()).collect())
    }

    /// Every letter in one bucket.
    pub fn single() -> Self {
        Self::preset(&["αβγδεζηθικλμνξοπρστυφχψω"])
    }

    pub fn five() -> Self {
        Self::preset(&["αβ", "γδεζηθι", "κλμνξο", "πρ", "στυφχψω"])
    }

    pub fn twelve() -> Self {
        Self::preset(&[
            "α", "βγ", "δ", "ε", "ζηθι", "κ", "λμ", "νξο", "π", "ρσ", "τυ", "φχψω",
        ])
    }

    fn preset(groups: &[&str]) -> Self {
        Self {
            groups: groups.iter().map(|g| g.chars().collect()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn letters(&self, group: usize) -> Option<&[char]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Group owning a normalized first letter.
    pub fn group_of(&self, first: Option<char>) -> usize {
        first
            .and_then(|c| self.groups.iter().position(|g| g.contains(&c)))
            .unwrap_or(self.groups.len() - 1)
    }
}

/// First and last letters present in a bucket, for titling. Primary members
/// decide; a bucket reached only through inflections uses its members' keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BucketLabel {
    pub first: char,
    pub last: char,
}

impl fmt::Display for BucketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first: String = self.first.to_uppercase().collect();
        let last: String = self.last.to_uppercase().collect();
        if self.first == self.last {
            write!(f, "{first}")
        } else {
            write!(f, "{first}-{last}")
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Member {
    pub headword: String,
    /// False when the headword is here only because an inflection starts here.
    pub primary: bool,
}

/// Headwords assigned to one letter group, in sort-key order.
#[derive(Clone, Debug)]
pub struct Bucket {
    pub index: usize,
    pub label: Option<BucketLabel>,
    pub members: Vec<Member>,
}

impl Bucket {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn headwords(&self) -> impl Iterator<Item = &str> + '_ {
        self.members.iter().map(|m| m.headword.as_str())
    }

    pub fn contains(&self, headword: &str) -> bool {
        self.members.iter().any(|m| m.headword == headword)
    }

    pub fn primary_count(&self) -> usize {
        self.members.iter().filter(|m| m.primary).count()
    }

    /// `(headword, entries)` pairs ready for rendering.
    pub fn entries<'a>(
        &'a self,
        lexicon: &'a Lexicon,
    ) -> impl Iterator<Item = (&'a str, &'a [HeadwordEntry])> + 'a {
        self.members.iter().filter_map(move |m| {
            lexicon
                .get(&m.headword)
                .map(|entries| (m.headword.as_str(), entries))
        })
    }
}

#[derive(Clone, Debug)]
pub struct Partition {
    buckets: Vec<Bucket>,
}

impl Partition {
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket(&self, index: usize) -> Option<&Bucket> {
        self.buckets.get(index)
    }

    pub fn into_buckets(self) -> Vec<Bucket> {
        self.buckets
    }

    /// Bucket holding `headword` as a primary member.
    pub fn primary_group(&self, headword: &str) -> Option<usize> {
        self.buckets.iter().position(|b| {
            b.members
                .iter()
                .any(|m| m.primary && m.headword == headword)
        })
    }
}

/// Headwords with their sort keys, ordered by key (empty keys last), ties by
/// the raw string.
fn sorted_headwords<'a>(lexicon: &'a Lexicon, alphabet: &Alphabet) -> Vec<(String, &'a str)> {
    let mut order: Vec<(String, &str)> = lexicon
        .headwords()
        .map(|h| (alphabet.sort_key(h), h))
        .collect();
    order.sort_by(|(ka, a), (kb, b)| key_order(ka, kb).then_with(|| a.cmp(b)));
    order
}

/// Rows of headword bits, one per slot letter plus a trailing slot for keys
/// no slot letter matches.
struct SlotRows {
    primary: Vec<BitSet>,
    reach: Vec<BitSet>,
}

/// Alphabet letters followed by any scheme letters the alphabet lacks, so a
/// key starting with `3` finds the group that claims `3`.
fn slot_letters(scheme: &LetterScheme, alphabet: &Alphabet) -> Vec<char> {
    let mut letters = alphabet.letters().to_vec();
    for group in &scheme.groups {
        for c in group {
            if alphabet.letter_index(*c).is_none() && !letters.contains(c) {
                letters.push(*c);
            }
        }
    }
    letters
}

impl SlotRows {
    fn build(
        lexicon: &Lexicon,
        order: &[(String, &str)],
        alphabet: &Alphabet,
        letters: &[char],
    ) -> Self {
        let n = order.len();
        let slots = letters.len() + 1;
        let extra = &letters[alphabet.letters().len()..];
        let slot_of = |first: Option<char>| {
            first
                .and_then(|c| {
                    alphabet.letter_index(c).or_else(|| {
                        extra
                            .iter()
                            .position(|x| *x == c)
                            .map(|p| alphabet.letters().len() + p)
                    })
                })
                .unwrap_or(slots - 1)
        };
        let mut primary: Vec<BitSet> = (0..slots).map(|_| bitvec![usize, Lsb0; 0; n]).collect();
        let mut reach: Vec<BitSet> = (0..slots).map(|_| bitvec![usize, Lsb0; 0; n]).collect();

        for (idx, (key, headword)) in order.iter().enumerate() {
            let home = slot_of(key.chars().next());
            primary[home].set(idx, true);
            reach[home].set(idx, true);
            for entry in lexicon.get(headword).unwrap_or_default() {
                for form in &entry.inflections {
                    reach[slot_of(alphabet.classify(form))].set(idx, true);
                }
            }
        }
        Self { primary, reach }
    }
}

/// Assign every headword to its primary group and to every group one of its
/// inflections classifies into. Pure; safe to recompute for any scheme.
pub fn partition(lexicon: &Lexicon, scheme: &LetterScheme, alphabet: &Alphabet) -> Partition {
    let order = sorted_headwords(lexicon, alphabet);
    let n = order.len();
    let letters = slot_letters(scheme, alphabet);
    let rows = SlotRows::build(lexicon, &order, alphabet, &letters);

    let mut slot_group: Vec<usize> = letters
        .iter()
        .map(|c| scheme.group_of(Some(*c)))
        .collect();
    slot_group.push(scheme.len() - 1);

    let mut buckets = Vec::with_capacity(scheme.len());
    for index in 0..scheme.len() {
        let mut primaries = bitvec![usize, Lsb0; 0; n];
        let mut members = bitvec![usize, Lsb0; 0; n];
        for (slot, group) in slot_group.iter().enumerate() {
            if *group == index {
                primaries |= &rows.primary[slot];
                members |= &rows.reach[slot];
            }
        }
        let label = label_for(&primaries, &order).or_else(|| label_for(&members, &order));
        let members: Vec<Member> = members
            .iter_ones()
            .map(|idx| Member {
                headword: order[idx].1.to_string(),
                primary: primaries[idx],
            })
            .collect();
        debug!(
            "bucket {}: {} headwords ({} primary)",
            index + 1,
            members.len(),
            primaries.count_ones()
        );
        buckets.push(Bucket {
            index,
            label,
            members,
        });
    }

    Partition { buckets }
}

/// First `ceil(n * percent / 100)` headwords of the full sort order.
pub fn sample(lexicon: &Lexicon, alphabet: &Alphabet, percent: f64) -> Bucket {
    let order = sorted_headwords(lexicon, alphabet);
    let take = sample_size(order.len(), percent);
    let members: Vec<Member> = order
        .iter()
        .take(take)
        .map(|(_, h)| Member {
            headword: (*h).to_string(),
            primary: true,
        })
        .collect();
    let mut mask = bitvec![usize, Lsb0; 0; order.len()];
    mask[..take].fill(true);
    Bucket {
        index: 0,
        label: label_for(&mask, &order),
        members,
    }
}

fn label_for(primaries: &BitSet, order: &[(String, &str)]) -> Option<BucketLabel> {
    let first = primaries
        .iter_ones()
        .find_map(|idx| order[idx].0.chars().next())?;
    let last = primaries
        .iter_ones()
        .rev()
        .find_map(|idx| order[idx].0.chars().next())?;
    Some(BucketLabel { first, last })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon(words: &[(&str, &[&str])]) -> Lexicon {
        words
            .iter()
            .map(|(headword, forms)| {
                let mut entry = HeadwordEntry::new(*headword, "noun");
                entry.add_definition("def");
                for form in *forms {
                    entry.add_inflection(*form);
                }
                entry
            })
            .collect()
    }

    #[test]
    fn validates_schemes() {
        assert_eq!(LetterScheme::new(vec![]), Err(SchemeError::Empty));
        assert_eq!(
            LetterScheme::from_strs(&["αβ", ""]),
            Err(SchemeError::EmptyGroup(1))
        );
        assert_eq!(
            LetterScheme::from_strs(&["αβ", "Βγ"]),
            Err(SchemeError::Overlap('Β'))
        );
        let scheme = LetterScheme::from_strs(&["ΑΒ", "ΓΔ"]).unwrap();
        assert_eq!(scheme.letters(0), Some(&['α', 'β'][..]));
    }

    #[test]
    fn alphabet_schemes_fold_and_reject_strangers() {
        let greek = Alphabet::greek();
        let scheme = LetterScheme::for_alphabet(vec![vec!['Α', 'ς'], vec!['ω']], &greek).unwrap();
        assert_eq!(scheme.letters(0), Some(&['α', 'σ'][..]));
        assert_eq!(
            LetterScheme::for_alphabet(vec![vec!['3'], vec!['α']], &greek),
            Err(SchemeError::UnknownLetter('3'))
        );
        assert_eq!(
            LetterScheme::for_alphabet(vec![vec!['σ'], vec!['ς']], &greek),
            Err(SchemeError::Overlap('σ'))
        );
    }

    #[test]
    fn letters_outside_the_alphabet_keep_their_group() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[("3D", &[]), ("άλφα", &["3άλφα"])]);
        let scheme = LetterScheme::from_strs(&["3", "αβγδεζηθικλμνξοπρστυφχψω"]).unwrap();
        let part = partition(&lex, &scheme, &greek);

        assert_eq!(scheme.group_of(greek.classify("3D")), 0);
        assert_eq!(part.primary_group("3D"), Some(0));
        assert_eq!(part.primary_group("άλφα"), Some(1));
        assert!(part.bucket(0).unwrap().contains("άλφα"));
        assert_eq!(part.bucket(0).unwrap().label.unwrap().to_string(), "3");
    }

    #[test]
    fn presets_cover_the_alphabet_exactly_once() {
        let greek = Alphabet::greek();
        for scheme in [LetterScheme::five(), LetterScheme::twelve(), LetterScheme::single()] {
            let mut all: Vec<char> = (0..scheme.len())
                .flat_map(|g| scheme.letters(g).unwrap().to_vec())
                .collect();
            all.sort_unstable();
            let mut expected = greek.letters().to_vec();
            expected.sort_unstable();
            assert_eq!(all, expected);
        }
        assert_eq!(LetterScheme::five().len(), 5);
        assert_eq!(LetterScheme::twelve().len(), 12);
    }

    #[test]
    fn unclaimed_keys_fall_into_last_group() {
        let scheme = LetterScheme::from_strs(&["αβ", "γδ"]).unwrap();
        assert_eq!(scheme.group_of(Some('β')), 0);
        assert_eq!(scheme.group_of(Some('δ')), 1);
        assert_eq!(scheme.group_of(Some('ω')), 1);
        assert_eq!(scheme.group_of(Some('3')), 1);
        assert_eq!(scheme.group_of(None), 1);
    }

    #[test]
    fn inflections_pull_lemma_into_their_bucket() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[("αγάπη", &["δαγαπημένος"]), ("γάτα", &["γάτες"])]);
        let scheme = LetterScheme::from_strs(&["ΑΒ", "ΓΔ"]).unwrap();
        let part = partition(&lex, &scheme, &greek);

        assert!(part.bucket(0).unwrap().contains("αγάπη"));
        assert!(part.bucket(1).unwrap().contains("αγάπη"));
        assert!(!part.bucket(0).unwrap().contains("γάτα"));
        assert_eq!(part.primary_group("αγάπη"), Some(0));
        assert_eq!(part.primary_group("γάτα"), Some(1));

        let second = part.bucket(1).unwrap();
        let agapi = second.members.iter().find(|m| m.headword == "αγάπη").unwrap();
        assert!(!agapi.primary);
        assert_eq!(second.primary_count(), 1);
    }

    #[test]
    fn inflection_only_bucket_is_labelled_from_its_members() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[("αγάπη", &["δαγαπημένος"]), ("βάρκα", &["δβάρκες"])]);
        let part = partition(&lex, &LetterScheme::from_strs(&["ΑΒ", "ΓΔ"]).unwrap(), &greek);
        let second = part.bucket(1).unwrap();
        assert_eq!(second.primary_count(), 0);
        assert_eq!(second.len(), 2);
        assert_eq!(second.label.unwrap().to_string(), "Α-Β");
    }

    #[test]
    fn primary_membership_is_exhaustive_and_unique() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[
            ("ώρα", &["ώρες", "Ώρα"]),
            ("άνθρωπος", &["ανθρώπου", "ΆΝΘΡΩΠΕ"]),
            ("3D", &[]),
            ("ζήτω", &[]),
            ("ψάρι", &["ψαριού"]),
        ]);
        let part = partition(&lex, &LetterScheme::five(), &greek);
        for headword in lex.headwords() {
            let homes = part
                .buckets()
                .iter()
                .filter(|b| b.members.iter().any(|m| m.primary && m.headword == headword))
                .count();
            assert_eq!(homes, 1, "{headword}");
        }
        assert_eq!(part.primary_group("3D"), Some(4));
    }

    #[test]
    fn every_inflection_reaches_its_lemma() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[
            ("είμαι", &["ήμουν", "ήταν", "Είμαι"]),
            ("λέω", &["είπα", "πες", "ΕΙΠΑ"]),
            ("βλέπω", &["είδα", "δες"]),
        ]);
        let scheme = LetterScheme::twelve();
        let part = partition(&lex, &scheme, &greek);
        for (headword, entries) in lex.iter() {
            for form in entries.iter().flat_map(|e| e.inflections.iter()) {
                let group = scheme.group_of(greek.classify(form));
                assert!(
                    part.bucket(group).unwrap().contains(headword),
                    "{headword} not reachable from {form}"
                );
            }
        }
    }

    #[test]
    fn buckets_are_sorted_and_labelled() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[("γάτα", &[]), ("Άλφα", &[]), ("αβγό", &[]), ("βάρκα", &[])]);
        let part = partition(&lex, &LetterScheme::from_strs(&["αβ", "γδ"]).unwrap(), &greek);
        let first = part.bucket(0).unwrap();
        assert_eq!(first.headwords().collect::<Vec<_>>(), vec!["αβγό", "Άλφα", "βάρκα"]);
        assert_eq!(first.label.unwrap().to_string(), "Α-Β");
        assert_eq!(part.bucket(1).unwrap().label.unwrap().to_string(), "Γ");
    }

    #[test]
    fn single_scheme_emits_everything_once() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[("γάτα", &["Γάτα"]), ("ώρα", &[]), ("3D", &[])]);
        let part = partition(&lex, &LetterScheme::single(), &greek);
        assert_eq!(part.buckets().len(), 1);
        assert_eq!(part.bucket(0).unwrap().len(), 3);
    }

    #[test]
    fn sampling_takes_ceil_from_the_front() {
        let greek = Alphabet::greek();
        let lex = lexicon(&[("δ", &[]), ("γ", &[]), ("β", &[]), ("α", &[]), ("ε", &[])]);
        let all = sample(&lex, &greek, 100.0);
        assert_eq!(all.len(), lex.headword_count());

        let some = sample(&lex, &greek, 30.0);
        assert_eq!(some.headwords().collect::<Vec<_>>(), vec!["α", "β"]);
        assert_eq!(some.label.unwrap().to_string(), "Α-Β");

        let tiny = sample(&lex, &greek, 0.5);
        assert_eq!(tiny.len(), 1);

        let empty = sample(&Lexicon::default(), &greek, 50.0);
        assert!(empty.is_empty());
        assert!(empty.label.is_none());
    }
}
