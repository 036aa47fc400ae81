//! Merge filtered per-sense records into canonical headword entries.
//!
//! The scan is strictly sequential: arrival order decides which etymology
//! wins and in which order definitions appear. Inflection pointers
//! ("this word is a form of that lemma") are only collected during the scan
//! and resolved in [`Aggregator::finalize`].

use std::collections::{BTreeSet, HashMap};
use std::iter;

use lexis_paradigm::ParadigmTable;
use lexis_types::{HeadwordEntry, PLACEHOLDER_DEFINITION, RawRecord, Sense, case_variants};
use tracing::{Level, debug, info, warn};

use crate::filter::{RecordFilter, Rejection, is_bound_morpheme};
use crate::lexicon::Lexicon;
use crate::source::{RecordError, RecordSource};

/// Malformed lines logged at `warn` before dropping to `debug`.
pub const MALFORMED_LOG_LIMIT: usize = 5;

/// Lemma → surface forms pointing at it. Kept even when the lemma never
/// gets an entry of its own.
pub type LemmaInflectionMap = HashMap<String, BTreeSet<String>>;

/// What happened to one record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ingest {
    Rejected(Rejection),
    /// Only inflection pointers; no entry of its own.
    Inflection,
    Merged,
}

/// How much of a source to ingest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IngestLimit {
    All,
    /// Stop after `ceil(accepted * p / 100)` accepted records, counted over
    /// the filtered stream so the sample size is reproducible.
    Percent(f64),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IngestStats {
    pub lines: usize,
    pub malformed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub inflection_only: usize,
    pub merged: usize,
    pub truncated: bool,
}

/// `ceil(total * percent / 100)`, never zero for a non-empty total.
pub fn sample_size(total: usize, percent: f64) -> usize {
    if total == 0 {
        return 0;
    }
    let wanted = (total as f64 * percent / 100.0).ceil() as usize;
    wanted.clamp(1, total)
}

pub struct Aggregator {
    filter: RecordFilter,
    paradigms: ParadigmTable,
    lexicon: Lexicon,
    lemma_map: LemmaInflectionMap,
    stats: IngestStats,
}

impl Aggregator {
    pub fn new(filter: RecordFilter, paradigms: ParadigmTable) -> Self {
        Self {
            filter,
            paradigms,
            lexicon: Lexicon::default(),
            lemma_map: LemmaInflectionMap::new(),
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Filter and merge a single record.
    pub fn ingest(&mut self, record: &RawRecord) -> Ingest {
        if let Some(reason) = self.filter.rejection(record) {
            self.stats.rejected += 1;
            return Ingest::Rejected(reason);
        }
        self.stats.accepted += 1;

        let word = record.word.trim();
        let mut entry = HeadwordEntry::new(word, record.pos.trim());
        for sense in &record.senses {
            if sense.is_inflection_pointer() {
                for lemma in sense.lemma_pointers() {
                    self.record_pointer(lemma, word);
                }
                continue;
            }
            if let Some(definition) = definition_text(sense) {
                entry.add_definition(definition);
            }
        }

        if record.is_pure_inflection() {
            self.stats.inflection_only += 1;
            return Ingest::Inflection;
        }

        if entry.definitions.is_empty() {
            entry.add_definition(PLACEHOLDER_DEFINITION);
        }
        entry.offer_etymology(record.etymology_text.as_deref());
        self.collect_inflections(record, &mut entry);

        let surfaces: Vec<String> = entry.inflections.iter().cloned().collect();
        for surface in surfaces.iter().map(String::as_str).chain(iter::once(word)) {
            for variant in case_variants(surface) {
                entry.add_inflection(variant);
            }
        }

        self.lexicon.merge(entry);
        self.stats.merged += 1;
        Ingest::Merged
    }

    /// Drive a whole source, skipping malformed lines.
    pub fn ingest_source(&mut self, source: &RecordSource, limit: IngestLimit) {
        let cap = match limit {
            IngestLimit::All => None,
            IngestLimit::Percent(p) => {
                let total = self.count_accepted(source);
                let cap = sample_size(total, p);
                info!("ingest limit {p}%: {cap} of {total} accepted records");
                Some(cap)
            }
        };

        let mut accepted_here = 0usize;
        for (_, parsed) in source.records() {
            if cap.is_some_and(|c| accepted_here >= c) {
                self.stats.truncated = true;
                break;
            }
            self.stats.lines += 1;
            let record = match parsed {
                Ok(record) => record,
                Err(err) => {
                    self.note_malformed(&err);
                    continue;
                }
            };
            if !matches!(self.ingest(&record), Ingest::Rejected(_)) {
                accepted_here += 1;
            }
        }
    }

    /// Resolve inflection pointers and freeze the table.
    pub fn finalize(self) -> (Lexicon, LemmaInflectionMap) {
        let Aggregator {
            mut lexicon,
            lemma_map,
            stats,
            ..
        } = self;

        let mut resolved = 0usize;
        for (lemma, forms) in &lemma_map {
            let Some(entries) = lexicon.get_mut(lemma) else {
                continue;
            };
            resolved += 1;
            for entry in entries.iter_mut() {
                for form in forms.iter().filter(|f| !is_bound_morpheme(f)) {
                    entry.add_inflection(form.as_str());
                }
            }
        }

        info!(
            "ingested {} lines: {} accepted, {} rejected, {} malformed, {} inflection-only{}",
            stats.lines,
            stats.accepted,
            stats.rejected,
            stats.malformed,
            stats.inflection_only,
            if stats.truncated { " (truncated)" } else { "" }
        );
        info!(
            "{} headwords, {} entries; {} of {} pointed-to lemmas resolved",
            lexicon.headword_count(),
            lexicon.entry_count(),
            resolved,
            lemma_map.len()
        );
        (lexicon, lemma_map)
    }

    fn count_accepted(&self, source: &RecordSource) -> usize {
        source
            .records()
            .filter_map(|(_, parsed)| parsed.ok())
            .filter(|record| self.filter.accept(record))
            .count()
    }

    fn record_pointer(&mut self, lemma: &str, word: &str) {
        if lemma == word {
            return;
        }
        let forms = self.lemma_map.entry(lemma.to_string()).or_default();
        forms.insert(word.to_string());
        forms.extend(case_variants(word));
    }

    fn collect_inflections(&self, record: &RawRecord, entry: &mut HeadwordEntry) {
        let alphabet = self.filter.alphabet();
        let mut explicit = 0usize;
        for form in &record.forms {
            let surface = form.form.trim();
            if surface.is_empty()
                || form.is_metadata()
                || is_bound_morpheme(surface)
                || !alphabet.has_script_char(surface)
                || alphabet.has_foreign_letters(surface)
            {
                continue;
            }
            explicit += 1;
            entry.add_inflection(surface);
        }

        for related in &record.related {
            let surface = related.word.trim();
            if !surface.is_empty() && !is_bound_morpheme(surface) {
                entry.add_inflection(surface);
            }
        }

        // Explicit forms are authoritative; paradigms only fill gaps.
        if explicit > 0 {
            return;
        }
        for template in record.templates() {
            if let Some(expansion) = self.paradigms.expansion(&entry.headword, &template.name) {
                debug!(
                    "expanded {} via {} into {} forms",
                    entry.headword,
                    expansion.paradigm,
                    expansion.forms.len()
                );
                for form in expansion.forms {
                    entry.add_inflection(form);
                }
                entry.expanded_from_paradigm = true;
            }
        }
    }

    fn note_malformed(&mut self, err: &RecordError) {
        self.stats.malformed += 1;
        let nth = self.stats.malformed;
        if malformed_log_level(nth) == Level::DEBUG {
            debug!("skipping malformed record: {err}");
        } else if nth == MALFORMED_LOG_LIMIT {
            warn!("skipping malformed record: {err} (further ones logged at debug)");
        } else {
            warn!("skipping malformed record: {err}");
        }
    }
}

/// Level for the `nth` malformed record (1-based).
fn malformed_log_level(nth: usize) -> Level {
    if nth <= MALFORMED_LOG_LIMIT {
        Level::WARN
    } else {
        Level::DEBUG
    }
}

/// Glosses joined with `"; "`, falling back to raw glosses, prefixed with
/// bracketed raw tags. `None` when nothing survives trimming.
fn definition_text(sense: &Sense) -> Option<String> {
    let joined = |parts: &[String]| {
        parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    };
    let mut body = joined(&sense.glosses);
    if body.is_empty() {
        body = joined(&sense.raw_glosses);
    }
    if body.is_empty() {
        return None;
    }

    let tags: Vec<&str> = sense
        .raw_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        Some(body)
    } else {
        Some(format!("[{}] {body}", tags.join(", ")))
    }
}
