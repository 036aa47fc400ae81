//! Turn a Wiktionary NDJSON extraction into a frozen headword table.
//!
//! The pipeline is a single sequential pass:
//! [`RecordSource`] (mmap or owned buffer, one JSON object per line) →
//! [`RecordFilter`] (language, script, part-of-speech, bound morphemes) →
//! [`Aggregator`] (merge by `(headword, pos)`, collect inflections, expand
//! paradigms) → [`Aggregator::finalize`] → [`Lexicon`].
//!
//! Malformed lines are counted and skipped; no single bad record aborts a run.
//!
//! # Example
//! ```no_run
//! use lexis_db::{Aggregator, IngestLimit, LoadMode, RecordFilter, RecordSource};
//! use lexis_paradigm::ParadigmTable;
//!
//! # fn main() -> anyhow::Result<()> {
//! let source = RecordSource::open("/path/to/greek.jsonl", LoadMode::Mmap)?;
//! let mut agg = Aggregator::new(RecordFilter::greek(), ParadigmTable::builtin());
//! agg.ingest_source(&source, IngestLimit::All);
//! let (lexicon, _pointers) = agg.finalize();
//!
//! if let Some(entries) = lexicon.get("γράφω") {
//!     for entry in entries {
//!         println!("{} ({}): {:?}", entry.headword, entry.pos, entry.definitions);
//!     }
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p lexis-db --example stats -- <records.jsonl>`.

pub mod aggregate;
pub mod filter;
pub mod lexicon;
pub mod source;

pub use aggregate::{
    Aggregator, Ingest, IngestLimit, IngestStats, LemmaInflectionMap, MALFORMED_LOG_LIMIT,
    sample_size,
};
pub use filter::{FilterConfig, RecordFilter, Rejection, is_bound_morpheme};
pub use lexicon::Lexicon;
pub use source::{LoadMode, RecordError, RecordSource};
