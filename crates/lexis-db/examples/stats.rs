use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use lexis_db::{Aggregator, IngestLimit, LoadMode, RecordFilter, RecordSource};
use lexis_paradigm::ParadigmTable;

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p lexis-db --example stats -- <records.jsonl>")?;

    let source = RecordSource::open(&path, LoadMode::Mmap)
        .with_context(|| format!("opening {}", path.display()))?;
    let start = Instant::now();
    let mut agg = Aggregator::new(RecordFilter::greek(), ParadigmTable::builtin());
    agg.ingest_source(&source, IngestLimit::All);
    let stats = agg.stats().clone();
    let (lexicon, pointers) = agg.finalize();

    let inflections: usize = lexicon
        .iter()
        .flat_map(|(_, entries)| entries)
        .map(|e| e.inflections.len())
        .sum();
    let expanded = lexicon
        .iter()
        .flat_map(|(_, entries)| entries)
        .filter(|e| e.expanded_from_paradigm)
        .count();
    let dangling = pointers
        .keys()
        .filter(|lemma| !lexicon.contains(lemma))
        .count();

    println!("Source       : {} ({} bytes)", path.display(), source.byte_len());
    println!("Lines        : {}", stats.lines);
    println!("Malformed    : {}", stats.malformed);
    println!("Accepted     : {}", stats.accepted);
    println!("Rejected     : {}", stats.rejected);
    println!("Pointer-only : {}", stats.inflection_only);
    println!("Headwords    : {}", lexicon.headword_count());
    println!("Entries      : {}", lexicon.entry_count());
    println!("Inflections  : {}", inflections);
    println!("From paradigm: {}", expanded);
    println!("Dangling lemma pointers: {}", dangling);
    println!("Elapsed      : {} ms", start.elapsed().as_millis());

    Ok(())
}
