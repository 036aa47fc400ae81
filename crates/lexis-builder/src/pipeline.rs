use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use lexis_db::{Aggregator, IngestStats, RecordFilter, RecordSource};
use lexis_paradigm::ParadigmTable;
use lexis_types::Alphabet;
use tracing::info;

use crate::config::BuildOptions;
use crate::render::{BucketReport, render_all};

#[derive(Debug)]
pub struct BuildSummary {
    pub stats: IngestStats,
    pub headwords: usize,
    pub reports: Vec<BucketReport>,
}

impl BuildSummary {
    /// True when buckets were requested and none of them came out.
    pub fn all_failed(&self) -> bool {
        !self.reports.is_empty() && self.reports.iter().all(|r| !r.outcome.is_success())
    }
}

/// Ingest, partition, render. Per-bucket failures are reported, not raised.
pub async fn run(options: &BuildOptions) -> Result<BuildSummary> {
    let paradigms = match &options.paradigms {
        Some(path) => ParadigmTable::load(path)?,
        None => ParadigmTable::builtin(),
    };
    info!("paradigm table: {} declensions", paradigms.len());

    let start = Instant::now();
    let source = RecordSource::open(&options.source, options.load_mode)
        .with_context(|| format!("open {}", options.source.display()))?;
    let mut aggregator = Aggregator::new(RecordFilter::greek(), paradigms);
    aggregator.ingest_source(&source, options.ingest);
    let stats = aggregator.stats().clone();
    let (lexicon, _) = aggregator.finalize();
    info!(
        "lexicon built in {} ms: {} headwords, {} entries",
        start.elapsed().as_millis(),
        lexicon.headword_count(),
        lexicon.entry_count()
    );

    let part_start = Instant::now();
    let buckets = options.plan.buckets(&lexicon, &Alphabet::greek());
    info!(
        "{} buckets planned in {} ms",
        buckets.len(),
        part_start.elapsed().as_millis()
    );

    tokio::fs::create_dir_all(&options.render.out_dir)
        .await
        .with_context(|| format!("create {}", options.render.out_dir.display()))?;
    let headwords = lexicon.headword_count();
    let render_start = Instant::now();
    let reports = render_all(buckets, Arc::new(lexicon), Arc::new(options.render.clone())).await;
    info!("rendered in {} ms", render_start.elapsed().as_millis());

    Ok(BuildSummary {
        stats,
        headwords,
        reports,
    })
}
