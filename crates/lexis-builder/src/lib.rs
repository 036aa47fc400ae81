//! Split a built [`lexis_db::Lexicon`] into letter-range buckets and render
//! each bucket to disk, optionally piping it through an external converter.
//!
//! Partitioning is pure and cheap to recompute; rendering runs one tokio task
//! per bucket and reports a [`BucketOutcome`] for each.

pub mod config;
pub mod partition;
pub mod pipeline;
pub mod render;

pub use config::{BuildOptions, BuildPlan, Cli, ConfigError, SchemeChoice, validate_percent};
pub use partition::{
    Bucket, BucketLabel, LetterScheme, Member, Partition, SchemeError, partition, sample,
};
pub use pipeline::{BuildSummary, run};
pub use render::{
    BucketDocument, BucketOutcome, BucketReport, Converter, DocumentEntry, DocumentHeadword,
    RenderError, RenderOptions, render_all, write_bucket,
};
