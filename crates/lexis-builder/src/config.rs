use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use lexis_db::{IngestLimit, LoadMode, Lexicon};
use lexis_types::Alphabet;
use thiserror::Error;

use crate::partition::{Bucket, LetterScheme, partition, sample};
use crate::render::{Converter, DEFAULT_MAX_INFLECTIONS, RenderOptions};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{flag} must be greater than 0 and at most 100, got {value}")]
    InvalidPercent { flag: &'static str, value: f64 },
    #[error("bucket {requested} is out of range (scheme has {available} buckets)")]
    BucketOutOfRange { requested: usize, available: usize },
    #[error("--timeout-secs must be positive")]
    ZeroTimeout,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum SchemeChoice {
    Single,
    #[default]
    Five,
    Twelve,
}

impl SchemeChoice {
    pub fn scheme(self) -> LetterScheme {
        match self {
            Self::Single => LetterScheme::single(),
            Self::Five => LetterScheme::five(),
            Self::Twelve => LetterScheme::twelve(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "lexis")]
#[command(about = "Build a letter-partitioned Greek dictionary from Wiktionary records")]
pub struct Cli {
    /// Wiktionary NDJSON extraction, one record per line.
    #[arg(long, env = "LEXIS_SOURCE")]
    pub source: PathBuf,
    #[arg(long, env = "LEXIS_LOAD_MODE", default_value = "mmap", value_parser = parse_load_mode)]
    pub load_mode: LoadMode,
    #[arg(long, env = "LEXIS_SCHEME", value_enum, default_value_t = SchemeChoice::Five)]
    pub scheme: SchemeChoice,
    /// Build only this bucket (1-based).
    #[arg(long, env = "LEXIS_BUCKET", conflicts_with = "percent")]
    pub bucket: Option<usize>,
    /// Emit one sample bucket holding the first p% of headwords.
    #[arg(long, env = "LEXIS_PERCENT")]
    pub percent: Option<f64>,
    /// Stop ingesting after p% of the accepted records.
    #[arg(long, env = "LEXIS_INGEST_PERCENT")]
    pub ingest_percent: Option<f64>,
    /// JSON paradigm table; the built-in table is used when absent.
    #[arg(long, env = "LEXIS_PARADIGMS")]
    pub paradigms: Option<PathBuf>,
    #[arg(long, env = "LEXIS_OUT_DIR", default_value = "out")]
    pub out_dir: PathBuf,
    #[arg(long, env = "LEXIS_CONVERTER")]
    pub converter: Option<String>,
    /// Converter argument; `{input}` is replaced by the bucket file.
    #[arg(long = "converter-arg", allow_hyphen_values = true)]
    pub converter_args: Vec<String>,
    #[arg(long, env = "LEXIS_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,
    #[arg(long, env = "LEXIS_MAX_INFLECTIONS", default_value_t = DEFAULT_MAX_INFLECTIONS)]
    pub max_inflections: usize,
}

fn parse_load_mode(raw: &str) -> Result<LoadMode, String> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Ok(LoadMode::Mmap),
        "owned" => Ok(LoadMode::Owned),
        other => Err(format!("unknown load mode {other:?} (expected mmap or owned)")),
    }
}

/// What to emit once the lexicon is built.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildPlan {
    Sample { percent: f64 },
    Buckets {
        scheme: LetterScheme,
        only: Option<usize>,
    },
}

impl BuildPlan {
    pub fn buckets(&self, lexicon: &Lexicon, alphabet: &Alphabet) -> Vec<Bucket> {
        match self {
            Self::Sample { percent } => vec![sample(lexicon, alphabet, *percent)],
            Self::Buckets { scheme, only } => {
                let buckets = partition(lexicon, scheme, alphabet).into_buckets();
                match only {
                    Some(index) => buckets.into_iter().filter(|b| b.index == *index).collect(),
                    None => buckets,
                }
            }
        }
    }
}

/// Validated build parameters.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub load_mode: LoadMode,
    pub ingest: IngestLimit,
    pub paradigms: Option<PathBuf>,
    pub plan: BuildPlan,
    pub render: RenderOptions,
}

pub fn validate_percent(flag: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 100.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidPercent { flag, value })
    }
}

impl Cli {
    pub fn into_options(self) -> Result<BuildOptions, ConfigError> {
        let ingest = match self.ingest_percent {
            Some(p) => IngestLimit::Percent(validate_percent("--ingest-percent", p)?),
            None => IngestLimit::All,
        };

        let plan = match self.percent {
            Some(p) => BuildPlan::Sample {
                percent: validate_percent("--percent", p)?,
            },
            None => {
                let scheme = self.scheme.scheme();
                let only = match self.bucket {
                    Some(requested) if requested == 0 || requested > scheme.len() => {
                        return Err(ConfigError::BucketOutOfRange {
                            requested,
                            available: scheme.len(),
                        });
                    }
                    Some(requested) => Some(requested - 1),
                    None => None,
                };
                BuildPlan::Buckets { scheme, only }
            }
        };

        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let converter = self.converter.map(|program| {
            Converter::new(program)
                .with_args(self.converter_args)
                .with_timeout(Duration::from_secs(self.timeout_secs))
        });

        Ok(BuildOptions {
            source: self.source,
            load_mode: self.load_mode,
            ingest,
            paradigms: self.paradigms,
            plan,
            render: RenderOptions {
                out_dir: self.out_dir,
                converter,
                max_inflections: self.max_inflections,
            },
        })
    }
}
