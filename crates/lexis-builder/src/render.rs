use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use lexis_db::Lexicon;
use lexis_types::HeadwordEntry;
use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::partition::Bucket;

pub const DEFAULT_MAX_INFLECTIONS: usize = 50;
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(300);
const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("encode bucket {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("start converter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("wait for converter {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("converter exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },
    #[error("converter timed out after {0:?}")]
    Timeout(Duration),
    #[error("render task failed: {0}")]
    Task(String),
}

#[derive(Debug, Serialize)]
pub struct BucketDocument {
    pub index: usize,
    pub label: Option<String>,
    pub entries: Vec<DocumentHeadword>,
}

#[derive(Debug, Serialize)]
pub struct DocumentHeadword {
    pub headword: String,
    pub entries: Vec<DocumentEntry>,
}

#[derive(Debug, Serialize)]
pub struct DocumentEntry {
    pub pos: String,
    pub definitions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etymology: Option<String>,
    pub inflections: Vec<String>,
}

impl BucketDocument {
    pub fn build(bucket: &Bucket, lexicon: &Lexicon, max_inflections: usize) -> Self {
        let entries = bucket
            .entries(lexicon)
            .map(|(headword, entries)| DocumentHeadword {
                headword: headword.to_string(),
                entries: entries
                    .iter()
                    .map(|e| DocumentEntry::build(e, max_inflections))
                    .collect(),
            })
            .collect();
        Self {
            index: bucket.index,
            label: bucket.label.map(|l| l.to_string()),
            entries,
        }
    }

    /// Output file name, numbered from one.
    pub fn file_name(&self) -> String {
        format!("bucket-{:02}.json", self.index + 1)
    }
}

impl DocumentEntry {
    fn build(entry: &HeadwordEntry, max_inflections: usize) -> Self {
        let definitions = if entry.definitions.len() > 1 {
            entry
                .definitions
                .iter()
                .enumerate()
                .map(|(i, d)| format!("{}. {d}", i + 1))
                .collect()
        } else {
            entry.definitions.clone()
        };
        // Lowercase surfaces first so the cap drops case variants before real forms.
        let (plain, variants): (Vec<&String>, Vec<&String>) = entry
            .inflections
            .iter()
            .partition(|f| f.to_lowercase() == **f);
        let inflections = plain
            .into_iter()
            .chain(variants)
            .take(max_inflections)
            .cloned()
            .collect();
        Self {
            pos: entry.pos.clone(),
            definitions,
            etymology: entry.etymology.clone(),
            inflections,
        }
    }
}

pub async fn write_bucket(doc: &BucketDocument, out_dir: &Path) -> Result<PathBuf, RenderError> {
    let path = out_dir.join(doc.file_name());
    let bytes = serde_json::to_vec_pretty(doc).map_err(|source| RenderError::Encode {
        index: doc.index,
        source,
    })?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| RenderError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// External program turning a bucket file into a reader format.
#[derive(Clone, Debug)]
pub struct Converter {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Converter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_CONVERTER_TIMEOUT,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments with `{input}` substituted; the input path is appended when
    /// no argument mentions it.
    pub fn command_args(&self, input: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, &input))
            .collect();
        if !self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            args.push(input.into_owned());
        }
        args
    }

    pub async fn run(&self, input: &Path) -> Result<(), RenderError> {
        let child = Command::new(&self.program)
            .args(self.command_args(input))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // On timeout the output future is dropped, which kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))?
            .map_err(|source| RenderError::Wait {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RenderError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub out_dir: PathBuf,
    pub converter: Option<Converter>,
    pub max_inflections: usize,
}

impl RenderOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            converter: None,
            max_inflections: DEFAULT_MAX_INFLECTIONS,
        }
    }
}

#[derive(Debug)]
pub enum BucketOutcome {
    Written(PathBuf),
    Converted(PathBuf),
    Failed(RenderError),
    TimedOut(Duration),
}

impl BucketOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written(_) | Self::Converted(_))
    }
}

#[derive(Debug)]
pub struct BucketReport {
    pub index: usize,
    pub label: Option<String>,
    pub headwords: usize,
    pub outcome: BucketOutcome,
}

async fn render_bucket(bucket: &Bucket, lexicon: &Lexicon, options: &RenderOptions) -> BucketOutcome {
    let doc = BucketDocument::build(bucket, lexicon, options.max_inflections);
    let path = match write_bucket(&doc, &options.out_dir).await {
        Ok(path) => path,
        Err(err) => return BucketOutcome::Failed(err),
    };
    debug!("wrote {}", path.display());

    let Some(converter) = &options.converter else {
        return BucketOutcome::Written(path);
    };
    match converter.run(&path).await {
        Ok(()) => BucketOutcome::Converted(path),
        Err(RenderError::Timeout(after)) => BucketOutcome::TimedOut(after),
        Err(err) => BucketOutcome::Failed(err),
    }
}

/// Render every bucket on its own task. One bucket failing never stops the
/// others; reports come back in bucket order.
pub async fn render_all(
    buckets: Vec<Bucket>,
    lexicon: Arc<Lexicon>,
    options: Arc<RenderOptions>,
) -> Vec<BucketReport> {
    let handles: Vec<_> = buckets
        .into_iter()
        .map(|bucket| {
            let index = bucket.index;
            let label = bucket.label.map(|l| l.to_string());
            let headwords = bucket.len();
            let lexicon = Arc::clone(&lexicon);
            let options = Arc::clone(&options);
            let handle =
                tokio::spawn(async move { render_bucket(&bucket, &lexicon, &options).await });
            (index, label, headwords, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (index, label, headwords, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("bucket {} task ended abnormally: {err}", index + 1);
                BucketOutcome::Failed(RenderError::Task(err.to_string()))
            }
        };
        reports.push(BucketReport {
            index,
            label,
            headwords,
            outcome,
        });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{LetterScheme, partition};
    use lexis_types::Alphabet;

    fn lexicon() -> Lexicon {
        let mut grafo = HeadwordEntry::new("γράφω", "verb");
        grafo.add_definition("to write");
        grafo.add_definition("to record");
        grafo.offer_etymology(Some("From Ancient Greek γράφω."));
        for form in ["γράφεις", "Γράφεις", "έγραψα", "ΈΓΡΑΨΑ"] {
            grafo.add_inflection(form);
        }
        let mut vivlio = HeadwordEntry::new("βιβλίο", "noun");
        vivlio.add_definition("book");
        [grafo, vivlio].into_iter().collect()
    }

    fn buckets(lex: &Lexicon) -> Vec<Bucket> {
        partition(lex, &LetterScheme::single(), &Alphabet::greek()).into_buckets()
    }

    #[test]
    fn numbers_only_multiple_definitions() {
        let lex = lexicon();
        let doc = BucketDocument::build(&buckets(&lex)[0], &lex, DEFAULT_MAX_INFLECTIONS);
        assert_eq!(doc.entries[0].headword, "βιβλίο");
        assert_eq!(doc.entries[0].entries[0].definitions, vec!["book"]);
        assert_eq!(
            doc.entries[1].entries[0].definitions,
            vec!["1. to write", "2. to record"]
        );
        assert_eq!(doc.file_name(), "bucket-01.json");
        assert_eq!(doc.label.as_deref(), Some("Β-Γ"));
    }

    #[test]
    fn caps_inflections_keeping_plain_forms() {
        let lex = lexicon();
        let doc = BucketDocument::build(&buckets(&lex)[0], &lex, 2);
        let inflections = &doc.entries[1].entries[0].inflections;
        assert_eq!(inflections, &vec!["έγραψα".to_string(), "γράφεις".to_string()]);
    }

    #[test]
    fn substitutes_or_appends_input() {
        let input = Path::new("/tmp/bucket-01.json");
        let conv = Converter::new("kindlegen").with_args(vec!["-o".into(), "{input}.mobi".into()]);
        assert_eq!(conv.command_args(input), vec!["-o", "/tmp/bucket-01.json.mobi"]);
        let bare = Converter::new("kindlegen").with_args(vec!["-v".into()]);
        assert_eq!(bare.command_args(input), vec!["-v", "/tmp/bucket-01.json"]);
    }

    #[tokio::test]
    async fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let lex = lexicon();
        let doc = BucketDocument::build(&buckets(&lex)[0], &lex, DEFAULT_MAX_INFLECTIONS);
        let path = write_bucket(&doc, dir.path()).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["entries"][1]["headword"], "γράφω");
        assert_eq!(
            value["entries"][1]["entries"][0]["etymology"],
            "From Ancient Greek γράφω."
        );
        assert!(value["entries"][0]["entries"][0].get("etymology").is_none());
    }

    #[tokio::test]
    async fn missing_out_dir_fails_only_that_render() {
        let dir = tempfile::tempdir().unwrap();
        let lex = Arc::new(lexicon());
        let options = Arc::new(RenderOptions::new(dir.path().join("missing")));
        let reports = render_all(buckets(&lex), lex, options).await;
        assert_eq!(reports.len(), 1);
        assert!(matches!(
            reports[0].outcome,
            BucketOutcome::Failed(RenderError::Write { .. })
        ));
    }

    #[test]
    fn wait_failures_are_not_reported_as_spawn_failures() {
        let err = RenderError::Wait {
            program: "kindlegen".into(),
            source: std::io::Error::other("interrupted"),
        };
        assert_eq!(err.to_string(), "wait for converter kindlegen: interrupted");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn converter_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bucket-01.json");
        std::fs::write(&input, "{}").unwrap();

        let ok = Converter::new("sh").with_args(vec!["-c".into(), "test -s \"$0\"".into(), "{input}".into()]);
        ok.run(&input).await.unwrap();

        let failing = Converter::new("sh").with_args(vec!["-c".into(), "echo boom >&2; exit 3".into()]);
        match failing.run(&input).await {
            Err(RenderError::Exit { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }

        let slow = Converter::new("sh")
            .with_args(vec!["-c".into(), "sleep 5".into()])
            .with_timeout(Duration::from_millis(100));
        assert!(matches!(slow.run(&input).await, Err(RenderError::Timeout(_))));

        let missing = Converter::new("lexis-no-such-converter");
        let err = missing.run(&input).await.unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
        assert!(err.to_string().starts_with("start converter lexis-no-such-converter"));
    }
}
