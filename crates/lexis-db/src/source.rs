use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lexis_types::RawRecord;
use memmap2::Mmap;
use thiserror::Error;

/// Strategy for loading the record file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy).
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// A single bad line. Never fatal for the stream.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("line {line}: not valid UTF-8")]
    Utf8 { line: usize },
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl RecordError {
    pub fn line(&self) -> usize {
        match self {
            RecordError::Utf8 { line } | RecordError::Json { line, .. } => *line,
        }
    }
}

/// Newline-delimited JSON records backed by mmap or an owned buffer.
///
/// [`RecordSource::records`] hands out a fresh lazy iterator on every call,
/// so the same source can be scanned more than once.
pub struct RecordSource {
    path: Option<PathBuf>,
    buffer: Buffer,
}

impl RecordSource {
    pub fn open(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let buffer = load_file(path, mode)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            buffer,
        })
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: None,
            buffer: Buffer::Owned(bytes.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn byte_len(&self) -> usize {
        self.buffer.as_slice().len()
    }

    /// Lazily parse every non-blank line. Line numbers are 1-based.
    pub fn records(&self) -> impl Iterator<Item = (usize, Result<RawRecord, RecordError>)> + '_ {
        self.buffer
            .as_slice()
            .split(|b| *b == b'\n')
            .enumerate()
            .filter_map(|(idx, raw_line)| {
                let line = strip_cr(raw_line);
                if line.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
                Some((idx + 1, parse_line(idx + 1, line)))
            })
    }
}

fn parse_line(line: usize, bytes: &[u8]) -> Result<RawRecord, RecordError> {
    let text = std::str::from_utf8(bytes).map_err(|_| RecordError::Utf8 { line })?;
    serde_json::from_str(text).map_err(|source| RecordError::Json { line, source })
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_reports_bad_ones() {
        let source = RecordSource::from_bytes(
            "{\"word\":\"λόγος\"}\r\n\n   \n{not json}\n{\"word\":\"νερό\"}\n".as_bytes().to_vec(),
        );
        let parsed: Vec<_> = source.records().collect();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].0, 1);
        assert_eq!(parsed[0].1.as_ref().unwrap().word, "λόγος");
        assert!(matches!(parsed[1].1, Err(RecordError::Json { line: 4, .. })));
        assert_eq!(parsed[2].1.as_ref().unwrap().word, "νερό");
    }

    #[test]
    fn invalid_utf8_is_a_record_error() {
        let mut bytes = b"{\"word\":\"a\"}\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let source = RecordSource::from_bytes(bytes);
        let errors: Vec<_> = source
            .records()
            .filter_map(|(_, r)| r.err())
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], RecordError::Utf8 { line: 2 }));
        assert_eq!(errors[0].line(), 2);
    }

    #[test]
    fn records_are_restartable() {
        let source = RecordSource::from_bytes(b"{\"word\":\"a\"}\n{\"word\":\"b\"}\n".to_vec());
        assert_eq!(source.records().count(), 2);
        assert_eq!(source.records().count(), 2);
    }
}
