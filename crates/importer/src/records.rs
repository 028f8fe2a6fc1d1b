use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::error::{ImportError, Result};

/// Source identifier as exported. `7` and `"7"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Text(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Int(id) => write!(f, "{}", id),
            SourceId::UInt(id) => write!(f, "{}", id),
            SourceId::Text(id) => write!(f, "{:?}", id),
        }
    }
}

/// One line of the sources file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceRecord {
    Text(TextSourceRecord),
    Pdf(PdfSourceRecord),
    /// Any other discriminator; logged and skipped
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSourceRecord {
    pub source_name: String,
    pub directory_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSourceRecord {
    pub source_name: String,
    pub directory_name: String,
    pub source_id: SourceId,
    /// Text layer extracted at export time
    #[serde(default)]
    pub text: Option<String>,
}

/// One line of the text-bounds file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBoundsRecord {
    pub source_id: SourceId,
    pub text_bounds: serde_json::Value,
}

/// Streams typed records out of a JSON-Lines file, skipping blank lines.
pub struct JsonLines<T> {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
    _record: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonLines<T> {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).await.map_err(ImportError::io(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line: 0,
            _record: PhantomData,
        })
    }

    /// 1-based line number of the last record returned
    pub fn line_number(&self) -> usize {
        self.line
    }

    pub async fn next_record(&mut self) -> Result<Option<T>> {
        loop {
            let Some(text) = self
                .lines
                .next_line()
                .await
                .map_err(ImportError::io(&self.path))?
            else {
                return Ok(None);
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            let record = serde_json::from_str(&text).map_err(|source| ImportError::MalformedRecord {
                path: self.path.clone(),
                line: self.line,
                source,
            })?;
            return Ok(Some(record));
        }
    }
}
