use serde::Deserialize;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::records::{SourceId, TextBoundsRecord};

/// Where a source's bounds record starts in the bounds file.
#[derive(Debug, Clone, Copy)]
struct Location {
    offset: u64,
    line: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundsKey {
    source_id: SourceId,
}

/// Byte-offset index over a text-bounds file.
///
/// Built in a single pass; each lookup seeks straight to its record so
/// the bounds payloads never have to sit in memory together.
pub struct BoundsIndex {
    path: PathBuf,
    locations: HashMap<SourceId, Location>,
}

impl BoundsIndex {
    pub async fn build(path: &Path) -> Result<Self> {
        let file = File::open(path).await.map_err(ImportError::io(path))?;
        let mut reader = BufReader::new(file);

        let mut locations = HashMap::new();
        let mut buf = String::new();
        let mut offset = 0u64;
        let mut line = 0usize;

        loop {
            buf.clear();
            let read = reader
                .read_line(&mut buf)
                .await
                .map_err(ImportError::io(path))?;
            if read == 0 {
                break;
            }
            line += 1;

            if !buf.trim().is_empty() {
                let key: BoundsKey = serde_json::from_str(&buf).map_err(|source| ImportError::MalformedRecord {
                    path: path.to_path_buf(),
                    line,
                    source,
                })?;

                // First record for an id wins
                if locations.contains_key(&key.source_id) {
                    warn!(source_id = %key.source_id, line, "duplicate text bounds record ignored");
                } else {
                    locations.insert(key.source_id, Location { offset, line });
                }
            }

            offset += read as u64;
        }

        debug!(path = %path.display(), sources = locations.len(), "indexed text bounds");
        Ok(Self {
            path: path.to_path_buf(),
            locations,
        })
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, source_id: &SourceId) -> bool {
        self.locations.contains_key(source_id)
    }

    /// The `textBounds` payload recorded for `source_id`, verbatim.
    pub async fn lookup(&self, source_id: &SourceId) -> Result<Option<serde_json::Value>> {
        let Some(location) = self.locations.get(source_id) else {
            return Ok(None);
        };

        let mut file = File::open(&self.path).await.map_err(ImportError::io(&self.path))?;
        file.seek(SeekFrom::Start(location.offset))
            .await
            .map_err(ImportError::io(&self.path))?;

        let mut buf = String::new();
        BufReader::new(file)
            .read_line(&mut buf)
            .await
            .map_err(ImportError::io(&self.path))?;

        let record: TextBoundsRecord = serde_json::from_str(&buf).map_err(|source| ImportError::MalformedRecord {
            path: self.path.clone(),
            line: location.line,
            source,
        })?;

        Ok(Some(record.text_bounds))
    }
}
