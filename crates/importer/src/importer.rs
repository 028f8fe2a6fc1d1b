use client::{PdfSource, SourceApi};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::archive;
use crate::bounds::BoundsIndex;
use crate::bundle::{self, EntityFiles, EntityRole};
use crate::error::{ImportError, Result};
use crate::records::{JsonLines, PdfSourceRecord, SourceId, SourceRecord, TextSourceRecord};
use crate::scratch::ScratchDir;

/// What to do with a PDF source that has no text-bounds record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingBoundsPolicy {
    /// Log an error and create the source without bounds
    #[default]
    Degrade,
    /// Log a warning and do not create the source
    Skip,
    /// Abort the import
    Fail,
}

impl FromStr for MissingBoundsPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown missing-bounds policy '{}' (expected degrade, skip or fail)", other)),
        }
    }
}

impl fmt::Display for MissingBoundsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Degrade => "degrade",
            Self::Skip => "skip",
            Self::Fail => "fail",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Parent of the per-run scratch directory
    pub scratch_root: PathBuf,
    pub missing_bounds: MissingBoundsPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            missing_bounds: MissingBoundsPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    /// `directory/source` of every source that already existed
    pub conflicts: Vec<String>,
    /// PDF sources without a text-bounds record
    pub missing_bounds: Vec<SourceId>,
    /// Unsupported record types and sources skipped for missing bounds
    pub skipped: usize,
}

impl ImportReport {
    /// Records read from the sources file
    pub fn records(&self) -> usize {
        self.created + self.conflicts.len() + self.skipped
    }
}

enum Outcome {
    Created,
    Skipped,
}

/// Replays the sources of one export bundle into a project.
pub struct ProjectImport<P> {
    archive: PathBuf,
    project: P,
    options: ImportOptions,
}

impl<P: SourceApi> ProjectImport<P> {
    pub fn new(archive: impl Into<PathBuf>, project: P) -> Self {
        Self {
            archive: archive.into(),
            project,
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn project(&self) -> &P {
        &self.project
    }

    /// Unpack the bundle, resolve its entity files and create every source.
    ///
    /// The scratch directory is removed on every exit path.
    pub async fn run(&self) -> Result<ImportReport> {
        let scratch = ScratchDir::create_in(&self.options.scratch_root).await?;
        info!(
            archive = %self.archive.display(),
            scratch = %scratch.path().display(),
            "unpacking export bundle"
        );

        archive::extract(&self.archive, scratch.path()).await?;
        let files = bundle::discover(scratch.path()).await?;
        let report = self.import_sources(&files).await?;

        info!(
            created = report.created,
            conflicts = report.conflicts.len(),
            missing_bounds = report.missing_bounds.len(),
            skipped = report.skipped,
            "import finished"
        );
        Ok(report)
    }

    /// Create one source per record of the sources file, in file order.
    pub async fn import_sources(&self, files: &EntityFiles) -> Result<ImportReport> {
        // Only PDF records need bounds; text-only bundles never read the file
        let bounds = OnceCell::new();
        let mut sources = JsonLines::<SourceRecord>::open(&files.path(EntityRole::Sources)).await?;
        let mut report = ImportReport::default();

        while let Some(record) = sources.next_record().await? {
            match self.create_source(files, &bounds, &record, &mut report).await {
                Ok(Outcome::Created) => report.created += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) if e.is_conflict() => {
                    let name = record_name(&record);
                    warn!(source = %name, "source already exists, skipping");
                    report.conflicts.push(name);
                }
                Err(e) => {
                    error!(line = sources.line_number(), error = %e, "import aborted");
                    return Err(e);
                }
            }
        }

        Ok(report)
    }

    async fn create_source(
        &self,
        files: &EntityFiles,
        bounds: &OnceCell<BoundsIndex>,
        record: &SourceRecord,
        report: &mut ImportReport,
    ) -> Result<Outcome> {
        match record {
            SourceRecord::Text(TextSourceRecord {
                source_name,
                directory_name,
                text,
            }) => {
                self.project
                    .create_text_source(source_name, text, directory_name)
                    .await?;
                Ok(Outcome::Created)
            }
            SourceRecord::Pdf(pdf) => self.create_pdf_source(files, bounds, pdf, report).await,
            SourceRecord::Unsupported => {
                warn!("unsupported source type, skipping record");
                Ok(Outcome::Skipped)
            }
        }
    }

    async fn create_pdf_source(
        &self,
        files: &EntityFiles,
        bounds: &OnceCell<BoundsIndex>,
        record: &PdfSourceRecord,
        report: &mut ImportReport,
    ) -> Result<Outcome> {
        let path = payload_path(files.root(), &record.directory_name, &record.source_name)?;
        let bounds_path = files.path(EntityRole::TextBounds);
        let index = bounds
            .get_or_try_init(|| BoundsIndex::build(&bounds_path))
            .await?;
        let text_bounds = index.lookup(&record.source_id).await?;

        if text_bounds.is_none() {
            match self.options.missing_bounds {
                MissingBoundsPolicy::Degrade => {
                    error!(source_id = %record.source_id, "unable to find text bounds");
                    report.missing_bounds.push(record.source_id.clone());
                }
                MissingBoundsPolicy::Skip => {
                    warn!(source_id = %record.source_id, "unable to find text bounds, skipping source");
                    report.missing_bounds.push(record.source_id.clone());
                    return Ok(Outcome::Skipped);
                }
                MissingBoundsPolicy::Fail => {
                    return Err(ImportError::MissingBounds {
                        source_id: record.source_id.clone(),
                    });
                }
            }
        }

        let source = PdfSource {
            path,
            name: record.source_name.clone(),
            directory: record.directory_name.clone(),
            ocr: false,
            source_text: record.text.clone(),
            text_bounds,
        };
        self.project.create_pdf_source(&source).await?;
        Ok(Outcome::Created)
    }
}

fn record_name(record: &SourceRecord) -> String {
    match record {
        SourceRecord::Text(r) => format!("{}/{}", r.directory_name, r.source_name),
        SourceRecord::Pdf(r) => format!("{}/{}", r.directory_name, r.source_name),
        SourceRecord::Unsupported => "<unsupported>".to_string(),
    }
}

/// `<root>/<directory>/<name>`, refusing anything but plain path segments
fn payload_path(root: &Path, directory: &str, name: &str) -> Result<PathBuf> {
    let relative = Path::new(directory).join(name);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));

    if !plain || name.is_empty() {
        return Err(ImportError::UnsafePayloadPath {
            directory: directory.to_string(),
            name: name.to_string(),
        });
    }

    Ok(root.join(relative))
}
