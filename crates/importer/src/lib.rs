pub mod archive;
pub mod bounds;
pub mod bundle;
pub mod error;
pub mod importer;
pub mod records;
pub mod scratch;

pub use bounds::BoundsIndex;
pub use bundle::{EntityFiles, EntityRole};
pub use error::{ImportError, Result};
pub use importer::{ImportOptions, ImportReport, MissingBoundsPolicy, ProjectImport};
pub use records::{PdfSourceRecord, SourceId, SourceRecord, TextBoundsRecord, TextSourceRecord};
pub use scratch::ScratchDir;

use client::SourceApi;
use std::path::Path;

/// Import every source of the export bundle at `archive` into `project`
pub async fn import_bundle<P: SourceApi>(
    archive: &Path,
    project: P,
    options: ImportOptions,
) -> Result<ImportReport> {
    ProjectImport::new(archive, project)
        .with_options(options)
        .run()
        .await
}
