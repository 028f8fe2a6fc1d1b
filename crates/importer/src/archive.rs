use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ImportError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
}

impl ArchiveFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("zip") => Ok(ArchiveFormat::Zip),
            Some("tar") => Ok(ArchiveFormat::Tar),
            _ => Err(ImportError::UnsupportedArchive {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Unpack `archive` into `target`. Runs on the blocking pool.
pub async fn extract(archive: &Path, target: &Path) -> Result<()> {
    let format = ArchiveFormat::from_path(archive)?;
    let archive = archive.to_path_buf();
    let target = target.to_path_buf();

    tokio::task::spawn_blocking(move || match format {
        ArchiveFormat::Zip => extract_zip(&archive, &target),
        ArchiveFormat::Tar => extract_tar(&archive, &target),
    })
    .await?
}

fn extract_zip(archive: &Path, target: &Path) -> Result<()> {
    let file = File::open(archive).map_err(ImportError::io(archive))?;
    let mut bundle = zip::ZipArchive::new(file)?;
    let mut written = 0usize;

    for i in 0..bundle.len() {
        let mut entry = bundle.by_index(i)?;

        // Reject entries that would land outside the target directory
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!(entry = entry.name(), "skipping archive entry with unsafe path");
            continue;
        };
        let out_path: PathBuf = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(ImportError::io(&out_path))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(ImportError::io(parent))?;
        }
        let mut outfile = File::create(&out_path).map_err(ImportError::io(&out_path))?;
        std::io::copy(&mut entry, &mut outfile).map_err(ImportError::io(&out_path))?;
        written += 1;
    }

    info!(archive = %archive.display(), files = written, "extracted zip bundle");
    Ok(())
}

fn extract_tar(archive: &Path, target: &Path) -> Result<()> {
    let file = File::open(archive).map_err(ImportError::io(archive))?;
    // `unpack` refuses entries that escape `target`
    tar::Archive::new(file)
        .unpack(target)
        .map_err(ImportError::io(archive))?;

    info!(archive = %archive.display(), "extracted tar bundle");
    Ok(())
}
