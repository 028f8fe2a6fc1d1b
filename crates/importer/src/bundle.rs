use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{ImportError, Result};

/// The kinds of entity file an export bundle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRole {
    Sources,
    TextBounds,
    Annotations,
    Layers,
    Relations,
    Schemas,
    AnnotationTypes,
}

impl EntityRole {
    /// All roles, in the order missing files are reported
    pub const ALL: [EntityRole; 7] = [
        EntityRole::Sources,
        EntityRole::TextBounds,
        EntityRole::Schemas,
        EntityRole::AnnotationTypes,
        EntityRole::Annotations,
        EntityRole::Layers,
        EntityRole::Relations,
    ];

    /// Filename marker, as in `<export>.<suffix>.jsonl`
    pub fn suffix(self) -> &'static str {
        match self {
            EntityRole::Sources => "sources",
            EntityRole::TextBounds => "text-bounds",
            EntityRole::Annotations => "annotations",
            EntityRole::Layers => "layers",
            EntityRole::Relations => "relations",
            EntityRole::Schemas => "schemas",
            EntityRole::AnnotationTypes => "atntypes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityRole::Sources => "Sources",
            EntityRole::TextBounds => "Text Bounds",
            EntityRole::Annotations => "Annotations",
            EntityRole::Layers => "Layers",
            EntityRole::Relations => "Relations",
            EntityRole::Schemas => "Schemas",
            EntityRole::AnnotationTypes => "Annotation Types",
        }
    }

    /// Export request option that makes the platform include this file
    pub fn export_option(self) -> Option<&'static str> {
        match self {
            EntityRole::Sources => Some("includeSources"),
            EntityRole::TextBounds => Some("includeTextBounds"),
            EntityRole::Schemas | EntityRole::AnnotationTypes => Some("includeSchemas"),
            EntityRole::Annotations | EntityRole::Layers | EntityRole::Relations => None,
        }
    }

    pub fn missing_message(self) -> String {
        match self.export_option() {
            Some(option) => format!(
                "{} missing from export. Make the export request with {}=true.",
                self.label(),
                option
            ),
            None => format!("{} missing from export.", self.label()),
        }
    }

    fn pattern(self) -> &'static Regex {
        static PATTERNS: LazyLock<HashMap<EntityRole, Regex>> = LazyLock::new(|| {
            EntityRole::ALL
                .iter()
                .map(|role| {
                    // Anchored at the start only; `discover` limits candidates to `.jsonl` files
                    let pattern = format!(r"^.*\.{}\.jsonl", regex::escape(role.suffix()));
                    (*role, Regex::new(&pattern).expect("role pattern is valid"))
                })
                .collect()
        });
        &PATTERNS[&self]
    }

    pub fn matches(self, filename: &str) -> bool {
        self.pattern().is_match(filename)
    }
}

impl fmt::Display for EntityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Resolved entity files of an unpacked bundle.
#[derive(Debug, Clone)]
pub struct EntityFiles {
    root: PathBuf,
    files: HashMap<EntityRole, String>,
}

impl EntityFiles {
    /// Directory the bundle was unpacked into
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filename(&self, role: EntityRole) -> &str {
        // `classify` guarantees every role is present
        &self.files[&role]
    }

    pub fn path(&self, role: EntityRole) -> PathBuf {
        self.root.join(self.filename(role))
    }
}

/// Match each role against `filenames`; the first match in listing order wins.
pub fn classify(filenames: &[String]) -> Result<HashMap<EntityRole, String>> {
    let mut files = HashMap::new();

    for role in EntityRole::ALL {
        let found = filenames
            .iter()
            .find(|name| role.matches(name))
            .ok_or(ImportError::MissingRole { role })?;
        files.insert(role, found.clone());
    }

    Ok(files)
}

/// List the top-level regular `.jsonl` files under `root` and resolve every role.
pub async fn discover(root: &Path) -> Result<EntityFiles> {
    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(ImportError::io(root))?;

    let mut filenames = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(ImportError::io(root))? {
        let path = entry.path();
        if !entry.file_type().await.map_err(ImportError::io(&path))?.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            filenames.push(name.to_string());
        }
    }

    // Directory listing order is filesystem dependent
    filenames.sort();
    debug!(files = ?filenames, "bundle entity files");

    let files = classify(&filenames)?;
    Ok(EntityFiles {
        root: root.to_path_buf(),
        files,
    })
}
