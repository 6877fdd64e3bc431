//! Source model discovery

use crate::error::{ConvertError, Result};
use std::path::{Path, PathBuf};

/// The single source model found in a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInput {
    file_path: PathBuf,
}

impl StagedInput {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// File name only, safe to show to callers
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Find the one file with `extension` directly under `dir`.
///
/// Zero matches is [`ConvertError::InputNotFound`]; more than one is
/// [`ConvertError::AmbiguousInput`]. Subdirectories are not searched.
pub async fn locate_input(dir: &Path, extension: &str) -> Result<StagedInput> {
    let mut matches = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_match = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if is_match {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(ConvertError::InputNotFound {
            extension: extension.to_string(),
        }),
        1 => Ok(StagedInput {
            file_path: matches.remove(0),
        }),
        _ => {
            let mut candidates: Vec<String> = matches
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();
            candidates.sort();
            Err(ConvertError::AmbiguousInput {
                extension: extension.to_string(),
                candidates,
            })
        }
    }
}
