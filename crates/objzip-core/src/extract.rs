//! Archive extraction into a workspace

use crate::error::{ConvertError, Result};
use std::io::{Cursor, Read};
use std::path::Path;

/// Extract a ZIP archive into `dest`, keeping the archive's own layout.
///
/// Returns the number of files written. Entries that would land outside
/// `dest`, or a total uncompressed size above `max_bytes`, fail the whole
/// extraction.
pub fn extract_archive(bytes: &[u8], dest: &Path, max_bytes: u64) -> Result<usize> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut written = 0;
    let mut remaining = max_bytes;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let rel_path = file.enclosed_name().ok_or_else(|| {
            ConvertError::ExtractionFailed(format!("unsafe entry name '{}'", file.name()))
        })?;
        let dest_path = dest.join(rel_path);

        if file.is_dir() {
            std::fs::create_dir_all(&dest_path).map_err(io_failure)?;
            continue;
        }

        // Declared sizes can lie, so the copy below is capped as well
        if file.size() > remaining {
            return Err(too_large(max_bytes));
        }

        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_failure)?;
        }
        let mut out = std::fs::File::create(&dest_path).map_err(io_failure)?;
        let mut limited = (&mut file).take(remaining.saturating_add(1));
        let copied = std::io::copy(&mut limited, &mut out).map_err(io_failure)?;
        if copied > remaining {
            return Err(too_large(max_bytes));
        }
        remaining -= copied;
        written += 1;
    }

    Ok(written)
}

fn too_large(max_bytes: u64) -> ConvertError {
    ConvertError::ExtractionFailed(format!("archive expands beyond {} bytes", max_bytes))
}

fn io_failure(e: std::io::Error) -> ConvertError {
    ConvertError::ExtractionFailed(e.to_string())
}
