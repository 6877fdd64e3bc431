//! Output packaging

use crate::error::{ConvertError, Result};
use std::io::{Cursor, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

/// Zip everything under `dir`, recursively, with paths relative to `dir`.
///
/// Returns `None` when `dir` does not exist or holds no regular files.
pub fn collect_output(dir: &Path) -> Result<Option<Vec<u8>>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut files = 0usize;

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
        let rel_path = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| ConvertError::Io(std::io::Error::other(e)))?;
        let name = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options).map_err(zip_failure)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, options).map_err(zip_failure)?;
            writer.write_all(&std::fs::read(entry.path())?)?;
            files += 1;
        }
    }

    if files == 0 {
        return Ok(None);
    }

    let cursor = writer.finish().map_err(zip_failure)?;
    Ok(Some(cursor.into_inner()))
}

fn zip_failure(e: zip::result::ZipError) -> ConvertError {
    ConvertError::Io(std::io::Error::other(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_missing_directory_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(collect_output(&dir.path().join("converted")).unwrap().is_none());
    }

    #[test]
    fn test_directory_without_files_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("converted/empty")).unwrap();
        assert!(collect_output(&dir.path().join("converted")).unwrap().is_none());
    }

    #[test]
    fn test_zips_recursively_with_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("converted");
        std::fs::create_dir_all(out.join("textures")).unwrap();
        std::fs::write(out.join("Gold_converted.gltf"), b"{}").unwrap();
        std::fs::write(out.join("Gold_converted.bin"), b"\x00\x01").unwrap();
        std::fs::write(out.join("textures/albedo.jpg"), b"jpeg").unwrap();
        // Siblings of the output directory are not included
        std::fs::write(dir.path().join("Gold.obj"), b"v 0 0 0").unwrap();

        let bytes = collect_output(&out).unwrap().unwrap();
        assert_eq!(
            entry_names(&bytes),
            vec![
                "Gold_converted.bin",
                "Gold_converted.gltf",
                "textures/",
                "textures/albedo.jpg",
            ]
        );

        let mut archive = zip::ZipArchive::new(Cursor::new(&bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name("textures/albedo.jpg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "jpeg");
    }
}
