//! Pipeline configuration
//!
//! Values come from built-in defaults, an optional config file and
//! `OBJZIP_*` environment variables, in that order of precedence.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file names searched for in the working directory
pub const CONFIG_FILE_NAMES: &[&str] = &["objzip.toml", "objzip.yaml", "objzip.json"];

/// Environment variable that points at an explicit config file
pub const CONFIG_PATH_ENV: &str = "OBJZIP_CONFIG";

/// Prefix for environment overrides (`OBJZIP_CONVERTER_BINARY`, ...)
pub const ENV_PREFIX: &str = "OBJZIP";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory under which per-request workspaces are allocated
    pub work_root: PathBuf,
    /// Converter executable
    pub converter_binary: PathBuf,
    /// Driver script handed to the converter with `-P`
    pub driver_script: PathBuf,
    /// Extension of the source model file, without the dot
    pub input_extension: String,
    /// Subdirectory the driver script writes its results to
    pub output_dir_name: String,
    /// Used when the request carries no output format
    pub default_output_format: String,
    /// Accepted output formats; empty accepts any token
    pub allowed_formats: Vec<String>,
    pub fetch_timeout_secs: u64,
    pub convert_timeout_secs: u64,
    pub max_archive_bytes: u64,
    /// Cap on the total uncompressed size of an archive's entries
    pub max_extracted_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from("/tmp/objzip"),
            converter_binary: PathBuf::from("/usr/bin/blender-2.83.4-linux64/blender"),
            driver_script: PathBuf::from("scripts/objmat.py"),
            input_extension: "obj".to_string(),
            output_dir_name: "converted".to_string(),
            default_output_format: "obj".to_string(),
            allowed_formats: Vec::new(),
            fetch_timeout_secs: 60,
            convert_timeout_secs: 600,
            max_archive_bytes: 512 * 1024 * 1024,
            max_extracted_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

impl PipelineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn convert_timeout(&self) -> Duration {
        Duration::from_secs(self.convert_timeout_secs)
    }

    /// Load the pipeline section from the layered sources
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        load_settings(file)?.try_deserialize()
    }
}

/// Anchor a relative path at the current directory.
///
/// The converter runs with the workspace as its working directory, so every
/// path handed to it (or used to build its arguments) must be absolute.
pub fn absolute_path(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|dir| dir.join(&path))
        .unwrap_or(path)
}

/// Find a configuration file in a directory
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Build the layered settings (file, then environment).
///
/// `file` wins over `OBJZIP_CONFIG`, which wins over the search in the
/// current directory. The raw [`config::Config`] is returned so callers can
/// deserialize their own sections from the same flat key space.
pub fn load_settings(file: Option<&Path>) -> Result<config::Config, config::ConfigError> {
    let explicit = file
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

    let mut builder = config::Config::builder();
    match explicit {
        Some(path) => {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(path) = std::env::current_dir()
                .ok()
                .and_then(|dir| find_config_file(&dir))
            {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("allowed_formats"),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_deployment_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.work_root, PathBuf::from("/tmp/objzip"));
        assert_eq!(config.output_dir_name, "converted");
        assert_eq!(config.input_extension, "obj");
        assert!(config.allowed_formats.is_empty());
        assert_eq!(config.convert_timeout(), Duration::from_secs(600));
        assert!(config.max_extracted_bytes > config.max_archive_bytes);
    }

    #[test]
    fn test_bundled_driver_script_matches_defaults() {
        let defaults = PipelineConfig::default();
        let script = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .join(&defaults.driver_script);
        let source = std::fs::read_to_string(&script).unwrap();

        assert!(source.contains(&format!("OUTPUT_DIR = \"{}\"", defaults.output_dir_name)));
        assert!(source.contains(&format!(
            "DEFAULT_FORMAT = \"{}\"",
            defaults.default_output_format
        )));
        assert!(source.contains(r#"FORMATS = ("obj", "gltf")"#));
    }

    #[test]
    fn test_absolute_path_keeps_absolute_input() {
        assert_eq!(absolute_path("/srv/objzip"), PathBuf::from("/srv/objzip"));
        assert_eq!(
            absolute_path("scripts/objmat.py"),
            std::env::current_dir().unwrap().join("scripts/objmat.py")
        );
    }

    #[test]
    fn test_load_from_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("objzip.toml");
        std::fs::write(
            &path,
            r#"
converter_binary = "/opt/blender/blender"
allowed_formats = ["gltf", "obj"]
convert_timeout_secs = 30
"#,
        )
        .unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.converter_binary, PathBuf::from("/opt/blender/blender"));
        assert_eq!(config.allowed_formats, vec!["gltf", "obj"]);
        assert_eq!(config.convert_timeout_secs, 30);
        assert_eq!(config.fetch_timeout_secs, 60);
        assert_eq!(config.driver_script, PathBuf::from("scripts/objmat.py"));
    }

    #[test]
    fn test_find_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(find_config_file(dir.path()).is_none());

        std::fs::write(dir.path().join("objzip.yaml"), "work_root: /srv/objzip\n").unwrap();
        assert_eq!(
            find_config_file(dir.path()),
            Some(dir.path().join("objzip.yaml"))
        );
    }
}
