//! Common test fixtures for hrrr-overlay tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Cycle used throughout the end-to-end tests.
pub const TEST_DATE: &str = "20240615";
pub const TEST_HOUR: &str = "12";

/// Parameter table mapping a local CAPE-category code to the
/// Significant Tornado Parameter, which the built-in table lacks.
pub const STP_TABLE_YAML: &str = r#"
parameters:
  - discipline: 0
    category: 7
    number: 250
    short_name: STP
    long_name: Significant Tornado Parameter
"#;

/// Scratch cache and output directories removed on drop.
pub struct TempDirs {
    root: TempDir,
    cache: PathBuf,
    output: PathBuf,
}

impl TempDirs {
    /// Create a temporary root holding `cache/` and `images/`.
    ///
    /// Neither subdirectory is created, so bootstrap code can be tested.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        let cache = root.path().join("cache");
        let output = root.path().join("images");
        Self {
            root,
            cache,
            output,
        }
    }

    /// Like [`TempDirs::new`] with both subdirectories created.
    pub fn created() -> Self {
        let dirs = Self::new();
        fs::create_dir_all(&dirs.cache).expect("create cache dir");
        fs::create_dir_all(&dirs.output).expect("create output dir");
        dirs
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    /// Write [`STP_TABLE_YAML`] under the root and return its path.
    pub fn write_stp_table(&self) -> PathBuf {
        let path = self.root.path().join("parameters.yaml");
        fs::write(&path, STP_TABLE_YAML).expect("write table file");
        path
    }
}

impl Default for TempDirs {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted file names in `dir`; empty when it does not exist.
pub fn list_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dirs_layout() {
        let dirs = TempDirs::new();
        assert!(dirs.cache_dir().starts_with(dirs.root()));
        assert!(!dirs.cache_dir().exists());

        let dirs = TempDirs::created();
        assert!(dirs.cache_dir().is_dir());
        assert!(dirs.output_dir().is_dir());
    }

    #[test]
    fn test_list_file_names() {
        let dirs = TempDirs::created();
        fs::write(dirs.output_dir().join("b.png"), b"x").unwrap();
        fs::write(dirs.output_dir().join("a.png"), b"x").unwrap();
        assert_eq!(list_file_names(dirs.output_dir()), vec!["a.png", "b.png"]);
        assert!(list_file_names(&dirs.root().join("missing")).is_empty());
    }
}
