//! Bundle archives: enumerable collections of compiled-unit entries.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::scanner::ScanError;

/// Entry suffix marking a compiled unit inside a bundle.
pub const UNIT_SUFFIX: &str = ".unit";

/// A packaged bundle whose entries are addressable by path-like names.
///
/// Entries come back in archive order; callers must not assume any ordering
/// beyond what the archive itself guarantees.
pub trait BundleArchive {
    /// Enumerates entry names.
    ///
    /// Failure to open or walk the archive itself is a top-level
    /// [`ScanError::Aborted`]; it is never conflated with an archive that
    /// merely contains zero valid entries.
    fn entries(&self) -> Result<Vec<String>, ScanError>;
}

/// Bundle backed by a directory tree. Entry names are `/`-separated paths
/// relative to the root, sorted lexicographically so archive order is stable
/// across filesystems.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BundleArchive for DirArchive {
    fn entries(&self) -> Result<Vec<String>, ScanError> {
        let aborted = |source: std::io::Error| ScanError::Aborted {
            path: self.root.clone(),
            source,
        };

        if !self.root.is_dir() {
            return Err(aborted(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "bundle root is not a directory",
            )));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop in bundle"));
                aborted(source)
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or_else(|_| entry.path());
            entries.push(relative.to_string_lossy().replace('\\', "/"));
        }

        Ok(entries)
    }
}

/// Bundle held in memory, preserving insertion order. Used for manifests
/// generated at build time and by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: Vec<String>,
}

impl MemoryArchive {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }
}

impl BundleArchive for MemoryArchive {
    fn entries(&self) -> Result<Vec<String>, ScanError> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dir_archive_lists_files_relative_to_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("armory/mechanics")).unwrap();
        fs::write(temp.path().join("armory/mechanics/Explosion.unit"), b"").unwrap();
        fs::write(temp.path().join("bundle.toml"), b"").unwrap();

        let entries = DirArchive::new(temp.path()).entries().unwrap();

        assert_eq!(
            entries,
            vec![
                "armory/mechanics/Explosion.unit".to_string(),
                "bundle.toml".to_string(),
            ]
        );
    }

    #[test]
    fn dir_archive_order_is_deterministic() {
        let temp = TempDir::new().unwrap();
        for name in ["c.unit", "a.unit", "b.unit"] {
            fs::write(temp.path().join(name), b"").unwrap();
        }

        let entries = DirArchive::new(temp.path()).entries().unwrap();
        assert_eq!(entries, vec!["a.unit", "b.unit", "c.unit"]);
    }

    #[test]
    fn missing_root_aborts() {
        let temp = TempDir::new().unwrap();
        let archive = DirArchive::new(temp.path().join("nope"));

        assert!(matches!(
            archive.entries(),
            Err(ScanError::Aborted { .. })
        ));
    }

    #[test]
    fn memory_archive_preserves_insertion_order() {
        let archive = MemoryArchive::new(["b.unit", "a.unit"]);
        assert_eq!(archive.entries().unwrap(), vec!["b.unit", "a.unit"]);
    }
}
