//! Archive gateway: accepts a directory, `.tgz`/`.tar.gz`, or `.zip` and
//! produces a filesystem root to parse from (§4.2).
//!
//! Mirrors the original's `_open_archive`/`_cleanup` pair, but leans on
//! `tempfile::TempDir`'s `Drop` impl instead of an explicit cleanup call so
//! the scratch directory is removed on every exit path, including panics
//! unwinding through the parser.

use crate::error::{OdbError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Holds the root directory to parse from, plus an optional `TempDir` guard
/// when that root was extracted from an archive. Dropping this drops the
/// guard, which recursively removes the scratch directory.
pub struct OpenedArchive {
    pub root: PathBuf,
    _guard: Option<TempDir>,
}

/// Open `path`, which may be a directory or a supported archive file, and
/// return a filesystem root ready for `find_odb_root`.
pub fn open(path: &Path) -> Result<OpenedArchive> {
    if path.is_dir() {
        return Ok(OpenedArchive {
            root: path.to_path_buf(),
            _guard: None,
        });
    }

    let lower = path
        .to_string_lossy()
        .to_ascii_lowercase();

    let dir = TempDir::new()?;

    if lower.ends_with(".tgz") || lower.ends_with(".tar.gz") {
        extract_tar_gz(path, dir.path())?;
    } else if lower.ends_with(".tar") {
        extract_tar(path, dir.path())?;
    } else if lower.ends_with(".zip") {
        extract_zip(path, dir.path())?;
    } else {
        return Err(OdbError::UnsupportedArchive(path.to_path_buf()));
    }

    Ok(OpenedArchive {
        root: dir.path().to_path_buf(),
        _guard: Some(dir),
    })
}

fn extract_tar_gz(path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    extract_tar_reader(decoder, dest)
}

fn extract_tar(path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(path)?;
    extract_tar_reader(file, dest)
}

fn extract_tar_reader<R: std::io::Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry.map_err(|e| OdbError::Archive(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| OdbError::Archive(e.to_string()))?
            .to_path_buf();

        if !is_safe_relative_path(&entry_path) {
            log::debug!("skipping unsafe tar entry path: {}", entry_path.display());
            continue;
        }

        entry
            .unpack_in(dest)
            .map_err(|e| OdbError::Archive(e.to_string()))?;
    }
    Ok(())
}

fn extract_zip(path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| OdbError::Archive(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| OdbError::Archive(e.to_string()))?;

        let entry_path = match entry.enclosed_name() {
            Some(p) => p,
            None => {
                log::debug!("skipping unsafe zip entry path: {}", entry.name());
                continue;
            }
        };

        let out_path = dest.join(entry_path);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out_file)?;
    }
    Ok(())
}

/// Reject absolute paths and any component that would escape the extraction
/// root (`..`), matching the original's `filter="data"` tarfile behaviour.
fn is_safe_relative_path(p: &Path) -> bool {
    use std::path::Component;
    if p.is_absolute() {
        return false;
    }
    !p.components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

/// Case-insensitive lookup of `name` among `dir`'s entries.
pub fn find_ci(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.exists() {
        return Some(direct);
    }
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
            return Some(entry.path());
        }
    }
    None
}

/// Search depth 0, 1, and 2 under `root` for a `matrix/matrix` file,
/// matching names case-insensitively. Returns the ODB++ root directory
/// (the directory that directly contains `matrix/`), not the file itself.
pub fn find_odb_root(root: &Path) -> Result<PathBuf> {
    let candidates = [root.to_path_buf()]
        .into_iter()
        .chain(subdirs(root))
        .flat_map(|d| std::iter::once(d.clone()).chain(subdirs(&d)));

    for candidate in candidates {
        if let Some(matrix_dir) = find_ci(&candidate, "matrix") {
            if find_ci(&matrix_dir, "matrix").is_some() {
                return Ok(candidate);
            }
        }
    }

    Err(OdbError::RootNotFound(root.to_path_buf()))
}

fn subdirs(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default()
}

/// Resolve the step to parse: `requested`, if given, case-insensitively; else
/// the first step in lexicographic order.
pub fn find_step(odb_root: &Path, requested: Option<&str>) -> Result<PathBuf> {
    let steps_dir =
        find_ci(odb_root, "steps").ok_or_else(|| OdbError::StepNotFound("steps".to_string()))?;

    if let Some(name) = requested {
        return find_ci(&steps_dir, name)
            .ok_or_else(|| OdbError::StepNotFound(name.to_string()));
    }

    let mut names: Vec<PathBuf> = std::fs::read_dir(&steps_dir)?
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.path())
        .collect();
    names.sort();

    names
        .into_iter()
        .next()
        .ok_or_else(|| OdbError::StepNotFound("<any>".to_string()))
}

/// List step directory names in lexicographic order (used by the `--list-steps` CLI mode).
pub fn list_steps(odb_root: &Path) -> Result<Vec<String>> {
    let steps_dir =
        find_ci(odb_root, "steps").ok_or_else(|| OdbError::StepNotFound("steps".to_string()))?;

    let mut names: Vec<String> = std::fs::read_dir(&steps_dir)?
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_sample_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("matrix")).unwrap();
        fs::write(dir.path().join("matrix/matrix"), "").unwrap();
        fs::create_dir_all(dir.path().join("steps/pcb")).unwrap();
        fs::create_dir_all(dir.path().join("steps/alt_step")).unwrap();
        dir
    }

    #[test]
    fn finds_root_at_depth_zero() {
        let dir = make_sample_root();
        let root = find_odb_root(dir.path()).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn finds_root_nested_one_level() {
        let outer = TempDir::new().unwrap();
        let inner = outer.path().join("archive_contents");
        fs::create_dir_all(inner.join("matrix")).unwrap();
        fs::write(inner.join("matrix/matrix"), "").unwrap();
        let root = find_odb_root(outer.path()).unwrap();
        assert_eq!(root, inner);
    }

    #[test]
    fn missing_matrix_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(find_odb_root(dir.path()).is_err());
    }

    #[test]
    fn default_step_is_first_lexicographically() {
        let dir = make_sample_root();
        let root = find_odb_root(dir.path()).unwrap();
        let step = find_step(&root, None).unwrap();
        assert_eq!(step.file_name().unwrap(), "alt_step");
    }

    #[test]
    fn named_step_is_found_case_insensitively() {
        let dir = make_sample_root();
        let root = find_odb_root(dir.path()).unwrap();
        let step = find_step(&root, Some("PCB")).unwrap();
        assert_eq!(step.file_name().unwrap(), "pcb");
    }

    #[test]
    fn unsafe_tar_path_rejected() {
        assert!(!is_safe_relative_path(Path::new("../escape")));
        assert!(!is_safe_relative_path(Path::new("/etc/passwd")));
        assert!(is_safe_relative_path(Path::new("matrix/matrix")));
    }

    #[test]
    fn list_steps_sorted() {
        let dir = make_sample_root();
        let root = find_odb_root(dir.path()).unwrap();
        assert_eq!(list_steps(&root).unwrap(), vec!["alt_step", "pcb"]);
    }
}
