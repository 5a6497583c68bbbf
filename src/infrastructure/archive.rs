//! Packaging the build output into a zip archive
//!
//! Archive names are `<prefix>-<environment>-<unix millis>.zip`. The file is
//! created with `create_new`, so an existing archive is never overwritten;
//! on a name clash the timestamp is bumped.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PackageError;

/// A packaged build on local disk
#[derive(Debug)]
pub struct ArchiveArtifact {
    path: PathBuf,
    files: usize,
}

impl ArchiveArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Number of files stored
    pub fn files(&self) -> usize {
        self.files
    }

    /// Delete the archive; failures are logged, never returned
    pub fn remove(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("🧹 Cleaned up deployment package {}", self.file_name());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(
                    "⚠️  Could not clean up {}: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }
}

pub fn archive_name(prefix: &str, environment: &str, millis: i64) -> String {
    format!("{}-{}-{}.zip", prefix, environment, millis)
}

/// Zip the contents of `build_dir` into a new archive inside `archive_dir`
///
/// Entry names are relative to `build_dir` with `/` separators, so the
/// build's `index.html` sits at the archive root.
pub fn package_directory(
    build_dir: &Path,
    archive_dir: &Path,
    prefix: &str,
    environment: &str,
) -> Result<ArchiveArtifact, PackageError> {
    let (path, file) = create_unique(archive_dir, prefix, environment)?;

    match write_zip(build_dir, &path, file) {
        Ok(files) => Ok(ArchiveArtifact { path, files }),
        Err(e) => {
            // Don't leave a half-written archive behind
            if let Err(remove_err) = fs::remove_file(&path) {
                warn!(
                    "⚠️  Could not remove partial archive {}: {}",
                    path.display(),
                    remove_err
                );
            }
            Err(e)
        }
    }
}

fn create_unique(dir: &Path, prefix: &str, environment: &str) -> io::Result<(PathBuf, File)> {
    let mut millis = chrono::Utc::now().timestamp_millis();
    loop {
        let path = dir.join(archive_name(prefix, environment, millis));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => millis += 1,
            Err(e) => return Err(e),
        }
    }
}

/// `archive_path` is skipped so an archive dir inside the build dir
/// never zips the archive into itself
fn write_zip(build_dir: &Path, archive_path: &Path, file: File) -> Result<usize, PackageError> {
    let mut zip = ZipWriter::new(file);
    let file_options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = FileOptions::default().unix_permissions(0o755);
    let archive_path = fs::canonicalize(archive_path)?;

    let mut files = 0;
    for entry in WalkDir::new(build_dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && fs::canonicalize(entry.path()).map_or(false, |p| p == archive_path)
        {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(build_dir) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, dir_options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, file_options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut zip)?;
            files += 1;
        }
    }

    zip.finish()?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_fixture(root: &Path) -> PathBuf {
        let dist = root.join("dist");
        fs::create_dir_all(dist.join("assets")).unwrap();
        fs::create_dir_all(dist.join("terms")).unwrap();
        fs::write(dist.join("index.html"), "<html></html>").unwrap();
        fs::write(dist.join("assets/index-abc123.js"), "console.log(1)").unwrap();
        fs::write(dist.join("terms/privacy.html"), "privacy").unwrap();
        dist
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(
            archive_name("aplii-landing", "dev", 1700000000000),
            "aplii-landing-dev-1700000000000.zip"
        );
    }

    #[test]
    fn test_package_directory_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let dist = build_fixture(tmp.path());

        let artifact = package_directory(&dist, tmp.path(), "aplii-landing", "dev").unwrap();
        assert_eq!(artifact.files(), 3);
        assert!(artifact.file_name().starts_with("aplii-landing-dev-"));
        assert!(artifact.file_name().ends_with(".zip"));

        let mut zip = zip::ZipArchive::new(File::open(artifact.path()).unwrap()).unwrap();
        let names: Vec<String> = zip.file_names().map(String::from).collect();
        assert!(names.contains(&"index.html".to_string()));
        assert!(names.contains(&"assets/index-abc123.js".to_string()));
        assert!(names.contains(&"terms/privacy.html".to_string()));

        let assets = zip.by_name("assets/").unwrap().unix_mode().unwrap();
        assert_eq!(assets & 0o777, 0o755);
        let index_mode = zip.by_name("index.html").unwrap().unix_mode().unwrap();
        assert_eq!(index_mode & 0o777, 0o644);

        let mut index = String::new();
        io::Read::read_to_string(&mut zip.by_name("index.html").unwrap(), &mut index).unwrap();
        assert_eq!(index, "<html></html>");
    }

    #[test]
    fn test_consecutive_archives_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let dist = build_fixture(tmp.path());

        let first = package_directory(&dist, tmp.path(), "site", "dev").unwrap();
        let second = package_directory(&dist, tmp.path(), "site", "dev").unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().exists());
        assert!(second.path().exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dist = build_fixture(tmp.path());

        let artifact = package_directory(&dist, tmp.path(), "site", "prod").unwrap();
        assert!(artifact.remove());
        assert!(!artifact.path().exists());
        assert!(artifact.remove());
    }

    #[test]
    fn test_missing_build_dir_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();

        let err = package_directory(&tmp.path().join("missing"), &out, "site", "dev").unwrap_err();
        assert!(matches!(err, PackageError::Walk(_)));
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_archive_dir_inside_build_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dist = build_fixture(tmp.path());

        let artifact = package_directory(&dist, &dist, "site", "dev").unwrap();
        assert_eq!(artifact.files(), 3);

        let zip = zip::ZipArchive::new(File::open(artifact.path()).unwrap()).unwrap();
        assert!(!zip.file_names().any(|n| n.ends_with(".zip")));
    }
}
