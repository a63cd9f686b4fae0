//! Local file trees: aggregation for publishing and materialisation of
//! fetched wrappers
//!
//! Aggregation walks with walkdir, following symbolic links the way a plain
//! `stat` would while skipping link loops.

use crate::error::{IoError, Result, ValidationError};
use crate::types::FileEntry;
use log::{debug, warn};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Counts from materialising one wrapper tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Files written to disk
    pub written: usize,
    /// Entries with no content (directory markers, empty files), not written
    pub skipped_empty: usize,
}

/// Collect every regular file below `root` as a [`FileEntry`]
///
/// Paths are relative to `root` with `/` separators, in file-name order.
/// Directories are traversed, never emitted.
pub fn aggregate(root: &Path) -> Result<Vec<FileEntry>> {
    ensure_directory(root)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                warn!(
                    "Skipping symbolic link loop at {}",
                    e.path().map(|p| p.display().to_string()).unwrap_or_default()
                );
                continue;
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf);
                let io_error = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                let error = IoError::from_std(io_error);
                return Err(match path {
                    Some(path) => error.with_path(&path),
                    None => error,
                }
                .into());
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let content = std::fs::read(entry.path())
            .map_err(|e| IoError::from_std(e).with_path(entry.path()))?;
        files.push(FileEntry::new(relative_path(root, entry.path())?, content));
    }

    debug!("Aggregated {} files below {}", files.len(), root.display());
    Ok(files)
}

/// List the immediate subdirectories of `target` as `(name, path)` pairs
///
/// Each name is the identifier its wrapper is expected to publish as.
/// Plain files and hidden entries are skipped.
pub fn list_wrapper_dirs(target: &Path) -> Result<Vec<(String, PathBuf)>> {
    ensure_directory(target)?;

    let read_dir = std::fs::read_dir(target).map_err(|e| IoError::from_std(e).with_path(target))?;
    let mut dirs = Vec::new();

    for entry in read_dir {
        let entry = entry.map_err(|e| IoError::from_std(e).with_path(target))?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping non UTF-8 entry {}", path.display());
            continue;
        };

        if name.starts_with('.') {
            debug!("Skipping hidden entry {name}");
            continue;
        }
        if !path.is_dir() {
            warn!("Skipping {name}: not a directory");
            continue;
        }
        dirs.push((name, path));
    }

    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Write a fetched tree to `output_root/<cid>/`
///
/// Parent directories are created for every entry. Entries without content
/// are not written.
pub async fn write_tree(output_root: &Path, cid: &str, files: &[FileEntry]) -> Result<WriteSummary> {
    let wrapper_dir = output_root.join(safe_component(cid)?);
    create_dir_all(&wrapper_dir).await?;

    let mut summary = WriteSummary::default();
    for file in files {
        let destination = wrapper_dir.join(safe_relative_path(file.path())?);
        if let Some(parent) = destination.parent() {
            create_dir_all(parent).await?;
        }

        if file.is_empty() {
            summary.skipped_empty += 1;
            continue;
        }

        tokio::fs::write(&destination, file.content())
            .await
            .map_err(|e| IoError::from_std(e).with_path(&destination))?;
        summary.written += 1;
    }

    debug!(
        "Wrote {} files to {} ({} empty entries skipped)",
        summary.written,
        wrapper_dir.display(),
        summary.skipped_empty
    );
    Ok(summary)
}

/// Turn a store path into a relative local path, refusing anything that could
/// land outside the wrapper directory
pub fn safe_relative_path(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(ValidationError::unsafe_path(path, "path is empty").into());
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(ValidationError::unsafe_path(path, "path is not relative").into());
    }

    let mut relative = PathBuf::new();
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        relative.push(safe_component(segment).map_err(|_| {
            ValidationError::unsafe_path(path, "path escapes the wrapper directory")
        })?);
    }

    if relative.as_os_str().is_empty() {
        return Err(ValidationError::unsafe_path(path, "path has no components").into());
    }
    Ok(relative)
}

fn safe_component(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(ValidationError::unsafe_path(name, "not a single path component").into()),
    }
}

fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ValidationError::unsafe_path(&path.display().to_string(), "outside root"))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            ValidationError::unsafe_path(&path.display().to_string(), "path is not UTF-8")
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(IoError::file_not_found(path).into());
    }
    if !path.is_dir() {
        return Err(IoError::not_a_directory(path).into());
    }
    Ok(())
}

async fn create_dir_all(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| IoError::from_std(e).with_path(path).into())
}
