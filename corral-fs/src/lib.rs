//! Capability-based file access for record batches and entity exports.
//!
//! Paths arrive as UTF-8 from the command line. Each helper anchors the path
//! at an ambient directory handle (`/`, a Windows drive root, or `.`) and does
//! the rest of the work relative to that handle through `cap-std`.
#![forbid(unsafe_code)]

use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open an existing file for reading.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be opened.
pub fn open_for_read(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create or truncate a file for writing, creating missing parent
/// directories first.
///
/// # Errors
///
/// Returns the underlying I/O error when a directory or the file cannot be
/// created, or when `path` names no file.
pub fn create_for_write(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, name) = parent_handle(path)?;
    dir.create(name)
}

/// Create the parent directory of `path` and any missing ancestors.
///
/// # Errors
///
/// Returns the underlying I/O error when a directory cannot be created.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    let (anchor, rest) = anchored(parent)?;
    if rest.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(rest)
}

/// Whether `path` names an existing regular file.
///
/// Missing files and directories yield `Ok(false)`.
///
/// # Errors
///
/// Returns the underlying I/O error for anything other than a missing entry.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match parent_handle(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn parent_handle(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let (anchor, rest) = anchored(parent)?;
    if rest.as_str().is_empty() {
        return Ok((anchor, name));
    }
    Ok((anchor.open_dir(rest)?, name))
}

/// Split `path` into an ambient anchor directory and the remainder relative
/// to it.
fn anchored(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let mut anchor = Utf8PathBuf::new();
    let mut rest = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir if rest.as_str().is_empty() => {
                anchor.push(component.as_str());
            }
            other => rest.push(other.as_str()),
        }
    }
    if anchor.as_str().is_empty() {
        anchor.push(".");
    }
    let dir = fs_utf8::Dir::open_ambient_dir(&anchor, ambient_authority())?;
    Ok((dir, rest))
}
