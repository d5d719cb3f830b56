//! Capability-based filesystem helpers shared by the hidden gems crates.
//!
//! Every helper resolves an ambient directory handle with `cap-std` and then
//! operates relative to it, so callers never touch `std::fs` directly. Paths
//! are UTF-8 throughout via `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Open the directory containing `path` and return it with the bare file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("path `{path}` has no file name")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Create every missing directory above `path`.
///
/// Bare file names and paths directly under the filesystem root need no work.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    ensure_dir(parent)
}

/// Create `dir` and all of its ancestors when they do not already exist.
///
/// `cap-std` only creates paths beneath an open directory, so the root,
/// drive prefix and leading `..` steps become the anchor that is opened and
/// the rest is created beneath it.
pub fn ensure_dir(dir: &Utf8Path) -> io::Result<()> {
    let mut anchor = Utf8PathBuf::from(".");
    let mut relative = Utf8PathBuf::new();
    for component in dir.components() {
        match component {
            Utf8Component::Prefix(prefix) => anchor = Utf8PathBuf::from(prefix.as_str()),
            Utf8Component::RootDir => anchor.push(component.as_str()),
            Utf8Component::ParentDir if relative.as_str().is_empty() => anchor.push(".."),
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir | Utf8Component::Normal(_) => {
                relative.push(component.as_str());
            }
        }
    }
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(&anchor, ambient_authority())?.create_dir_all(&relative)
}

/// Report whether `path` names an existing regular file.
///
/// A missing parent directory or file yields `Ok(false)`.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_dir_and_file(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Read a whole UTF-8 text file.
pub fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.read_to_string(name.as_str())
}

/// Time elapsed since `path` was last modified.
///
/// Modification times in the future count as zero age.
pub fn file_age(path: &Utf8Path) -> io::Result<Duration> {
    let (dir, name) = open_dir_and_file(path)?;
    let modified = dir.metadata(name.as_str())?.modified()?.into_std();
    Ok(SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO))
}

/// Replace the contents of `path` without exposing a partially written file.
///
/// The bytes land in a hidden sibling first and are then renamed over the
/// target, so readers observe either the old contents or the new ones.
/// Missing parent directories are created.
pub fn write_atomic(path: &Utf8Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{name}.{}.{sequence}.tmp", std::process::id());
    if let Err(err) = dir.write(temp_name.as_str(), contents) {
        let _cleanup = dir.remove_file(temp_name.as_str());
        return Err(err);
    }
    if let Err(err) = dir.rename(temp_name.as_str(), &dir, name.as_str()) {
        let _cleanup = dir.remove_file(temp_name.as_str());
        return Err(err);
    }
    Ok(())
}
