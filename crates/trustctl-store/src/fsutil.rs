//! Filesystem primitives for backups: tree mirroring and atomic replace.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trustctl_core::{Result, TrustError};
use walkdir::WalkDir;

/// Mirror the tree at `src` into `dst`, which must not exist yet.
///
/// Regular files keep their permission bits, symlinks are recreated
/// verbatim (not followed), directories get their permissions applied
/// after their contents are written.
pub fn mirror_dir(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::metadata(src).map_err(|e| TrustError::io(src, e))?;
    if !meta.is_dir() {
        return Err(TrustError::io(
            src,
            io::Error::other("not a directory"),
        ));
    }

    let mut dirs: Vec<(PathBuf, fs::Permissions)> = Vec::new();

    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            TrustError::io(path, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| TrustError::io(entry.path(), io::Error::other(e)))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| TrustError::io(&target, e))?;
            let perms = entry
                .metadata()
                .map_err(|e| TrustError::io(entry.path(), e.into()))?
                .permissions();
            dirs.push((target, perms));
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path()).map_err(|e| TrustError::io(entry.path(), e))?;
            symlink(&link, &target)?;
        } else {
            // fs::copy carries the permission bits over.
            fs::copy(entry.path(), &target).map_err(|e| TrustError::io(&target, e))?;
        }
    }

    for (dir, perms) in dirs.into_iter().rev() {
        fs::set_permissions(&dir, perms).map_err(|e| TrustError::io(&dir, e))?;
    }

    debug!(src = %src.display(), dst = %dst.display(), "mirrored directory");
    Ok(())
}

/// Replace the directory `live` with a mirror of `replacement`.
///
/// The new tree is staged next to `live` and swapped in with renames, so
/// readers see either the old tree or the new one. If the swap fails the
/// old tree is put back.
pub fn replace_dir(live: &Path, replacement: &Path) -> Result<()> {
    let parent = parent_of(live);
    let staged = tempfile::Builder::new()
        .prefix(".trustctl-stage-")
        .tempdir_in(parent)
        .map_err(|e| TrustError::io(parent, e))?;
    let staged_tree = staged.path().join("tree");
    mirror_dir(replacement, &staged_tree)?;

    swap_dir(&staged_tree, live, parent)?;

    debug!(live = %live.display(), "replaced directory");
    Ok(())
}

/// Rename `staged` to `live`, parking an existing `live` in a temp
/// directory under `scratch` until the swap has gone through.
///
/// If the swap fails the old tree is put back. If that fails too, the old
/// tree is left in `scratch` and the error says where.
pub fn swap_dir(staged: &Path, live: &Path, scratch: &Path) -> Result<()> {
    swap_dir_with(staged, live, scratch, |from, to| fs::rename(from, to))
}

fn swap_dir_with<F>(staged: &Path, live: &Path, scratch: &Path, mut rename: F) -> Result<()>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    let retired = tempfile::Builder::new()
        .prefix(".trustctl-retired-")
        .tempdir_in(scratch)
        .map_err(|e| TrustError::io(scratch, e))?;
    let retired_tree = retired.path().join("tree");

    let had_live = fs::symlink_metadata(live).is_ok();
    if had_live {
        rename(live, &retired_tree).map_err(|e| TrustError::io(live, e))?;
    }
    let Err(swap) = rename(staged, live) else {
        return Ok(());
    };
    if !had_live {
        return Err(TrustError::io(live, swap));
    }

    match rename(&retired_tree, live) {
        Ok(()) => Err(TrustError::io(live, swap)),
        Err(rollback) => {
            let kept = retired.keep().join("tree");
            warn!(
                live = %live.display(),
                kept = %kept.display(),
                error = %rollback,
                "could not put the previous tree back"
            );
            Err(TrustError::io(
                live,
                io::Error::new(
                    swap.kind(),
                    format!(
                        "{swap}; putting the previous tree back also failed ({rollback}), it is kept at {}",
                        kept.display()
                    ),
                ),
            ))
        }
    }
}

/// Write `contents` to `path` through a temp file in the same directory.
///
/// An existing file's permissions are preserved; a symlink at `path` is
/// replaced by a regular file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = parent_of(path);
    let perms = fs::metadata(path).ok().map(|m| m.permissions());

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| TrustError::io(parent, e))?;
    tmp.write_all(contents).map_err(|e| TrustError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| TrustError::io(tmp.path(), e))?;
    if let Some(perms) = perms {
        fs::set_permissions(tmp.path(), perms).map_err(|e| TrustError::io(tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| TrustError::io(path, e.error))?;
    Ok(())
}

/// Copy `src` over `dst` atomically.
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    let contents = fs::read(src).map_err(|e| TrustError::io(src, e))?;
    write_atomic(dst, &contents)
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(original, link).map_err(|e| TrustError::io(link, e))
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(original, link).map_err(|e| TrustError::io(link, e))
}
