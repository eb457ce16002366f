//! Overlay merge/revert over the shared install staging tree.
//!
//! The staging tree (`_install` under the busybox checkout) is reused by
//! every sandbox, so an overlay only borrows it: `apply` records exactly
//! what it changed, and `revert` undoes exactly that, restoring any staging
//! file the overlay displaced. Between the two calls the tree is in a
//! mutated state and no other build may touch it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;

/// Undo record for one applied overlay.
///
/// Dropping an unreverted handle reverts best-effort; call `revert` to
/// observe failures.
#[derive(Debug)]
pub struct MergeHandle {
    /// Files and symlinks copied into staging.
    copied: Vec<PathBuf>,
    /// Directories created in staging, parents before children.
    created_dirs: Vec<PathBuf>,
    /// Staging files moved aside on collision: (backup, original).
    displaced: Vec<(PathBuf, PathBuf)>,
    backup_dir: PathBuf,
    armed: bool,
}

/// Merge `overlay` into `staging`, overwriting collisions (overlay wins).
///
/// A missing overlay directory is not an error: the returned handle has
/// nothing to revert.
pub fn apply(overlay: &Path, staging: &Path) -> Result<MergeHandle> {
    let mut handle = MergeHandle {
        copied: Vec::new(),
        created_dirs: Vec::new(),
        displaced: Vec::new(),
        backup_dir: backup_dir_for(staging),
        armed: true,
    };

    if !overlay.is_dir() {
        return Ok(handle);
    }

    println!("  Merging overlay {} into staging...", overlay.display());

    if !staging.exists() {
        fs::create_dir_all(staging)?;
        handle.created_dirs.push(staging.to_path_buf());
    }

    for entry in WalkDir::new(overlay).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(overlay)
            .expect("walked entry is under the overlay root");
        let dest = staging.join(rel);

        if entry.file_type().is_dir() {
            if !dest.exists() {
                fs::create_dir_all(&dest)?;
                handle.created_dirs.push(dest);
            }
        } else {
            if dest.exists() || dest.is_symlink() {
                handle.displace(rel, &dest)?;
            }
            if entry.file_type().is_symlink() {
                let target = fs::read_link(entry.path())?;
                std::os::unix::fs::symlink(&target, &dest)?;
            } else {
                fs::copy(entry.path(), &dest)?;
            }
            handle.copied.push(dest);
        }
    }

    Ok(handle)
}

impl MergeHandle {
    /// True when `apply` found no overlay to merge.
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty() && self.created_dirs.is_empty() && self.displaced.is_empty()
    }

    /// Undo the merge: delete the copied paths, restore displaced staging
    /// files, drop directories the overlay introduced. Never a blind wipe
    /// of the staging tree.
    pub fn revert(mut self) -> Result<()> {
        self.armed = false;
        self.undo()
    }

    /// Move a collided staging file into the backup area.
    fn displace(&mut self, rel: &Path, dest: &Path) -> Result<()> {
        let backup = self.backup_dir.join(rel);
        if let Some(parent) = backup.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(dest, &backup)?;
        self.displaced.push((backup, dest.to_path_buf()));
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        for file in self.copied.drain(..) {
            match fs::remove_file(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        for (backup, original) in self.displaced.drain(..) {
            if let Some(parent) = original.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&backup, &original)?;
        }

        // Deepest first so children go before parents. A directory that
        // picked up non-overlay contents in the meantime stays.
        for dir in self.created_dirs.drain(..).rev() {
            let _ = fs::remove_dir(&dir);
        }

        if self.backup_dir.exists() {
            let _ = fs::remove_dir_all(&self.backup_dir);
        }

        Ok(())
    }
}

impl Drop for MergeHandle {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.undo() {
                eprintln!("  [WARN] overlay revert on drop failed: {}", e);
            }
        }
    }
}

fn backup_dir_for(staging: &Path) -> PathBuf {
    let name = staging
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "staging".to_string());
    staging
        .parent()
        .unwrap_or(staging)
        .join(format!(".{}.overlay-undo", name))
}
