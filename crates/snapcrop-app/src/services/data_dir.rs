// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

/// Return the application data directory, creating it if needed.
///
/// On desktop this uses a conventional location. Mobile hosts keep their
/// photos themselves and only the config lands here.
pub fn data_dir() -> PathBuf {
    let dir = base_dir().join("snapcrop");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(path = %dir.display(), error = %e, "could not create data dir");
    }
    dir
}

/// Return the application cache directory, creating it if needed.
///
/// Holds transient files only (desktop captures); safe to wipe at any time.
pub fn cache_dir() -> PathBuf {
    let dir = cache_base_dir().join("snapcrop");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(path = %dir.display(), error = %e, "could not create cache dir");
    }
    dir
}

/// Return a subdirectory inside `root` (e.g. "captures"), creating it if needed.
pub fn data_subdir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(path = %dir.display(), error = %e, "could not create data subdir");
    }
    dir
}

fn base_dir() -> PathBuf {
    // XDG data dir, then HOME, then /tmp
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

fn cache_base_dir() -> PathBuf {
    // XDG cache dir, then HOME, then the system temp dir
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cache");
    }
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdir_is_created() {
        let root = tempfile::tempdir().unwrap();
        let captures = data_subdir(root.path(), "captures");
        assert!(captures.is_dir());
        assert_eq!(captures, root.path().join("captures"));
    }
}
