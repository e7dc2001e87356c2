//! Locate files holding module declarations

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".terraform"];

/// All files named `file_name` under `root`, sorted
pub fn find_module_files(root: &Path, file_name: &str) -> Vec<PathBuf> {
    let wanted = OsStr::new(file_name);

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|entry| {
            entry
                .inspect_err(|e| warn!("Skipping unreadable entry: {}", e))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == wanted)
        .map(DirEntry::into_path)
        .collect();

    files.sort();
    debug!("Found {} {} file(s) under {}", files.len(), file_name, root.display());
    files
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}
