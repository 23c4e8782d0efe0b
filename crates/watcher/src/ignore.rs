//! Ignore rules for folder activity
//!
//! Two sources, checked in order:
//! 1. Built-in rules (hidden entries, editor temp files, OS metadata files)
//! 2. Per-folder gitignore-style patterns from the folder's `ignore` list

use anyhow::{Context, Result};
use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Component, Path, PathBuf};

/// Decides which paths under a watched folder count as activity.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    patterns: Option<Gitignore>,
}

impl IgnoreRules {
    /// Build rules for `root` from gitignore-style `patterns`.
    pub fn new(root: &Path, patterns: &[String]) -> Result<Self> {
        let patterns = if patterns.is_empty() {
            None
        } else {
            let mut builder = GitignoreBuilder::new(root);
            for pattern in patterns {
                builder
                    .add_line(None, pattern)
                    .with_context(|| format!("invalid ignore pattern '{}'", pattern))?;
            }
            Some(builder.build()?)
        };

        Ok(Self {
            root: root.to_path_buf(),
            patterns,
        })
    }

    /// Check whether `path` should be ignored.
    ///
    /// `path` may be absolute (under the root) or relative to the root.
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        if is_builtin_ignored(relative) {
            return true;
        }

        if relative.is_absolute() {
            // Outside the root; built-in rules are all that apply.
            return false;
        }

        match self.patterns {
            Some(ref gitignore) => gitignore
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore(),
            None => false,
        }
    }

    /// Number of user patterns in effect
    pub fn pattern_count(&self) -> usize {
        self.patterns.as_ref().map_or(0, |g| g.num_ignores() as usize)
    }
}

/// Hidden entries anywhere below the root, plus well-known temp files.
fn is_builtin_ignored(relative: &Path) -> bool {
    let hidden = relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    });
    if hidden {
        return true;
    }

    let filename = relative
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    is_editor_temp(filename)
}

fn is_editor_temp(filename: &str) -> bool {
    // Vim swap files
    if filename.ends_with(".swp") || filename.ends_with(".swo") || filename.ends_with(".swx") {
        return true;
    }

    // Backup files
    if filename.ends_with('~') {
        return true;
    }

    // Emacs auto-save
    if filename.len() > 1 && filename.starts_with('#') && filename.ends_with('#') {
        return true;
    }

    // Windows metadata
    filename == "Thumbs.db" || filename == "desktop.ini"
}
