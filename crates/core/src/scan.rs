use crate::config::has_extension;
use crate::error::OrganizeError;
use crate::names::strip_marker;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
    /// 分類マーク (`a_` など) を除いた名前。並び順と分類に使う。
    pub unmarked_name: String,
    pub status: String,
}

impl WorkItem {
    pub fn new(path: PathBuf) -> Self {
        let unmarked_name = strip_marker(&file_name_of(&path)).to_string();
        Self {
            path,
            unmarked_name,
            status: String::new(),
        }
    }

    pub fn name(&self) -> String {
        file_name_of(&self.path)
    }
}

pub fn ensure_directory(dir: &Path) -> Result<(), OrganizeError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(OrganizeError::NotADirectory(dir.to_path_buf()))
    }
}

pub fn list_work_items(dir: &Path, extensions: &[String]) -> Result<Vec<WorkItem>> {
    ensure_directory(dir)?;

    let mut items = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("フォルダを読めませんでした: {}", dir.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || !has_extension(&name, extensions) {
            continue;
        }
        items.push(WorkItem::new(entry.into_path()));
    }

    items.sort_by(|a, b| {
        a.unmarked_name
            .cmp(&b.unmarked_name)
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(items)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default()
}
