use crate::apply::{copy_preserving_times, rename_in_place};
use crate::config::Config;
use crate::error::OrganizeError;
use crate::names::{is_valid_mark, mark_name};
use crate::scan::{ensure_directory, list_work_items, WorkItem};
use crate::thumbnail::{fit_to_box, ThumbnailCache, DEFAULT_CACHE_CAPACITY, THUMBNAIL_DIM};
use anyhow::{Context, Result};
use image::DynamicImage;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

pub const THUMBNAIL_STRIP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// コピー先もマークも無いので何もしない
    Unchanged,
    Renamed(PathBuf),
    Copied(PathBuf),
}

/// 写真を1枚ずつ確認し、マーク付けやコピーを行うセッション。
pub struct ReviewSession {
    destination: Option<PathBuf>,
    items: Vec<WorkItem>,
    current: Option<usize>,
    thumbnails: ThumbnailCache<DynamicImage>,
}

impl ReviewSession {
    pub fn open(source: &Path, destination: Option<&Path>, config: &Config) -> Result<Self> {
        ensure_directory(source)?;
        if let Some(dest) = destination {
            ensure_directory(dest)?;
        }
        info!("{} を読み込みます", source.display());
        let items = list_work_items(source, &config.still_extensions)?;
        Ok(Self::from_items(items, destination.map(Path::to_path_buf)))
    }

    pub fn from_items(items: Vec<WorkItem>, destination: Option<PathBuf>) -> Self {
        Self {
            destination,
            items,
            current: None,
            thumbnails: ThumbnailCache::new(DEFAULT_CACHE_CAPACITY),
        }
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&WorkItem> {
        self.current.and_then(|index| self.items.get(index))
    }

    /// 最初の呼び出しで先頭を選ぶ。末尾では止まる。
    pub fn advance(&mut self) -> Option<&WorkItem> {
        if self.items.is_empty() {
            return None;
        }
        self.current = Some(match self.current {
            None => 0,
            Some(index) => (index + 1).min(self.items.len() - 1),
        });
        self.current()
    }

    /// 未選択のときは何もしない。先頭では止まる。
    pub fn retreat(&mut self) -> Option<&WorkItem> {
        let index = self.current?;
        self.current = Some(index.saturating_sub(1));
        self.current()
    }

    /// コピー先が無ければ `<mark>_<name>` へのリネーム、あればコピー (移動はしない)。
    /// 処理後は次のファイルへ進む。
    pub fn mark(&mut self, mark: Option<char>) -> Result<MarkOutcome> {
        let index = self.current.context("表示中のファイルがありません")?;
        if let Some(mark) = mark {
            if !is_valid_mark(mark) {
                return Err(OrganizeError::malformed(&mark.to_string(), "a-z").into());
            }
        }

        let item = &mut self.items[index];
        let name = item.name();
        let new_name = match mark {
            Some(mark) => mark_name(mark, &name),
            None => name.clone(),
        };

        let outcome = match (&self.destination, mark) {
            (None, None) => return Ok(MarkOutcome::Unchanged),
            (None, Some(mark)) => {
                info!("{} を {} にリネームします", item.path.display(), new_name);
                let renamed = rename_in_place(&item.path, &new_name)?;
                item.path = renamed.clone();
                item.status = format!("Renamed as {mark}");
                MarkOutcome::Renamed(renamed)
            }
            (Some(dest), mark) => {
                info!("{} を {} にコピーします", item.path.display(), dest.display());
                let copied = copy_preserving_times(&item.path, dest, &new_name)?;
                item.status = match mark {
                    Some(mark) => format!("Copied as {mark}"),
                    None => "Copied".to_string(),
                };
                MarkOutcome::Copied(copied)
            }
        };

        self.advance();
        Ok(outcome)
    }

    /// カーソルを中心にしたサムネイル列の範囲。リストの端では寄せる。
    pub fn thumbnail_window(&self, strip_len: usize) -> Range<usize> {
        let Some(current) = self.current else {
            return 0..0;
        };
        let len = self.items.len();
        let half = strip_len.saturating_sub(1) / 2;
        let mut start = current.saturating_sub(half);
        if len - start < strip_len {
            start = len.saturating_sub(strip_len);
        }
        start..(start + strip_len).min(len)
    }

    pub fn thumbnail(&mut self, index: usize) -> Result<&DynamicImage> {
        let item = self
            .items
            .get(index)
            .with_context(|| format!("範囲外のインデックスです: {index}"))?;
        let path = item.path.clone();
        self.thumbnails
            .get_or_try_insert_with(&item.unmarked_name, || {
                info!("{} のサムネイルを作成します", path.display());
                fit_to_box(&path, THUMBNAIL_DIM)
            })
    }

    pub fn cached_thumbnails(&self) -> usize {
        self.thumbnails.len()
    }
}
