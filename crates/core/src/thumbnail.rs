use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use std::collections::{HashMap, VecDeque};
use std::path::Path;

pub const CANVAS_DIM: u32 = 800;
pub const THUMBNAIL_DIM: u32 = 100;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// 縦横比を保ったまま `max_dim` 四方に収まるよう拡大縮小する。
pub fn fit_to_box(path: &Path, max_dim: u32) -> Result<DynamicImage> {
    let image = image::open(path)
        .with_context(|| format!("画像を読み込めませんでした: {}", path.display()))?;
    Ok(image.resize(max_dim, max_dim, FilterType::Triangle))
}

/// 容量固定の LRU キャッシュ。キーは分類マークを除いたファイル名。
#[derive(Debug)]
pub struct ThumbnailCache<T> {
    capacity: usize,
    entries: HashMap<String, T>,
    order: VecDeque<String>,
}

impl<T> ThumbnailCache<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn insert(&mut self, key: String, value: T) {
        if self.entries.contains_key(&key) {
            self.touch(&key);
        } else {
            while self.entries.len() >= self.capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
            }
            self.order.push_back(key.clone());
        }
        self.entries.insert(key, value);
    }

    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: &str,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        if self.contains(key) {
            self.touch(key);
        } else {
            let value = load()?;
            self.insert(key.to_string(), value);
        }
        Ok(&self.entries[key])
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}
