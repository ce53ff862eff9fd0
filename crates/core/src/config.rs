use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_STILL_EXTENSIONS: &[&str] = &[".jpg", ".heic"];
pub const DEFAULT_MOVIE_EXTENSIONS: &[&str] = &[".mp4"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub still_extensions: Vec<String>,
    pub movie_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            still_extensions: to_owned_list(DEFAULT_STILL_EXTENSIONS),
            movie_extensions: to_owned_list(DEFAULT_MOVIE_EXTENSIONS),
        }
    }
}

impl Config {
    /// 静止画と動画の拡張子を合わせた一覧 (列挙対象)。
    pub fn all_extensions(&self) -> Vec<String> {
        self.still_extensions
            .iter()
            .chain(self.movie_extensions.iter())
            .cloned()
            .collect()
    }

    pub fn is_still(&self, name: &str) -> bool {
        has_extension(name, &self.still_extensions)
    }

    pub fn is_movie(&self, name: &str) -> bool {
        has_extension(name, &self.movie_extensions)
    }

    fn normalized(mut self) -> Self {
        self.still_extensions = normalize_extensions(&self.still_extensions);
        self.movie_extensions = normalize_extensions(&self.movie_extensions);
        self
    }
}

/// 読み取り専用。設定ファイルへの書き戻しは行わない。
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;
    let config = toml::from_str::<Config>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config.normalized())
}

pub fn has_extension(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&ext.to_ascii_lowercase()))
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            }
        })
        .collect()
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
