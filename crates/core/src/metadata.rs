use crate::datetime::read_change_time;
use crate::exif_reader::read_embedded_capture;
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CaptureSource {
    EmbeddedMetadata,
    ChangeTime,
    FileName,
}

/// 1つのソースから得た撮影日時。ソース間での合成はしない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapturedAt {
    pub source: CaptureSource,
    pub date: DateTime<Local>,
}

/// ファイルから日時の元データを取り出す窓口。
pub trait CaptureProbe {
    /// `Ok(None)` はメタデータ欠落 (次のソースへ)。
    fn embedded_capture(&self, path: &Path) -> Result<Option<String>>;

    fn change_time(&self, path: &Path) -> Result<i64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl CaptureProbe for FsProbe {
    fn embedded_capture(&self, path: &Path) -> Result<Option<String>> {
        read_embedded_capture(path)
    }

    fn change_time(&self, path: &Path) -> Result<i64> {
        read_change_time(path)
    }
}
