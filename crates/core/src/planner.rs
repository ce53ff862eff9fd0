use crate::config::Config;
use crate::datetime::{
    ensure_token_year, format_token, from_change_time, parse_exif_datetime, parse_token,
};
use crate::error::OrganizeError;
use crate::metadata::{CaptureProbe, CaptureSource, CapturedAt};
use crate::names::{classify, derived_name, Tier};
use crate::report::FailureKind;
use crate::scan::WorkItem;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenameAction {
    AlreadyCanonical { token: String },
    StripPrefix { new_name: String },
    Derive { new_name: String, captured: CapturedAt },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl From<OrganizeError> for ItemFailure {
    fn from(err: OrganizeError) -> Self {
        let kind = match &err {
            OrganizeError::MalformedInput { .. } => FailureKind::MalformedInput,
            OrganizeError::MetadataAbsent(_) => FailureKind::NoCaptureDate,
            OrganizeError::NotADirectory(_) | OrganizeError::FilesystemOperationFailed { .. } => {
                FailureKind::FilesystemOperationFailed
            }
        };
        Self {
            kind,
            reason: err.to_string(),
        }
    }
}

/// 1ファイル分のリネーム判断。ファイルシステムは変更しない。
pub fn plan_rename(
    item: &WorkItem,
    config: &Config,
    probe: &dyn CaptureProbe,
) -> Result<RenameAction, ItemFailure> {
    let name = item.name();
    match classify(&item.unmarked_name, &name) {
        Tier::Canonical { token } => Ok(RenameAction::AlreadyCanonical { token }),
        Tier::ImgPrefixed { new_name } => Ok(RenameAction::StripPrefix { new_name }),
        Tier::NeedsDerivation => {
            let captured = derive_capture(&item.path, &name, config, probe)?;
            Ok(RenameAction::Derive {
                new_name: derived_name(&format_token(&captured.date), &name),
                captured,
            })
        }
    }
}

/// 動画は変更時刻、静止画は埋め込みメタデータのみを見る。
pub fn derive_capture(
    path: &Path,
    name: &str,
    config: &Config,
    probe: &dyn CaptureProbe,
) -> Result<CapturedAt, ItemFailure> {
    if config.is_movie(name) {
        let seconds = probe.change_time(path).map_err(|err| ItemFailure {
            kind: FailureKind::NoCaptureDate,
            reason: format!("{err:#}"),
        })?;
        return Ok(CapturedAt {
            source: CaptureSource::ChangeTime,
            date: ensure_token_year(from_change_time(seconds)?)?,
        });
    }

    if config.is_still(name) {
        let raw = probe
            .embedded_capture(path)
            .map_err(|err| ItemFailure {
                kind: FailureKind::NoCaptureDate,
                reason: format!("{err:#}"),
            })?
            .ok_or_else(|| OrganizeError::MetadataAbsent(path.to_path_buf()))?;
        return Ok(CapturedAt {
            source: CaptureSource::EmbeddedMetadata,
            date: ensure_token_year(parse_exif_datetime(&raw)?)?,
        });
    }

    Err(OrganizeError::MetadataAbsent(path.to_path_buf()).into())
}

pub fn timestamp_from_token(token: &str) -> Result<CapturedAt, ItemFailure> {
    Ok(CapturedAt {
        source: CaptureSource::FileName,
        date: parse_token(token)?,
    })
}
