use crate::error::OrganizeError;
use chrono::{DateTime, Local};
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// 同じフォルダ内で `new_name` にリネームする。既存ファイルは上書きしない。
pub fn rename_in_place(path: &Path, new_name: &str) -> Result<PathBuf, OrganizeError> {
    let target = ensure_free_target(path, path.with_file_name(new_name))?;
    fs::rename(path, &target).map_err(|err| OrganizeError::filesystem("リネーム", path, err))?;
    Ok(target)
}

/// 書き込みをせずに、リネーム先が空いているかだけ確認する。
pub fn check_rename_target(path: &Path, new_name: &str) -> Result<PathBuf, OrganizeError> {
    ensure_free_target(path, path.with_file_name(new_name))
}

/// アクセス時刻と更新時刻を `date` に揃える。
///
/// OS によっては作成日時がこれより後だった場合に作成日時も引き下げられる。
pub fn set_file_times(path: &Path, date: &DateTime<Local>) -> Result<(), OrganizeError> {
    let time = SystemTime::from(*date);
    let file = open_for_times(path)
        .map_err(|err| OrganizeError::filesystem("タイムスタンプ設定", path, err))?;
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
        .map_err(|err| OrganizeError::filesystem("タイムスタンプ設定", path, err))
}

// 読めないが書けるファイルは書き込みモードで開き直す。内容は変更しない。
// 読み書きどちらもできないファイルは所有者でも失敗する。
fn open_for_times(path: &Path) -> io::Result<File> {
    let opened = OpenOptions::new()
        .read(!cfg!(windows))
        .write(cfg!(windows))
        .open(path);
    match opened {
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            OpenOptions::new().write(true).open(path)
        }
        other => other,
    }
}

/// `dest_dir/new_name` にコピーし、更新・アクセス時刻を元ファイルに合わせる。
pub fn copy_preserving_times(
    path: &Path,
    dest_dir: &Path,
    new_name: &str,
) -> Result<PathBuf, OrganizeError> {
    let target = ensure_free_target(path, dest_dir.join(new_name))?;
    fs::copy(path, &target).map_err(|err| OrganizeError::filesystem("コピー", path, err))?;

    let meta = fs::metadata(path).map_err(|err| OrganizeError::filesystem("コピー", path, err))?;
    let mut times = FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    OpenOptions::new()
        .write(true)
        .open(&target)
        .and_then(|file| file.set_times(times))
        .map_err(|err| OrganizeError::filesystem("タイムスタンプ設定", &target, err))?;
    Ok(target)
}

fn ensure_free_target(path: &Path, target: PathBuf) -> Result<PathBuf, OrganizeError> {
    if target != path && target.exists() {
        return Err(target_taken(target));
    }
    Ok(target)
}

pub(crate) fn target_taken(target: PathBuf) -> OrganizeError {
    OrganizeError::filesystem(
        "リネーム先の確認",
        target,
        io::Error::new(io::ErrorKind::AlreadyExists, "同名のファイルが既に存在します"),
    )
}
