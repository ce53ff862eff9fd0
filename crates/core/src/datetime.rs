use crate::error::OrganizeError;
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone};
use std::fs;
use std::path::Path;

pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
pub const TOKEN_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const TOKEN_LEN: usize = 15;

/// `DateTimeOriginal` の値 (`YYYY:MM:DD HH:MM:SS`) をローカル時刻として解釈する。
pub fn parse_exif_datetime(raw: &str) -> Result<DateTime<Local>, OrganizeError> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let naive = NaiveDateTime::parse_from_str(trimmed, EXIF_DATE_FORMAT)
        .map_err(|_| OrganizeError::malformed(raw, "YYYY:MM:DD HH:MM:SS"))?;
    to_local(naive, raw, "YYYY:MM:DD HH:MM:SS")
}

/// ファイル名先頭の `YYYYMMDD_HHMMSS` をローカル時刻として解釈する。
pub fn parse_token(token: &str) -> Result<DateTime<Local>, OrganizeError> {
    if !is_token_shape(token) {
        return Err(OrganizeError::malformed(token, "YYYYMMDD_HHMMSS"));
    }
    let naive = NaiveDateTime::parse_from_str(token, TOKEN_DATE_FORMAT)
        .map_err(|_| OrganizeError::malformed(token, "YYYYMMDD_HHMMSS"))?;
    to_local(naive, token, "YYYYMMDD_HHMMSS")
}

pub fn format_token(date: &DateTime<Local>) -> String {
    date.format(TOKEN_DATE_FORMAT).to_string()
}

/// 年が4桁 (1000..=9999) でない日時はファイル名トークンにできない。
pub fn ensure_token_year(date: DateTime<Local>) -> Result<DateTime<Local>, OrganizeError> {
    if (1000..=9999).contains(&date.year()) {
        Ok(date)
    } else {
        Err(OrganizeError::malformed(
            &date.format("%Y-%m-%d %H:%M:%S").to_string(),
            "1000..=9999 年",
        ))
    }
}

pub fn from_change_time(seconds: i64) -> Result<DateTime<Local>, OrganizeError> {
    Local
        .timestamp_opt(seconds, 0)
        .earliest()
        .ok_or_else(|| OrganizeError::malformed(&seconds.to_string(), "UNIX epoch seconds"))
}

/// ステータス変更時刻 (Unix の `st_ctime`) を秒で返す。
#[cfg(unix)]
pub fn read_change_time(path: &Path) -> Result<i64> {
    use std::os::unix::fs::MetadataExt;

    let meta = fs::metadata(path)
        .with_context(|| format!("ファイル情報を取得できませんでした: {}", path.display()))?;
    Ok(meta.ctime())
}

#[cfg(not(unix))]
pub fn read_change_time(path: &Path) -> Result<i64> {
    use std::time::UNIX_EPOCH;

    let meta = fs::metadata(path)
        .with_context(|| format!("ファイル情報を取得できませんでした: {}", path.display()))?;
    let time = meta
        .created()
        .or_else(|_| meta.modified())
        .with_context(|| format!("ファイル時刻を取得できませんでした: {}", path.display()))?;
    let seconds = match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    };
    Ok(seconds)
}

fn is_token_shape(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == TOKEN_LEN
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 8 { *b == b'_' } else { b.is_ascii_digit() })
}

fn to_local(
    naive: NaiveDateTime,
    input: &str,
    expected: &'static str,
) -> Result<DateTime<Local>, OrganizeError> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| OrganizeError::malformed(input, expected))
}
