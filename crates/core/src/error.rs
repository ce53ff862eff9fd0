use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("フォルダが存在しません: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("形式が不正です ({expected} を期待): {input}")]
    MalformedInput {
        input: String,
        expected: &'static str,
    },
    #[error("撮影日時のメタデータがありません: {}", .0.display())]
    MetadataAbsent(PathBuf),
    #[error("{operation}に失敗しました: {}: {source}", .path.display())]
    FilesystemOperationFailed {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrganizeError {
    pub(crate) fn malformed(input: &str, expected: &'static str) -> Self {
        Self::MalformedInput {
            input: input.to_string(),
            expected,
        }
    }

    pub(crate) fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::FilesystemOperationFailed {
            operation,
            path: path.into(),
            source,
        }
    }
}
