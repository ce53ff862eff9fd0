use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    NoCaptureDate,
    MalformedInput,
    FilesystemOperationFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Failure {
    pub name: String,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub renamed: usize,
    pub timestamps_fixed: usize,
    pub skipped: usize,
    pub dry_run: bool,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    pub fn new(total: usize, dry_run: bool) -> Self {
        Self {
            total,
            dry_run,
            ..Self::default()
        }
    }

    pub fn record_failure(&mut self, name: &str, kind: FailureKind, reason: impl Into<String>) {
        self.failures.push(Failure {
            name: name.to_string(),
            kind,
            reason: reason.into(),
        });
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// 失敗が無ければ `None`。
    pub fn summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(format!(
            "{} errors - {:?}",
            self.failures.len(),
            self.failed_names()
        ))
    }

    pub fn emit(&self) {
        if let Some(summary) = self.summary() {
            error!("{summary}");
        }
    }
}
