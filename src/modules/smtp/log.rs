// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::progress::{ProgressKind, ProgressLine};
use crate::raise_error;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only record of send outcomes, one line per recipient.
#[derive(Clone, Debug)]
pub struct SendLog {
    path: PathBuf,
}

impl SendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_entry(at: DateTime<Utc>, line: &ProgressLine) -> String {
        format!(
            "{} {}\n",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            line
        )
    }

    /// Appends an outcome line. Only success and failure lines are recorded.
    pub async fn append(&self, line: &ProgressLine) -> BulkMailerResult<()> {
        if !line.kind.is_outcome() {
            return Ok(());
        }
        let entry = Self::format_entry(Utc::now(), line);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                raise_error!(
                    format!("Failed to open send log {:?}: {}", self.path, e),
                    ErrorCode::InternalError
                )
            })?;
        file.write_all(entry.as_bytes()).await.map_err(|e| {
            raise_error!(
                format!("Failed to write send log {:?}: {}", self.path, e),
                ErrorCode::InternalError
            )
        })?;
        file.flush()
            .await
            .map_err(|e| raise_error!(e.to_string(), ErrorCode::InternalError))
    }

    pub async fn read(&self) -> BulkMailerResult<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(raise_error!(
                "No send log has been written yet".into(),
                ErrorCode::ResourceNotFound
            )),
            Err(e) => Err(raise_error!(
                format!("Failed to read send log {:?}: {}", self.path, e),
                ErrorCode::InternalError
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entry_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(
            SendLog::format_entry(at, &ProgressLine::success("a@b.com")),
            "2025-03-01T09:30:00.000Z [success] a@b.com\n"
        );
        assert_eq!(
            SendLog::format_entry(at, &ProgressLine::failure("a@b.com", "550 no such user")),
            "2025-03-01T09:30:00.000Z [failure] a@b.com: 550 no such user\n"
        );
    }

    #[tokio::test]
    async fn appends_outcomes_only() {
        let dir = tempfile::tempdir().unwrap();
        let log = SendLog::new(dir.path().join("send-log.txt"));
        log.append(&ProgressLine::success("a@b.com")).await.unwrap();
        log.append(&ProgressLine::notice("ignored")).await.unwrap();
        log.append(&ProgressLine::failure("c@d.com", "boom")).await.unwrap();

        let content = log.read().await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" [success] a@b.com"));
        assert!(lines[1].ends_with(" [failure] c@d.com: boom"));
    }

    #[tokio::test]
    async fn missing_log_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let log = SendLog::new(dir.path().join("absent.txt"));
        let err = log.read().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }
}
