use std::path::{Path, PathBuf};

/// 需要保留输出的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggedStep {
    CreateBucket,
    Website,
    Policy,
}

impl LoggedStep {
    /// 日志文件名
    pub fn file_name(self) -> &'static str {
        match self {
            LoggedStep::CreateBucket => "s3-create-bucket.log",
            LoggedStep::Website => "s3-website.log",
            LoggedStep::Policy => "s3-policy.log",
        }
    }
}

/// 步骤日志，每次运行覆盖写入，不会自动清理。
#[derive(Debug, Clone)]
pub struct ArtifactLog {
    dir: PathBuf,
}

impl ArtifactLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, step: LoggedStep) -> PathBuf {
        self.dir.join(step.file_name())
    }

    /// 写入步骤输出。写入失败只记录警告，不影响流程。
    ///
    /// # 返回值
    ///
    /// 写入成功时返回日志文件路径。
    pub async fn record(&self, step: LoggedStep, content: &str) -> Option<PathBuf> {
        let path = self.path_for(step);
        match tokio::fs::write(&path, content).await {
            Ok(()) => Some(path),
            Err(err) => {
                tracing::warn!(
                    target: crate::TRACING_TARGET_PROVISION,
                    path = %path.display(),
                    error = %err,
                    "无法写入步骤日志"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let log = ArtifactLog::new(dir.path());

        log.record(LoggedStep::Policy, "first run").await.unwrap();
        let path = log.record(LoggedStep::Policy, "second").await.unwrap();

        assert_eq!(path, dir.path().join("s3-policy.log"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_record_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let log = ArtifactLog::new(dir.path().join("missing").join("nested"));

        assert!(log.record(LoggedStep::Website, "output").await.is_none());
    }
}
