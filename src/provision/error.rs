//! 配置流程的错误类型。

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// 会修改存储桶状态的提供者调用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStep {
    CreateBucket,
    PutWebsite,
    PutPublicAccessBlock,
    PutBucketPolicy,
}

impl fmt::Display for ApiStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateBucket => "创建存储桶",
            Self::PutWebsite => "配置静态网站托管",
            Self::PutPublicAccessBlock => "关闭公共访问阻止",
            Self::PutBucketPolicy => "应用存储桶策略",
        };
        f.write_str(name)
    }
}

/// 致命错误，流程在第一次出现时终止。
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("未找到命令行工具 `{tool}`: {detail}")]
    ToolMissing { tool: String, detail: String },

    #[error("无法获取调用者身份，请检查凭证配置: {0}")]
    NotAuthenticated(String),

    #[error("无法确定存储桶 `{bucket}` 是否存在: {detail}")]
    ExistenceCheckFailed { bucket: String, detail: String },

    #[error("{step}失败: {detail}")]
    ApiCallFailed { step: ApiStep, detail: String },

    #[error(
        "存储桶 `{bucket}` 创建后经过 {attempts} 次检查（共等待 {waited:?}）仍不可见，请稍后重试"
    )]
    ConsistencyTimeout {
        bucket: String,
        attempts: u32,
        waited: Duration,
    },

    #[error("配置无效: {0}")]
    InvalidConfig(String),
}

/// 不会终止流程的问题。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionWarning {
    #[error("CORS 配置失败（不影响网站访问）: {detail}")]
    CorsConfigurationFailed { detail: String },
}
