//! S3 提供者接口
//!
//! 流程中的每一步都对应这里的一个方法。成功时返回调用输出，供写入步骤日志。

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::s3::documents::{BucketPolicy, CorsDocument, WebsiteDocuments};

/// 提供者调用失败。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 命令行工具不存在或无法执行
    #[error("`{tool}` 不可用: {detail}")]
    ToolMissing { tool: String, detail: String },

    /// 调用失败，`output` 为捕获的原始输出
    #[error("{output}")]
    Call { output: String },
}

impl ProviderError {
    pub fn call(output: impl Into<String>) -> Self {
        Self::Call {
            output: output.into(),
        }
    }
}

/// 调用者身份，只检查是否存在，不做进一步校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// ARN，缺失时为用户 ID
    pub principal: String,
    pub account: Option<String>,
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.account {
            Some(account) => write!(f, "{} (账户 {account})", self.principal),
            None => f.write_str(&self.principal),
        }
    }
}

/// 存储桶管理接口。
#[automock]
#[async_trait]
pub trait BucketProvider: Send + Sync {
    /// 检查所依赖的工具是否可用。
    async fn check_tool(&self) -> Result<(), ProviderError>;

    /// 解析当前调用者身份。
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError>;

    /// 检查存储桶是否存在。
    ///
    /// 存储桶不存在时返回 `Ok(false)`，其他失败返回错误。
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError>;

    /// 在指定区域创建存储桶。
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<String, ProviderError>;

    async fn put_website(
        &self,
        bucket: &str,
        website: &WebsiteDocuments,
    ) -> Result<String, ProviderError>;

    /// 关闭全部四个公共访问阻止选项。
    async fn put_public_access_block(&self, bucket: &str) -> Result<String, ProviderError>;

    async fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &BucketPolicy,
    ) -> Result<String, ProviderError>;

    async fn put_bucket_cors(
        &self,
        bucket: &str,
        cors: &CorsDocument,
    ) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let identity = CallerIdentity {
            principal: "arn:aws:iam::123456789012:user/deploy".to_string(),
            account: Some("123456789012".to_string()),
        };
        assert_eq!(
            identity.to_string(),
            "arn:aws:iam::123456789012:user/deploy (账户 123456789012)"
        );
    }

    #[test]
    fn test_call_error_shows_captured_output() {
        let err = ProviderError::call("AccessDenied: nope");
        assert_eq!(err.to_string(), "AccessDenied: nope");
    }
}
