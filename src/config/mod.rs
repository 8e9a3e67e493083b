//! 站点存储桶的配置模块。
//!
//! 所有参数都可以通过命令行参数或环境变量提供，不带任何参数运行时使用默认值。
//! 启动时会先加载 `.env` 文件，使其中的变量可以作为默认值。

mod consistency;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub use consistency::ConsistencyConfig;

use crate::provision::ProvisionError;

/// 默认存储桶名称
pub const DEFAULT_BUCKET: &str = "mozedu-frontend-prod-af";

/// 默认区域
pub const DEFAULT_REGION: &str = "af-south-1";

/// 默认的索引文件名
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// 默认的错误页面，SPA 路由由前端处理，因此同样指向 index.html
pub const DEFAULT_ERROR_DOCUMENT: &str = "index.html";

/// 与云服务交互所使用的后端。
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// 进程内的 AWS SDK
    Sdk,
    /// 外部的 `aws` 命令行工具
    Cli,
}

/// 存储桶配置。
///
/// # 环境变量
///
/// * `S3_BUCKET` - 存储桶名称
/// * `AWS_REGION` - 区域
/// * `S3_INDEX_DOCUMENT` / `S3_ERROR_DOCUMENT` - 网站的索引与错误页面
/// * `S3_ENDPOINT` - S3 兼容服务的端点 URL（可选）
/// * `SETUP_BACKEND` - `sdk` 或 `cli`
/// * `SETUP_ASSUME_YES` - 存储桶已存在时不再询问
/// * `SETUP_LOG_DIR` - 步骤日志的输出目录
#[derive(Debug, Clone, Parser)]
#[command(name = "static-site-setup")]
#[command(about = "为静态网站托管创建并配置 S3 存储桶")]
#[command(version)]
pub struct SiteConfig {
    /// 目标存储桶名称
    #[arg(long, env = "S3_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// 存储桶所在区域
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// 网站索引文件
    #[arg(long, env = "S3_INDEX_DOCUMENT", default_value = DEFAULT_INDEX_DOCUMENT)]
    pub index_document: String,

    /// 网站错误页面
    #[arg(long, env = "S3_ERROR_DOCUMENT", default_value = DEFAULT_ERROR_DOCUMENT)]
    pub error_document: String,

    /// 使用的后端
    #[arg(long, env = "SETUP_BACKEND", value_enum, default_value_t = Backend::Sdk)]
    pub backend: Backend,

    /// `cli` 后端调用的程序
    #[arg(long, env = "SETUP_AWS_CLI", default_value = "aws")]
    pub aws_cli: String,

    /// 自定义端点，用于 S3 兼容服务或本地测试
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint_url: Option<String>,

    /// 存储桶已存在时直接重新配置，不再询问
    #[arg(short = 'y', long, env = "SETUP_ASSUME_YES")]
    pub assume_yes: bool,

    /// 步骤日志目录，默认为系统临时目录
    #[arg(long, env = "SETUP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(flatten)]
    pub consistency: ConsistencyConfig,
}

impl SiteConfig {
    /// 加载 `.env` 后解析命令行参数。
    pub fn init() -> Self {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("警告: 无法加载 .env 文件: {err}");
        }
        Self::parse()
    }

    /// 使用默认选项为指定存储桶创建配置。
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            index_document: DEFAULT_INDEX_DOCUMENT.to_string(),
            error_document: DEFAULT_ERROR_DOCUMENT.to_string(),
            backend: Backend::Sdk,
            aws_cli: "aws".to_string(),
            endpoint_url: None,
            assume_yes: false,
            log_dir: None,
            consistency: ConsistencyConfig::default(),
        }
    }

    /// 步骤日志的输出目录。
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// 校验配置。
    ///
    /// 存储桶名称需满足 S3 命名规则：3 到 63 个字符，只包含小写字母、数字、`-` 和 `.`，
    /// 且以字母或数字开头和结尾。
    pub fn validate(&self) -> Result<(), ProvisionError> {
        validate_bucket_name(&self.bucket)?;

        if self.region.trim().is_empty() {
            return Err(ProvisionError::InvalidConfig("区域不能为空".to_string()));
        }
        if self.index_document.trim().is_empty() || self.error_document.trim().is_empty() {
            return Err(ProvisionError::InvalidConfig(
                "索引文件和错误页面不能为空".to_string(),
            ));
        }

        self.consistency.validate()
    }

    /// 以 debug 级别记录配置。
    pub fn log(&self) {
        tracing::debug!(
            target: crate::TRACING_TARGET_CONFIG,
            bucket = %self.bucket,
            region = %self.region,
            index_document = %self.index_document,
            error_document = %self.error_document,
            backend = ?self.backend,
            endpoint_url = ?self.endpoint_url,
            assume_yes = self.assume_yes,
            log_dir = %self.log_dir().display(),
            "配置已加载"
        );
        self.consistency.log();
    }
}

fn validate_bucket_name(bucket: &str) -> Result<(), ProvisionError> {
    let invalid = |reason: &str| {
        Err(ProvisionError::InvalidConfig(format!(
            "存储桶名称 `{bucket}` 无效: {reason}"
        )))
    };

    if !(3..=63).contains(&bucket.len()) {
        return invalid("长度必须在 3 到 63 之间");
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return invalid("只能包含小写字母、数字、'-' 和 '.'");
    }

    let is_edge = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !is_edge(bucket.chars().next()) || !is_edge(bucket.chars().last()) {
        return invalid("必须以字母或数字开头和结尾");
    }
    if bucket.contains("..") {
        return invalid("不能包含连续的 '.'");
    }

    Ok(())
}
