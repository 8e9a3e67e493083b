//! 静态网站存储桶配置工具库
//!
//! 这是一个幂等的配置工具，主要功能包括：
//! - 检查工具与凭证
//! - 存储桶不存在时在指定区域创建，并等待其可见
//! - 启用静态网站托管、关闭公共访问阻止、应用公共读取策略
//! - 配置 CORS（失败不影响整体结果）
//! - 输出网站端点及后续步骤

pub mod config;
pub mod provision;
pub mod s3;
pub mod utils;

use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{Backend, SiteConfig};
use crate::provision::{ProvisionError, ProvisionReport, Provisioner};
use crate::s3::{BucketProvider, CliProvider, SdkProvider};
use crate::utils::prompt::StdinPrompt;

// Tracing target constants
pub const TRACING_TARGET_CONFIG: &str = "static_site_setup::config";
pub const TRACING_TARGET_PROVISION: &str = "static_site_setup::provision";
pub const TRACING_TARGET_PROVIDER: &str = "static_site_setup::provider";

/// 初始化日志。
///
/// 日志级别通过 `RUST_LOG` 环境变量配置，默认为 `info`。日志写入 stderr，
/// 不会与控制台状态行混在一起。
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_timer(LocalTime::rfc_3339())
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

/// 根据配置选择后端并执行配置流程。
///
/// # 参数
///
/// * `config` - 存储桶配置。
///
/// # 返回值
///
/// 流程完成时的结果，或第一个致命错误。
pub async fn provision(config: &SiteConfig) -> Result<ProvisionReport, ProvisionError> {
    config.validate()?;
    config.log();

    let provider: Box<dyn BucketProvider> = match config.backend {
        Backend::Sdk => Box::new(SdkProvider::from_config(config).await),
        Backend::Cli => Box::new(
            CliProvider::new(&config.aws_cli, &config.region)
                .with_endpoint(config.endpoint_url.clone()),
        ),
    };
    let prompt = StdinPrompt;

    Provisioner::new(config, provider.as_ref(), &prompt)
        .run()
        .await
}
