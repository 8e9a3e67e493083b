//! S3模块
//!
//! 该模块负责与 S3 交互：提供者接口、SDK 与命令行两种实现，以及提交给 S3 的配置文档。

// 声明子模块
pub mod cli;
pub mod documents;
pub mod provider;
pub mod sdk;

// 重新导出常用的类型
pub use cli::CliProvider;
pub use documents::{BucketPolicy, CorsDocument, WebsiteDocuments, website_endpoint};
pub use provider::{BucketProvider, CallerIdentity, MockBucketProvider, ProviderError};
pub use sdk::SdkProvider;
