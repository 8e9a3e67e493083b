//! 基于 AWS SDK 的提供者实现。

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CorsConfiguration, CorsRule, CreateBucketConfiguration,
    ErrorDocument, IndexDocument, PublicAccessBlockConfiguration, WebsiteConfiguration,
};

use crate::config::SiteConfig;
use crate::s3::documents::{BucketPolicy, CorsDocument, WebsiteDocuments};
use crate::s3::provider::{BucketProvider, CallerIdentity, ProviderError};

/// 无需位置约束的默认区域
const DEFAULT_PROVIDER_REGION: &str = "us-east-1";

/// 使用 AWS SDK 管理存储桶。
#[derive(Debug, Clone)]
pub struct SdkProvider {
    client: Client,
    sts: aws_sdk_sts::Client,
}

impl SdkProvider {
    pub fn new(client: Client, sts: aws_sdk_sts::Client) -> Self {
        Self { client, sts }
    }

    /// 使用标准 AWS 凭证链创建客户端。
    ///
    /// 自定义端点只作用于 S3，并使用路径风格访问以兼容 S3 兼容服务；
    /// 调用者身份始终通过 STS 解析。
    pub async fn from_config(config: &SiteConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(
            Client::from_conf(s3_config.build()),
            aws_sdk_sts::Client::new(&sdk_config),
        )
    }
}

/// 将 SDK 错误转换为包含完整上下文的提供者错误。
fn sdk_error<E: std::error::Error>(err: E) -> ProviderError {
    ProviderError::call(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl BucketProvider for SdkProvider {
    async fn check_tool(&self) -> Result<(), ProviderError> {
        // SDK 已链接进程序
        Ok(())
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(sdk_error)?;

        let principal = output
            .arn()
            .or(output.user_id())
            .filter(|principal| !principal.is_empty())
            .ok_or_else(|| ProviderError::call("STS 未返回调用者身份"))?;

        Ok(CallerIdentity {
            principal: principal.to_string(),
            account: output.account().map(str::to_string),
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_not_found())
                    || err
                        .raw_response()
                        .is_some_and(|response| response.status().as_u16() == 404);

                if not_found {
                    Ok(false)
                } else {
                    Err(sdk_error(err))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<String, ProviderError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // 默认区域之外必须指定位置约束
        if region != DEFAULT_PROVIDER_REGION {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        let output = request.send().await.map_err(sdk_error)?;
        Ok(format!("{output:?}"))
    }

    async fn put_website(
        &self,
        bucket: &str,
        website: &WebsiteDocuments,
    ) -> Result<String, ProviderError> {
        let configuration = WebsiteConfiguration::builder()
            .index_document(
                IndexDocument::builder()
                    .suffix(website.index())
                    .build()
                    .map_err(sdk_error)?,
            )
            .error_document(
                ErrorDocument::builder()
                    .key(website.error())
                    .build()
                    .map_err(sdk_error)?,
            )
            .build();

        let output = self
            .client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(configuration)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(format!("{output:?}"))
    }

    async fn put_public_access_block(&self, bucket: &str) -> Result<String, ProviderError> {
        let configuration = PublicAccessBlockConfiguration::builder()
            .block_public_acls(false)
            .ignore_public_acls(false)
            .block_public_policy(false)
            .restrict_public_buckets(false)
            .build();

        let output = self
            .client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(configuration)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(format!("{output:?}"))
    }

    async fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &BucketPolicy,
    ) -> Result<String, ProviderError> {
        let document = policy.to_json().map_err(sdk_error)?;

        let output = self
            .client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(document)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(format!("{output:?}"))
    }

    async fn put_bucket_cors(
        &self,
        bucket: &str,
        cors: &CorsDocument,
    ) -> Result<String, ProviderError> {
        let mut builder = CorsConfiguration::builder();
        for rule in &cors.cors_rules {
            let cors_rule = CorsRule::builder()
                .set_allowed_headers(Some(rule.allowed_headers.clone()))
                .set_allowed_methods(Some(rule.allowed_methods.clone()))
                .set_allowed_origins(Some(rule.allowed_origins.clone()))
                .set_expose_headers(Some(rule.expose_headers.clone()))
                .build()
                .map_err(sdk_error)?;
            builder = builder.cors_rules(cors_rule);
        }
        let configuration = builder.build().map_err(sdk_error)?;

        let output = self
            .client
            .put_bucket_cors()
            .bucket(bucket)
            .cors_configuration(configuration)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(format!("{output:?}"))
    }
}
