//! 通过外部 `aws` 命令行工具管理存储桶。

use std::io::ErrorKind;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::s3::documents::{BucketPolicy, CorsDocument, WebsiteDocuments};
use crate::s3::provider::{BucketProvider, CallerIdentity, ProviderError};

/// 无需位置约束的默认区域
const DEFAULT_PROVIDER_REGION: &str = "us-east-1";

/// 关闭全部公共访问阻止选项的参数
const PUBLIC_ACCESS_BLOCK_OFF: &str = "BlockPublicAcls=false,IgnorePublicAcls=false,BlockPublicPolicy=false,RestrictPublicBuckets=false";

/// `sts get-caller-identity` 的输出
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentityOutput {
    arn: Option<String>,
    account: Option<String>,
    user_id: Option<String>,
}

/// 调用 `aws` 命令行工具的提供者。
#[derive(Debug, Clone)]
pub struct CliProvider {
    program: String,
    region: String,
    endpoint_url: Option<String>,
}

impl CliProvider {
    pub fn new(program: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            region: region.into(),
            endpoint_url: None,
        }
    }

    /// 设置 S3 兼容服务的端点，只用于 `s3api` 调用。
    pub fn with_endpoint(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    /// 构造针对存储桶的 `s3api` 参数。
    fn s3api_args(&self, operation: &str, bucket: &str, extra: &[&str]) -> Vec<String> {
        let mut args = vec![
            "s3api".to_string(),
            operation.to_string(),
            "--bucket".to_string(),
            bucket.to_string(),
        ];
        args.extend(extra.iter().map(|arg| arg.to_string()));
        if let Some(endpoint) = &self.endpoint_url {
            args.push("--endpoint-url".to_string());
            args.push(endpoint.clone());
        }
        args
    }

    fn create_bucket_args(&self, bucket: &str, region: &str) -> Vec<String> {
        if region == DEFAULT_PROVIDER_REGION {
            return self.s3api_args("create-bucket", bucket, &[]);
        }
        let constraint = format!("LocationConstraint={region}");
        self.s3api_args(
            "create-bucket",
            bucket,
            &["--create-bucket-configuration", constraint.as_str()],
        )
    }

    /// 执行命令并返回合并后的 stdout 与 stderr。
    async fn run<I, S>(&self, args: I) -> Result<String, ProviderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .args(["--region", self.region.as_str()])
            .output()
            .await
            .map_err(|err| self.spawn_error(err))?;

        let captured = capture(&output.stdout, &output.stderr);
        tracing::debug!(
            target: crate::TRACING_TARGET_PROVIDER,
            program = %self.program,
            status = %output.status,
            "命令执行完成"
        );

        if output.status.success() {
            Ok(captured)
        } else {
            Err(ProviderError::call(captured))
        }
    }

    fn spawn_error(&self, err: std::io::Error) -> ProviderError {
        if err.kind() == ErrorKind::NotFound {
            ProviderError::ToolMissing {
                tool: self.program.clone(),
                detail: err.to_string(),
            }
        } else {
            ProviderError::call(format!("无法执行 `{}`: {err}", self.program))
        }
    }
}

fn capture(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, _) => stderr.trim().to_string(),
        (false, true) => stdout.trim().to_string(),
        (false, false) => format!("{}\n{}", stdout.trim(), stderr.trim()),
    }
}

/// `head-bucket` 失败时判断是否只是存储桶不存在。
fn is_not_found(output: &str) -> bool {
    output.contains("(404)") || output.contains("Not Found") || output.contains("NoSuchBucket")
}

fn json_arg(result: serde_json::Result<String>) -> Result<String, ProviderError> {
    result.map_err(|err| ProviderError::call(format!("无法序列化配置文档: {err}")))
}

#[async_trait]
impl BucketProvider for CliProvider {
    async fn check_tool(&self) -> Result<(), ProviderError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .await
            .map_err(|err| self.spawn_error(err))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ProviderError::ToolMissing {
                tool: self.program.clone(),
                detail: capture(&output.stdout, &output.stderr),
            })
        }
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        let output = self
            .run(["sts", "get-caller-identity", "--output", "json"])
            .await?;

        let parsed: CallerIdentityOutput = serde_json::from_str(&output)
            .map_err(|err| ProviderError::call(format!("无法解析身份信息: {err}\n{output}")))?;

        let principal = parsed
            .arn
            .or(parsed.user_id)
            .filter(|principal| !principal.is_empty())
            .ok_or_else(|| ProviderError::call(format!("身份信息为空: {output}")))?;

        Ok(CallerIdentity {
            principal,
            account: parsed.account,
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError> {
        match self.run(self.s3api_args("head-bucket", bucket, &[])).await {
            Ok(_) => Ok(true),
            Err(ProviderError::Call { output }) if is_not_found(&output) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<String, ProviderError> {
        self.run(self.create_bucket_args(bucket, region)).await
    }

    async fn put_website(
        &self,
        bucket: &str,
        website: &WebsiteDocuments,
    ) -> Result<String, ProviderError> {
        let document = json_arg(website.to_json())?;
        self.run(self.s3api_args(
            "put-bucket-website",
            bucket,
            &["--website-configuration", document.as_str()],
        ))
        .await
    }

    async fn put_public_access_block(&self, bucket: &str) -> Result<String, ProviderError> {
        self.run(self.s3api_args(
            "put-public-access-block",
            bucket,
            &["--public-access-block-configuration", PUBLIC_ACCESS_BLOCK_OFF],
        ))
        .await
    }

    async fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &BucketPolicy,
    ) -> Result<String, ProviderError> {
        let document = json_arg(policy.to_json())?;
        self.run(self.s3api_args(
            "put-bucket-policy",
            bucket,
            &["--policy", document.as_str()],
        ))
        .await
    }

    async fn put_bucket_cors(
        &self,
        bucket: &str,
        cors: &CorsDocument,
    ) -> Result<String, ProviderError> {
        let document = json_arg(cors.to_json())?;
        self.run(self.s3api_args(
            "put-bucket-cors",
            bucket,
            &["--cors-configuration", document.as_str()],
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_bucket_args_with_location_constraint() {
        let provider = CliProvider::new("aws", "af-south-1");
        assert_eq!(
            provider.create_bucket_args("my-site", "af-south-1"),
            [
                "s3api",
                "create-bucket",
                "--bucket",
                "my-site",
                "--create-bucket-configuration",
                "LocationConstraint=af-south-1",
            ]
        );
    }

    #[test]
    fn test_create_bucket_args_in_default_region() {
        let provider = CliProvider::new("aws", "us-east-1");
        let args = provider.create_bucket_args("my-site", "us-east-1");
        assert!(!args.iter().any(|arg| arg.starts_with("LocationConstraint")));
    }

    #[test]
    fn test_s3api_args_include_endpoint() {
        let provider = CliProvider::new("aws", "af-south-1")
            .with_endpoint(Some("http://localhost:9000".to_string()));
        assert_eq!(
            provider.s3api_args("head-bucket", "my-site", &[]),
            [
                "s3api",
                "head-bucket",
                "--bucket",
                "my-site",
                "--endpoint-url",
                "http://localhost:9000",
            ]
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(is_not_found(
            "An error occurred (404) when calling the HeadBucket operation: Not Found"
        ));
        assert!(!is_not_found(
            "An error occurred (403) when calling the HeadBucket operation: Forbidden"
        ));
        assert!(!is_not_found("Could not connect to the endpoint URL"));
    }

    #[test]
    fn test_capture_merges_streams() {
        assert_eq!(capture(b"out\n", b""), "out");
        assert_eq!(capture(b"", b"err\n"), "err");
        assert_eq!(capture(b"out", b"err"), "out\nerr");
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_missing() {
        let provider = CliProvider::new("definitely-not-an-installed-aws-cli", "af-south-1");
        let err = provider.check_tool().await.unwrap_err();
        assert!(matches!(err, ProviderError::ToolMissing { .. }));

        let err = provider.bucket_exists("my-site").await.unwrap_err();
        assert!(matches!(err, ProviderError::ToolMissing { .. }));
    }

    #[cfg(unix)]
    mod fake_cli {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};
        use tempfile::TempDir;

        const IDENTITY_JSON: &str = r#"{"UserId":"AIDAEXAMPLE","Account":"123456789012","Arn":"arn:aws:iam::123456789012:user/deploy"}"#;

        /// 模拟 `aws` 的脚本，把每次调用的参数逐行写入日志，调用之间以 `--` 分隔
        fn fake_aws(dir: &TempDir) -> (PathBuf, PathBuf) {
            let program = dir.path().join("aws");
            let log = dir.path().join("calls.log");
            let script = format!(
                r#"#!/bin/sh
printf '%s\n' "$@" -- >> '{log}'
if [ "$1" = "--version" ]; then
    echo "aws-cli/2.15.0"
    exit 0
fi
if [ "$1" = "sts" ]; then
    echo '{IDENTITY_JSON}'
    exit 0
fi
if [ "$2" = "head-bucket" ]; then
    case "$4" in
        missing-site)
            echo "An error occurred (404) when calling the HeadBucket operation: Not Found" >&2
            exit 254
            ;;
        forbidden-site)
            echo "An error occurred (403) when calling the HeadBucket operation: Forbidden" >&2
            exit 254
            ;;
    esac
fi
echo '{{}}'
"#,
                log = log.display(),
            );
            std::fs::write(&program, script).unwrap();
            std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
            (program, log)
        }

        /// 读取记录的调用，每项为一次调用的参数
        fn invocations(log: &Path) -> Vec<Vec<String>> {
            let content = std::fs::read_to_string(log).unwrap_or_default();
            let mut calls = Vec::new();
            let mut current = Vec::new();
            for line in content.lines() {
                if line == "--" {
                    calls.push(std::mem::take(&mut current));
                } else {
                    current.push(line.to_string());
                }
            }
            calls
        }

        #[tokio::test]
        async fn test_caller_identity_parses_sts_output() {
            let dir = TempDir::new().unwrap();
            let (program, log) = fake_aws(&dir);
            let provider = CliProvider::new(program.to_string_lossy(), "af-south-1")
                .with_endpoint(Some("http://localhost:9000".to_string()));

            provider.check_tool().await.unwrap();
            let identity = provider.caller_identity().await.unwrap();
            assert_eq!(identity.principal, "arn:aws:iam::123456789012:user/deploy");
            assert_eq!(identity.account.as_deref(), Some("123456789012"));

            // 端点只用于 s3api
            assert_eq!(
                invocations(&log),
                [
                    vec!["--version"],
                    vec![
                        "sts",
                        "get-caller-identity",
                        "--output",
                        "json",
                        "--region",
                        "af-south-1"
                    ],
                ]
            );
        }

        #[tokio::test]
        async fn test_head_bucket_maps_exit_status() {
            let dir = TempDir::new().unwrap();
            let (program, _log) = fake_aws(&dir);
            let provider = CliProvider::new(program.to_string_lossy(), "af-south-1");

            assert!(provider.bucket_exists("my-site").await.unwrap());
            assert!(!provider.bucket_exists("missing-site").await.unwrap());

            let err = provider.bucket_exists("forbidden-site").await.unwrap_err();
            assert!(matches!(err, ProviderError::Call { .. }));
            assert!(err.to_string().contains("(403)"));
        }

        #[tokio::test]
        async fn test_configuration_calls_pass_documents_and_endpoint() {
            let dir = TempDir::new().unwrap();
            let (program, log) = fake_aws(&dir);
            let provider = CliProvider::new(program.to_string_lossy(), "af-south-1")
                .with_endpoint(Some("http://localhost:9000".to_string()));

            let website = WebsiteDocuments::new("index.html", "404.html");
            let policy = BucketPolicy::public_read("my-site");
            let cors = CorsDocument::permissive();

            provider.create_bucket("my-site", "af-south-1").await.unwrap();
            provider.put_website("my-site", &website).await.unwrap();
            provider.put_public_access_block("my-site").await.unwrap();
            provider.put_bucket_policy("my-site", &policy).await.unwrap();
            provider.put_bucket_cors("my-site", &cors).await.unwrap();

            let tail = ["--endpoint-url", "http://localhost:9000", "--region", "af-south-1"];
            let expected: Vec<Vec<String>> = [
                vec![
                    "create-bucket".to_string(),
                    "--create-bucket-configuration".to_string(),
                    "LocationConstraint=af-south-1".to_string(),
                ],
                vec![
                    "put-bucket-website".to_string(),
                    "--website-configuration".to_string(),
                    website.to_json().unwrap(),
                ],
                vec![
                    "put-public-access-block".to_string(),
                    "--public-access-block-configuration".to_string(),
                    PUBLIC_ACCESS_BLOCK_OFF.to_string(),
                ],
                vec![
                    "put-bucket-policy".to_string(),
                    "--policy".to_string(),
                    policy.to_json().unwrap(),
                ],
                vec![
                    "put-bucket-cors".to_string(),
                    "--cors-configuration".to_string(),
                    cors.to_json().unwrap(),
                ],
            ]
            .into_iter()
            .map(|call| {
                let mut args = vec![
                    "s3api".to_string(),
                    call[0].clone(),
                    "--bucket".to_string(),
                    "my-site".to_string(),
                ];
                args.extend(call[1..].iter().cloned());
                args.extend(tail.iter().map(|arg| arg.to_string()));
                args
            })
            .collect();

            assert_eq!(invocations(&log), expected);
        }
    }
}
