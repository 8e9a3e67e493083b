//! 按顺序执行配置步骤。
//!
//! 第一个致命错误会终止流程并进入 `Failed`，CORS 失败只记为警告。
//! 各步骤对远端的修改不会回滚。

use crate::config::SiteConfig;
use crate::provision::consistency::wait_until_visible;
use crate::provision::report::{BucketOutcome, ProvisionReport};
use crate::provision::step::{Stage, StageTrail, Step};
use crate::provision::{ApiStep, ProvisionError, ProvisionWarning};
use crate::s3::{
    BucketPolicy, BucketProvider, CallerIdentity, CorsDocument, ProviderError, WebsiteDocuments,
    website_endpoint,
};
use crate::utils::artifacts::{ArtifactLog, LoggedStep};
use crate::utils::console;
use crate::utils::prompt::ConfirmPrompt;

/// 步骤执行后的走向
enum Flow {
    Next(Stage),
    Finish(Stage),
}

/// 运行过程中积累的状态
#[derive(Default)]
struct RunState {
    trail: StageTrail,
    identity: Option<CallerIdentity>,
    exists: bool,
    declined: bool,
    warnings: Vec<ProvisionWarning>,
}

/// 配置流程。
pub struct Provisioner<'a> {
    config: &'a SiteConfig,
    provider: &'a dyn BucketProvider,
    prompt: &'a dyn ConfirmPrompt,
    artifacts: ArtifactLog,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        config: &'a SiteConfig,
        provider: &'a dyn BucketProvider,
        prompt: &'a dyn ConfirmPrompt,
    ) -> Self {
        Self {
            config,
            provider,
            prompt,
            artifacts: ArtifactLog::new(config.log_dir()),
        }
    }

    /// 执行全部步骤。
    ///
    /// # 返回值
    ///
    /// 完成时返回运行结果（可能带有警告），否则返回第一个致命错误。
    pub async fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let mut state = RunState::default();

        for step in Step::ORDER {
            tracing::info!(
                target: crate::TRACING_TARGET_PROVISION,
                step = step.description(),
                "开始执行步骤"
            );

            match self.execute(step, &mut state).await {
                Ok(Flow::Next(stage)) => state.trail.advance(stage),
                Ok(Flow::Finish(stage)) => {
                    state.trail.advance(stage);
                    break;
                }
                Err(err) => {
                    debug_assert!(step.is_fatal());
                    state.trail.advance(Stage::Failed);
                    tracing::error!(
                        target: crate::TRACING_TARGET_PROVISION,
                        step = ?step,
                        error = %err,
                        "步骤失败，流程终止"
                    );
                    return Err(err);
                }
            }
        }

        if !state.trail.current().is_terminal() {
            state.trail.advance(Stage::Done);
        }

        Ok(self.report(state))
    }

    async fn execute(&self, step: Step, state: &mut RunState) -> Result<Flow, ProvisionError> {
        let bucket = self.config.bucket.as_str();

        match step {
            Step::CheckTool => {
                self.provider.check_tool().await.map_err(tool_error)?;
                Ok(Flow::Next(Stage::ToolChecked))
            }
            Step::ResolveIdentity => {
                let identity = self.provider.caller_identity().await.map_err(|err| match err {
                    ProviderError::ToolMissing { tool, detail } => {
                        ProvisionError::ToolMissing { tool, detail }
                    }
                    ProviderError::Call { output } => ProvisionError::NotAuthenticated(output),
                })?;
                if identity.principal.trim().is_empty() {
                    return Err(ProvisionError::NotAuthenticated(
                        "未返回调用者身份".to_string(),
                    ));
                }

                console::success(&format!("已认证: {identity}"));
                state.identity = Some(identity);
                Ok(Flow::Next(Stage::Authenticated))
            }
            Step::ProbeExistence => {
                state.exists =
                    self.provider
                        .bucket_exists(bucket)
                        .await
                        .map_err(|err| match err {
                            ProviderError::ToolMissing { tool, detail } => {
                                ProvisionError::ToolMissing { tool, detail }
                            }
                            ProviderError::Call { output } => {
                                ProvisionError::ExistenceCheckFailed {
                                    bucket: bucket.to_string(),
                                    detail: output,
                                }
                            }
                        })?;

                if state.exists {
                    console::warning(&format!("存储桶 {bucket} 已存在"));
                    state.declined = !self.consent_to_reconfigure().await;
                } else {
                    console::info(&format!("存储桶 {bucket} 不存在，将创建"));
                }
                Ok(Flow::Next(Stage::ExistenceKnown))
            }
            Step::CreateBucket => {
                if state.exists {
                    if state.declined {
                        console::info("已取消重新配置，不做任何修改");
                        return Ok(Flow::Finish(Stage::Skipped));
                    }
                    console::info("跳过创建，重新应用配置");
                    return Ok(Flow::Next(Stage::Skipped));
                }

                self.create_bucket(bucket).await?;
                Ok(Flow::Next(Stage::Created))
            }
            Step::ConfigureWebsite => {
                let website =
                    WebsiteDocuments::new(&self.config.index_document, &self.config.error_document);
                let result = self.provider.put_website(bucket, &website).await;
                self.apply(ApiStep::PutWebsite, Some(LoggedStep::Website), result)
                    .await?;
                console::success(&format!(
                    "已启用静态网站托管 (索引: {}, 错误页: {})",
                    website.index(),
                    website.error()
                ));
                Ok(Flow::Next(Stage::WebsiteConfigured))
            }
            Step::ConfigurePublicAccess => {
                let result = self.provider.put_public_access_block(bucket).await;
                self.apply(ApiStep::PutPublicAccessBlock, None, result)
                    .await?;
                console::success("已关闭公共访问阻止");
                Ok(Flow::Next(Stage::PublicAccessConfigured))
            }
            Step::ApplyPolicy => {
                let policy = BucketPolicy::public_read(bucket);
                let result = self.provider.put_bucket_policy(bucket, &policy).await;
                self.apply(ApiStep::PutBucketPolicy, Some(LoggedStep::Policy), result)
                    .await?;
                console::success("已应用公共读取策略");
                Ok(Flow::Next(Stage::PolicyApplied))
            }
            Step::ConfigureCors => {
                match self
                    .provider
                    .put_bucket_cors(bucket, &CorsDocument::permissive())
                    .await
                {
                    Ok(_) => console::success("已配置 CORS"),
                    Err(err) => {
                        let warning = ProvisionWarning::CorsConfigurationFailed {
                            detail: err.to_string(),
                        };
                        tracing::warn!(
                            target: crate::TRACING_TARGET_PROVISION,
                            error = %err,
                            "CORS 配置失败，继续执行"
                        );
                        console::warning(&warning.to_string());
                        state.warnings.push(warning);
                    }
                }
                Ok(Flow::Next(Stage::CorsAttempted))
            }
        }
    }

    /// 存储桶已存在时是否重新配置。非交互运行时直接继续。
    async fn consent_to_reconfigure(&self) -> bool {
        if self.config.assume_yes || !self.prompt.is_interactive() {
            return true;
        }

        match self.prompt.confirm("是否重新应用网站配置?").await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(target: crate::TRACING_TARGET_PROVISION, error = %err, "读取确认失败，视为拒绝");
                false
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), ProvisionError> {
        let region = self.config.region.as_str();
        let result = self.provider.create_bucket(bucket, region).await;
        self.apply(ApiStep::CreateBucket, Some(LoggedStep::CreateBucket), result)
            .await?;
        console::success(&format!("已在 {region} 创建存储桶 {bucket}"));

        console::info("等待存储桶可见...");
        let attempts = wait_until_visible(self.provider, bucket, &self.config.consistency).await?;
        tracing::info!(target: crate::TRACING_TARGET_PROVISION, bucket, attempts, "存储桶已可见");
        Ok(())
    }

    /// 记录调用输出，失败时转换为致命错误。
    async fn apply(
        &self,
        step: ApiStep,
        logged: Option<LoggedStep>,
        result: Result<String, ProviderError>,
    ) -> Result<String, ProvisionError> {
        let output = match &result {
            Ok(output) => output.as_str(),
            Err(ProviderError::Call { output }) => output.as_str(),
            Err(ProviderError::ToolMissing { detail, .. }) => detail.as_str(),
        };
        if let Some(logged) = logged {
            self.artifacts.record(logged, output).await;
        }

        match result {
            Ok(output) => Ok(output),
            Err(ProviderError::ToolMissing { tool, detail }) => {
                Err(ProvisionError::ToolMissing { tool, detail })
            }
            Err(ProviderError::Call { output }) => Err(ProvisionError::ApiCallFailed {
                step,
                detail: output,
            }),
        }
    }

    fn report(&self, state: RunState) -> ProvisionReport {
        let outcome = match (state.exists, state.declined) {
            (false, _) => BucketOutcome::Created,
            (true, false) => BucketOutcome::Reconfigured,
            (true, true) => BucketOutcome::LeftUnchanged,
        };

        ProvisionReport {
            bucket: self.config.bucket.clone(),
            region: self.config.region.clone(),
            endpoint: website_endpoint(&self.config.bucket, &self.config.region),
            identity: state.identity.unwrap_or_else(|| CallerIdentity {
                principal: String::new(),
                account: None,
            }),
            outcome,
            warnings: state.warnings,
            stages: state.trail.into_stages(),
            log_dir: self.artifacts.dir().to_path_buf(),
        }
    }
}

fn tool_error(err: ProviderError) -> ProvisionError {
    match err {
        ProviderError::ToolMissing { tool, detail } => ProvisionError::ToolMissing { tool, detail },
        ProviderError::Call { output } => ProvisionError::ToolMissing {
            tool: "aws".to_string(),
            detail: output,
        },
    }
}
