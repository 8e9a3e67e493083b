//! 流程完成后的结果。

use std::path::PathBuf;

use crate::provision::{ProvisionWarning, Stage};
use crate::s3::CallerIdentity;

/// 本次运行对存储桶做了什么。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOutcome {
    /// 新建并完成配置
    Created,
    /// 已存在，重新应用了配置
    Reconfigured,
    /// 已存在，操作员拒绝重新配置
    LeftUnchanged,
}

#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub identity: CallerIdentity,
    pub outcome: BucketOutcome,
    pub warnings: Vec<ProvisionWarning>,
    pub stages: Vec<Stage>,
    pub log_dir: PathBuf,
}

impl ProvisionReport {
    pub fn final_stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Start)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
