//! 流程的步骤与状态。
//!
//! ```text
//! Start → ToolChecked → Authenticated → ExistenceKnown → {Created|Skipped}
//!       → WebsiteConfigured → PublicAccessConfigured → PolicyApplied
//!       → CorsAttempted → Done
//! ```
//!
//! `CorsAttempted` 之前的任意状态都可能进入 `Failed`。
//! 拒绝重新配置时从 `Skipped` 直接进入 `Done`。

use std::fmt;

/// 流程状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ToolChecked,
    Authenticated,
    ExistenceKnown,
    Created,
    Skipped,
    WebsiteConfigured,
    PublicAccessConfigured,
    PolicyApplied,
    CorsAttempted,
    Done,
    Failed,
}

impl Stage {
    /// 是否允许从当前状态转移到 `next`。
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;

        if next == Failed {
            return !matches!(self, CorsAttempted | Done | Failed);
        }

        matches!(
            (self, next),
            (Start, ToolChecked)
                | (ToolChecked, Authenticated)
                | (Authenticated, ExistenceKnown)
                | (ExistenceKnown, Created | Skipped)
                | (Created | Skipped, WebsiteConfigured)
                | (Skipped, Done)
                | (WebsiteConfigured, PublicAccessConfigured)
                | (PublicAccessConfigured, PolicyApplied)
                | (PolicyApplied, CorsAttempted)
                | (CorsAttempted, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 按顺序执行的步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckTool,
    ResolveIdentity,
    ProbeExistence,
    CreateBucket,
    ConfigureWebsite,
    ConfigurePublicAccess,
    ApplyPolicy,
    ConfigureCors,
}

impl Step {
    /// 执行顺序
    pub const ORDER: [Step; 8] = [
        Step::CheckTool,
        Step::ResolveIdentity,
        Step::ProbeExistence,
        Step::CreateBucket,
        Step::ConfigureWebsite,
        Step::ConfigurePublicAccess,
        Step::ApplyPolicy,
        Step::ConfigureCors,
    ];

    /// 失败时是否终止流程。
    pub fn is_fatal(self) -> bool {
        !matches!(self, Step::ConfigureCors)
    }

    pub fn description(self) -> &'static str {
        match self {
            Step::CheckTool => "检查工具",
            Step::ResolveIdentity => "检查凭证",
            Step::ProbeExistence => "检查存储桶是否存在",
            Step::CreateBucket => "创建存储桶",
            Step::ConfigureWebsite => "配置静态网站托管",
            Step::ConfigurePublicAccess => "关闭公共访问阻止",
            Step::ApplyPolicy => "应用公共读取策略",
            Step::ConfigureCors => "配置 CORS",
        }
    }
}

/// 记录状态转移的轨迹。
#[derive(Debug, Clone)]
pub struct StageTrail {
    stages: Vec<Stage>,
}

impl Default for StageTrail {
    fn default() -> Self {
        Self {
            stages: vec![Stage::Start],
        }
    }
}

impl StageTrail {
    pub fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Start)
    }

    pub fn advance(&mut self, next: Stage) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(next),
            "非法状态转移: {current} -> {next}"
        );
        tracing::debug!(target: crate::TRACING_TARGET_PROVISION, from = %current, to = %next, "状态转移");
        self.stages.push(next);
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<Stage> {
        self.stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions_are_allowed() {
        let path = [
            Stage::Start,
            Stage::ToolChecked,
            Stage::Authenticated,
            Stage::ExistenceKnown,
            Stage::Created,
            Stage::WebsiteConfigured,
            Stage::PublicAccessConfigured,
            Stage::PolicyApplied,
            Stage::CorsAttempted,
            Stage::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_cors_attempted_cannot_fail() {
        assert!(!Stage::CorsAttempted.can_advance_to(Stage::Failed));
        assert!(Stage::PolicyApplied.can_advance_to(Stage::Failed));
        assert!(!Stage::Failed.can_advance_to(Stage::Done));
    }

    #[test]
    fn test_cannot_skip_steps() {
        assert!(!Stage::Start.can_advance_to(Stage::Authenticated));
        assert!(!Stage::Created.can_advance_to(Stage::Done));
        assert!(!Stage::PolicyApplied.can_advance_to(Stage::Done));
    }

    #[test]
    fn test_only_cors_is_recoverable() {
        let recoverable: Vec<_> = Step::ORDER.iter().filter(|s| !s.is_fatal()).collect();
        assert_eq!(recoverable, [&Step::ConfigureCors]);
    }

    #[test]
    fn test_trail_records_transitions() {
        let mut trail = StageTrail::default();
        trail.advance(Stage::ToolChecked);
        trail.advance(Stage::Failed);
        assert_eq!(trail.current(), Stage::Failed);
        assert!(trail.current().is_terminal());
        assert_eq!(
            trail.stages(),
            [Stage::Start, Stage::ToolChecked, Stage::Failed]
        );
    }
}
