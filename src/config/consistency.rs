//! 创建存储桶后等待其可见的退避参数。

use std::time::Duration;

use clap::Args;

use crate::provision::ProvisionError;

/// 每次重试后延迟的放大倍数
const BACKOFF_MULTIPLIER: u32 = 2;

/// 最终一致性等待配置。
///
/// 第一次检查前等待 `initial_delay_secs`，之后每次延迟翻倍，
/// 直到达到最大尝试次数或累计等待时间超过 `max_wait_secs`。
#[derive(Debug, Clone, Args)]
pub struct ConsistencyConfig {
    /// 第一次检查前的等待时间（秒）
    #[arg(
        long = "consistency-initial-delay-secs",
        env = "SETUP_CONSISTENCY_INITIAL_DELAY_SECS",
        default_value_t = 5
    )]
    pub initial_delay_secs: u64,

    /// 最大检查次数
    #[arg(
        long = "consistency-max-attempts",
        env = "SETUP_CONSISTENCY_MAX_ATTEMPTS",
        default_value_t = 5
    )]
    pub max_attempts: u32,

    /// 累计等待时间上限（秒）
    #[arg(
        long = "consistency-max-wait-secs",
        env = "SETUP_CONSISTENCY_MAX_WAIT_SECS",
        default_value_t = 60
    )]
    pub max_wait_secs: u64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: 5,
            max_attempts: 5,
            max_wait_secs: 60,
        }
    }
}

impl ConsistencyConfig {
    /// 不等待、只检查指定次数的配置。
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            initial_delay_secs: 0,
            max_attempts,
            max_wait_secs: 60,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    /// 第 `attempt` 次检查（从 1 开始）前的延迟，不考虑累计上限。
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = BACKOFF_MULTIPLIER.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay().saturating_mul(factor)
    }

    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.max_attempts == 0 {
            return Err(ProvisionError::InvalidConfig(
                "最大检查次数至少为 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log(&self) {
        tracing::debug!(
            target: crate::TRACING_TARGET_CONFIG,
            initial_delay_secs = self.initial_delay_secs,
            max_attempts = self.max_attempts,
            max_wait_secs = self.max_wait_secs,
            "最终一致性等待配置"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_each_attempt() {
        let config = ConsistencyConfig::default();
        assert_eq!(config.delay_for(1), Duration::from_secs(5));
        assert_eq!(config.delay_for(2), Duration::from_secs(10));
        assert_eq!(config.delay_for(3), Duration::from_secs(20));
    }

    #[test]
    fn test_immediate_has_no_delay() {
        let config = ConsistencyConfig::immediate(3);
        assert_eq!(config.delay_for(3), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_is_invalid() {
        let config = ConsistencyConfig::immediate(0);
        assert!(matches!(
            config.validate(),
            Err(ProvisionError::InvalidConfig(_))
        ));
    }
}
