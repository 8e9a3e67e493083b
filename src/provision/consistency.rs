//! 等待新建的存储桶对后续读取可见。

use std::time::Duration;

use crate::config::ConsistencyConfig;
use crate::provision::ProvisionError;
use crate::s3::BucketProvider;

/// 以指数退避反复检查存储桶是否存在。
///
/// 检查次数和累计等待时间都有上限，超过后返回 `ConsistencyTimeout`。
/// 检查过程中出现的错误视为暂时不可见。
///
/// # 返回值
///
/// 存储桶可见时所用的检查次数。
pub async fn wait_until_visible(
    provider: &dyn BucketProvider,
    bucket: &str,
    config: &ConsistencyConfig,
) -> Result<u32, ProvisionError> {
    let max_wait = config.max_wait();
    let mut waited = Duration::ZERO;
    let mut attempts = 0;

    while attempts < config.max_attempts {
        attempts += 1;

        let pause = config.delay_for(attempts).min(max_wait.saturating_sub(waited));
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
            waited += pause;
        }

        match provider.bucket_exists(bucket).await {
            Ok(true) => {
                tracing::debug!(
                    target: crate::TRACING_TARGET_PROVISION,
                    bucket,
                    attempts,
                    ?waited,
                    "存储桶已可见"
                );
                return Ok(attempts);
            }
            Ok(false) => {
                tracing::debug!(target: crate::TRACING_TARGET_PROVISION, bucket, attempts, "存储桶尚不可见");
            }
            Err(err) => {
                tracing::warn!(
                    target: crate::TRACING_TARGET_PROVISION,
                    bucket,
                    attempts,
                    error = %err,
                    "检查存储桶时出错"
                );
            }
        }

        if !max_wait.is_zero() && waited >= max_wait {
            break;
        }
    }

    Err(ProvisionError::ConsistencyTimeout {
        bucket: bucket.to_string(),
        attempts,
        waited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::{MockBucketProvider, ProviderError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_returns_after_bucket_becomes_visible() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut provider = MockBucketProvider::new();
        provider
            .expect_bucket_exists()
            .times(3)
            .returning(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst) == 2));

        let attempts = wait_until_visible(&provider, "my-site", &ConsistencyConfig::immediate(5))
            .await
            .unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_after_max_attempts() {
        let mut provider = MockBucketProvider::new();
        provider
            .expect_bucket_exists()
            .times(4)
            .returning(|_| Ok(false));

        let err = wait_until_visible(&provider, "my-site", &ConsistencyConfig::immediate(4))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::ConsistencyTimeout { attempts: 4, .. }
        ));
    }

    #[tokio::test]
    async fn test_errors_count_as_not_visible() {
        let mut provider = MockBucketProvider::new();
        provider
            .expect_bucket_exists()
            .times(2)
            .returning(|_| Err(ProviderError::call("connection reset")));

        let result =
            wait_until_visible(&provider, "my-site", &ConsistencyConfig::immediate(2)).await;
        assert!(matches!(
            result,
            Err(ProvisionError::ConsistencyTimeout { attempts: 2, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_wait_is_bounded() {
        let mut provider = MockBucketProvider::new();
        provider.expect_bucket_exists().returning(|_| Ok(false));

        let config = ConsistencyConfig {
            initial_delay_secs: 5,
            max_attempts: 10,
            max_wait_secs: 12,
        };
        let err = wait_until_visible(&provider, "my-site", &config)
            .await
            .unwrap_err();

        // 5s + 7s 达到上限
        match err {
            ProvisionError::ConsistencyTimeout {
                attempts, waited, ..
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(waited, Duration::from_secs(12));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
