//! 一時的な失敗に対する指数バックオフ付きの再試行。

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// 再試行ポリシー。
///
/// 初回の呼び出しに加えて最大 `max_retries` 回再試行する。
/// n 回目の再試行の前に `base_delay * multiplier^(n-1)` 待つ。待ち時間は `max_delay` で頭打ち。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
            multiplier: default_multiplier(),
            max_delay: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// `retry` 回目 (1 始まり) の再試行前の待ち時間。
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// 設定値として使えない倍率なら、その理由を返す。
    pub fn invalid_multiplier(&self) -> Option<String> {
        (!self.multiplier.is_finite() || self.multiplier <= 0.0)
            .then(|| format!("gemini.retry.multiplier must be a positive number: {}", self.multiplier))
    }

    /// `operation` を実行し、`is_retryable` が真を返す失敗の間だけ再試行する。
    pub async fn run<T, E, F, Fut>(
        &self,
        mut operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut retry = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.max_retries && is_retryable(&e) => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    warn!(
                        error = %e,
                        attempt = retry,
                        max_retries = self.max_retries,
                        delay = %humantime::format_duration(delay),
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Busy,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn is_busy(e: &TestError) -> bool {
        *e == TestError::Busy
    }

    #[test]
    fn delays_grow_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy {
            max_retries: 100,
            ..Default::default()
        };
        assert_eq!(policy.delay_for(5), Duration::from_secs(16));
        assert_eq!(policy.delay_for(6), Duration::from_secs(30));
        assert_eq!(policy.delay_for(70), Duration::from_secs(30));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));

        let infinite = RetryPolicy {
            multiplier: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(infinite.delay_for(2), Duration::from_secs(30));
    }

    #[test]
    fn multiplier_must_be_positive_and_finite() {
        assert!(RetryPolicy::default().invalid_multiplier().is_none());
        for multiplier in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let policy = RetryPolicy {
                multiplier,
                ..Default::default()
            };
            assert!(policy.invalid_multiplier().is_some(), "{multiplier}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let result = policy
            .run(
                move || async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 { Err(TestError::Busy) } else { Ok(n) }
                },
                is_busy,
            )
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::default();

        let result: Result<(), _> = policy
            .run(
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Busy)
                },
                is_busy,
            )
            .await;

        assert_eq!(result, Err(TestError::Busy));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_fatal_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::default();

        let result: Result<(), _> = policy
            .run(
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Fatal)
                },
                is_busy,
            )
            .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
