//! 批量执行器 - 编排层
//!
//! ## 职责
//!
//! 执行一批 WorkUnit，并按提交顺序返回结果。
//!
//! ## 设计特点
//!
//! - **协作式并发**：所有任务的 future 在当前 task 上一起 poll（`join_all`），
//!   不为每个任务 `tokio::spawn`
//! - **顺序保持**：结果位置与提交位置一致，与完成顺序无关
//! - **并发上限**：通过 Semaphore 限制同时进行的 LLM 调用数量
//! - **重试与超时**：每个任务独立重试（指数退避），可选单任务超时
//! - **失败策略**：`FailFast` 第一个失败即中止整批；`Isolate` 收集成功与失败

use std::str::FromStr;
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, warn};

use crate::error::{BackendError, PipelineError};
use crate::models::{ExecutionResult, WorkUnit};
use crate::utils::truncate_text;

/// 单个任务失败时的批次处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 任一任务失败即中止整批，不收集部分结果
    FailFast,
    /// 失败的任务单独记录，其余结果照常返回
    #[default]
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(format!("未知的失败策略: {}", other)),
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待时间，之后每次翻倍
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// 只调用一次，不重试
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// 第 `attempt` 次失败后的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// 单个任务的失败记录
#[derive(Debug)]
pub struct UnitFailure {
    pub index: usize,
    pub worker_role: String,
    pub label: String,
    pub error: BackendError,
}

/// 批次执行结果
///
/// `results` 和 `failures` 都按提交顺序排列
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<ExecutionResult>,
    pub failures: Vec<UnitFailure>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    /// 部分成功：既有结果也有失败
    pub fn is_partial(&self) -> bool {
        !self.results.is_empty() && !self.failures.is_empty()
    }
}

/// 批量执行器
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    max_concurrency: usize,
    retry: RetryPolicy,
    unit_timeout: Option<Duration>,
    failure_policy: FailurePolicy,
}

impl BatchExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            retry: RetryPolicy::default(),
            unit_timeout: None,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_unit_timeout(mut self, unit_timeout: Option<Duration>) -> Self {
        self.unit_timeout = unit_timeout;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// 顺序执行单个任务（Phase 1 / Phase 3）
    pub async fn execute_one(&self, unit: WorkUnit) -> Result<String, BackendError> {
        self.run_with_retry(&unit).await
    }

    /// 并发执行一批任务（Phase 2）
    ///
    /// 空批次直接返回空结果，不调用任何 Worker
    pub async fn execute(&self, units: Vec<WorkUnit>) -> Result<BatchOutcome, PipelineError> {
        if units.is_empty() {
            return Ok(BatchOutcome::default());
        }

        debug!(
            "提交 {} 个任务，并发上限 {}，策略 {:?}",
            units.len(),
            self.max_concurrency,
            self.failure_policy
        );

        let semaphore = Semaphore::new(self.max_concurrency);
        let tasks = units
            .into_iter()
            .enumerate()
            .map(|(index, unit)| self.run_indexed(index, unit, &semaphore));

        match self.failure_policy {
            FailurePolicy::FailFast => {
                let results = try_join_all(tasks).await.map_err(|failure| {
                    error!(
                        "[{}] ❌ 评审失败，中止整批: {}",
                        failure.label, failure.error
                    );
                    PipelineError::Backend {
                        phase: "Phase 2",
                        source: failure.error,
                    }
                })?;
                Ok(BatchOutcome {
                    results,
                    failures: Vec::new(),
                })
            }
            FailurePolicy::Isolate => {
                let mut outcome = BatchOutcome::default();
                for result in join_all(tasks).await {
                    match result {
                        Ok(result) => outcome.results.push(result),
                        Err(failure) => outcome.failures.push(failure),
                    }
                }
                Ok(outcome)
            }
        }
    }

    async fn run_indexed(
        &self,
        index: usize,
        unit: WorkUnit,
        semaphore: &Semaphore,
    ) -> Result<ExecutionResult, UnitFailure> {
        // Semaphore 不会被关闭，获取失败时直接放行
        let _permit = semaphore.acquire().await.ok();

        match self.run_with_retry(&unit).await {
            Ok(output) => {
                debug!("[{}] ✓ 完成: {}", unit.label, truncate_text(&output, 60));
                Ok(ExecutionResult {
                    index,
                    worker_role: unit.worker().role.clone(),
                    label: unit.label,
                    output,
                })
            }
            Err(error) => Err(UnitFailure {
                index,
                worker_role: unit.worker().role.clone(),
                label: unit.label,
                error,
            }),
        }
    }

    async fn run_with_retry(&self, unit: &WorkUnit) -> Result<String, BackendError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.run_once(unit).await {
                Ok(output) => return Ok(output),
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "[{}] ⚠️ 第 {}/{} 次调用失败: {}，{:?} 后重试",
                        unit.label, attempt, max_attempts, e, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        "[{}] ❌ 调用失败 (已尝试 {} 次): {}",
                        unit.label, attempt, e
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn run_once(&self, unit: &WorkUnit) -> Result<String, BackendError> {
        let worker = unit.worker();
        match self.unit_timeout {
            Some(limit) => timeout(limit, worker.perform(unit))
                .await
                .map_err(|_| BackendError::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => worker.perform(unit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::Worker;
    use crate::test_support::ScriptedGenerator;

    fn units_for(generator: Arc<ScriptedGenerator>, topics: &[&str]) -> Vec<WorkUnit> {
        let worker = Arc::new(Worker::new("평가관", "평가", "전문가", generator));
        topics
            .iter()
            .map(|topic| WorkUnit::new(worker.clone(), *topic, "점수").with_label(*topic))
            .collect()
    }

    fn fast_executor() -> BatchExecutor {
        BatchExecutor::new(16).with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_empty_batch_invokes_nothing() {
        let generator = Arc::new(ScriptedGenerator::echo());
        let outcome = fast_executor().execute(Vec::new()).await.unwrap();

        assert_eq!(outcome.total(), 0);
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_submission_order() {
        // 越靠前的任务越慢，完成顺序与提交顺序相反
        let generator = Arc::new(ScriptedGenerator::echo().with_delay(|request| {
            let rank: u64 = request.instruction.parse().unwrap_or(0);
            Duration::from_millis(50 - rank * 10)
        }));
        let units = units_for(generator.clone(), &["0", "1", "2", "3", "4"]);

        let outcome = fast_executor().execute(units).await.unwrap();

        let outputs: Vec<&str> = outcome.results.iter().map(|r| r.output.as_str()).collect();
        assert_eq!(outputs, vec!["0", "1", "2", "3", "4"]);
        let indexes: Vec<usize> = outcome.results.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
        assert!(generator.max_in_flight() > 1, "任务应当并发执行");
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let generator = Arc::new(
            ScriptedGenerator::echo().with_delay(|_| Duration::from_millis(10)),
        );
        let units = units_for(generator.clone(), &["a", "b", "c", "d", "e", "f"]);

        BatchExecutor::new(2).execute(units).await.unwrap();

        assert!(generator.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_isolate_keeps_sibling_results() {
        let generator = Arc::new(ScriptedGenerator::echo().failing_on("b"));
        let units = units_for(generator.clone(), &["a", "b", "c"]);

        let outcome = fast_executor()
            .with_failure_policy(FailurePolicy::Isolate)
            .execute(units)
            .await
            .unwrap();

        assert!(outcome.is_partial());
        let labels: Vec<&str> = outcome.results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "c"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_batch() {
        let generator = Arc::new(ScriptedGenerator::echo().failing_on("b"));
        let units = units_for(generator, &["a", "b", "c"]);

        let result = fast_executor()
            .with_failure_policy(FailurePolicy::FailFast)
            .execute(units)
            .await;

        assert!(matches!(result, Err(PipelineError::Backend { .. })));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let generator = Arc::new(ScriptedGenerator::echo().failing_times("a", 2));
        let units = units_for(generator.clone(), &["a"]);

        let outcome = fast_executor().execute(units).await.unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(generator.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let generator = Arc::new(ScriptedGenerator::echo().failing_on("a"));
        let units = units_for(generator.clone(), &["a"]);

        let outcome = fast_executor().execute(units).await.unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(generator.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_unit_timeout_counts_as_failure() {
        let generator = Arc::new(
            ScriptedGenerator::echo().with_delay(|_| Duration::from_millis(200)),
        );
        let units = units_for(generator, &["slow"]);

        let outcome = BatchExecutor::new(4)
            .with_retry(RetryPolicy::none())
            .with_unit_timeout(Some(Duration::from_millis(10)))
            .execute(units)
            .await
            .unwrap();

        assert!(matches!(
            outcome.failures[0].error,
            BackendError::Timeout { .. }
        ));
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!(
            "fail_fast".parse::<FailurePolicy>(),
            Ok(FailurePolicy::FailFast)
        );
        assert_eq!("ISOLATE".parse::<FailurePolicy>(), Ok(FailurePolicy::Isolate));
        assert!("whatever".parse::<FailurePolicy>().is_err());
    }
}
