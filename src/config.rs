use std::time::Duration;

use crate::orchestrator::batch_executor::{BatchExecutor, FailurePolicy, RetryPolicy};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 输入 ---
    /// 评审项目 TOML 文件路径
    pub items_file: String,
    /// 检索上下文时使用的提案书引用
    pub document_reference: String,
    // --- 执行策略 ---
    /// 同时进行的评审调用数量
    pub max_concurrent_evaluations: usize,
    /// 单个评审任务的超时时间（秒），0 表示不限制
    pub unit_timeout_secs: u64,
    /// 每次 LLM 调用的最大尝试次数
    pub max_attempts: u32,
    /// 重试的基础等待时间（毫秒），按指数递增
    pub retry_base_delay_ms: u64,
    /// 单个评审失败时的处理策略
    pub failure_policy: FailurePolicy,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: "ollama".to_string(),
            llm_api_base_url: "http://localhost:11434/v1".to_string(),
            llm_model_name: "llama3.2".to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 2048,
            items_file: "data/evaluation_items.toml".to_string(),
            document_reference: "A사_제안서.pdf".to_string(),
            max_concurrent_evaluations: 100,
            unit_timeout_secs: 120,
            max_attempts: 3,
            retry_base_delay_ms: 500,
            failure_policy: FailurePolicy::Isolate,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            llm_max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_tokens),
            items_file: std::env::var("ITEMS_FILE").unwrap_or(default.items_file),
            document_reference: std::env::var("DOCUMENT_REFERENCE").unwrap_or(default.document_reference),
            max_concurrent_evaluations: std::env::var("MAX_CONCURRENT_EVALUATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_evaluations),
            unit_timeout_secs: std::env::var("UNIT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.unit_timeout_secs),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            retry_base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_base_delay_ms),
            failure_policy: std::env::var("FAILURE_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.failure_policy),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// LLM 调用的重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// 根据配置构建批量执行器
    pub fn batch_executor(&self) -> BatchExecutor {
        let timeout = (self.unit_timeout_secs > 0).then(|| Duration::from_secs(self.unit_timeout_secs));
        BatchExecutor::new(self.max_concurrent_evaluations)
            .with_retry(self.retry_policy())
            .with_unit_timeout(timeout)
            .with_failure_policy(self.failure_policy)
    }
}
