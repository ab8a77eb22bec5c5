use thiserror::Error;

/// LLM 后端调用错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// 请求构建失败
    #[error("LLM 请求构建失败 (模型: {model}): {message}")]
    InvalidRequest { model: String, message: String },
    /// API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 超时
    #[error("LLM 调用超时 ({secs} 秒)")]
    Timeout { secs: u64 },
}

impl BackendError {
    /// 请求本身有问题时重试没有意义
    pub fn is_retryable(&self) -> bool {
        !matches!(self, BackendError::InvalidRequest { .. })
    }
}

/// 分类结果解析错误
///
/// Dispatcher 的输出不是合法的结构化数据时产生，只在 Dispatcher 阶段内部消化
#[derive(Debug, Error)]
pub enum ClassificationParseError {
    /// 输出中找不到 JSON 对象
    #[error("输出中没有 JSON 对象")]
    NoJsonObject,
    /// JSON 语法或结构错误
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 评审项目加载错误
#[derive(Debug, Error)]
pub enum ItemLoadError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 某个阶段的 LLM 调用失败
    #[error("{phase} 阶段失败: {source}")]
    Backend {
        phase: &'static str,
        #[source]
        source: BackendError,
    },
    /// 批量评审任务全部失败
    #[error("全部 {total} 个评审任务均失败")]
    AllUnitsFailed { total: usize },
}

// ========== Result 类型别名 ==========

/// 流水线结果类型
pub type AppResult<T> = Result<T, PipelineError>;
