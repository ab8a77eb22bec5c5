//! 测试用的脚本化文本生成后端
//!
//! 不访问网络：按请求内容返回预设文本，记录所有请求，
//! 可以按主题注入延迟或失败

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::services::{GenerationRequest, TextGenerator};

type Responder = Box<dyn Fn(&GenerationRequest) -> String + Send + Sync>;
type DelayFn = Box<dyn Fn(&GenerationRequest) -> Duration + Send + Sync>;

/// 脚本化后端
pub struct ScriptedGenerator {
    responder: Responder,
    delay: Option<DelayFn>,
    /// 指令第一行包含该文本时失败，值为剩余失败次数（`None` 表示一直失败）
    failures: Mutex<HashMap<String, Option<usize>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(responder: impl Fn(&GenerationRequest) -> String + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            failures: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// 原样返回指令
    pub fn echo() -> Self {
        Self::new(|request| request.instruction.clone())
    }

    /// 按 Worker 角色应答的完整流水线后端
    ///
    /// Dispatcher 返回 `dispatcher_reply`，Reporter 返回收到的报告数量，
    /// 其他 Worker 返回针对指令第一行的评审结果
    pub fn for_pipeline(dispatcher_reply: impl Into<String>) -> Self {
        let dispatcher_reply = dispatcher_reply.into();
        Self::new(move |request| {
            if request.role == crate::workflow::dispatcher::DISPATCHER_ROLE {
                dispatcher_reply.clone()
            } else if request.role == crate::workflow::reporter::REPORTER_ROLE {
                let count = request.instruction.matches("[评审结果]").count();
                format!("最终报告: 综合了 {} 份评审", count)
            } else {
                let first_line = request.instruction.lines().next().unwrap_or_default();
                format!("[评审结果] {} => 8/10", first_line)
            }
        })
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(&GenerationRequest) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    /// 指令第一行包含 `needle` 的请求一直失败
    pub fn failing_on(self, needle: impl Into<String>) -> Self {
        self.lock_failures().insert(needle.into(), None);
        self
    }

    /// 指令第一行包含 `needle` 的请求前 `times` 次失败
    pub fn failing_times(self, needle: impl Into<String>, times: usize) -> Self {
        self.lock_failures().insert(needle.into(), Some(times));
        self
    }

    /// 收到的所有请求，按到达顺序
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// 指定角色收到的请求数
    pub fn calls_for_role(&self, role: &str) -> usize {
        self.requests().iter().filter(|r| r.role == role).count()
    }

    /// 观察到的最大同时进行请求数
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<usize>>> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn should_fail(&self, request: &GenerationRequest) -> bool {
        let first_line = request.instruction.lines().next().unwrap_or_default();
        let mut failures = self.lock_failures();
        for (needle, remaining) in failures.iter_mut() {
            if !first_line.contains(needle.as_str()) {
                continue;
            }
            match remaining {
                None => return true,
                Some(0) => {}
                Some(n) => {
                    *n -= 1;
                    return true;
                }
            }
        }
        false
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(request)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail(request) {
            return Err(BackendError::ApiCallFailed {
                model: self.model_name().to_string(),
                message: "scripted failure".to_string(),
            });
        }

        Ok((self.responder)(request))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
