//! 应用入口 - 编排层
//!
//! 负责装配后端、加载评审项目、运行流水线并输出结果

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::Config;
use crate::models::load_items_from_toml;
use crate::orchestrator::pipeline::{EvaluationPipeline, PipelineOutcome};
use crate::services::{LlmService, PlaceholderContextProvider};
use crate::utils::logging::{log_startup, print_final_report, print_no_work};

/// 应用主结构
pub struct App {
    config: Config,
    pipeline: EvaluationPipeline,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        log_startup(&config.llm_model_name, &config.llm_api_base_url);

        let backend = Arc::new(LlmService::new(&config));
        let pipeline =
            EvaluationPipeline::from_config(&config, backend, Arc::new(PlaceholderContextProvider));

        Self { config, pipeline }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<PipelineOutcome> {
        let items = load_items_from_toml(Path::new(&self.config.items_file))
            .await
            .with_context(|| format!("无法加载评审项目: {}", self.config.items_file))?;

        let outcome = self
            .pipeline
            .run(&items)
            .await
            .context("评审流程失败")?;

        match &outcome {
            PipelineOutcome::NoWork => print_no_work(),
            PipelineOutcome::Report(report) => {
                if !report.failed.is_empty() {
                    warn!("⚠️ 以下项目未能完成评审: {}", report.failed.join(", "));
                }
                print_final_report(&report.text);
            }
        }

        Ok(outcome)
    }
}
