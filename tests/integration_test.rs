use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use proposal_evaluator::models::load_items_from_toml;
use proposal_evaluator::test_support::ScriptedGenerator;
use proposal_evaluator::workflow::{DISPATCHER_ROLE, REPORTER_ROLE};
use proposal_evaluator::{
    BatchExecutor, CategorizedGroups, Config, EvaluationItem, EvaluationPipeline, FailurePolicy,
    LlmService, PipelineError, PipelineOutcome, PlaceholderContextProvider, RetryPolicy,
};

fn reference_items() -> Vec<EvaluationItem> {
    vec![
        EvaluationItem::new("기술", "시스템 아키텍처", "MSA 기반의 유연하고 확장 가능한 아키텍처인가?"),
        EvaluationItem::new("관리", "프로젝트 관리 방안", "WBS 기반의 상세하고 실현 가능한 일정을 제시하였는가?"),
        EvaluationItem::new("기술", "데이터베이스 암호화", "개인정보보호 및 데이터 암호화 방안이 명시되었는가?"),
        EvaluationItem::new("관리", "투입 인력 계획", "투입 인력의 역할과 경력이 적절한가?"),
        EvaluationItem::new("가격", "비용 산정 내역", "제시된 비용이 합리적이고 구체적인 근거를 포함하는가?"),
    ]
}

fn correct_dispatch_reply(items: &[EvaluationItem]) -> String {
    serde_json::to_string(&CategorizedGroups::group_by_category(items)).unwrap()
}

fn pipeline_with(backend: Arc<ScriptedGenerator>, policy: FailurePolicy) -> EvaluationPipeline {
    let executor = BatchExecutor::new(8)
        .with_retry(RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        })
        .with_failure_policy(policy);
    EvaluationPipeline::new(
        backend,
        Arc::new(PlaceholderContextProvider),
        executor,
        "A사_제안서.pdf",
    )
}

fn specialist_calls(backend: &ScriptedGenerator) -> usize {
    backend
        .requests()
        .iter()
        .filter(|r| r.role != DISPATCHER_ROLE && r.role != REPORTER_ROLE)
        .count()
}

#[tokio::test]
async fn test_reference_items_end_to_end() {
    let items = reference_items();
    let backend = Arc::new(ScriptedGenerator::for_pipeline(correct_dispatch_reply(&items)));
    let pipeline = pipeline_with(backend.clone(), FailurePolicy::Isolate);

    let outcome = pipeline.run(&items).await.unwrap();

    let PipelineOutcome::Report(report) = outcome else {
        panic!("应当生成最终报告");
    };
    assert_eq!(report.evaluated, 5);
    assert!(report.failed.is_empty());
    assert_eq!(report.text, "最终报告: 综合了 5 份评审");

    assert_eq!(backend.calls_for_role(DISPATCHER_ROLE), 1);
    assert_eq!(backend.calls_for_role(REPORTER_ROLE), 1);
    assert_eq!(specialist_calls(&backend), 5);

    let mut specialist_roles: Vec<String> = backend
        .requests()
        .into_iter()
        .filter(|r| r.role != DISPATCHER_ROLE && r.role != REPORTER_ROLE)
        .map(|r| r.role)
        .collect();
    specialist_roles.sort();
    specialist_roles.dedup();
    assert_eq!(specialist_roles.len(), 3);
}

#[tokio::test]
async fn test_report_concatenates_results_in_category_order() {
    let items = reference_items();
    let backend = Arc::new(ScriptedGenerator::for_pipeline(correct_dispatch_reply(&items)));
    let pipeline = pipeline_with(backend.clone(), FailurePolicy::Isolate);

    pipeline.run(&items).await.unwrap();

    let report_request = backend
        .requests()
        .into_iter()
        .find(|r| r.role == REPORTER_ROLE)
        .unwrap();
    let positions: Vec<usize> = ["시스템 아키텍처", "데이터베이스 암호화", "프로젝트 관리 방안", "투입 인력 계획", "비용 산정 내역"]
        .iter()
        .map(|topic| report_request.instruction.find(topic).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_empty_input_reports_no_work() {
    let backend = Arc::new(ScriptedGenerator::for_pipeline("{}"));
    let pipeline = pipeline_with(backend.clone(), FailurePolicy::Isolate);

    let outcome = pipeline.run(&[]).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::NoWork);
    assert_eq!(specialist_calls(&backend), 0);
    assert_eq!(backend.calls_for_role(REPORTER_ROLE), 0);
}

#[tokio::test]
async fn test_malformed_classification_reports_no_work() {
    let backend = Arc::new(ScriptedGenerator::for_pipeline("분류 결과: 기술, 관리, 가격"));
    let pipeline = pipeline_with(backend.clone(), FailurePolicy::Isolate);

    let outcome = pipeline.run(&reference_items()).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::NoWork);
    assert_eq!(backend.calls_for_role(DISPATCHER_ROLE), 1);
    assert_eq!(specialist_calls(&backend), 0);
    assert_eq!(backend.calls_for_role(REPORTER_ROLE), 0);
}

#[tokio::test]
async fn test_partial_batch_still_reports() {
    let items = reference_items();
    let backend = Arc::new(
        ScriptedGenerator::for_pipeline(correct_dispatch_reply(&items)).failing_on("비용 산정 내역"),
    );
    let pipeline = pipeline_with(backend.clone(), FailurePolicy::Isolate);

    let outcome = pipeline.run(&items).await.unwrap();

    let PipelineOutcome::Report(report) = outcome else {
        panic!("部分失败时仍应生成报告");
    };
    assert_eq!(report.evaluated, 4);
    assert_eq!(report.failed, vec!["비용 산정 내역".to_string()]);
    assert_eq!(report.text, "最终报告: 综合了 4 份评审");
}

#[tokio::test]
async fn test_fail_fast_aborts_run() {
    let items = reference_items();
    let backend = Arc::new(
        ScriptedGenerator::for_pipeline(correct_dispatch_reply(&items)).failing_on("비용 산정 내역"),
    );
    let pipeline = pipeline_with(backend.clone(), FailurePolicy::FailFast);

    let result = pipeline.run(&items).await;

    assert!(matches!(
        result,
        Err(PipelineError::Backend {
            phase: "Phase 2",
            ..
        })
    ));
    assert_eq!(backend.calls_for_role(REPORTER_ROLE), 0);
}

#[tokio::test]
async fn test_all_units_failing_is_an_error() {
    let items = vec![EvaluationItem::new("기술", "시스템 아키텍처", "MSA")];
    let backend = Arc::new(
        ScriptedGenerator::for_pipeline(correct_dispatch_reply(&items)).failing_on("시스템 아키텍처"),
    );
    let pipeline = pipeline_with(backend.clone(), FailurePolicy::Isolate);

    let result = pipeline.run(&items).await;

    assert!(matches!(result, Err(PipelineError::AllUnitsFailed { total: 1 })));
    assert_eq!(backend.calls_for_role(REPORTER_ROLE), 0);
}

#[tokio::test]
async fn test_sample_items_file_matches_reference() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/evaluation_items.toml");
    let items = tokio_test::assert_ok!(load_items_from_toml(&path).await);

    assert_eq!(items, reference_items());
    let groups = CategorizedGroups::group_by_category(&items);
    let sizes: Vec<usize> = groups.iter().map(|g| g.items.len()).collect();
    assert_eq!(groups.categories(), vec!["기술", "관리", "가격"]);
    assert_eq!(sizes, vec![2, 2, 1]);
}

/// 对真实后端运行完整流程
///
/// 运行方式：
/// ```bash
/// cargo test test_live_backend -- --ignored --nocapture
/// ```
#[tokio::test]
#[ignore]
async fn test_live_backend() {
    let _ = tracing_subscriber::fmt::try_init();

    let config = Config::from_env();
    let pipeline = EvaluationPipeline::from_config(
        &config,
        Arc::new(LlmService::new(&config)),
        Arc::new(PlaceholderContextProvider),
    );

    let outcome = pipeline.run(&reference_items()).await.expect("评审流程失败");

    match outcome {
        PipelineOutcome::Report(report) => {
            println!("{}", report.text);
            assert!(!report.text.is_empty());
        }
        PipelineOutcome::NoWork => println!("Dispatcher 输出无法解析，没有评审任务"),
    }
}
