pub mod dispatcher;
pub mod reporter;
pub mod specialist;

pub use dispatcher::{decode_categorization, make_dispatcher, run_dispatch, DISPATCHER_ROLE};
pub use reporter::{concatenate_results, make_reporter, run_report, REPORTER_ROLE};
pub use specialist::{build_evaluation_plan, make_specialist, specialist_role, EvaluationPlan};
