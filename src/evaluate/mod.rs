//! Answer evaluation: judge client, response parsing, score aggregation,
//! and summary statistics.

pub mod cases;
pub mod judge;
pub mod response;
pub mod score;
pub mod stats;

pub use cases::{load_test_cases, prepare_test_cases, TestCase};
pub use judge::{build_prompt, load_prompt_template, JudgeClient};
pub use response::{EvaluatorResponse, Specificity};
pub use score::{aggregate, error_score, score_answer, ScoredEvaluation};
pub use stats::{summarize, EvaluationSummary};
