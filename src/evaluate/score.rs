//! Score aggregation: reduce a parsed judge response to one normalized score.

use crate::evaluate::response::{EvaluatorResponse, Specificity};
use serde::Serialize;

/// Aggregated evaluation for one test case.
///
/// `error: true` marks cases that produced no usable judge response; callers
/// exclude them from statistics instead of counting them as zero-scored
/// successes.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEvaluation {
    /// Normalized weighted score in [0, 1].
    pub score: f64,
    /// Unnormalized weighted sum in [0, 40] (legacy responses keep their raw 0-100 value).
    pub raw_score: f64,
    pub factual_correctness: f64,
    pub fact_coverage: f64,
    pub specificity: f64,
    /// True when the judge marked specificity as not applicable; the zero
    /// above then only feeds the weighted sum, not specificity averages.
    pub specificity_na: bool,
    pub facts_covered: usize,
    pub total_facts: usize,
    /// True when the judge reported more covered facts than exist; the count
    /// is kept unclamped so the discrepancy stays visible.
    pub facts_overreported: bool,
    pub analysis: String,
    pub error: bool,
}

/// Reduce a parsed judge response to a scored evaluation.
///
/// Weighted raw score = 2*factual + coverage + specificity (sentinel
/// specificity counts as 0), normalized by the 40-point maximum.
pub fn aggregate(response: &EvaluatorResponse, fact_count: usize) -> ScoredEvaluation {
    match response {
        EvaluatorResponse::Rubric(rubric) => {
            let factual = rubric.scores.factual_correctness;
            let coverage = rubric.scores.fact_coverage;
            let (specificity, specificity_na) = match rubric.scores.specificity {
                Specificity::Score(s) => (s, false),
                Specificity::NotApplicable => (0.0, true),
            };

            let raw_score = 2.0 * factual + coverage + specificity;

            let facts_covered = rubric
                .reasoning
                .as_ref()
                .map(|r| r.facts_found.len())
                .unwrap_or(0);
            let facts_overreported = facts_covered > fact_count;
            if facts_overreported {
                log::warn!(
                    "Judge reported {} facts covered but only {} facts exist",
                    facts_covered,
                    fact_count
                );
            }

            ScoredEvaluation {
                score: raw_score / 40.0,
                raw_score,
                factual_correctness: factual,
                fact_coverage: coverage,
                specificity,
                specificity_na,
                facts_covered,
                total_facts: fact_count,
                facts_overreported,
                analysis: rubric.summary.clone().unwrap_or_default(),
                error: false,
            }
        }
        EvaluatorResponse::Legacy(legacy) => ScoredEvaluation {
            score: legacy.score / 100.0,
            raw_score: legacy.score,
            factual_correctness: 0.0,
            fact_coverage: 0.0,
            specificity: 0.0,
            specificity_na: false,
            facts_covered: 0,
            total_facts: fact_count,
            facts_overreported: false,
            analysis: String::new(),
            error: false,
        },
    }
}

/// Zero score tagged as an error (unusable judge response or failed call).
pub fn error_score(fact_count: usize, analysis: impl Into<String>) -> ScoredEvaluation {
    ScoredEvaluation {
        score: 0.0,
        raw_score: 0.0,
        factual_correctness: 0.0,
        fact_coverage: 0.0,
        specificity: 0.0,
        specificity_na: false,
        facts_covered: 0,
        total_facts: fact_count,
        facts_overreported: false,
        analysis: analysis.into(),
        error: true,
    }
}

/// Score raw judge text. Never fails: unparsable responses become
/// error-tagged zero scores.
pub fn score_answer(text: &str, fact_count: usize) -> ScoredEvaluation {
    match EvaluatorResponse::parse(text) {
        Ok(response) => aggregate(&response, fact_count),
        Err(e) => {
            log::error!("Failed to parse judge response: {}", e);
            error_score(fact_count, e.to_string())
        }
    }
}
