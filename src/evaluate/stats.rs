//! Summary statistics over a batch of scored evaluations.

use crate::evaluate::score::ScoredEvaluation;
use serde::Serialize;

/// Batch-level averages. Error-tagged cases count toward `total` and
/// `errors` but are excluded from every average; specificity averages also
/// exclude not-applicable cases.
#[derive(Debug, Serialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub completed: usize,
    pub errors: usize,
    pub average_score: f64,
    pub average_raw_score: f64,
    pub average_factual_correctness: f64,
    pub average_fact_coverage: f64,
    pub average_specificity: f64,
    pub specificity_na_count: usize,
    pub average_facts_covered: f64,
}

pub fn summarize(evaluations: &[ScoredEvaluation]) -> EvaluationSummary {
    let completed: Vec<&ScoredEvaluation> = evaluations.iter().filter(|e| !e.error).collect();
    let total = evaluations.len();
    let errors = total - completed.len();

    if completed.is_empty() {
        return EvaluationSummary {
            total,
            completed: 0,
            errors,
            average_score: 0.0,
            average_raw_score: 0.0,
            average_factual_correctness: 0.0,
            average_fact_coverage: 0.0,
            average_specificity: 0.0,
            specificity_na_count: 0,
            average_facts_covered: 0.0,
        };
    }

    let n = completed.len() as f64;
    let average_score = completed.iter().map(|e| e.score).sum::<f64>() / n;
    let average_raw_score = completed.iter().map(|e| e.raw_score).sum::<f64>() / n;
    let average_factual_correctness =
        completed.iter().map(|e| e.factual_correctness).sum::<f64>() / n;
    let average_fact_coverage = completed.iter().map(|e| e.fact_coverage).sum::<f64>() / n;
    let average_facts_covered = completed.iter().map(|e| e.facts_covered as f64).sum::<f64>() / n;

    let applicable: Vec<f64> = completed
        .iter()
        .filter(|e| !e.specificity_na)
        .map(|e| e.specificity)
        .collect();
    let specificity_na_count = completed.len() - applicable.len();
    let average_specificity = if applicable.is_empty() {
        0.0
    } else {
        applicable.iter().sum::<f64>() / applicable.len() as f64
    };

    EvaluationSummary {
        total,
        completed: completed.len(),
        errors,
        average_score,
        average_raw_score,
        average_factual_correctness,
        average_fact_coverage,
        average_specificity,
        specificity_na_count,
        average_facts_covered,
    }
}
