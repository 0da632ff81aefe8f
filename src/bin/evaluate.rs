//! Evaluation CLI: judge each test case's system answer against its
//! ground-truth facts and write aggregated scores.

use clap::Parser;
use prbench::evaluate::{
    build_prompt, error_score, load_prompt_template, load_test_cases, prepare_test_cases, score_answer,
    summarize, JudgeClient, ScoredEvaluation, TestCase,
};
use prbench::Config;
use serde::Serialize;
use std::path::PathBuf;

/// Evaluate system answers against ground-truth facts with an LLM judge.
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
struct Args {
    /// Path to the test cases JSON file.
    #[arg(long, default_value = "data/test_cases.json")]
    cases: PathBuf,

    /// Field holding the system's answer in each test case.
    #[arg(long, default_value = "system_answer")]
    answer_field: String,

    /// Output path for the JSON results.
    #[arg(long, default_value = "evaluation_results.json")]
    output: PathBuf,

    /// Prompt template override (defaults to evaluation.prompt_file from config).
    #[arg(long)]
    prompt: Option<PathBuf>,
}

/// One test case together with its scored evaluation, as persisted.
#[derive(Serialize)]
struct EvaluationRecord {
    #[serde(flatten)]
    test_case: TestCase,
    evaluation: ScoredEvaluation,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    // Missing credentials abort before any case is touched
    let api_key = config.judge_api_key()?;
    let judge = JudgeClient::new(
        api_key,
        config.evaluation.model.clone(),
        config.evaluation.max_tokens,
    )?;

    let prompt_path = args.prompt.as_ref().unwrap_or(&config.evaluation.prompt_file);
    let template = load_prompt_template(prompt_path)?;

    let raw = load_test_cases(&args.cases)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", args.cases.display(), e))?;
    let cases = prepare_test_cases(raw, &args.answer_field)?;

    println!("Evaluating {} test cases with {}\n", cases.len(), config.evaluation.model);

    let mut evaluations = Vec::with_capacity(cases.len());
    let total = cases.len();

    for (index, case) in cases.iter().enumerate() {
        let evaluation = if case.system_answer.is_empty() {
            log::warn!("{}: no system answer, tallying as error", case.id);
            error_score(case.facts.len(), "No system answer provided")
        } else {
            let prompt = build_prompt(
                &template,
                &case.question,
                &case.ground_truth,
                &case.facts,
                &case.system_answer,
            );
            match judge
                .evaluate_answer(&prompt, config.evaluation.max_retries)
                .await
            {
                Ok(text) => score_answer(&text, case.facts.len()),
                Err(e) => {
                    log::error!("Judge call failed for case {}: {}", case.id, e);
                    error_score(case.facts.len(), format!("API error: {}", e))
                }
            }
        };

        if evaluation.error {
            println!(
                "  [{}/{}] {}: Error - {}",
                index + 1,
                total,
                case.id,
                truncate(&evaluation.analysis, 60)
            );
        } else {
            let specificity = if evaluation.specificity_na {
                "N/A".to_string()
            } else {
                format!("{:.1}", evaluation.specificity)
            };
            println!(
                "  [{}/{}] {}: Score={:.3} [{:.0}/40] (F={:.1}, C={:.1}, S={})",
                index + 1,
                total,
                case.id,
                evaluation.score,
                evaluation.raw_score,
                evaluation.factual_correctness,
                evaluation.fact_coverage,
                specificity
            );
        }

        evaluations.push(evaluation);
    }

    let summary = summarize(&evaluations);

    let records: Vec<EvaluationRecord> = cases
        .into_iter()
        .zip(evaluations)
        .map(|(test_case, evaluation)| EvaluationRecord { test_case, evaluation })
        .collect();

    let output = serde_json::json!({
        "summary": summary,
        "results": records,
    });
    std::fs::write(&args.output, serde_json::to_string_pretty(&output)?)?;

    println!("\n=== Evaluation Summary ===");
    println!("Total cases:   {}", summary.total);
    println!("Completed:     {}", summary.completed);
    if summary.errors > 0 {
        println!("Errors:        {} (excluded from averages)", summary.errors);
    }
    println!("Average score: {:.3} ({:.1}/40 raw)", summary.average_score, summary.average_raw_score);
    println!("Factual (2x):  {:.2}", summary.average_factual_correctness);
    println!("Coverage (1x): {:.2}", summary.average_fact_coverage);
    if summary.specificity_na_count > 0 {
        println!(
            "Specificity:   {:.2} ({} N/A cases)",
            summary.average_specificity, summary.specificity_na_count
        );
    } else {
        println!("Specificity:   {:.2}", summary.average_specificity);
    }
    println!("Facts covered: {:.1} average", summary.average_facts_covered);
    println!("\nResults saved to: {}", args.output.display());

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
