use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use contextforge_common::config::AppConfig;
use contextforge_common::context::{
    build_baseline, classify as classify_intent, token_reduction_ratio, IntentResult,
    LlmAnswerGenerator, QueryOptions, QueryOutcome, QueryPipeline,
};
use contextforge_common::embeddings::create_embedder;
use contextforge_common::AppError;
use contextforge_search::VectorIndex;
use serde::Serialize;
use tracing::info;

use crate::cli::{ClassifyArgs, QueryArgs};

/// Baseline vs adaptive context for one question
#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    pub query: String,
    pub intent: IntentResult,
    pub baseline_tokens: usize,
    pub baseline_chunks: usize,
    pub compressed_tokens: usize,
    pub num_sentences: usize,
    pub token_reduction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_answer: Option<String>,
}

pub fn classify(args: ClassifyArgs) -> Result<()> {
    let result = classify_intent(&args.question);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn query(config: &AppConfig, args: QueryArgs) -> Result<()> {
    let pipeline = load_pipeline(config, &args)?;
    let outcome = pipeline.run(&args.question, &options(config, &args)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

pub async fn compare(config: &AppConfig, args: QueryArgs) -> Result<()> {
    let pipeline = load_pipeline(config, &args)?;
    let report = build_comparison(&pipeline, &args.question, &options(config, &args)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Query: {}", report.query);
    println!(
        "Intent: {} (confidence {:.2})",
        report.intent.intent, report.intent.confidence
    );
    println!(
        "Baseline: {} tokens from {} chunks",
        report.baseline_tokens, report.baseline_chunks
    );
    println!(
        "Adaptive: {} tokens from {} sentences",
        report.compressed_tokens, report.num_sentences
    );
    match report.token_reduction {
        Some(ratio) => println!("Token reduction: {:.1}%", ratio * 100.0),
        None => println!("Token reduction: n/a (empty baseline)"),
    }
    if let Some(answer) = &report.baseline_answer {
        println!("\nBaseline answer:\n{}", answer);
    }
    if let Some(answer) = &report.adaptive_answer {
        println!("\nAdaptive answer:\n{}", answer);
    }
    Ok(())
}

/// Run the baseline and the adaptive pipeline over the same retrieval
pub async fn build_comparison(
    pipeline: &QueryPipeline,
    query: &str,
    options: &QueryOptions,
) -> Result<ComparisonReport> {
    let embedding = pipeline.embedder().embed(query).await?;
    let baseline = build_baseline(&embedding, pipeline.retriever().as_ref(), options.top_k)?;
    let outcome = pipeline.run(query, options).await?;

    let baseline_answer = if options.generate_answer {
        let generator = pipeline.generator().ok_or_else(|| {
            AppError::configuration("Answer generation requested but no generator is configured")
        })?;
        Some(generator.generate(&baseline.context, query).await?)
    } else {
        None
    };

    Ok(ComparisonReport {
        query: query.to_string(),
        intent: outcome.intent,
        baseline_tokens: baseline.tokens,
        baseline_chunks: baseline.num_chunks,
        compressed_tokens: outcome.tokens_used,
        num_sentences: outcome.num_sentences,
        token_reduction: token_reduction_ratio(baseline.tokens, outcome.tokens_used),
        baseline_answer,
        adaptive_answer: outcome.answer,
    })
}

fn options(config: &AppConfig, args: &QueryArgs) -> QueryOptions {
    QueryOptions {
        top_k: args.top_k.unwrap_or(config.retrieval.top_k),
        token_limit: args.token_limit.unwrap_or(config.retrieval.token_limit),
        generate_answer: args.answer,
    }
}

fn load_pipeline(config: &AppConfig, args: &QueryArgs) -> Result<QueryPipeline> {
    let path = args
        .index
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.retrieval.index_path));
    let index = VectorIndex::load(&path)
        .with_context(|| format!("failed to load index {}", path.display()))?;

    let embedder = create_embedder(&config.embedding)?;
    index.ensure_compatible(embedder.as_ref())?;
    info!(chunks = index.len(), path = %path.display(), "Index loaded");

    let mut pipeline = QueryPipeline::new(embedder, Arc::new(index));
    if args.answer {
        let generator = LlmAnswerGenerator::from_config(&config.generation)?;
        pipeline = pipeline.with_generator(Arc::new(generator));
    }
    Ok(pipeline)
}

fn print_outcome(outcome: &QueryOutcome) {
    println!("Query: {}", outcome.query);
    println!(
        "Intent: {} (confidence {:.2})",
        outcome.intent.intent, outcome.intent.confidence
    );
    println!(
        "Tokens used: {} across {} sentences",
        outcome.tokens_used, outcome.num_sentences
    );
    println!("\nCompressed context:\n{}", outcome.compressed_context);
    if let Some(answer) = &outcome.answer {
        println!("\nAnswer:\n{}", answer);
    }
}
