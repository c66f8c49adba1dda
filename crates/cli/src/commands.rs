use crate::workspace;
use anyhow::{bail, Result};
use repolens_engine::{
    AnalysisPipeline, AnswerConfig, AnswerEvent, EmbeddingProvider, EngineError,
    HttpGenerationProvider, PipelineConfig, QueryEngine,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the full pipeline over `root` and persist the snapshot
pub async fn analyze(root: &Path, repo_id: Option<String>) -> Result<()> {
    let input = workspace::ingest(root, repo_id)?;
    let commit = input.repo.commit.clone();

    let embedder = workspace::embedder_from_env()?;
    let pipeline = AnalysisPipeline::new(PipelineConfig::default(), embedder)
        .map_err(|e| anyhow::anyhow!(e))?;

    let cancel = CancellationToken::new();
    let snapshot = pipeline.run(input, &cancel).await?;

    let dir = workspace::snapshot_dir(root, &commit);
    snapshot.save(&dir).await?;
    workspace::write_latest(root, &commit)?;

    let state = snapshot.state();
    let diagnostics = snapshot.diagnostics();
    print_json(&json!({
        "repo_id": state.repo.id,
        "commit": commit,
        "files": state.files.len(),
        "symbols": state.symbols.len(),
        "modules": state.modules.modules.len(),
        "chunks": snapshot.index().len(),
        "coverage_ratio": diagnostics.coverage_ratio(),
        "coverage_ok": diagnostics.coverage_ok,
        "parse_failures": diagnostics.parse_failures,
        "unresolved_references": diagnostics.unresolved_references.len(),
        "saved_to": dir.display().to_string(),
    }))
}

pub async fn summary(root: &Path) -> Result<()> {
    let snapshot = workspace::load_latest(root).await?;
    print_json(&snapshot.summary())
}

pub async fn modules(root: &Path) -> Result<()> {
    let snapshot = workspace::load_latest(root).await?;
    print_json(&snapshot.list_modules())
}

pub async fn module(root: &Path, module_id: &str) -> Result<()> {
    let snapshot = workspace::load_latest(root).await?;
    match snapshot.module(module_id) {
        Some(detail) => print_json(&detail),
        None => bail!("module not found: {module_id}"),
    }
}

pub async fn graph(root: &Path) -> Result<()> {
    let snapshot = workspace::load_latest(root).await?;
    print_json(snapshot.dependency_graph())
}

pub async fn search(
    root: &Path,
    query: &str,
    scope: Option<String>,
    top_k: usize,
    keyword: bool,
) -> Result<()> {
    let snapshot = workspace::load_latest(root).await?;

    if keyword {
        return print_json(&snapshot.search_keyword(query, scope.as_deref(), top_k));
    }

    let embedder = workspace::embedder_from_env()?;
    ensure_provider_matches(&snapshot, embedder.id())?;
    let engine = QueryEngine::new(
        embedder,
        Arc::new(HttpGenerationProvider::new(0).map_err(|e| anyhow::anyhow!(e))?),
        AnswerConfig::default(),
    );
    let results = engine
        .search(&snapshot, query, scope.as_deref(), top_k)
        .await?;
    print_json(&results)
}

pub async fn answer(
    root: &Path,
    query: &str,
    scope: Option<String>,
    max_evidence: Option<usize>,
    stream: bool,
) -> Result<()> {
    let snapshot = workspace::load_latest(root).await?;
    let model = workspace::model_from_env()?;
    let embedder = workspace::embedder_from_env()?;
    ensure_provider_matches(&snapshot, embedder.id())?;

    let config = AnswerConfig::default();
    let engine = QueryEngine::new(
        embedder,
        Arc::new(HttpGenerationProvider::new(config.max_retries).map_err(|e| anyhow::anyhow!(e))?),
        config,
    );

    if stream {
        let mut streaming = engine
            .answer_stream(&snapshot, query, scope.as_deref(), max_evidence, &model)
            .await
            .map_err(map_answer_error)?;
        while let Some(event) = streaming.events.recv().await {
            match event {
                AnswerEvent::Citations(citations) => {
                    eprintln!("{}", serde_json::to_string(&citations)?);
                }
                AnswerEvent::Segment(text) => {
                    use std::io::Write;
                    print!("{text}");
                    std::io::stdout().flush().ok();
                }
                AnswerEvent::Done => println!(),
                AnswerEvent::Error(e) => bail!("generation failed: {e}"),
            }
        }
        return Ok(());
    }

    let answer = engine
        .answer(&snapshot, query, scope.as_deref(), max_evidence, &model)
        .await
        .map_err(map_answer_error)?;
    print_json(&answer)
}

/// Typed answer failures become user-facing messages instead of traces
fn map_answer_error(e: EngineError) -> anyhow::Error {
    match e {
        EngineError::NoEvidence => {
            anyhow::anyhow!("insufficient information: no indexed content matched the question")
        }
        EngineError::ProviderUnavailable { detail } => {
            anyhow::anyhow!("generation provider unavailable (retryable): {detail}")
        }
        other => other.into(),
    }
}

/// The index only answers queries embedded by the provider that built it
fn ensure_provider_matches(
    snapshot: &repolens_engine::AnalysisSnapshot,
    embedder_id: &str,
) -> Result<()> {
    let built_with = &snapshot.index().provider_id;
    if built_with != embedder_id {
        bail!(
            "index was built with embedding provider '{built_with}' but '{embedder_id}' is \
             configured; re-run `repolens analyze` or adjust EMBEDDING_* settings"
        );
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
