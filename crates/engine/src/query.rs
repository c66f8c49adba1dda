use crate::config::AnswerConfig;
use crate::error::{EngineError, Result};
use crate::generation::{GenerationProvider, ModelConfig};
use crate::snapshot::{AnalysisSnapshot, Answer, SearchResult};
use repolens_chunker::Citation;
use repolens_vector_store::{EmbeddingProvider, SearchHit};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const SYSTEM_PROMPT: &str = "You are a codebase analysis assistant. Use only the provided \
evidence. Answer concisely and include only verifiable facts. Every claim you assert must be \
grounded in the evidence; reference the supporting evidence blocks with their [n] markers. \
If the evidence is insufficient, say so instead of guessing.";

/// Events emitted by a streaming answer. Citations always arrive first;
/// the stream ends with `Done` or `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerEvent {
    Citations(Vec<Citation>),
    Segment(String),
    Done,
    Error(String),
}

/// A running streamed answer. Dropping the receiver or triggering
/// `cancel` stops the underlying provider call.
pub struct AnswerStream {
    pub events: mpsc::Receiver<AnswerEvent>,
    pub cancel: CancellationToken,
}

/// Search and citation-constrained answering over an analysis snapshot.
///
/// Retrieval and answering share one embedding provider; the vectors in
/// the snapshot must come from the same provider or scores are garbage.
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    config: AnswerConfig,
}

impl QueryEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        config: AnswerConfig,
    ) -> Self {
        Self {
            embedder,
            generator,
            config,
        }
    }

    /// Semantic search; every result carries a citation
    pub async fn search(
        &self,
        snapshot: &AnalysisSnapshot,
        query: &str,
        module_scope: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let hits = self.retrieve(snapshot, query, module_scope, top_k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                chunk_id: hit.chunk.id.clone(),
                text: hit.chunk.text.clone(),
                score: hit.score,
                module_id: hit.chunk.module_id.clone(),
                citation: hit.chunk.citation(),
            })
            .collect())
    }

    /// Citation-constrained answer over the snapshot's index.
    ///
    /// Fails with [`EngineError::NoEvidence`] when nothing clears the
    /// relevance floor and with [`EngineError::ProviderUnavailable`] when
    /// the generation endpoint cannot be reached; it never fabricates
    /// citations.
    pub async fn answer(
        &self,
        snapshot: &AnalysisSnapshot,
        query: &str,
        module_scope: Option<&str>,
        max_evidence: Option<usize>,
        model: &ModelConfig,
    ) -> Result<Answer> {
        let evidence = self
            .admissible_evidence(snapshot, query, module_scope, max_evidence)
            .await?;

        let user_prompt = build_user_prompt(&evidence, query);
        let text = self
            .generator
            .complete(SYSTEM_PROMPT, &user_prompt, model)
            .await?;

        let citations = attribute_citations(&text, &evidence);
        Ok(Answer {
            answer: text,
            citations,
        })
    }

    /// Streaming variant: citations first, then text segments as the
    /// provider produces them. Canceling the returned token aborts the
    /// in-flight provider call.
    pub async fn answer_stream(
        &self,
        snapshot: &AnalysisSnapshot,
        query: &str,
        module_scope: Option<&str>,
        max_evidence: Option<usize>,
        model: &ModelConfig,
    ) -> Result<AnswerStream> {
        let evidence = self
            .admissible_evidence(snapshot, query, module_scope, max_evidence)
            .await?;
        let user_prompt = build_user_prompt(&evidence, query);
        let citations: Vec<Citation> = evidence.iter().map(|h| h.chunk.citation()).collect();

        let (event_tx, event_rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let generator = self.generator.clone();
        let model = model.clone();

        tokio::spawn(async move {
            if event_tx
                .send(AnswerEvent::Citations(dedup_citations(citations)))
                .await
                .is_err()
            {
                return;
            }

            let (segment_tx, mut segment_rx) = mpsc::channel::<String>(32);
            let forward_tx = event_tx.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(text) = segment_rx.recv().await {
                    if forward_tx.send(AnswerEvent::Segment(text)).await.is_err() {
                        break;
                    }
                }
            });

            let result = tokio::select! {
                _ = token.cancelled() => Err(EngineError::Canceled),
                result = generator.complete_stream(SYSTEM_PROMPT, &user_prompt, &model, segment_tx) => result,
            };
            let _ = forwarder.await;

            let event = match result {
                Ok(()) | Err(EngineError::Canceled) => AnswerEvent::Done,
                Err(e) => AnswerEvent::Error(e.to_string()),
            };
            let _ = event_tx.send(event).await;
        });

        Ok(AnswerStream {
            events: event_rx,
            cancel,
        })
    }

    /// Top-k retrieval with optional module scoping
    async fn retrieve(
        &self,
        snapshot: &AnalysisSnapshot,
        query: &str,
        module_scope: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| EngineError::provider_unavailable(format!("query embedding: {e}")))?;

        let scope: Option<HashSet<String>> = module_scope.map(|s| snapshot.module_scope_ids(s));
        let index = snapshot.index();
        let hits = index.search(&query_vector, top_k, |chunk| match &scope {
            Some(ids) => chunk
                .module_id
                .as_deref()
                .is_some_and(|m| ids.contains(m)),
            None => true,
        })?;
        Ok(hits)
    }

    /// Retrieval plus the relevance floor: the only text generation may
    /// draw claims from
    async fn admissible_evidence(
        &self,
        snapshot: &AnalysisSnapshot,
        query: &str,
        module_scope: Option<&str>,
        max_evidence: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let wanted = max_evidence.unwrap_or(self.config.default_max_evidence);
        let hits = self.retrieve(snapshot, query, module_scope, wanted).await?;
        let admitted: Vec<SearchHit> = hits
            .into_iter()
            .filter(|h| h.score >= self.config.relevance_floor)
            .collect();
        if admitted.is_empty() {
            return Err(EngineError::NoEvidence);
        }
        Ok(admitted)
    }
}

/// Numbered evidence blocks followed by the question
fn build_user_prompt(evidence: &[SearchHit], query: &str) -> String {
    let mut prompt = String::from("Evidence:\n");
    for (i, hit) in evidence.iter().enumerate() {
        let chunk = &hit.chunk;
        let location = match (chunk.line_start, chunk.line_end) {
            (Some(start), Some(end)) => format!("{}:{start}-{end}", chunk.file_path),
            _ => chunk.file_path.clone(),
        };
        let symbol = chunk
            .symbol
            .as_deref()
            .map(|s| format!(" ({s})"))
            .unwrap_or_default();
        prompt.push_str(&format!("\n[{}] {location}{symbol}\n{}\n", i + 1, chunk.text));
    }
    prompt.push_str(&format!("\nQuestion:\n{query}\n"));
    prompt
}

/// Citations for the evidence blocks the answer actually references via
/// [n] markers; when the model emits no markers, every admitted evidence
/// block is cited so a non-empty answer never arrives citation-free.
fn attribute_citations(answer: &str, evidence: &[SearchHit]) -> Vec<Citation> {
    let referenced: Vec<Citation> = evidence
        .iter()
        .enumerate()
        .filter(|(i, _)| answer.contains(&format!("[{}]", i + 1)))
        .map(|(_, hit)| hit.chunk.citation())
        .collect();

    let chosen = if referenced.is_empty() {
        evidence.iter().map(|h| h.chunk.citation()).collect()
    } else {
        referenced
    };
    dedup_citations(chosen)
}

fn dedup_citations(citations: Vec<Citation>) -> Vec<Citation> {
    let mut seen = HashSet::new();
    citations
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
