use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::snapshot::{AnalysisSnapshot, AnalysisState};
use repolens_chunker::{ChunkBuilder, FileContent};
use repolens_cluster::ClusterEngine;
use repolens_extractor::{
    content_hash, file_id, ExtractorRegistry, FileExtraction, FileExtractor, Language, Repository,
    SourceFile,
};
use repolens_graph::{EdgeEndpoint, GraphBuilder};
use repolens_vector_store::{EmbeddingCache, EmbeddingProvider, IndexSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One file as delivered by the ingest collaborator: path, language tag,
/// and content. Include/exclude filtering already happened upstream.
#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub path: String,
    pub language: Language,
    pub content: String,
}

/// A finalized (repo, commit) snapshot to analyze
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub repo: Repository,
    pub files: Vec<IngestedFile>,
}

/// Extraction results keyed by path, validated against the content hash;
/// lets a new commit skip re-parsing unchanged files
#[derive(Debug, Default)]
pub struct ExtractionCache {
    entries: HashMap<String, (String, FileExtraction)>,
}

impl ExtractionCache {
    pub fn get(&self, path: &str, hash: &str) -> Option<&FileExtraction> {
        self.entries
            .get(path)
            .filter(|(cached_hash, _)| cached_hash == hash)
            .map(|(_, extraction)| extraction)
    }

    pub fn insert(&mut self, path: String, hash: String, extraction: FileExtraction) {
        self.entries.insert(path, (hash, extraction));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable carry-over between analysis runs
#[derive(Default)]
pub struct AnalysisCaches {
    pub extractions: ExtractionCache,
    pub embeddings: EmbeddingCache,
}

/// The analysis pipeline: extract → symbol table → dependency graph →
/// module clustering → chunk → embed → index.
///
/// Extraction and embedding fan out over bounded worker pools; everything
/// between them is a single-threaded deterministic pass, and fan-out
/// results are re-sorted by path before aggregation so scheduling never
/// leaks into symbol IDs or the module tree.
pub struct AnalysisPipeline {
    config: PipelineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        config.validate().map_err(EngineError::Other)?;
        Ok(Self { config, embedder })
    }

    pub async fn run(
        &self,
        input: AnalysisInput,
        cancel: &CancellationToken,
    ) -> Result<AnalysisSnapshot> {
        let mut caches = AnalysisCaches::default();
        self.run_incremental(input, cancel, &mut caches).await
    }

    /// Like [`run`](Self::run), but consults and updates `caches` so
    /// unchanged files skip re-parsing and unchanged chunk texts skip the
    /// embedding provider.
    pub async fn run_incremental(
        &self,
        input: AnalysisInput,
        cancel: &CancellationToken,
        caches: &mut AnalysisCaches,
    ) -> Result<AnalysisSnapshot> {
        let mut files = input.files;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let mut repo = input.repo;

        log::info!(
            "analysis start: {} files for {}@{}",
            files.len(),
            repo.id,
            repo.commit
        );

        let source_files: Vec<SourceFile> = files
            .iter()
            .map(|f| SourceFile {
                id: file_id(&repo.id, &f.path),
                path: f.path.clone(),
                language: f.language,
                content_hash: content_hash(f.content.as_bytes()),
                byte_size: f.content.len() as u64,
            })
            .collect();

        let mut languages: Vec<Language> = source_files
            .iter()
            .map(|f| f.language)
            .filter(|l| *l != Language::Unknown)
            .collect();
        languages.sort();
        languages.dedup();
        repo.languages = languages;

        // Stage 1: extraction, embarrassingly parallel per file
        let mut diagnostics = Diagnostics {
            total_files: files.len(),
            ..Default::default()
        };
        let extractions = self
            .extract_stage(&files, &source_files, cancel, caches, &mut diagnostics)
            .await?;

        // Stages 2-4 are deterministic single-threaded passes
        let table = repolens_extractor::SymbolTable::build(&repo.id, &extractions);

        let build = GraphBuilder::new(&source_files).build(&table, &extractions);
        diagnostics.unresolved_references = build.unresolved;

        let file_set: std::collections::HashSet<&str> =
            source_files.iter().map(|f| f.path.as_str()).collect();
        build
            .graph
            .validate(|p| file_set.contains(p), |id| table.contains(id))
            .map_err(|e| EngineError::Other(e.to_string()))?;
        let graph_view = build.graph.view();

        let paths: Vec<String> = source_files.iter().map(|f| f.path.clone()).collect();
        let file_edges: Vec<(String, String)> = graph_view
            .edges
            .iter()
            .filter_map(|e| match (&e.source, &e.target) {
                (EdgeEndpoint::File(src), EdgeEndpoint::File(dst)) => {
                    Some((src.clone(), dst.clone()))
                }
                _ => None,
            })
            .collect();
        let modules = ClusterEngine::new(self.config.cluster.clone())?
            .cluster(&paths, &file_edges)?;

        // 100% module coverage is a hard invariant; indexing an
        // uncovered file would silently break downstream guarantees
        for path in &paths {
            if modules.module_of_file(path).is_none() {
                return Err(EngineError::coverage(format!(
                    "file not assigned to any module: {path}"
                )));
            }
        }

        // Stage 5: chunk and embed
        let contents: Vec<FileContent> = files
            .iter()
            .map(|f| FileContent {
                path: f.path.clone(),
                content: f.content.clone(),
            })
            .collect();
        let chunks = ChunkBuilder::new(self.config.chunks.clone())?.build(&contents, &table, &modules);

        let mut index = IndexSnapshot::new(
            repo.id.clone(),
            repo.commit.clone(),
            self.embedder.id(),
            self.embedder.dimension(),
            self.config.metric,
        );
        self.embed_stage(chunks, &mut index, cancel, caches).await?;

        diagnostics.finalize(self.config.coverage_threshold);

        // Symbols serialize in declaration order within path-sorted files
        let mut symbols = Vec::with_capacity(table.len());
        for path in &paths {
            symbols.extend(table.file_symbols(path).into_iter().cloned());
        }

        let entry_points = detect_entry_points(&paths);

        let state = AnalysisState {
            repo,
            files: source_files,
            symbols,
            graph: graph_view,
            modules,
            entry_points,
            diagnostics,
        };

        log::info!(
            "analysis complete: {} symbols, {} modules, {} chunks",
            state.symbols.len(),
            state.modules.modules.len(),
            index.len()
        );
        Ok(AnalysisSnapshot::new(state, index))
    }

    /// Parallel per-file extraction with an adaptive worker cap. Results
    /// are re-sorted by path before they feed the deterministic stages.
    async fn extract_stage(
        &self,
        files: &[IngestedFile],
        source_files: &[SourceFile],
        cancel: &CancellationToken,
        caches: &mut AnalysisCaches,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<(String, FileExtraction)>> {
        let registry = ExtractorRegistry::new();
        let max_concurrent = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(2, 8);

        let mut pending: Vec<&IngestedFile> = Vec::new();
        let mut extractions: Vec<(String, FileExtraction)> = Vec::new();

        for (file, source) in files.iter().zip(source_files.iter()) {
            if !registry.supports(file.language) {
                diagnostics.skipped_files.push(file.path.clone());
                continue;
            }
            diagnostics.eligible_files += 1;
            if let Some(cached) = caches.extractions.get(&file.path, &source.content_hash) {
                diagnostics.reused_files += 1;
                diagnostics.parsed_files += 1;
                extractions.push((file.path.clone(), cached.clone()));
            } else {
                pending.push(file);
            }
        }

        for batch in pending.chunks(max_concurrent) {
            // Per-file cancellation boundary: never abort mid-file
            if cancel.is_cancelled() {
                return Err(EngineError::Canceled);
            }

            let mut tasks = Vec::with_capacity(batch.len());
            for file in batch {
                let path = file.path.clone();
                let language = file.language;
                let content = file.content.clone();
                tasks.push(tokio::spawn(async move {
                    let result = FileExtractor::new(language)
                        .and_then(|mut ex| ex.extract(&path, &content))
                        .map_err(|e| e.to_string());
                    (path, result)
                }));
            }

            for task in tasks {
                match task.await {
                    Ok((path, Ok(extraction))) => {
                        diagnostics.parsed_files += 1;
                        let hash = source_files
                            .iter()
                            .find(|f| f.path == path)
                            .map(|f| f.content_hash.clone())
                            .unwrap_or_default();
                        caches
                            .extractions
                            .insert(path.clone(), hash, extraction.clone());
                        extractions.push((path, extraction));
                    }
                    Ok((path, Err(reason))) => {
                        log::warn!("parse failure in {path}: {reason}");
                        diagnostics.record_parse_failure(path, reason);
                    }
                    Err(e) => {
                        diagnostics.record_parse_failure("<task>", format!("worker panicked: {e}"));
                    }
                }
            }
        }

        extractions.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(extractions)
    }

    /// Batched embedding with cache reuse; cancellation is honored at
    /// batch boundaries, never mid-chunk
    async fn embed_stage(
        &self,
        chunks: Vec<repolens_chunker::Chunk>,
        index: &mut IndexSnapshot,
        cancel: &CancellationToken,
        caches: &mut AnalysisCaches,
    ) -> Result<()> {
        let provider_id = self.embedder.id().to_string();

        for batch in chunks.chunks(self.config.embed_batch_size) {
            if cancel.is_cancelled() {
                return Err(EngineError::Canceled);
            }

            let mut miss_texts: Vec<String> = Vec::new();
            let mut miss_positions: Vec<usize> = Vec::new();
            let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(batch.len());

            for (pos, chunk) in batch.iter().enumerate() {
                match caches.embeddings.get(&provider_id, &chunk.text) {
                    Some(vector) => vectors.push(Some(vector.clone())),
                    None => {
                        vectors.push(None);
                        miss_texts.push(chunk.text.clone());
                        miss_positions.push(pos);
                    }
                }
            }

            if !miss_texts.is_empty() {
                let embedded = self.embedder.embed_batch(&miss_texts).await?;
                for (slot, vector) in miss_positions.into_iter().zip(embedded.into_iter()) {
                    caches
                        .embeddings
                        .insert(&provider_id, &batch[slot].text, vector.clone());
                    vectors[slot] = Some(vector);
                }
            }

            for (chunk, vector) in batch.iter().zip(vectors.into_iter()) {
                let Some(vector) = vector else {
                    continue;
                };
                index.upsert(chunk.clone(), vector)?;
            }
        }
        Ok(())
    }
}

/// Conventionally named program entry files, for the repo summary
fn detect_entry_points(paths: &[String]) -> Vec<String> {
    const ENTRY_STEMS: &[&str] = &["main", "app", "index", "server", "cli", "manage", "__main__"];
    let mut found: Vec<String> = paths
        .iter()
        .filter(|p| {
            let stem = p
                .rsplit('/')
                .next()
                .and_then(|name| name.split('.').next())
                .unwrap_or("");
            ENTRY_STEMS.contains(&stem)
        })
        .cloned()
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_entry_points() {
        let paths = vec![
            "src/main.rs".to_string(),
            "src/lib.rs".to_string(),
            "app.py".to_string(),
            "pkg/__main__.py".to_string(),
            "web/index.ts".to_string(),
        ];
        let entries = detect_entry_points(&paths);
        assert_eq!(
            entries,
            vec!["app.py", "pkg/__main__.py", "src/main.rs", "web/index.ts"]
        );
    }

    #[test]
    fn test_extraction_cache_hash_guard() {
        let mut cache = ExtractionCache::default();
        cache.insert("a.py".into(), "hash1".into(), FileExtraction::default());
        assert!(cache.get("a.py", "hash1").is_some());
        assert!(cache.get("a.py", "hash2").is_none());
        assert!(cache.get("b.py", "hash1").is_none());
    }
}
