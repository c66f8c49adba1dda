use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use repolens_chunker::Citation;
use repolens_cluster::{Module, ModuleTree};
use repolens_extractor::{Repository, SourceFile, Symbol};
use repolens_graph::{DependencyEdge, EdgeEndpoint, GraphView};
use repolens_vector_store::IndexSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Everything an analysis run produced, minus the vector index (persisted
/// separately so the index artifact can be reloaded on its own).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisState {
    pub repo: Repository,
    pub files: Vec<SourceFile>,
    /// Declaration order within each file, files sorted by path
    pub symbols: Vec<Symbol>,
    pub graph: GraphView,
    pub modules: ModuleTree,
    pub entry_points: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// `GetSummary` response shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSummary {
    pub languages: Vec<String>,
    pub module_tree: ModuleTree,
    pub entry_points: Vec<String>,
}

/// `GetModule` response shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDetail {
    pub module: Module,
    pub files: Vec<String>,
    pub symbols: Vec<Symbol>,
    pub deps_in: Vec<DependencyEdge>,
    pub deps_out: Vec<DependencyEdge>,
}

/// One `Search` result; every result carries its citation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub module_id: Option<String>,
    pub citation: Citation,
}

/// `Answer` response shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

const STATE_FILE: &str = "state.json";
const INDEX_FILE: &str = "index.json";

/// An immutable, queryable view over one completed analysis run.
///
/// Lookup maps are rebuilt from the state on construction, so a snapshot
/// loaded from disk behaves identically to one fresh out of the pipeline.
#[derive(Debug)]
pub struct AnalysisSnapshot {
    state: AnalysisState,
    index: Arc<IndexSnapshot>,
    symbols_by_id: HashMap<String, usize>,
    symbols_by_file: HashMap<String, Vec<usize>>,
    file_paths: HashSet<String>,
}

impl AnalysisSnapshot {
    pub fn new(state: AnalysisState, index: IndexSnapshot) -> Self {
        let mut symbols_by_id = HashMap::with_capacity(state.symbols.len());
        let mut symbols_by_file: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, symbol) in state.symbols.iter().enumerate() {
            symbols_by_id.insert(symbol.id.clone(), idx);
            symbols_by_file
                .entry(symbol.file_path.clone())
                .or_default()
                .push(idx);
        }
        let file_paths = state.files.iter().map(|f| f.path.clone()).collect();
        Self {
            state,
            index: Arc::new(index),
            symbols_by_id,
            symbols_by_file,
            file_paths,
        }
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn repo(&self) -> &Repository {
        &self.state.repo
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.state.diagnostics
    }

    pub fn index(&self) -> Arc<IndexSnapshot> {
        self.index.clone()
    }

    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.symbols_by_id.get(id).map(|&i| &self.state.symbols[i])
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.file_paths.contains(path)
    }

    pub fn file_symbols(&self, path: &str) -> Vec<&Symbol> {
        self.symbols_by_file
            .get(path)
            .map(|indices| indices.iter().map(|&i| &self.state.symbols[i]).collect())
            .unwrap_or_default()
    }

    /// A citation is sound when its file is part of this run and its
    /// symbol, if named, is declared in that file
    pub fn citation_valid(&self, citation: &Citation) -> bool {
        if !self.has_file(&citation.file_path) {
            return false;
        }
        match &citation.symbol {
            None => true,
            Some(name) => self
                .file_symbols(&citation.file_path)
                .iter()
                .any(|s| &s.name == name),
        }
    }

    // -- service surface -------------------------------------------------

    pub fn summary(&self) -> RepoSummary {
        RepoSummary {
            languages: self
                .state
                .repo
                .languages
                .iter()
                .map(|l| l.as_str().to_string())
                .collect(),
            module_tree: self.state.modules.clone(),
            entry_points: self.state.entry_points.clone(),
        }
    }

    pub fn list_modules(&self) -> &[Module] {
        &self.state.modules.modules
    }

    pub fn module(&self, module_id: &str) -> Option<ModuleDetail> {
        let module = self.state.modules.get(module_id)?.clone();
        let files = self.state.modules.subtree_files(module_id);
        let file_set: HashSet<&str> = files.iter().map(String::as_str).collect();

        let mut symbols = Vec::new();
        for path in &files {
            symbols.extend(self.file_symbols(path).into_iter().cloned());
        }

        let mut deps_in = Vec::new();
        let mut deps_out = Vec::new();
        for edge in &self.state.graph.edges {
            let (EdgeEndpoint::File(src), EdgeEndpoint::File(dst)) = (&edge.source, &edge.target)
            else {
                continue;
            };
            let src_inside = file_set.contains(src.as_str());
            let dst_inside = file_set.contains(dst.as_str());
            if src_inside && !dst_inside {
                deps_out.push(edge.clone());
            } else if !src_inside && dst_inside {
                deps_in.push(edge.clone());
            }
        }

        Some(ModuleDetail {
            module,
            files,
            symbols,
            deps_in,
            deps_out,
        })
    }

    pub fn dependency_graph(&self) -> &GraphView {
        &self.state.graph
    }

    /// Chunk-admission set for a module scope: the scope module and all
    /// of its descendants. Unknown scopes admit nothing.
    pub fn module_scope_ids(&self, scope: &str) -> HashSet<String> {
        self.state
            .modules
            .descendant_ids(scope)
            .into_iter()
            .collect()
    }

    /// Plain token-match search over chunk text; the fallback ranking
    /// when semantic search is not wanted
    pub fn search_keyword(
        &self,
        query: &str,
        module_scope: Option<&str>,
        top_k: usize,
    ) -> Vec<SearchResult> {
        let tokens: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| t.len() >= 2)
            .map(str::to_string)
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }
        let scope = module_scope.map(|s| self.module_scope_ids(s));

        let mut scored: Vec<SearchResult> = self
            .index
            .chunks()
            .filter(|chunk| match &scope {
                Some(ids) => chunk
                    .module_id
                    .as_deref()
                    .is_some_and(|m| ids.contains(m)),
                None => true,
            })
            .filter_map(|chunk| {
                let haystack = chunk.text.to_lowercase();
                let hits: usize = tokens
                    .iter()
                    .map(|t| haystack.matches(t.as_str()).count().min(5))
                    .sum();
                if hits == 0 {
                    return None;
                }
                Some(SearchResult {
                    chunk_id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    score: hits as f32,
                    module_id: chunk.module_id.clone(),
                    citation: chunk.citation(),
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        scored.truncate(top_k);
        scored
    }

    // -- persistence -----------------------------------------------------

    /// Persist state and index under `dir` (keyed by commit by the caller)
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let data = serde_json::to_vec(&self.state)?;
        let state_path = dir.join(STATE_FILE);
        let tmp = state_path.with_extension("tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &state_path).await?;

        self.index.save(dir.join(INDEX_FILE)).await?;
        Ok(())
    }

    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let state_path = dir.join(STATE_FILE);
        if !state_path.exists() {
            return Err(EngineError::Other(format!(
                "no analysis state at {}",
                state_path.display()
            )));
        }
        let data = tokio::fs::read(&state_path).await?;
        let state: AnalysisState = serde_json::from_slice(&data)?;
        let index = IndexSnapshot::load(dir.join(INDEX_FILE)).await?;
        Ok(Self::new(state, index))
    }
}
