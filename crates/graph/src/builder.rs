use crate::graph::DependencyGraph;
use crate::resolve::resolve_import;
use crate::types::{EdgeType, UnresolvedReference};
use repolens_extractor::{
    FileExtraction, Language, ReferenceKind, SourceFile, SymbolKind, SymbolTable,
};
use std::collections::{BTreeSet, HashMap};

/// Everything the two-pass build produces: the graph itself plus the
/// references that were dropped, with reasons, for the diagnostics report.
pub struct GraphBuildOutput {
    pub graph: DependencyGraph,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Builds the dependency graph from extraction output.
///
/// Pass 1 resolves imports to file-level edges; pass 2 resolves call/
/// inherit/use references to symbol-level edges, lifting cross-file symbol
/// edges to file edges as well. Both passes tolerate unresolvable input:
/// a dropped reference is recorded, never a failure.
pub struct GraphBuilder {
    file_set: BTreeSet<String>,
    languages: HashMap<String, Language>,
}

impl GraphBuilder {
    pub fn new(files: &[SourceFile]) -> Self {
        Self {
            file_set: files.iter().map(|f| f.path.clone()).collect(),
            languages: files
                .iter()
                .map(|f| (f.path.clone(), f.language))
                .collect(),
        }
    }

    pub fn build(
        &self,
        table: &SymbolTable,
        extractions: &[(String, FileExtraction)],
    ) -> GraphBuildOutput {
        let mut graph = DependencyGraph::new();
        let mut unresolved = Vec::new();

        // Node insertion in sorted order keeps petgraph indices stable
        for path in &self.file_set {
            graph.add_file_node(path);
        }
        for symbol in table.iter() {
            if symbol.kind != SymbolKind::Import {
                graph.add_symbol_node(symbol);
            }
        }

        let mut sorted: Vec<&(String, FileExtraction)> = extractions.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, extraction) in &sorted {
            self.build_file_edges(path, extraction, &mut graph, &mut unresolved);
        }
        for (path, extraction) in &sorted {
            self.build_symbol_edges(path, extraction, table, &mut graph, &mut unresolved);
        }

        log::info!(
            "dependency graph: {} nodes, {} edges, {} unresolved references",
            graph.node_count(),
            graph.edge_count(),
            unresolved.len()
        );

        GraphBuildOutput { graph, unresolved }
    }

    fn build_file_edges(
        &self,
        path: &str,
        extraction: &FileExtraction,
        graph: &mut DependencyGraph,
        unresolved: &mut Vec<UnresolvedReference>,
    ) {
        let language = self
            .languages
            .get(path)
            .copied()
            .unwrap_or(Language::Unknown);

        for reference in &extraction.references {
            if reference.kind != ReferenceKind::Import {
                continue;
            }
            match resolve_import(language, path, &reference.name, &self.file_set) {
                Some(target) if target != *path => {
                    let source_idx = graph.add_file_node(path);
                    let target_idx = graph.add_file_node(&target);
                    graph.add_edge(
                        source_idx,
                        target_idx,
                        EdgeType::Import,
                        Some(reference.detail.clone()),
                    );
                }
                Some(_) => {}
                None => unresolved.push(UnresolvedReference {
                    file_path: path.to_string(),
                    name: reference.name.clone(),
                    kind: EdgeType::Import,
                    line: reference.line,
                    reason: "external or unresolvable import".to_string(),
                }),
            }
        }
    }

    fn build_symbol_edges(
        &self,
        path: &str,
        extraction: &FileExtraction,
        table: &SymbolTable,
        graph: &mut DependencyGraph,
        unresolved: &mut Vec<UnresolvedReference>,
    ) {
        let file_ids = table.file_symbol_ids(path);

        for reference in &extraction.references {
            let edge_type = match reference.kind {
                ReferenceKind::Call => EdgeType::Call,
                ReferenceKind::Inherit => EdgeType::Inherit,
                ReferenceKind::Use => EdgeType::Use,
                ReferenceKind::Import => continue,
            };

            // Top-level statements have no source symbol; nothing to edge
            let Some(source_id) = reference.container.and_then(|i| file_ids.get(i)) else {
                continue;
            };

            let Some(target_id) = self.resolve_candidate(table, &reference.name, path) else {
                unresolved.push(UnresolvedReference {
                    file_path: path.to_string(),
                    name: reference.name.clone(),
                    kind: edge_type,
                    line: reference.line,
                    reason: "no matching declaration".to_string(),
                });
                continue;
            };

            let (Some(source_idx), Some(target_idx)) = (
                graph.symbol_node(source_id),
                graph.symbol_node(&target_id),
            ) else {
                continue;
            };
            graph.add_edge(
                source_idx,
                target_idx,
                edge_type,
                Some(reference.detail.clone()),
            );

            // Lift cross-file symbol edges to the file level
            if let Some(target_path) = table.get(&target_id).map(|s| s.file_path.clone()) {
                if target_path != path {
                    let src_file = graph.add_file_node(path);
                    let dst_file = graph.add_file_node(&target_path);
                    graph.add_edge(src_file, dst_file, edge_type, None);
                }
            }
        }
    }

    /// Tie-break for ambiguous names: prefer a candidate in the same file,
    /// then the same directory, then the lexicographically first ID. The
    /// candidate list is pre-sorted, so "first" is deterministic.
    fn resolve_candidate(
        &self,
        table: &SymbolTable,
        name: &str,
        source_file: &str,
    ) -> Option<String> {
        let candidates = table.candidates(name);
        if candidates.is_empty() {
            return None;
        }

        let same_file = candidates
            .iter()
            .find(|id| table.get(id).is_some_and(|s| s.file_path == source_file));
        if let Some(id) = same_file {
            return Some(id.clone());
        }

        let source_dir = parent_dir(source_file);
        let same_dir = candidates
            .iter()
            .find(|id| table.get(id).is_some_and(|s| parent_dir(&s.file_path) == source_dir));
        if let Some(id) = same_dir {
            return Some(id.clone());
        }

        candidates.first().cloned()
    }
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}
