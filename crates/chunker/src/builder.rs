use crate::config::ChunkConfig;
use crate::error::{ChunkerError, Result};
use crate::types::{estimate_tokens, Chunk, Granularity};
use repolens_cluster::ModuleTree;
use repolens_extractor::{SymbolKind, SymbolTable};

/// Most files listed verbatim in a module summary before eliding
const MODULE_SUMMARY_FILES: usize = 30;

/// A file path with its content, as handed over by the pipeline
#[derive(Debug, Clone)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

/// Builds the three chunk granularities from analysis state.
///
/// Output order is deterministic: files sorted by path, symbols in
/// declaration order, modules in id order.
pub struct ChunkBuilder {
    config: ChunkConfig,
}

impl ChunkBuilder {
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn build(
        &self,
        files: &[FileContent],
        table: &SymbolTable,
        tree: &ModuleTree,
    ) -> Vec<Chunk> {
        let mut sorted: Vec<&FileContent> = files.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));

        let mut chunks = Vec::new();
        for file in &sorted {
            let module_id = tree.module_of_file(&file.path).map(str::to_string);
            self.symbol_chunks(file, table, module_id.as_deref(), &mut chunks);
            self.file_chunks(file, table, module_id.as_deref(), &mut chunks);
        }
        self.module_chunks(table, tree, &mut chunks);

        log::debug!("built {} chunks from {} files", chunks.len(), files.len());
        chunks
    }

    fn symbol_chunks(
        &self,
        file: &FileContent,
        table: &SymbolTable,
        module_id: Option<&str>,
        out: &mut Vec<Chunk>,
    ) {
        let lines: Vec<&str> = file.content.lines().collect();

        for symbol in table.file_symbols(&file.path) {
            if !matches!(
                symbol.kind,
                SymbolKind::Class | SymbolKind::Function | SymbolKind::Method | SymbolKind::Module
            ) {
                continue;
            }
            let Some(text) = slice_lines(&lines, symbol.line_start, symbol.line_end) else {
                continue;
            };

            for (part, text, line_start, line_end) in
                self.split_by_lines(&text, symbol.line_start)
            {
                let tokens = estimate_tokens(&text);
                if tokens < self.config.min_chunk_tokens {
                    continue;
                }
                let id = if part == 0 {
                    format!("sym:{}", symbol.id)
                } else {
                    format!("sym:{}#p{part}", symbol.id)
                };
                out.push(Chunk {
                    id,
                    granularity: Granularity::Symbol,
                    module_id: module_id.map(str::to_string),
                    file_path: file.path.clone(),
                    symbol: Some(symbol.name.clone()),
                    symbol_id: Some(symbol.id.clone()),
                    line_start: Some(line_start),
                    line_end: Some(line_end),
                    text,
                    estimated_tokens: tokens,
                });
            }
        }
    }

    fn file_chunks(
        &self,
        file: &FileContent,
        table: &SymbolTable,
        module_id: Option<&str>,
        out: &mut Vec<Chunk>,
    ) {
        let total_lines = file.content.lines().count().max(1);
        let tokens = estimate_tokens(&file.content);

        if tokens <= self.config.max_chunk_tokens {
            if tokens >= self.config.min_chunk_tokens {
                out.push(self.file_chunk_part(
                    file,
                    module_id,
                    0,
                    file.content.clone(),
                    1,
                    total_lines,
                ));
            }
            return;
        }

        // Oversized: split at top-level declaration boundaries, falling
        // back to plain line windows for files without declarations
        let lines: Vec<&str> = file.content.lines().collect();
        let mut boundaries: Vec<usize> = table
            .file_symbols(&file.path)
            .iter()
            .filter(|s| s.container.is_none() && s.kind != SymbolKind::Import)
            .map(|s| s.line_start)
            .filter(|&l| l > 1 && l <= lines.len())
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        let segments = if boundaries.is_empty() {
            self.split_by_lines(&file.content, 1)
                .into_iter()
                .map(|(_, text, ls, le)| (text, ls, le))
                .collect()
        } else {
            self.pack_segments(&lines, &boundaries)
        };

        for (part, (text, line_start, line_end)) in segments.into_iter().enumerate() {
            if estimate_tokens(&text) < self.config.min_chunk_tokens {
                continue;
            }
            out.push(self.file_chunk_part(file, module_id, part, text, line_start, line_end));
        }
    }

    fn file_chunk_part(
        &self,
        file: &FileContent,
        module_id: Option<&str>,
        part: usize,
        text: String,
        line_start: usize,
        line_end: usize,
    ) -> Chunk {
        let id = if part == 0 {
            format!("file:{}", file.path)
        } else {
            format!("file:{}#p{part}", file.path)
        };
        let tokens = estimate_tokens(&text);
        Chunk {
            id,
            granularity: Granularity::File,
            module_id: module_id.map(str::to_string),
            file_path: file.path.clone(),
            symbol: None,
            symbol_id: None,
            line_start: Some(line_start),
            line_end: Some(line_end),
            text,
            estimated_tokens: tokens,
        }
    }

    fn module_chunks(&self, table: &SymbolTable, tree: &ModuleTree, out: &mut Vec<Chunk>) {
        for module in &tree.modules {
            let files = tree.subtree_files(&module.id);
            let Some(first_file) = files.first().cloned() else {
                continue;
            };

            let mut text = String::new();
            let location = if module.path_prefix.is_empty() {
                "repository root".to_string()
            } else {
                module.path_prefix.clone()
            };
            text.push_str(&format!("Module {} ({location})\n", module.name));
            text.push_str(&format!(
                "{} files, {} internal dependencies\n",
                module.stats.file_count, module.stats.internal_edges
            ));

            text.push_str("Files:\n");
            for path in files.iter().take(MODULE_SUMMARY_FILES) {
                text.push_str(&format!("- {path}\n"));
            }
            if files.len() > MODULE_SUMMARY_FILES {
                text.push_str(&format!(
                    "... and {} more files\n",
                    files.len() - MODULE_SUMMARY_FILES
                ));
            }

            let mut listed = 0;
            for path in &files {
                if listed >= self.config.module_summary_symbols {
                    break;
                }
                for symbol in table.file_symbols(path) {
                    if listed >= self.config.module_summary_symbols {
                        break;
                    }
                    if symbol.kind == SymbolKind::Import {
                        continue;
                    }
                    if listed == 0 {
                        text.push_str("Key symbols:\n");
                    }
                    let signature = symbol
                        .signature
                        .as_deref()
                        .unwrap_or(symbol.name.as_str());
                    text.push_str(&format!(
                        "- {} {} ({path}:{}) {signature}\n",
                        symbol.kind.as_str(),
                        symbol.name,
                        symbol.line_start
                    ));
                    listed += 1;
                }
            }

            let text = self.truncate_at_line(&text);
            out.push(Chunk {
                id: format!("module:{}", module.id),
                granularity: Granularity::Module,
                module_id: Some(module.id.clone()),
                file_path: first_file,
                symbol: None,
                symbol_id: None,
                line_start: None,
                line_end: None,
                estimated_tokens: estimate_tokens(&text),
                text,
            });
        }
    }

    /// Split text into budget-sized parts at line boundaries.
    /// Returns (part index, text, first line, last line) tuples.
    fn split_by_lines(&self, text: &str, first_line: usize) -> Vec<(usize, String, usize, usize)> {
        let max_chars = self.config.max_chunk_tokens * 4;
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut current_start = first_line;
        let mut line_no = first_line;

        for line in text.lines() {
            if !current.is_empty() && current.len() + line.len() + 1 > max_chars {
                parts.push((parts.len(), current.clone(), current_start, line_no - 1));
                current.clear();
                current_start = line_no;
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            line_no += 1;
        }
        if !current.is_empty() {
            parts.push((parts.len(), current, current_start, line_no - 1));
        }
        parts
    }

    /// Pack declaration-delimited segments greedily under the budget
    fn pack_segments(&self, lines: &[&str], boundaries: &[usize]) -> Vec<(String, usize, usize)> {
        let max_chars = self.config.max_chunk_tokens * 4;
        let mut cut_points: Vec<usize> = vec![1];
        cut_points.extend_from_slice(boundaries);
        cut_points.push(lines.len() + 1);
        cut_points.dedup();

        let mut packed = Vec::new();
        let mut current = String::new();
        let mut current_start = 1;

        for window in cut_points.windows(2) {
            let (from, to) = (window[0], window[1]);
            let segment = lines[from - 1..to - 1].join("\n");
            if !current.is_empty() && current.len() + segment.len() + 1 > max_chars {
                packed.push((current.clone(), current_start, from - 1));
                current.clear();
                current_start = from;
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(&segment);
        }
        if !current.is_empty() {
            packed.push((current, current_start, lines.len()));
        }
        packed
    }

    fn truncate_at_line(&self, text: &str) -> String {
        let max_chars = self.config.max_chunk_tokens * 4;
        if text.len() <= max_chars {
            return text.to_string();
        }
        let mut out = String::new();
        for line in text.lines() {
            if !out.is_empty() && out.len() + line.len() + 1 > max_chars {
                break;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(line);
        }
        out
    }
}

/// 1-indexed inclusive line slice
fn slice_lines(lines: &[&str], start: usize, end: usize) -> Option<String> {
    if start == 0 || start > lines.len() {
        return None;
    }
    let end = end.min(lines.len());
    Some(lines[start - 1..end].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use repolens_cluster::{ClusterConfig, ClusterEngine};
    use repolens_extractor::{FileExtraction, FileExtractor, Language};

    fn analyze(files: &[(&str, &str)]) -> (Vec<FileContent>, SymbolTable, ModuleTree) {
        let mut extractions: Vec<(String, FileExtraction)> = Vec::new();
        let mut contents = Vec::new();
        for (path, content) in files {
            let mut extractor = FileExtractor::new(Language::from_path(path)).unwrap();
            extractions.push((path.to_string(), extractor.extract(path, content).unwrap()));
            contents.push(FileContent {
                path: path.to_string(),
                content: content.to_string(),
            });
        }
        let table = SymbolTable::build("repo", &extractions);
        let paths: Vec<String> = files.iter().map(|(p, _)| p.to_string()).collect();
        let tree = ClusterEngine::new(ClusterConfig::default())
            .unwrap()
            .cluster(&paths, &[])
            .unwrap();
        (contents, table, tree)
    }

    #[test]
    fn test_three_granularities_emitted() {
        let (files, table, tree) = analyze(&[(
            "a.py",
            "def foo():\n    return 1\n\ndef bar():\n    return foo()\n",
        )]);
        let chunks = ChunkBuilder::new(ChunkConfig::default())
            .unwrap()
            .build(&files, &table, &tree);

        assert!(chunks.iter().any(|c| c.granularity == Granularity::Symbol));
        assert!(chunks.iter().any(|c| c.granularity == Granularity::File));
        assert!(chunks.iter().any(|c| c.granularity == Granularity::Module));
    }

    #[test]
    fn test_symbol_chunk_carries_citation_metadata() {
        let (files, table, tree) =
            analyze(&[("a.py", "def foo():\n    return 1\n")]);
        let chunks = ChunkBuilder::new(ChunkConfig::default())
            .unwrap()
            .build(&files, &table, &tree);

        let sym = chunks
            .iter()
            .find(|c| c.granularity == Granularity::Symbol)
            .unwrap();
        assert_eq!(sym.symbol.as_deref(), Some("foo"));
        assert_eq!(sym.file_path, "a.py");
        assert_eq!(sym.line_start, Some(1));
        assert_eq!(sym.module_id.as_deref(), Some("root"));

        let citation = sym.citation();
        assert_eq!(citation.symbol.as_deref(), Some("foo"));
        assert_eq!(citation.file_path, "a.py");
    }

    #[test]
    fn test_oversized_file_splits_at_declarations() {
        // Each function is ~40 tokens; a 16-token budget forces splits
        let mut source = String::new();
        for i in 0..6 {
            source.push_str(&format!(
                "def f{i}():\n    value = {i} * 10  # some padding text here\n    return value\n\n"
            ));
        }
        let (files, table, tree) = analyze(&[("big.py", source.as_str())]);

        let config = ChunkConfig {
            max_chunk_tokens: 16,
            ..Default::default()
        };
        let chunks = ChunkBuilder::new(config).unwrap().build(&files, &table, &tree);

        let file_parts: Vec<_> = chunks
            .iter()
            .filter(|c| c.granularity == Granularity::File)
            .collect();
        assert!(file_parts.len() > 1, "expected multiple file parts");

        // Every part starts at a declaration (or file start), never mid-line
        for part in &file_parts {
            let first = part.text.lines().next().unwrap_or("");
            assert!(
                first.starts_with("def ") || part.line_start == Some(1) || first.is_empty(),
                "part starts mid-declaration: {first:?}"
            );
        }
    }

    #[test]
    fn test_module_chunk_cites_member_file() {
        let (files, table, tree) = analyze(&[
            ("pkg/a.py", "def one():\n    pass\n"),
            ("pkg/b.py", "def two():\n    pass\n"),
        ]);
        let chunks = ChunkBuilder::new(ChunkConfig::default())
            .unwrap()
            .build(&files, &table, &tree);

        let module = chunks
            .iter()
            .find(|c| c.granularity == Granularity::Module)
            .unwrap();
        assert_eq!(module.file_path, "pkg/a.py");
        assert!(module.text.contains("pkg/b.py"));
        assert!(module.text.contains("one"));
    }

    #[test]
    fn test_chunk_ids_deterministic() {
        let input = &[("a.py", "def foo():\n    return 1\n")];
        let (files, table, tree) = analyze(input);
        let builder = ChunkBuilder::new(ChunkConfig::default()).unwrap();

        let first: Vec<String> = builder
            .build(&files, &table, &tree)
            .into_iter()
            .map(|c| c.id)
            .collect();
        let second: Vec<String> = builder
            .build(&files, &table, &tree)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_chunk_within_budget_or_unsplittable() {
        let mut source = String::new();
        for i in 0..20 {
            source.push_str(&format!("def gen{i}():\n    return {i}\n"));
        }
        let (files, table, tree) = analyze(&[("gen.py", source.as_str())]);
        let config = ChunkConfig {
            max_chunk_tokens: 24,
            ..Default::default()
        };
        let chunks = ChunkBuilder::new(config.clone())
            .unwrap()
            .build(&files, &table, &tree);

        for chunk in &chunks {
            // A single line can exceed the budget; multi-line chunks cannot
            if chunk.text.lines().count() > 1 {
                assert!(
                    chunk.estimated_tokens <= config.max_chunk_tokens * 2,
                    "{} is {} tokens",
                    chunk.id,
                    chunk.estimated_tokens
                );
            }
        }
    }
}
