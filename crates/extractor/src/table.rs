use crate::ids::symbol_id;
use crate::types::{FileExtraction, Symbol, SymbolKind};
use std::collections::{BTreeMap, HashMap};

/// Repo-wide symbol index, keyed by stable symbol ID.
///
/// Built once per analysis run from declaration-ordered per-file
/// extractions. Iteration orders are deterministic (BTreeMap-backed), so
/// repeated runs over the same input produce identical output.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
    /// Bare name -> candidate symbol IDs, sorted. Imports are declarations
    /// of foreign names and are not resolution candidates.
    by_name: BTreeMap<String, Vec<String>>,
    /// File path -> symbol IDs in declaration order
    by_file: BTreeMap<String, Vec<String>>,
}

impl SymbolTable {
    /// Assemble the table from per-file extractions.
    ///
    /// Input order does not matter; files are processed sorted by path and
    /// symbols within a file in declaration order, which also fixes the
    /// ordinal suffix used to split identical ID hashes.
    pub fn build(repo_id: &str, extractions: &[(String, FileExtraction)]) -> Self {
        let mut sorted: Vec<&(String, FileExtraction)> = extractions.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut table = Self::default();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (path, extraction) in sorted {
            let mut file_ids: Vec<String> = Vec::with_capacity(extraction.symbols.len());

            for record in &extraction.symbols {
                // Containers always precede their children in declaration
                // order, so the qualified prefix is already resolved.
                let qualified = match record.container {
                    Some(idx) => {
                        let container_name = extraction
                            .symbols
                            .get(idx)
                            .map(|c| c.name.as_str())
                            .unwrap_or_default();
                        qualified_name_of(extraction, idx, container_name, &record.name)
                    }
                    None => record.name.clone(),
                };

                let base = symbol_id(repo_id, path, record.kind.as_str(), &qualified);
                let ordinal = seen.entry(base.clone()).or_insert(0);
                let id = if *ordinal == 0 {
                    base.clone()
                } else {
                    format!("{base}-{ordinal}")
                };
                *ordinal += 1;

                let container_id = record
                    .container
                    .and_then(|idx| file_ids.get(idx).cloned());

                let symbol = Symbol {
                    id: id.clone(),
                    file_path: path.clone(),
                    kind: record.kind,
                    name: record.name.clone(),
                    signature: record.signature.clone(),
                    container: container_id,
                    line_start: record.line_start,
                    line_end: record.line_end,
                };

                if record.kind != SymbolKind::Import {
                    table
                        .by_name
                        .entry(record.name.clone())
                        .or_default()
                        .push(id.clone());
                }
                file_ids.push(id.clone());
                table.symbols.insert(id, symbol);
            }

            table.by_file.insert(path.clone(), file_ids);
        }

        for candidates in table.by_name.values_mut() {
            candidates.sort();
        }

        log::debug!(
            "symbol table built: {} symbols across {} files",
            table.symbols.len(),
            table.by_file.len()
        );
        table
    }

    /// Look up a symbol by ID
    pub fn get(&self, id: &str) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.symbols.contains_key(id)
    }

    /// Candidate IDs for a bare name, lexicographically sorted
    pub fn candidates(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Candidates narrowed by kind and/or declaring file
    pub fn candidates_matching(
        &self,
        name: &str,
        kind: Option<SymbolKind>,
        file: Option<&str>,
    ) -> Vec<&Symbol> {
        self.candidates(name)
            .iter()
            .filter_map(|id| self.symbols.get(id))
            .filter(|s| kind.is_none_or(|k| s.kind == k))
            .filter(|s| file.is_none_or(|f| s.file_path == f))
            .collect()
    }

    /// Symbol IDs declared in a file, in declaration order
    pub fn file_symbol_ids(&self, path: &str) -> &[String] {
        self.by_file.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbols declared in a file, in declaration order
    pub fn file_symbols(&self, path: &str) -> Vec<&Symbol> {
        self.file_symbol_ids(path)
            .iter()
            .filter_map(|id| self.symbols.get(id))
            .collect()
    }

    /// All symbols, ordered by ID
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Paths of all files with at least one symbol
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.by_file.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Qualified name: dotted container chain plus the symbol's own name
fn qualified_name_of(
    extraction: &FileExtraction,
    container_idx: usize,
    container_name: &str,
    name: &str,
) -> String {
    // Walk outward through the container chain; chains are short
    let mut parts = vec![name.to_string(), container_name.to_string()];
    let mut idx = container_idx;
    while let Some(parent) = extraction.symbols.get(idx).and_then(|r| r.container) {
        if let Some(record) = extraction.symbols.get(parent) {
            parts.push(record.name.clone());
        }
        idx = parent;
    }
    parts.reverse();
    parts.join(".")
}
