use crate::language::Language;
use serde::{Deserialize, Serialize};

/// A repository snapshot under analysis. Immutable once analysis of a commit starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    /// Repository identifier
    pub id: String,

    /// Source locator (URL or local path)
    pub source: String,

    /// Branch name
    pub branch: String,

    /// Commit SHA the snapshot was taken at
    pub commit: String,

    /// Languages discovered in the snapshot
    pub languages: Vec<Language>,
}

/// A single analyzed source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    /// Stable file identifier derived from (repo, path)
    pub id: String,

    /// Repository-relative path, '/'-separated
    pub path: String,

    /// Detected language
    pub language: Language,

    /// Content hash (sha256 hex) for change detection
    pub content_hash: String,

    /// Size in bytes
    pub byte_size: u64,
}

/// Kind of a named code entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Method,
    Variable,
    Import,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Variable => "variable",
            Self::Import => "import",
        }
    }
}

/// A symbol as emitted by an extractor, before repo-wide IDs are assigned.
///
/// `container` is the index of the enclosing record within the same file's
/// declaration-ordered symbol list; the symbol table resolves it to an ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolRecord {
    pub kind: SymbolKind,
    pub name: String,
    pub signature: Option<String>,
    pub container: Option<usize>,
    pub line_start: usize,
    pub line_end: usize,
}

/// A fully identified symbol in the repo-wide table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Symbol {
    /// Stable identifier, identical across runs on the same commit
    pub id: String,

    /// Repository-relative path of the declaring file
    pub file_path: String,

    pub kind: SymbolKind,
    pub name: String,

    /// Declaration signature (first line of the declaration)
    pub signature: Option<String>,

    /// Enclosing symbol ID, resolved by lookup (never an owning pointer)
    pub container: Option<String>,

    /// 1-indexed declaration line range
    pub line_start: usize,
    pub line_end: usize,
}

/// Kind of a raw reference found at a use site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Import,
    Call,
    Inherit,
    Use,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Call => "call",
            Self::Inherit => "inherit",
            Self::Use => "use",
        }
    }
}

/// An unresolved reference statement found by an extractor.
///
/// `name` is the bare target (last path segment); `detail` keeps the full
/// reference text for diagnostics and import resolution. `container` indexes
/// the enclosing symbol record, when any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawReference {
    pub kind: ReferenceKind,
    pub name: String,
    pub detail: String,
    pub line: usize,
    pub container: Option<usize>,
}

/// Extraction output for one file: symbols in declaration order plus the
/// raw references downstream resolution passes consume.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileExtraction {
    pub symbols: Vec<SymbolRecord>,
    pub references: Vec<RawReference>,
}

impl FileExtraction {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.references.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_kind_as_str() {
        assert_eq!(SymbolKind::Class.as_str(), "class");
        assert_eq!(SymbolKind::Method.as_str(), "method");
        assert_eq!(ReferenceKind::Inherit.as_str(), "inherit");
    }

    #[test]
    fn test_file_extraction_is_empty() {
        assert!(FileExtraction::default().is_empty());
        let ex = FileExtraction {
            symbols: vec![SymbolRecord {
                kind: SymbolKind::Function,
                name: "f".into(),
                signature: None,
                container: None,
                line_start: 1,
                line_end: 2,
            }],
            references: vec![],
        };
        assert!(!ex.is_empty());
    }
}
