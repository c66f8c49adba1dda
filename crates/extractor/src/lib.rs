//! # Repolens Extractor
//!
//! Language-pluggable symbol extraction and the repo-wide symbol table.
//!
//! ## Architecture
//!
//! ```text
//! Source File
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Tree-sitter Parsing → AST
//!     │
//!     ├──> Symbol Walk
//!     │    ├─> Declarations in declaration order
//!     │    └─> Raw import/call/inherit/use references
//!     │
//!     └──> SymbolTable
//!          ├─> Stable sha256-derived IDs
//!          ├─> name → candidate IDs index
//!          └─> file → declaration-order index
//! ```
//!
//! Extractors are looked up through an [`ExtractorRegistry`] constructed
//! once per run; there is no process-wide parser state. A parse failure on
//! one file never aborts a batch — callers record it and move on.

mod error;
mod extract;
mod ids;
mod language;
mod table;
mod types;

pub use error::{ExtractError, Result};
pub use extract::{last_segment, ExtractorRegistry, FileExtractor};
pub use ids::{content_hash, file_id, symbol_id};
pub use language::Language;
pub use table::SymbolTable;
pub use types::{
    FileExtraction, RawReference, ReferenceKind, Repository, SourceFile, Symbol, SymbolKind,
    SymbolRecord,
};
