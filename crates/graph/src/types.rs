use serde::{Deserialize, Serialize};

/// Kind of dependency between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// File-level import
    Import,
    /// A calls B
    Call,
    /// A extends/implements B
    Inherit,
    /// A references B (attribute/type use)
    Use,
}

impl EdgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Call => "call",
            Self::Inherit => "inherit",
            Self::Use => "use",
        }
    }
}

/// One endpoint of a dependency edge: a file path or a symbol ID.
///
/// Both endpoints of every materialized edge refer to entities produced in
/// the same analysis run; anything else is dropped during the build and
/// recorded as unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EdgeEndpoint {
    File(String),
    Symbol(String),
}

impl EdgeEndpoint {
    pub fn id(&self) -> &str {
        match self {
            Self::File(id) | Self::Symbol(id) => id,
        }
    }
}

/// A resolved dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: EdgeEndpoint,
    pub target: EdgeEndpoint,
    pub edge_type: EdgeType,
    /// Original reference text (dotted path, module specifier, ...)
    pub detail: Option<String>,
}

/// A reference that could not be resolved to an in-repo entity. Recorded
/// for diagnostics, never materialized as an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub file_path: String,
    pub name: String,
    pub kind: EdgeType,
    pub line: usize,
    pub reason: String,
}

/// Node payload in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// File path for file nodes, symbol ID for symbol nodes
    pub id: String,
    pub kind: NodeKind,
    /// Human-readable label (file path or symbol name)
    pub label: String,
    /// Declaring file (equals `id` for file nodes)
    pub file_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Symbol,
}

/// Serializable projection of the whole graph, deterministically ordered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<DependencyEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_type_as_str() {
        assert_eq!(EdgeType::Import.as_str(), "import");
        assert_eq!(EdgeType::Inherit.as_str(), "inherit");
    }

    #[test]
    fn test_endpoint_id() {
        assert_eq!(EdgeEndpoint::File("a.py".into()).id(), "a.py");
        assert_eq!(EdgeEndpoint::Symbol("abc123".into()).id(), "abc123");
    }

    #[test]
    fn test_edge_serialization_round_trip() {
        let edge = DependencyEdge {
            source: EdgeEndpoint::File("b.py".into()),
            target: EdgeEndpoint::File("a.py".into()),
            edge_type: EdgeType::Import,
            detail: Some("import a".into()),
        };
        let json = serde_json::to_string(&edge).unwrap();
        let back: DependencyEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(edge, back);
    }
}
