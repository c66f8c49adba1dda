use crate::error::{GraphError, Result};
use crate::types::{
    DependencyEdge, EdgeEndpoint, EdgeType, GraphNode, GraphView, NodeKind,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use repolens_extractor::Symbol;
use std::collections::{HashMap, HashSet};

/// Edge payload stored in the petgraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeData {
    pub edge_type: EdgeType,
    pub detail: Option<String>,
}

/// Dependency graph over files and symbols.
///
/// File-level `import` edges connect file nodes; `call`/`inherit`/`use`
/// edges connect symbol nodes, with cross-file symbol edges additionally
/// lifted to file edges. Every endpoint is an entity of the current run.
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, EdgeData>,
    file_index: HashMap<String, NodeIndex>,
    symbol_index: HashMap<String, NodeIndex>,
    /// (source, target, type) triples already present, to keep re-runs and
    /// repeated references from inflating edge counts
    edge_keys: HashSet<(NodeIndex, NodeIndex, EdgeType)>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            file_index: HashMap::new(),
            symbol_index: HashMap::new(),
            edge_keys: HashSet::new(),
        }
    }

    /// Add (or fetch) the node for a file path
    pub fn add_file_node(&mut self, path: &str) -> NodeIndex {
        if let Some(&idx) = self.file_index.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            id: path.to_string(),
            kind: NodeKind::File,
            label: path.to_string(),
            file_path: path.to_string(),
        });
        self.file_index.insert(path.to_string(), idx);
        idx
    }

    /// Add (or fetch) the node for a symbol
    pub fn add_symbol_node(&mut self, symbol: &Symbol) -> NodeIndex {
        if let Some(&idx) = self.symbol_index.get(&symbol.id) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            id: symbol.id.clone(),
            kind: NodeKind::Symbol,
            label: symbol.name.clone(),
            file_path: symbol.file_path.clone(),
        });
        self.symbol_index.insert(symbol.id.clone(), idx);
        idx
    }

    pub fn file_node(&self, path: &str) -> Option<NodeIndex> {
        self.file_index.get(path).copied()
    }

    pub fn symbol_node(&self, id: &str) -> Option<NodeIndex> {
        self.symbol_index.get(id).copied()
    }

    /// Add an edge unless the same (source, target, type) already exists
    pub fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        edge_type: EdgeType,
        detail: Option<String>,
    ) -> bool {
        if !self.edge_keys.insert((source, target, edge_type)) {
            return false;
        }
        self.graph.add_edge(source, target, EdgeData { edge_type, detail });
        true
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges as serializable records
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                let data = self.graph.edge_weight(e)?;
                Some(DependencyEdge {
                    source: self.endpoint_of(a),
                    target: self.endpoint_of(b),
                    edge_type: data.edge_type,
                    detail: data.detail.clone(),
                })
            })
            .collect()
    }

    /// Deterministically ordered projection for serialization and the
    /// service surface
    pub fn view(&self) -> GraphView {
        let mut nodes: Vec<GraphNode> = self
            .graph
            .node_indices()
            .filter_map(|i| self.graph.node_weight(i).cloned())
            .collect();
        nodes.sort_by(|a, b| (a.kind as u8, &a.id).cmp(&(b.kind as u8, &b.id)));

        let mut edges = self.edges();
        edges.sort_by(|a, b| {
            (&a.source, &a.target, a.edge_type.as_str())
                .cmp(&(&b.source, &b.target, b.edge_type.as_str()))
        });

        GraphView { nodes, edges }
    }

    /// File-level dependencies of a file: (outgoing, incoming), sorted
    pub fn file_dependencies(&self, path: &str) -> (Vec<DependencyEdge>, Vec<DependencyEdge>) {
        let Some(idx) = self.file_node(path) else {
            return (Vec::new(), Vec::new());
        };
        let mut out = self.collect_neighbors(idx, Direction::Outgoing);
        let mut inc = self.collect_neighbors(idx, Direction::Incoming);
        out.sort_by(|a, b| (&a.target, a.edge_type.as_str()).cmp(&(&b.target, b.edge_type.as_str())));
        inc.sort_by(|a, b| (&a.source, a.edge_type.as_str()).cmp(&(&b.source, b.edge_type.as_str())));
        (out, inc)
    }

    fn collect_neighbors(&self, idx: NodeIndex, dir: Direction) -> Vec<DependencyEdge> {
        self.graph
            .edges_directed(idx, dir)
            .map(|e| {
                use petgraph::visit::EdgeRef;
                DependencyEdge {
                    source: self.endpoint_of(e.source()),
                    target: self.endpoint_of(e.target()),
                    edge_type: e.weight().edge_type,
                    detail: e.weight().detail.clone(),
                }
            })
            .collect()
    }

    /// Verify every edge endpoint is backed by a known entity of this run
    pub fn validate(
        &self,
        file_exists: impl Fn(&str) -> bool,
        symbol_exists: impl Fn(&str) -> bool,
    ) -> Result<()> {
        for edge in self.edges() {
            for endpoint in [&edge.source, &edge.target] {
                let ok = match endpoint {
                    EdgeEndpoint::File(path) => file_exists(path),
                    EdgeEndpoint::Symbol(id) => symbol_exists(id),
                };
                if !ok {
                    return Err(GraphError::DanglingEndpoint(endpoint.id().to_string()));
                }
            }
        }
        Ok(())
    }

    fn endpoint_of(&self, idx: NodeIndex) -> EdgeEndpoint {
        let node = &self.graph[idx];
        match node.kind {
            NodeKind::File => EdgeEndpoint::File(node.id.clone()),
            NodeKind::Symbol => EdgeEndpoint::Symbol(node.id.clone()),
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
