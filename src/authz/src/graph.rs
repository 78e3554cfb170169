//! Resource containment graph
//!
//! Every definite name added to the graph contributes one node per segment
//! and one parent→child edge per adjacent segment pair. A node may have
//! several parents, so a bare `(Type, ID)` reference can resolve to more
//! than one fully-qualified name.
//!
//! ```text
//! team=acme ──► project=web ──► ws=abc123
//!                                  ▲
//! user=bob ────────────────────────┘
//! ```
//!
//! Here `ws=abc123` resolves to both `res:team=acme/project=web/ws=abc123`
//! and `res:user=bob/ws=abc123`.

use crate::config::GraphConfig;
use crate::error::{AuthzError, Result};
use crate::resource::{ResourceName, ResourceSegment};
use parking_lot::RwLock;
use petgraph::algo::has_path_connecting;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Edge weight: the parent contains the child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Containment;

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("contains")
    }
}

#[derive(Debug, Default)]
struct GraphState {
    graph: DiGraph<ResourceSegment, Containment>,
    index: HashMap<ResourceSegment, NodeIndex>,
}

impl GraphState {
    fn node_for(&mut self, segment: &ResourceSegment) -> NodeIndex {
        if let Some(&idx) = self.index.get(segment) {
            return idx;
        }
        let idx = self.graph.add_node(segment.clone());
        self.index.insert(segment.clone(), idx);
        idx
    }

    /// Fails if linking `segments` as a chain would close a cycle
    fn check_acyclic(&self, segments: &[ResourceSegment]) -> Result<()> {
        let mut seen = HashSet::with_capacity(segments.len());
        for segment in segments {
            if !seen.insert(segment) {
                return Err(AuthzError::CycleDetected(format!(
                    "segment {} appears twice in one name",
                    segment
                )));
            }
        }

        // New edges only run forward along the chain, so a cycle needs an
        // existing path from a later segment back to an earlier one.
        let existing: Vec<(usize, NodeIndex)> = segments
            .iter()
            .enumerate()
            .filter_map(|(pos, s)| self.index.get(s).map(|&idx| (pos, idx)))
            .collect();

        for &(i, earlier) in &existing {
            for &(j, later) in &existing {
                if j > i && has_path_connecting(&self.graph, later, earlier, None) {
                    return Err(AuthzError::CycleDetected(format!(
                        "{} already contains {}",
                        segments[j], segments[i]
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A parent→child edge in a [`GraphExport`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphEdge {
    pub parent: ResourceSegment,
    pub child: ResourceSegment,
}

/// Serializable snapshot of the graph, sorted for stable output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<ResourceSegment>,
    pub edges: Vec<GraphEdge>,
}

/// Thread-safe, append-only store of resource containment
///
/// # Examples
///
/// ```
/// use gatekeep_authz::graph::ResourceGraph;
/// use gatekeep_authz::resource::{ResourceName, ResourceSegment};
///
/// let graph = ResourceGraph::new();
/// graph.add(&ResourceName::new("res:team=acme/project=web/ws=abc123")).unwrap();
///
/// let names = graph.get_names(&ResourceSegment::new("ws", "abc123")).unwrap();
/// assert_eq!(names, vec![ResourceName::new("res:team=acme/project=web/ws=abc123")]);
/// ```
pub struct ResourceGraph {
    state: RwLock<GraphState>,
    config: GraphConfig,
}

impl ResourceGraph {
    /// Create an empty graph with default limits
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Register a definite name, linking its segments root-to-leaf
    ///
    /// Re-adding a known chain is a no-op. Nothing is modified when an
    /// error is returned.
    ///
    /// # Errors
    ///
    /// - `InvalidResourceName` if the name is malformed or not definite
    /// - `DepthExceeded` if the name is deeper than the configured maximum
    /// - `CycleDetected` if the chain would make the graph cyclic
    pub fn add(&self, name: &ResourceName) -> Result<()> {
        let parsed = name.parse_definite()?;
        let segments = parsed.segments();

        let max_depth = self.config.max_depth.get();
        if segments.len() > max_depth {
            return Err(AuthzError::DepthExceeded {
                name: name.to_string(),
                depth: segments.len(),
                max_depth,
            });
        }

        let mut state = self.state.write();
        state.check_acyclic(segments)?;

        let nodes_before = state.graph.node_count();
        let edges_before = state.graph.edge_count();

        let indices: Vec<NodeIndex> = segments.iter().map(|s| state.node_for(s)).collect();
        for pair in indices.windows(2) {
            if state.graph.find_edge(pair[0], pair[1]).is_none() {
                state.graph.add_edge(pair[0], pair[1], Containment);
            }
        }

        debug!(
            "Registered resource {}: {} new nodes, {} new edges",
            name,
            state.graph.node_count() - nodes_before,
            state.graph.edge_count() - edges_before
        );

        Ok(())
    }

    /// Resolve a bare segment into every fully-qualified name it has
    ///
    /// Returns an empty list for a segment the graph has never seen. Names
    /// are returned sorted.
    ///
    /// # Errors
    ///
    /// - `CycleDetected` if the ancestry walk revisits a node on its path
    /// - `PathLimitExceeded` if more than `max_resolved_paths` names exist
    pub fn get_names(&self, segment: &ResourceSegment) -> Result<Vec<ResourceName>> {
        let state = self.state.read();

        let Some(&start) = state.index.get(segment) else {
            debug!("Resource {} not found in graph", segment);
            return Ok(Vec::new());
        };

        let mut walk = AncestryWalk::new(
            &state.graph,
            segment,
            self.config.max_resolved_paths.get(),
        );
        walk.run(start)?;

        let mut names = walk.names;
        names.sort();

        debug!("Resolved {} to {} name(s)", segment, names.len());
        Ok(names)
    }

    /// Whether a node exists for `segment`
    pub fn contains(&self, segment: &ResourceSegment) -> bool {
        self.state.read().index.contains_key(segment)
    }

    pub fn node_count(&self) -> usize {
        self.state.read().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().graph.edge_count()
    }

    /// Snapshot the nodes and edges for diagnostics and fixtures
    pub fn export(&self) -> GraphExport {
        let state = self.state.read();

        let mut nodes: Vec<ResourceSegment> = state.graph.node_weights().cloned().collect();
        nodes.sort();

        let mut edges: Vec<GraphEdge> = state
            .graph
            .edge_indices()
            .filter_map(|e| state.graph.edge_endpoints(e))
            .map(|(parent, child)| GraphEdge {
                parent: state.graph[parent].clone(),
                child: state.graph[child].clone(),
            })
            .collect();
        edges.sort();

        GraphExport { nodes, edges }
    }

    /// Render the export as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }

    /// Render the graph in Graphviz DOT format
    pub fn to_dot(&self) -> String {
        let state = self.state.read();
        format!("{}", Dot::with_config(&state.graph, &[Config::EdgeNoLabel]))
    }
}

impl Default for ResourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first walk from a node up to every root
///
/// The walk keeps its own frame stack, so ancestry depth is bounded by
/// memory rather than by the thread's call stack.
struct AncestryWalk<'a> {
    graph: &'a DiGraph<ResourceSegment, Containment>,
    origin: &'a ResourceSegment,
    limit: usize,
    /// Leaf-to-root frames of the path being walked
    frames: Vec<Frame>,
    on_path: HashSet<NodeIndex>,
    names: Vec<ResourceName>,
}

/// A node on the current path and the parents still to visit
struct Frame {
    node: NodeIndex,
    parents: Vec<NodeIndex>,
    next: usize,
}

impl<'a> AncestryWalk<'a> {
    fn new(
        graph: &'a DiGraph<ResourceSegment, Containment>,
        origin: &'a ResourceSegment,
        limit: usize,
    ) -> Self {
        Self {
            graph,
            origin,
            limit,
            frames: Vec::new(),
            on_path: HashSet::new(),
            names: Vec::new(),
        }
    }

    fn run(&mut self, start: NodeIndex) -> Result<()> {
        self.enter(start)?;

        while let Some(frame) = self.frames.last_mut() {
            if let Some(&parent) = frame.parents.get(frame.next) {
                frame.next += 1;
                self.enter(parent)?;
            } else {
                let node = frame.node;
                self.frames.pop();
                self.on_path.remove(&node);
            }
        }

        Ok(())
    }

    /// Push `node` onto the path, emitting a name if it is a root
    fn enter(&mut self, node: NodeIndex) -> Result<()> {
        if !self.on_path.insert(node) {
            let trail = self
                .frames
                .iter()
                .map(|frame| self.graph[frame.node].to_string())
                .chain(std::iter::once(self.graph[node].to_string()))
                .collect::<Vec<_>>()
                .join(" <- ");
            warn!("Cycle found while resolving {}: {}", self.origin, trail);
            return Err(AuthzError::CycleDetected(trail));
        }

        let parents: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        let is_root = parents.is_empty();

        self.frames.push(Frame {
            node,
            parents,
            next: 0,
        });

        if is_root {
            self.emit()?;
        }
        Ok(())
    }

    fn emit(&mut self) -> Result<()> {
        if self.names.len() >= self.limit {
            return Err(AuthzError::PathLimitExceeded {
                segment: self.origin.clone(),
                limit: self.limit,
            });
        }

        let graph = self.graph;
        let name =
            ResourceName::from_segments(self.frames.iter().rev().map(|frame| &graph[frame.node]));
        self.names.push(name);
        Ok(())
    }
}
