//! The coverage graph: a DAG of `CoverageNode`s plus the four indexes
//! (`bubble_map`, `par_map`, `random_access`, `target_map`) that mapping and
//! genotyping consult. Nodes live in an arena (`petgraph::StableDiGraph`) and
//! are referred to everywhere else by stable `NodeIndex`, per the design note
//! on pointer-graphs-with-back-references.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::graph::node::CoverageNode;
use crate::prg::markers::{AlleleId, Marker, VariantLocus};

/// One entry of the random-access array: which node a PRG-string position
/// falls in, its offset within that node, and (for marker positions) the
/// variant locus it identifies.
#[derive(Debug, Clone, Copy)]
pub struct NodeAccess {
    pub node: NodeIndex,
    pub offset: usize,
    pub target: Option<VariantLocus>,
}

impl NodeAccess {
    pub fn new(node: NodeIndex, offset: usize, target: Option<VariantLocus>) -> Self {
        NodeAccess { node, offset, target }
    }
}

/// A marker reachable from another marker during backward search, with an
/// optional direct-deletion allele hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetedMarker {
    pub id: Marker,
    pub direct_deletion_allele: Option<AlleleId>,
}

impl TargetedMarker {
    pub fn new(id: Marker, direct_deletion_allele: Option<AlleleId>) -> Self {
        TargetedMarker {
            id,
            direct_deletion_allele,
        }
    }
}

pub struct CoverageGraph {
    pub(crate) graph: StableDiGraph<CoverageNode, ()>,
    pub(crate) root: NodeIndex,
    /// Site marker -> (start node, end node).
    pub(crate) bubble_starts: HashMap<Marker, NodeIndex>,
    pub(crate) bubble_map: HashMap<Marker, NodeIndex>,
    /// Site markers ordered innermost/rightmost first: children appear
    /// before their parents.
    pub(crate) bubble_order: Vec<Marker>,
    pub(crate) par_map: HashMap<Marker, VariantLocus>,
    pub(crate) random_access: Vec<NodeAccess>,
    pub(crate) target_map: HashMap<Marker, Vec<TargetedMarker>>,
    pub(crate) is_nested: bool,
}

impl CoverageGraph {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        graph: StableDiGraph<CoverageNode, ()>,
        root: NodeIndex,
        bubble_starts: HashMap<Marker, NodeIndex>,
        bubble_map: HashMap<Marker, NodeIndex>,
        bubble_order: Vec<Marker>,
        par_map: HashMap<Marker, VariantLocus>,
        random_access: Vec<NodeAccess>,
        target_map: HashMap<Marker, Vec<TargetedMarker>>,
        is_nested: bool,
    ) -> Self {
        CoverageGraph {
            graph,
            root,
            bubble_starts,
            bubble_map,
            bubble_order,
            par_map,
            random_access,
            target_map,
            is_nested,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> &CoverageNode {
        &self.graph[idx]
    }

    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges(idx)
            .map(|e| e.target())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn is_nested(&self) -> bool {
        self.is_nested
    }

    pub fn bubble_start(&self, site_marker: Marker) -> Option<NodeIndex> {
        self.bubble_starts.get(&site_marker).copied()
    }

    pub fn bubble_end(&self, site_marker: Marker) -> Option<NodeIndex> {
        self.bubble_map.get(&site_marker).copied()
    }

    /// Site markers in bubble-map order: every child site precedes its
    /// parent, so a bottom-up pass never needs recursion.
    pub fn bubbles_innermost_first(&self) -> &[Marker] {
        &self.bubble_order
    }

    pub fn parent_locus(&self, site_marker: Marker) -> Option<VariantLocus> {
        self.par_map.get(&site_marker).copied()
    }

    pub fn par_map(&self) -> &HashMap<Marker, VariantLocus> {
        &self.par_map
    }

    pub fn random_access(&self) -> &[NodeAccess] {
        &self.random_access
    }

    pub fn access_at(&self, prg_pos: usize) -> Option<&NodeAccess> {
        self.random_access.get(prg_pos)
    }

    pub fn target_map(&self) -> &HashMap<Marker, Vec<TargetedMarker>> {
        &self.target_map
    }

    pub fn targets_of(&self, marker: Marker) -> &[TargetedMarker] {
        self.target_map
            .get(&marker)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All nodes belonging to a given (site, allele), in graph order, used to
    /// collect an allele's full sequence for genotyped-site output.
    pub fn allele_nodes(&self, site_marker: Marker, allele_id: AlleleId) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                let n = &self.graph[idx];
                n.site_marker() == site_marker && n.allele_id() == allele_id
            })
            .collect();
        nodes.sort_by_key(|&idx| self.graph[idx].pos());
        nodes
    }

    /// Every (site, allele) pair any node in the graph belongs to, used to
    /// pre-populate per-allele coverage counters before mapping starts.
    pub fn known_loci(&self) -> Vec<VariantLocus> {
        let mut loci: Vec<VariantLocus> = self
            .graph
            .node_weights()
            .filter(|n| n.is_in_bubble())
            .map(|n| VariantLocus::new(n.site_marker(), n.allele_id()))
            .collect();
        loci.sort_unstable_by_key(|l| (l.marker, l.allele_id));
        loci.dedup();
        loci
    }

    /// Structural equality: same sequence, site/allele IDs and successors by
    /// content rather than by pointer identity.
    pub fn structurally_equal(&self, other: &CoverageGraph) -> bool {
        if self.graph.node_count() != other.graph.node_count() {
            return false;
        }
        let mut self_nodes: Vec<&CoverageNode> = self.graph.node_weights().collect();
        let mut other_nodes: Vec<&CoverageNode> = other.graph.node_weights().collect();
        self_nodes.sort_by_key(|n| n.pos());
        other_nodes.sort_by_key(|n| n.pos());
        self_nodes == other_nodes
    }
}
