//! Serialized form of the coverage graph, honoring the field order the
//! binary format's write-up mandates: bubble map first, then root, then
//! parental map, random-access array, target map, nested flag. With
//! arena-index storage there is no pointer recursion to protect against, but
//! the order is preserved anyway so the serialized shape still documents
//! (and a round-trip test still exercises) the original ordering
//! constraint.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::graph::coverage_graph::{CoverageGraph, NodeAccess, TargetedMarker};
use crate::graph::node::CoverageNode;
use crate::prg::markers::{AlleleId, Base, Marker, VariantLocus};

#[derive(Serialize, Deserialize)]
struct NodeDto {
    sequence: Vec<Base>,
    site_marker: Marker,
    allele_id: AlleleId,
    pos: usize,
    is_boundary: bool,
    coverage: Vec<u64>,
}

#[derive(Serialize, Deserialize)]
struct EdgeDto {
    from: usize,
    to: usize,
}

#[derive(Serialize, Deserialize)]
struct NodeAccessDto {
    node: usize,
    offset: usize,
    target: Option<VariantLocus>,
}

#[derive(Serialize, Deserialize)]
struct TargetedMarkerDto {
    id: Marker,
    direct_deletion_allele: Option<AlleleId>,
}

/// Field order matches the mandated on-disk layout even though arena indices
/// make the original stack-overflow hazard moot here.
#[derive(Serialize, Deserialize)]
struct GraphDto {
    bubble_map: HashMap<Marker, usize>,
    bubble_starts: HashMap<Marker, usize>,
    bubble_order: Vec<Marker>,
    root: usize,
    par_map: HashMap<Marker, VariantLocus>,
    random_access: Vec<NodeAccessDto>,
    target_map: HashMap<Marker, Vec<TargetedMarkerDto>>,
    is_nested: bool,
    nodes: Vec<NodeDto>,
    edges: Vec<EdgeDto>,
}

impl CoverageGraph {
    pub fn to_json(&self) -> Result<String> {
        let mut index_of: HashMap<NodeIndex, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(self.node_count());
        for idx in self.node_indices() {
            index_of.insert(idx, nodes.len());
            let n = self.node(idx);
            nodes.push(NodeDto {
                sequence: n.sequence().to_vec(),
                site_marker: n.site_marker(),
                allele_id: n.allele_id(),
                pos: n.pos(),
                is_boundary: n.is_boundary(),
                coverage: n.coverage_vec(),
            });
        }

        let mut edges = Vec::new();
        for &idx in index_of.keys() {
            for succ in self.successors(idx) {
                edges.push(EdgeDto {
                    from: index_of[&idx],
                    to: index_of[&succ],
                });
            }
        }

        let bubble_map = self
            .bubble_map
            .iter()
            .map(|(&m, &idx)| (m, index_of[&idx]))
            .collect();
        let bubble_starts = self
            .bubble_starts
            .iter()
            .map(|(&m, &idx)| (m, index_of[&idx]))
            .collect();
        let random_access = self
            .random_access
            .iter()
            .map(|a| NodeAccessDto {
                node: index_of[&a.node],
                offset: a.offset,
                target: a.target,
            })
            .collect();
        let target_map = self
            .target_map
            .iter()
            .map(|(&m, targets)| {
                (
                    m,
                    targets
                        .iter()
                        .map(|t| TargetedMarkerDto {
                            id: t.id,
                            direct_deletion_allele: t.direct_deletion_allele,
                        })
                        .collect(),
                )
            })
            .collect();

        let dto = GraphDto {
            bubble_map,
            bubble_starts,
            bubble_order: self.bubble_order.clone(),
            root: index_of[&self.root],
            par_map: self.par_map.clone(),
            random_access,
            target_map,
            is_nested: self.is_nested,
            nodes,
            edges,
        };

        Ok(serde_json::to_string_pretty(&dto)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let dto: GraphDto = serde_json::from_str(text)?;

        let mut graph: StableDiGraph<CoverageNode, ()> = StableDiGraph::new();
        let mut node_indices = Vec::with_capacity(dto.nodes.len());
        for n in &dto.nodes {
            let node = if n.is_boundary {
                if n.site_marker == 0 {
                    CoverageNode::root(n.pos)
                } else {
                    CoverageNode::boundary(n.pos, n.site_marker)
                }
            } else {
                CoverageNode::with_coverage(n.sequence.clone(), n.pos, n.site_marker, n.allele_id, n.coverage.clone())
            };
            node_indices.push(graph.add_node(node));
        }
        for e in &dto.edges {
            graph.update_edge(node_indices[e.from], node_indices[e.to], ());
        }

        let to_idx = |i: usize| node_indices[i];
        let bubble_map: HashMap<Marker, NodeIndex> = dto.bubble_map.into_iter().map(|(m, i)| (m, to_idx(i))).collect();
        let bubble_starts: HashMap<Marker, NodeIndex> =
            dto.bubble_starts.into_iter().map(|(m, i)| (m, to_idx(i))).collect();
        let random_access: Vec<NodeAccess> = dto
            .random_access
            .into_iter()
            .map(|a| NodeAccess::new(to_idx(a.node), a.offset, a.target))
            .collect();
        let target_map: HashMap<Marker, Vec<TargetedMarker>> = dto
            .target_map
            .into_iter()
            .map(|(m, targets)| {
                (
                    m,
                    targets
                        .into_iter()
                        .map(|t| TargetedMarker::new(t.id, t.direct_deletion_allele))
                        .collect(),
                )
            })
            .collect();

        Ok(CoverageGraph::new(
            graph,
            to_idx(dto.root),
            bubble_starts,
            bubble_map,
            dto.bubble_order,
            dto.par_map,
            random_access,
            target_map,
            dto.is_nested,
        ))
    }
}
