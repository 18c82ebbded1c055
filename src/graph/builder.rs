//! Single-pass construction of the coverage graph from a `PrgString`, plus
//! the second pass that builds the target map the search engine forks on.
//!
//! Grounded on gramtools' `cov_Graph_Builder`: a left-to-right walk
//! maintaining `backWire` (the most recent node awaiting an outgoing edge),
//! `cur_Node` (the node currently being filled with sequence) and
//! `cur_Locus` (the (site, allele) currently being recorded), with a stack of
//! such state to support nesting.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::errors::{GramError, Result};
use crate::graph::coverage_graph::{CoverageGraph, NodeAccess, TargetedMarker};
use crate::graph::node::CoverageNode;
use crate::prg::markers::{
    is_allele_marker, is_base, is_site_marker, site_marker_of, AlleleId, Marker, VariantLocus,
    ALLELE_UNKNOWN,
};
use crate::prg::string::PrgString;

/// Per-nesting-level bookkeeping kept on a stack while the site it describes
/// is open.
struct OpenSite {
    site_marker: Marker,
    start_node: NodeIndex,
    /// The node ending each allele seen so far, waiting to be wired to the
    /// bubble-end node once it exists.
    pending_allele_ends: Vec<NodeIndex>,
    allele_id: AlleleId,
    /// The (site, allele) context of the *enclosing* allele, recorded into
    /// the parental map if this site turns out to be nested.
    parent_locus: Option<VariantLocus>,
}

pub fn build_coverage_graph(prg: &PrgString) -> Result<CoverageGraph> {
    let mut graph: StableDiGraph<CoverageNode, ()> = StableDiGraph::new();
    let mut random_access: Vec<NodeAccess> = Vec::with_capacity(prg.len());
    let mut bubble_starts: HashMap<Marker, NodeIndex> = HashMap::new();
    let mut bubble_ends: HashMap<Marker, NodeIndex> = HashMap::new();
    let mut par_map: HashMap<Marker, VariantLocus> = HashMap::new();
    let mut is_nested = false;

    let root = graph.add_node(CoverageNode::root(0));
    let mut cur_node = graph.add_node(CoverageNode::new(Vec::new(), 0, 0, ALLELE_UNKNOWN));
    graph.update_edge(root, cur_node, ());
    let mut back_wire = cur_node;
    let mut open_sites: Vec<OpenSite> = Vec::new();
    // current (site, allele) context, used to populate the parental map for
    // any site opened while this is active.
    let mut cur_locus: Option<VariantLocus> = None;

    for (pos, &symbol) in prg.as_ints().iter().enumerate() {
        if is_base(symbol) {
            let node = &mut graph[cur_node];
            node.append(symbol as u8);
            let offset = node.sequence().len() - 1;
            random_access.push(NodeAccess::new(cur_node, offset, None));
            continue;
        }

        let marker: Marker = symbol;
        if is_site_marker(marker) {
            let already_open = open_sites.iter().any(|s| s.site_marker == marker);
            if !already_open {
                // Site entry: wire whatever sequence we've accumulated since
                // the last boundary, then open the bubble.
                if back_wire != cur_node {
                    graph.update_edge(back_wire, cur_node, ());
                }
                let start_node = graph.add_node(CoverageNode::boundary(pos, marker));
                graph.update_edge(cur_node, start_node, ());
                bubble_starts.insert(marker, start_node);

                if let Some(parent) = cur_locus {
                    par_map.insert(marker, parent);
                    is_nested = true;
                }

                random_access.push(NodeAccess::new(
                    start_node,
                    0,
                    Some(VariantLocus::new(marker, ALLELE_UNKNOWN)),
                ));

                let first_allele_locus = VariantLocus::new(marker, 1);
                open_sites.push(OpenSite {
                    site_marker: marker,
                    start_node,
                    pending_allele_ends: Vec::new(),
                    allele_id: 1,
                    parent_locus: cur_locus,
                });
                cur_locus = Some(first_allele_locus);
                cur_node = graph.add_node(CoverageNode::new(Vec::new(), pos + 1, marker, 1));
                graph.update_edge(start_node, cur_node, ());
                back_wire = cur_node;
            } else {
                // Site exit: close the final allele and wire everything to a
                // fresh bubble-end node.
                let mut open = open_sites.pop().unwrap();
                open.pending_allele_ends.push(cur_node);

                let end_node = graph.add_node(CoverageNode::boundary(pos, marker));
                for allele_end in &open.pending_allele_ends {
                    graph.update_edge(*allele_end, end_node, ());
                }
                bubble_ends.insert(marker, end_node);

                random_access.push(NodeAccess::new(
                    end_node,
                    0,
                    Some(VariantLocus::new(marker, ALLELE_UNKNOWN)),
                ));

                cur_locus = open.parent_locus;
                cur_node = graph.add_node(CoverageNode::new(
                    Vec::new(),
                    pos + 1,
                    cur_locus.map(|l| l.marker).unwrap_or(0),
                    cur_locus.map(|l| l.allele_id).unwrap_or(ALLELE_UNKNOWN),
                ));
                graph.update_edge(end_node, cur_node, ());
                back_wire = cur_node;
            }
        } else if is_allele_marker(marker) {
            let owner = site_marker_of(marker);
            let open = open_sites
                .iter_mut()
                .rfind(|s| s.site_marker == owner)
                .ok_or_else(|| GramError::MalformedPrg {
                    position: pos,
                    reason: format!("allele marker {} has no open site", marker),
                })?;
            open.pending_allele_ends.push(cur_node);
            open.allele_id += 1;

            random_access.push(NodeAccess::new(
                open.start_node,
                0,
                Some(VariantLocus::new(owner, open.allele_id)),
            ));

            cur_locus = Some(VariantLocus::new(owner, open.allele_id));
            cur_node = graph.add_node(CoverageNode::new(Vec::new(), pos + 1, owner, open.allele_id));
            graph.update_edge(open.start_node, cur_node, ());
            back_wire = cur_node;
        }
    }

    if !open_sites.is_empty() {
        return Err(GramError::MalformedPrg {
            position: prg.len(),
            reason: "unclosed site at end of PRG during graph construction".to_string(),
        });
    }

    let sink = graph.add_node(CoverageNode::root(prg.len()));
    graph.update_edge(back_wire, sink, ());

    let target_map = build_target_map(prg)?;

    let bubble_map: HashMap<Marker, NodeIndex> = bubble_starts
        .iter()
        .filter_map(|(&marker, &start)| bubble_ends.get(&marker).map(|&end| (marker, end)))
        .collect();

    // Innermost/rightmost bubbles first: a child site opens strictly later in
    // the PRG text than its parent, so sorting by start position descending
    // guarantees every child sorts before its parent.
    let mut bubble_order: Vec<Marker> = bubble_map.keys().copied().collect();
    bubble_order.sort_by_key(|m| std::cmp::Reverse(graph[bubble_starts[m]].pos()));

    Ok(CoverageGraph::new(
        graph,
        root,
        bubble_starts,
        bubble_map,
        bubble_order,
        par_map,
        random_access,
        target_map,
        is_nested,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    SiteEntry,
    SiteExit,
    AlleleSeparator,
}

fn build_target_map(prg: &PrgString) -> Result<HashMap<Marker, Vec<TargetedMarker>>> {
    let mut target_map: HashMap<Marker, Vec<TargetedMarker>> = HashMap::new();
    let mut opened: HashMap<Marker, bool> = HashMap::new();
    let mut cur_allele: HashMap<Marker, AlleleId> = HashMap::new();

    let markers: Vec<(usize, Marker)> = prg
        .as_ints()
        .iter()
        .enumerate()
        .filter(|&(_, &s)| !is_base(s))
        .map(|(pos, &s)| (pos, s))
        .collect();

    let classify = |marker: Marker, opened: &HashMap<Marker, bool>| -> MarkerKind {
        if is_allele_marker(marker) {
            MarkerKind::AlleleSeparator
        } else if *opened.get(&marker).unwrap_or(&false) {
            MarkerKind::SiteExit
        } else {
            MarkerKind::SiteEntry
        }
    };

    let mut prev: Option<(Marker, MarkerKind)> = None;
    for &(_, marker) in &markers {
        let kind = classify(marker, &opened);
        match kind {
            MarkerKind::SiteEntry => {
                opened.insert(marker, true);
                cur_allele.insert(marker, 1);
            }
            MarkerKind::AlleleSeparator => {
                let owner = site_marker_of(marker);
                *cur_allele.entry(owner).or_insert(1) += 1;
            }
            MarkerKind::SiteExit => {
                opened.insert(marker, false);
            }
        }

        if let Some((prev_marker, prev_kind)) = prev {
            let new_entry = match kind {
                MarkerKind::SiteEntry => TargetedMarker::new(marker, None),
                MarkerKind::SiteExit => {
                    // `marker` here already IS the site's own marker value
                    // (entry and exit share one odd id), so no
                    // allele-marker-to-site-marker conversion applies.
                    let direct_deletion = if prev_kind == MarkerKind::AlleleSeparator
                        && site_marker_of(prev_marker) == marker
                    {
                        Some(cur_allele[&marker])
                    } else {
                        None
                    };
                    TargetedMarker::new(marker, direct_deletion)
                }
                MarkerKind::AlleleSeparator => TargetedMarker::new(marker, None),
            };
            insert_target(&mut target_map, prev_marker, new_entry);
        }

        prev = Some((marker, kind));
    }

    Ok(target_map)
}

/// Keep the existing entry for `cur_m` unless the new one disambiguates a
/// direct deletion that the old one did not record.
fn insert_target(map: &mut HashMap<Marker, Vec<TargetedMarker>>, from: Marker, new_entry: TargetedMarker) {
    let entries = map.entry(from).or_default();
    if let Some(existing) = entries.iter_mut().find(|t| t.id == new_entry.id) {
        if existing.direct_deletion_allele.is_none() && new_entry.direct_deletion_allele.is_some() {
            existing.direct_deletion_allele = new_entry.direct_deletion_allele;
        }
    } else {
        entries.push(new_entry);
    }
}

