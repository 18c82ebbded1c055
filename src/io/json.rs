//! Per-site JSON output mirroring the nested-site bookkeeping the tool
//! exposes: alleles, coverages, genotype indices, log-likelihoods,
//! haplogroups, and the site nesting tree.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::errors::Result;
use crate::genotype::{GenotypeCall, GenotypedSite};
use crate::graph::CoverageGraph;
use crate::prg::markers::{decode_dna_bases, AlleleId, Marker};

#[derive(Serialize)]
struct SiteRecord {
    #[serde(rename = "ALS")]
    alleles: Vec<String>,
    #[serde(rename = "GT")]
    genotype: Option<Vec<AlleleId>>,
    #[serde(rename = "HAPG")]
    haplogroups: Vec<AlleleId>,
    #[serde(rename = "COVS")]
    coverages: Vec<f64>,
    #[serde(rename = "DP")]
    depth: u64,
    #[serde(rename = "NULL_REASON")]
    null_reason: Option<String>,
    best_log_likelihood: f64,
    runner_up_log_likelihood: f64,
    confidence: f64,
}

#[derive(Serialize)]
struct GenotypeReport {
    #[serde(rename = "Lvl1_Sites")]
    lvl1_sites: Vec<Marker>,
    #[serde(rename = "Child_map")]
    child_map: HashMap<String, Vec<Marker>>,
    sites: HashMap<String, SiteRecord>,
}

pub fn write_json_report<P: AsRef<Path>>(path: P, graph: &CoverageGraph, calls: &HashMap<Marker, GenotypedSite>) -> Result<()> {
    let mut lvl1_sites = Vec::new();
    let mut child_map: HashMap<String, Vec<Marker>> = HashMap::new();

    for &site_marker in graph.bubbles_innermost_first() {
        match graph.parent_locus(site_marker) {
            None => lvl1_sites.push(site_marker),
            Some(parent_locus) => {
                child_map.entry(parent_locus.to_string()).or_default().push(site_marker);
            }
        }
    }
    lvl1_sites.sort_unstable();

    let mut sites = HashMap::new();
    for (&site_marker, site) in calls {
        let (genotype, null_reason) = match &site.call {
            GenotypeCall::Called(alleles) => (Some(alleles.clone()), None),
            GenotypeCall::Null(reason) => (None, Some(format!("{:?}", reason))),
        };
        let alleles = site.alleles.iter().map(|a| decode_dna_bases(&a.sequence)).collect();
        let haplogroups = site.alleles.iter().map(|a| a.haplogroup).collect();
        let coverages = site
            .alleles
            .iter()
            .map(|a| site.per_allele_coverage.get(&a.allele_id).copied().unwrap_or(0.0))
            .collect();

        sites.insert(
            site_marker.to_string(),
            SiteRecord {
                alleles,
                genotype,
                haplogroups,
                coverages,
                depth: site.total_depth,
                null_reason,
                best_log_likelihood: site.best_log_likelihood,
                runner_up_log_likelihood: site.runner_up_log_likelihood,
                confidence: site.confidence,
            },
        );
    }

    let report = GenotypeReport {
        lvl1_sites,
        child_map,
        sites,
    };

    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;
    Ok(())
}
