//! A minimal VCF writer: one record per called site, 1-based coordinates
//! derived from the site's position in the coverage graph. Not a full
//! VCF-spec implementation (no header contig validation, no INFO/FORMAT
//! schema negotiation) — just enough to round-trip the fields this crate
//! defines.

use std::io::Write;
use std::path::Path;

use crate::errors::Result;
use crate::genotype::{GenotypeCall, GenotypedSite};
use crate::graph::CoverageGraph;
use crate::prg::markers::{decode_dna_bases, Marker};

pub fn write_vcf<P: AsRef<Path>>(path: P, graph: &CoverageGraph, calls: &std::collections::HashMap<Marker, GenotypedSite>) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);

    writeln!(writer, "##fileformat=VCFv4.2")?;
    writeln!(writer, "##source=gramalign")?;
    writeln!(writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE")?;

    let mut markers: Vec<&Marker> = calls.keys().collect();
    markers.sort_unstable();

    for &site_marker in markers {
        let site = &calls[site_marker];
        let pos = graph
            .bubble_start(*site_marker)
            .map(|idx| graph.node(idx).pos() + 1)
            .unwrap_or(0);

        let reference = site
            .alleles
            .first()
            .map(|a| decode_dna_bases(&a.sequence))
            .unwrap_or_default();
        let reference = if reference.is_empty() { "N".to_string() } else { reference };

        let alt: Vec<String> = site
            .alleles
            .iter()
            .skip(1)
            .map(|a| {
                let seq = decode_dna_bases(&a.sequence);
                if seq.is_empty() { "*".to_string() } else { seq }
            })
            .collect();
        let alt = if alt.is_empty() { ".".to_string() } else { alt.join(",") };

        let (gt, filter) = match &site.call {
            GenotypeCall::Called(alleles) => {
                let gt = alleles
                    .iter()
                    .map(|&a| (a.saturating_sub(1)).to_string())
                    .collect::<Vec<_>>()
                    .join("/");
                (gt, "PASS")
            }
            GenotypeCall::Null(_) => (".".to_string(), "NULL_CALL"),
        };

        writeln!(
            writer,
            "site{}\t{}\t.\t{}\t{}\t{:.2}\t{}\tDP={}\tGT\t{}",
            site_marker, pos, reference, alt, site.confidence, filter, site.total_depth, gt
        )?;
    }

    writer.flush()?;
    Ok(())
}
