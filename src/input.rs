//! Readers for the alignment inputs
//!
//! All inputs are whitespace separated text with `#` comments:
//! * network edge list: `label_a label_b correlation` (a lone label declares a node)
//! * candidate matches: `query_label target_label weight`
//! * alignment: `query_label target_label [anything else]`

use anyhow::{anyhow, bail, Context, Result};
use flate2::read::MultiGzDecoder;
use log::{debug, warn};
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::graph::Graph;
use crate::matching_graph::{MatchingGraph, MatchingMap};

/// Open a file, decompressing `.gz` (gzip) and `.bgz` (BGZF) by extension
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let extension = path.extension().and_then(|ext| ext.to_str());
    match extension {
        Some("gz") => Ok(Box::new(BufReader::new(MultiGzDecoder::new(file)))),
        Some("bgz") => Ok(Box::new(BufReader::new(bgzf::io::reader::Reader::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

/// Iterate (line number, fields) over the non-comment, non-blank lines
fn records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, Vec<String>)>> {
    reader.lines().enumerate().filter_map(|(idx, line)| {
        let line = match line {
            Ok(line) => line,
            Err(e) => return Some(Err(anyhow!(e).context(format!("Failed to read line {}", idx + 1)))),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let fields = trimmed.split_whitespace().map(str::to_string).collect();
        Some(Ok((idx + 1, fields)))
    })
}

fn parse_weight(field: &str, line_no: usize) -> Result<f64> {
    let weight: f64 = field
        .parse()
        .with_context(|| format!("Line {line_no}: invalid weight '{field}'"))?;
    if !weight.is_finite() {
        bail!("Line {line_no}: weight must be finite, got {field}");
    }
    Ok(weight)
}

/// Parse a network edge list
pub fn read_graph<R: BufRead>(reader: R, name: &str) -> Result<Graph> {
    let mut graph = Graph::new(name);
    let mut out_of_range = 0usize;

    for record in records(reader) {
        let (line_no, fields) = record?;
        match fields.as_slice() {
            [label] => {
                graph.add_node(label);
            }
            [a, b, weight, ..] => {
                let weight = parse_weight(weight, line_no)?;
                if !(-1.0..=1.0).contains(&weight) {
                    out_of_range += 1;
                }
                graph
                    .add_labeled_edge(a, b, weight)
                    .with_context(|| format!("Line {line_no} of {name} network"))?;
            }
            _ => bail!(
                "Line {line_no} of {name} network: expected 'label label weight', got {} fields",
                fields.len()
            ),
        }
    }

    if out_of_range > 0 {
        warn!("{out_of_range} edges of the {name} network have correlations outside [-1, 1]");
    }
    debug!("Read {graph}");
    Ok(graph)
}

/// Read a network edge list from a file
pub fn read_graph_file<P: AsRef<Path>>(path: P, name: &str) -> Result<Graph> {
    let path = path.as_ref();
    read_graph(open_input(path)?, name).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Counts from loading candidate matches
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CandidateStats {
    pub added: usize,
    /// Lines naming a label missing from either network
    pub skipped: usize,
}

/// Parse candidate matches into bipartite edges of `matching_graph`
pub fn read_candidates<R: BufRead>(reader: R, matching_graph: &mut MatchingGraph) -> Result<CandidateStats> {
    let mut stats = CandidateStats::default();

    for record in records(reader) {
        let (line_no, fields) = record?;
        let [query_label, target_label, weight, ..] = fields.as_slice() else {
            bail!(
                "Line {line_no}: expected 'query_label target_label weight', got {} fields",
                fields.len()
            );
        };
        let weight = parse_weight(weight, line_no)?;

        let query = matching_graph.query().node(query_label);
        let target = matching_graph.target().node(target_label);
        let (Some(query), Some(target)) = (query, target) else {
            stats.skipped += 1;
            continue;
        };

        let red = matching_graph.red_for_query(query);
        let blue = matching_graph.blue_for_target(target);
        matching_graph
            .add_edge(red, blue, weight)
            .with_context(|| format!("Line {line_no} of candidate matches"))?;
        stats.added += 1;
    }

    if stats.skipped > 0 {
        warn!(
            "Skipped {} candidate matches naming genes absent from the networks",
            stats.skipped
        );
    }
    Ok(stats)
}

pub fn read_candidates_file<P: AsRef<Path>>(path: P, matching_graph: &mut MatchingGraph) -> Result<CandidateStats> {
    let path = path.as_ref();
    read_candidates(open_input(path)?, matching_graph)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse an alignment (one matched pair per line) into a matching
pub fn read_alignment<R: BufRead>(reader: R, matching_graph: &MatchingGraph) -> Result<MatchingMap> {
    let mut matching = MatchingMap::new(matching_graph);

    for record in records(reader) {
        let (line_no, fields) = record?;
        let [query_label, target_label, ..] = fields.as_slice() else {
            bail!("Line {line_no}: expected 'query_label target_label'");
        };

        let query = matching_graph
            .query()
            .node(query_label)
            .with_context(|| format!("Line {line_no}: unknown query gene '{query_label}'"))?;
        let target = matching_graph
            .target()
            .node(target_label)
            .with_context(|| format!("Line {line_no}: unknown target gene '{target_label}'"))?;

        let red = matching_graph.red_for_query(query);
        let blue = matching_graph.blue_for_target(target);
        let edge = matching_graph.edge_between(red, blue).with_context(|| {
            format!("Line {line_no}: no candidate match between '{query_label}' and '{target_label}'")
        })?;

        matching
            .insert(matching_graph, edge)
            .with_context(|| format!("Line {line_no} of alignment"))?;
    }

    Ok(matching)
}

pub fn read_alignment_file<P: AsRef<Path>>(path: P, matching_graph: &MatchingGraph) -> Result<MatchingMap> {
    let path = path.as_ref();
    read_alignment(open_input(path)?, matching_graph)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
