//! CSV reports of an alignment
//!
//! Every report shares one scan over the matched pairs. Each unordered pair of
//! matched pairs (self-pairs included) is classified by which of the two input
//! graphs has an edge between its members, and each report kind emits exactly
//! one class. The alignment listing is the exception: one row per match.

use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::graph::{EdgeId, NodeId};
use crate::matching_graph::{BpEdge, MatchingGraph, MatchingMap};

/// Kind of CSV report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Edges present in both graphs
    Matched,
    /// Target edges with no query counterpart
    UnmatchedInQuery,
    /// Query edges with no target counterpart
    UnmatchedInTarget,
    /// The matching itself
    Alignment,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Matched,
        ReportKind::UnmatchedInQuery,
        ReportKind::UnmatchedInTarget,
        ReportKind::Alignment,
    ];

    /// File name suffix appended to the output prefix
    pub fn extension(&self) -> &'static str {
        match self {
            ReportKind::Matched => "-matched.csv",
            ReportKind::UnmatchedInQuery => "-unmatched1.csv",
            ReportKind::UnmatchedInTarget => "-unmatched2.csv",
            ReportKind::Alignment => "-alignment.csv",
        }
    }

    /// Suffix for a report kind given by name; unknown names get a bare ".csv"
    pub fn extension_for(name: &str) -> &'static str {
        name.parse::<ReportKind>()
            .map(|kind| kind.extension())
            .unwrap_or(".csv")
    }

    fn header<'a>(&self, labels: &'a ColumnLabels) -> Vec<&'a str> {
        match self {
            ReportKind::Matched => vec![
                labels.query_node.as_str(),
                labels.query_node.as_str(),
                labels.query_weight.as_str(),
                labels.target_node.as_str(),
                labels.target_node.as_str(),
                labels.target_weight.as_str(),
            ],
            ReportKind::UnmatchedInQuery => vec![
                labels.target_node.as_str(),
                labels.target_node.as_str(),
                labels.target_weight.as_str(),
                labels.query_node.as_str(),
                labels.query_node.as_str(),
            ],
            ReportKind::UnmatchedInTarget => vec![
                labels.query_node.as_str(),
                labels.query_node.as_str(),
                labels.query_weight.as_str(),
                labels.target_node.as_str(),
                labels.target_node.as_str(),
            ],
            ReportKind::Alignment => vec![
                labels.query_node.as_str(),
                labels.target_node.as_str(),
                labels.match_weight.as_str(),
            ],
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matched" => Ok(ReportKind::Matched),
            "unmatched1" | "unmatched-in-query" => Ok(ReportKind::UnmatchedInQuery),
            "unmatched2" | "unmatched-in-target" => Ok(ReportKind::UnmatchedInTarget),
            "alignment" => Ok(ReportKind::Alignment),
            _ => Err(format!(
                "Invalid report kind '{s}'. Use: matched, unmatched1, unmatched2, or alignment"
            )),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Matched => write!(f, "matched"),
            ReportKind::UnmatchedInQuery => write!(f, "unmatched1"),
            ReportKind::UnmatchedInTarget => write!(f, "unmatched2"),
            ReportKind::Alignment => write!(f, "alignment"),
        }
    }
}

/// Column names used in report headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabels {
    pub query_node: String,
    pub query_weight: String,
    pub target_node: String,
    pub target_weight: String,
    pub match_weight: String,
}

impl ColumnLabels {
    /// "<query> gene", "<query> co-expression", ... for two species names
    pub fn for_species(query: &str, target: &str, match_weight: &str) -> Self {
        ColumnLabels {
            query_node: format!("{query} gene"),
            query_weight: format!("{query} co-expression"),
            target_node: format!("{target} gene"),
            target_weight: format!("{target} co-expression"),
            match_weight: match_weight.to_string(),
        }
    }
}

impl Default for ColumnLabels {
    fn default() -> Self {
        ColumnLabels::for_species("Mouse", "Human", "Bit score")
    }
}

/// A matched red node with its query and target counterparts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedPair {
    pub query: Option<NodeId>,
    pub target: Option<NodeId>,
    pub edge: BpEdge,
}

/// Matched pairs in red node order
pub fn matched_pairs(matching_graph: &MatchingGraph, matching: &MatchingMap) -> Vec<MatchedPair> {
    matching_graph
        .red_nodes()
        .filter_map(|red| {
            let edge = matching.matched_edge(red)?;
            Some(MatchedPair {
                query: matching_graph.map_red_to_query(red),
                target: matching_graph.map_blue_to_target(matching_graph.blue_endpoint(edge)),
                edge,
            })
        })
        .collect()
}

/// Relationship of two matched pairs across the two graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    /// Edge in both graphs
    Conserved(EdgeId, EdgeId),
    /// Edge in the query graph only
    QueryOnly(EdgeId),
    /// Edge in the target graph only
    TargetOnly(EdgeId),
    Neither,
}

/// Classify the pair (p1, p2) by edge existence in each graph
pub fn classify_pair(matching_graph: &MatchingGraph, p1: &MatchedPair, p2: &MatchedPair) -> PairStatus {
    let query_edge = match (p1.query, p2.query) {
        (Some(a), Some(b)) => matching_graph.query_edge(a, b),
        _ => None,
    };
    let target_edge = match (p1.target, p2.target) {
        (Some(a), Some(b)) => matching_graph.target_edge(a, b),
        _ => None,
    };

    match (query_edge, target_edge) {
        (Some(q), Some(t)) => PairStatus::Conserved(q, t),
        (Some(q), None) => PairStatus::QueryOnly(q),
        (None, Some(t)) => PairStatus::TargetOnly(t),
        (None, None) => PairStatus::Neither,
    }
}

/// Render a weight with the shortest round-trip form, keeping ".0" on integers
pub fn format_weight(weight: f64) -> String {
    if weight.is_finite() && weight.fract() == 0.0 && weight.abs() < 1e15 {
        format!("{weight:.1}")
    } else {
        format!("{weight}")
    }
}

/// Writes one kind of report for a matching
pub struct AlignmentReporter<'a> {
    matching_graph: &'a MatchingGraph,
    kind: ReportKind,
    labels: ColumnLabels,
}

impl<'a> AlignmentReporter<'a> {
    pub fn new(matching_graph: &'a MatchingGraph, kind: ReportKind) -> Self {
        AlignmentReporter {
            matching_graph,
            kind,
            labels: ColumnLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: ColumnLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn extension(&self) -> &'static str {
        self.kind.extension()
    }

    /// Write the report for `matching` to `out`, returning the number of data rows
    pub fn write<W: Write>(&self, matching: &MatchingMap, out: &mut W) -> Result<usize> {
        let pairs = matched_pairs(self.matching_graph, matching);
        debug!("{} report: scanning {} matched pairs", self.kind, pairs.len());

        let mut writer = quoting_writer(&mut *out, b'\n');
        writer.write_record(self.kind.header(&self.labels))?;

        if self.kind == ReportKind::Alignment {
            writer.flush()?;
            drop(writer);
            return self.write_alignment(&pairs, out);
        }

        let mut rows = 0;
        for (i, p1) in pairs.iter().enumerate() {
            for p2 in &pairs[i..] {
                let status = classify_pair(self.matching_graph, p1, p2);
                if self.write_pair(p1, p2, status, &mut writer)? {
                    rows += 1;
                }
            }
        }
        writer.flush()?;

        Ok(rows)
    }

    /// Create `<prefix><extension>` and write the report into it
    pub fn write_to_prefix(&self, matching: &MatchingMap, prefix: &Path) -> Result<(PathBuf, usize)> {
        let mut path = prefix.as_os_str().to_owned();
        path.push(self.extension());
        let path = PathBuf::from(path);

        let file = File::create(&path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let rows = self.write(matching, &mut writer)?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush report file: {}", path.display()))?;

        Ok((path, rows))
    }

    fn write_alignment<W: Write>(&self, pairs: &[MatchedPair], out: &mut W) -> Result<usize> {
        // Labels end with the delimiter so the unquoted weight can follow
        let mut labels = quoting_writer(Vec::new(), b',');
        let mut rows = 0;
        let mut emitted = 0;
        for pair in pairs {
            if let (Some(q), Some(t)) = (pair.query, pair.target) {
                labels.write_record([self.query_label(Some(q)), self.target_label(Some(t))])?;
                labels.flush()?;
                let line = labels.get_ref();
                out.write_all(&line[emitted..])?;
                emitted = line.len();
                writeln!(out, "{}", format_weight(self.matching_graph.weight(pair.edge)))?;
                rows += 1;
            }
        }
        Ok(rows)
    }

    /// Emit the row for (p1, p2) if this report kind wants `status`
    fn write_pair<W: Write>(
        &self,
        p1: &MatchedPair,
        p2: &MatchedPair,
        status: PairStatus,
        writer: &mut csv::Writer<W>,
    ) -> Result<bool> {
        let query = self.matching_graph.query();
        let target = self.matching_graph.target();

        match (self.kind, status) {
            (ReportKind::Matched, PairStatus::Conserved(qe, te)) => {
                writer.write_record([
                    self.query_label(p1.query),
                    self.query_label(p2.query),
                    format_weight(query.weight(qe)).as_str(),
                    self.target_label(p1.target),
                    self.target_label(p2.target),
                    format_weight(target.weight(te)).as_str(),
                ])?;
            }
            (ReportKind::UnmatchedInQuery, PairStatus::TargetOnly(te)) => {
                writer.write_record([
                    self.target_label(p1.target),
                    self.target_label(p2.target),
                    format_weight(target.weight(te)).as_str(),
                    self.query_label(p1.query),
                    self.query_label(p2.query),
                ])?;
            }
            (ReportKind::UnmatchedInTarget, PairStatus::QueryOnly(qe)) => {
                writer.write_record([
                    self.query_label(p1.query),
                    self.query_label(p2.query),
                    format_weight(query.weight(qe)).as_str(),
                    self.target_label(p1.target),
                    self.target_label(p2.target),
                ])?;
            }
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn query_label(&self, node: Option<NodeId>) -> &str {
        node.map(|n| self.matching_graph.query().label(n)).unwrap_or("")
    }

    fn target_label(&self, node: Option<NodeId>) -> &str {
        node.map(|n| self.matching_graph.target().label(n)).unwrap_or("")
    }
}

/// CSV writer quoting every field, embedded quotes doubled
fn quoting_writer<W: Write>(out: W, terminator: u8) -> csv::Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(terminator))
        .from_writer(out)
}
