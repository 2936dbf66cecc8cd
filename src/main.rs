use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;

use coexalign::input::{read_alignment_file, read_candidates_file, read_graph_file};
use coexalign::matching_graph::MatchingGraph;
use coexalign::report::{AlignmentReporter, ColumnLabels, ReportKind};
use coexalign::score_model::ScoreModel;

/// coexalign - Score and report coexpression network alignments
///
/// Reads two coexpression networks, the candidate matches between their genes
/// and a computed one-to-one alignment, then writes CSV reports of conserved
/// and unmatched interactions.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Query network edge list (label label correlation)
    #[clap(short = 'q', long = "query")]
    query: PathBuf,

    /// Target network edge list (label label correlation)
    #[clap(short = 't', long = "target")]
    target: PathBuf,

    /// Candidate matches (query_label target_label weight), e.g. BLAST bit scores
    #[clap(short = 'c', long = "candidates")]
    candidates: PathBuf,

    /// Alignment to report (query_label target_label per line)
    #[clap(short = 'a', long = "alignment")]
    alignment: PathBuf,

    /// Output prefix; each report appends its own suffix
    #[clap(short = 'o', long = "output", default_value = "alignment")]
    output: PathBuf,

    /// Reports to write: matched, unmatched1, unmatched2, alignment
    #[clap(
        short = 'r',
        long = "report",
        value_delimiter = ',',
        default_values_t = ReportKind::ALL.to_vec()
    )]
    reports: Vec<ReportKind>,

    /// Weight of the coexpression term against the match weight term
    #[clap(short = 'b', long = "beta", default_value = "0.5")]
    beta: f64,

    /// Correlations with smaller magnitude are ignored when scoring
    #[clap(short = 'T', long = "corr-threshold", default_value = "0.0")]
    corr_threshold: f64,

    /// Organism name used in the query column headers
    #[clap(long = "query-name", default_value = "Mouse")]
    query_name: String,

    /// Organism name used in the target column headers
    #[clap(long = "target-name", default_value = "Human")]
    target_name: String,

    /// Header of the match weight column in the alignment report
    #[clap(long = "match-label", default_value = "Bit score")]
    match_label: String,

    /// Number of reports written concurrently
    #[clap(short = 'j', long = "threads", default_value = "4")]
    threads: usize,

    /// Only print errors
    #[clap(long = "quiet")]
    quiet: bool,

    /// More logging (-v debug, -vv trace)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    init_logging(&args);

    let mut seen = HashSet::new();
    args.reports.retain(|kind| seen.insert(*kind));

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(1))
        .build_global()?;

    let query = read_graph_file(&args.query, &args.query_name)?;
    let target = read_graph_file(&args.target, &args.target_name)?;
    info!("Query network: {query}");
    info!("Target network: {target}");
    for graph in [&query, &target] {
        if graph.self_loop_count() > 0 {
            warn!(
                "{} has {} self-loops; matched genes will be reported as interacting with themselves",
                graph.name(),
                graph.self_loop_count()
            );
        }
    }

    let mut matching_graph = MatchingGraph::new(query, target);
    let stats = read_candidates_file(&args.candidates, &mut matching_graph)?;
    info!("Loaded {} candidate matches", stats.added);

    let matching = read_alignment_file(&args.alignment, &matching_graph)?;
    info!("Alignment matches {} genes", matching.len());

    let model = ScoreModel::new(&matching_graph, args.beta, args.corr_threshold)
        .context("Invalid scoring parameters")?;
    let score = model.score_matching(&matching_graph, &matching);
    info!(
        "Score ({}, beta={}, threshold={}): {:.6} = {:.6} (matches) + {:.6} ({} conserved interactions)",
        model.score_function_name(),
        model.beta(),
        model.corr_threshold(),
        score.total,
        score.node_score,
        score.edge_score,
        score.conserved_edges
    );

    let labels = ColumnLabels::for_species(&args.query_name, &args.target_name, &args.match_label);
    let written: Vec<_> = args
        .reports
        .par_iter()
        .map(|&kind| -> Result<(ReportKind, PathBuf, usize)> {
            let reporter = AlignmentReporter::new(&matching_graph, kind).with_labels(labels.clone());
            let (path, rows) = reporter.write_to_prefix(&matching, &args.output)?;
            Ok((kind, path, rows))
        })
        .collect::<Result<_>>()?;

    for (kind, path, rows) in written {
        info!("Wrote {kind} report: {} ({rows} rows)", path.display());
    }

    Ok(())
}
