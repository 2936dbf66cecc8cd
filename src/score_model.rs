//! Continuous coexpression score model
//!
//! Scores a matching as the sum of two terms:
//! * node term: min-max normalised candidate weight, scaled into [0, 1 - beta]
//! * edge term: for every conserved edge pair, a sign-aware comparison of the
//!   two coexpression correlations, scaled by beta
//!
//! `beta` trades the two terms off against each other. Correlations whose
//! magnitude is below the threshold are noise and contribute nothing.

use anyhow::{bail, Result};
use log::debug;

use crate::graph::EdgeId;
use crate::matching_graph::{BpEdge, MatchingGraph, MatchingMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreModel {
    beta: f64,
    corr_threshold: f64,
    min_score: f64,
    max_score: f64,
}

/// Objective value of a matching, split by term
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlignmentScore {
    pub node_score: f64,
    pub edge_score: f64,
    pub total: f64,
    pub matched_nodes: usize,
    pub conserved_edges: usize,
}

impl ScoreModel {
    /// Build the model with the normalisation range taken from all candidate
    /// edge weights of `matching_graph`.
    pub fn new(matching_graph: &MatchingGraph, beta: f64, corr_threshold: f64) -> Result<Self> {
        let (min_score, max_score) = matching_graph.weight_range().unwrap_or((0.0, 0.0));
        debug!(
            "Match weight range over {} candidate edges: [{}, {}]",
            matching_graph.edge_count(),
            min_score,
            max_score
        );
        Self::with_range(beta, corr_threshold, min_score, max_score)
    }

    /// Build the model with an explicit normalisation range
    pub fn with_range(beta: f64, corr_threshold: f64, min_score: f64, max_score: f64) -> Result<Self> {
        if !beta.is_finite() || !(0.0..=1.0).contains(&beta) {
            bail!("beta must be within [0, 1], got {beta}");
        }
        // The profit term divides by (1 - threshold)
        if !corr_threshold.is_finite() || !(0.0..1.0).contains(&corr_threshold) {
            bail!("Correlation threshold must be within [0, 1), got {corr_threshold}");
        }
        if !min_score.is_finite() || !max_score.is_finite() || min_score > max_score {
            bail!("Invalid normalisation range [{min_score}, {max_score}]");
        }

        Ok(ScoreModel {
            beta,
            corr_threshold,
            min_score,
            max_score,
        })
    }

    pub fn score_function_name(&self) -> &'static str {
        "Continuous 2"
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn corr_threshold(&self) -> f64 {
        self.corr_threshold
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_score, self.max_score)
    }

    /// Min-max normalised candidate weight in [0, 1 - beta]
    pub fn normalized_match_weight(&self, edge_weight: f64) -> f64 {
        if self.min_score == self.max_score {
            return 0.0;
        }
        (1.0 - self.beta) * (edge_weight - self.min_score) / (self.max_score - self.min_score)
    }

    /// Score of a pair of correlations, one per input graph
    pub fn pair_score(&self, weight1: f64, weight2: f64) -> f64 {
        let tau = self.corr_threshold;

        if weight1.abs() < tau || weight2.abs() < tau {
            return 0.0;
        }

        // Coexpressed in opposite directions
        if (weight1 <= -tau && weight2 >= tau) || (weight2 <= -tau && weight1 >= tau) {
            return -self.beta;
        }

        self.beta
            * 0.5
            * (weight1.abs() + weight2.abs())
            * (((1.0 - tau) - (weight1 - weight2).abs()) / (1.0 - tau))
    }

    /// Normalised weight of a candidate edge
    pub fn match_edge_score(&self, matching_graph: &MatchingGraph, edge: BpEdge) -> f64 {
        self.normalized_match_weight(matching_graph.weight(edge))
    }

    /// Score of a query edge paired with a target edge
    pub fn edge_pair_score(
        &self,
        matching_graph: &MatchingGraph,
        query_edge: EdgeId,
        target_edge: EdgeId,
    ) -> f64 {
        self.pair_score(
            matching_graph.query().weight(query_edge),
            matching_graph.target().weight(target_edge),
        )
    }

    /// Objective value of `matching`: node term over matched red nodes plus
    /// the edge term over distinct matched pairs whose edges exist on both sides.
    pub fn score_matching(&self, matching_graph: &MatchingGraph, matching: &MatchingMap) -> AlignmentScore {
        let mut score = AlignmentScore::default();

        let mut pairs = Vec::with_capacity(matching.len());
        for red in matching_graph.red_nodes() {
            let Some(edge) = matching.matched_edge(red) else {
                continue;
            };
            score.node_score += self.match_edge_score(matching_graph, edge);
            score.matched_nodes += 1;

            let query = matching_graph.map_red_to_query(red);
            let target = matching_graph.map_blue_to_target(matching_graph.blue_endpoint(edge));
            if let (Some(q), Some(t)) = (query, target) {
                pairs.push((q, t));
            }
        }

        for (i, &(q1, t1)) in pairs.iter().enumerate() {
            for &(q2, t2) in &pairs[i + 1..] {
                let query_edge = matching_graph.query_edge(q1, q2);
                let target_edge = matching_graph.target_edge(t1, t2);
                if let (Some(qe), Some(te)) = (query_edge, target_edge) {
                    score.edge_score += self.edge_pair_score(matching_graph, qe, te);
                    score.conserved_edges += 1;
                }
            }
        }

        score.total = score.node_score + score.edge_score;
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::matching_graph::{BlueNode, RedNode};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    fn model(beta: f64, tau: f64) -> ScoreModel {
        ScoreModel::with_range(beta, tau, 0.0, 10.0).unwrap()
    }

    #[test]
    fn test_normalization() {
        let m = model(0.5, 0.2);
        assert_close(m.normalized_match_weight(0.0), 0.0);
        assert_close(m.normalized_match_weight(10.0), 0.5);
        assert_close(m.normalized_match_weight(5.0), 0.25);
    }

    #[test]
    fn test_degenerate_range_is_zero() {
        let m = ScoreModel::with_range(0.3, 0.0, 3.0, 3.0).unwrap();
        assert_eq!(m.normalized_match_weight(3.0), 0.0);
        assert_eq!(m.normalized_match_weight(100.0), 0.0);
    }

    #[test]
    fn test_pair_score_below_threshold() {
        let m = model(0.5, 0.3);
        assert_eq!(m.pair_score(0.29, 0.9), 0.0);
        assert_eq!(m.pair_score(-0.9, -0.1), 0.0);
    }

    #[test]
    fn test_pair_score_opposite_signs() {
        let m = model(0.4, 0.3);
        assert_eq!(m.pair_score(-0.5, 0.8), -0.4);
        assert_eq!(m.pair_score(0.3, -0.3), -0.4);
    }

    #[test]
    fn test_pair_score_profit() {
        let m = model(0.5, 0.2);
        // 0.5 * 0.5 * (0.8 + 0.6) * ((0.8 - 0.2) / 0.8)
        assert_close(m.pair_score(0.8, 0.6), 0.2625);
        assert_close(m.pair_score(-0.8, -0.6), 0.2625);
        // Equal weights: divergence term vanishes
        assert_close(m.pair_score(0.9, 0.9), 0.45);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(ScoreModel::with_range(0.5, 1.0, 0.0, 1.0).is_err());
        assert!(ScoreModel::with_range(0.5, -0.1, 0.0, 1.0).is_err());
        assert!(ScoreModel::with_range(1.5, 0.0, 0.0, 1.0).is_err());
        assert!(ScoreModel::with_range(f64::NAN, 0.0, 0.0, 1.0).is_err());
        assert!(ScoreModel::with_range(0.5, 0.0, 2.0, 1.0).is_err());
    }

    #[test]
    fn test_score_matching() {
        let mut query = Graph::new("query");
        query.add_labeled_edge("A", "B", 0.8).unwrap();
        query.add_labeled_edge("B", "C", 0.5).unwrap();
        let mut target = Graph::new("target");
        target.add_labeled_edge("X", "Y", 0.8).unwrap();
        target.add_node("Z");

        let mut gm = MatchingGraph::new(query, target);
        let ax = gm.add_edge(RedNode(0), BlueNode(0), 4.0).unwrap();
        let by = gm.add_edge(RedNode(1), BlueNode(1), 6.0).unwrap();
        let cz = gm.add_edge(RedNode(2), BlueNode(2), 2.0).unwrap();

        let matching = MatchingMap::from_edges(&gm, [ax, by, cz]).unwrap();
        let m = ScoreModel::new(&gm, 0.5, 0.0).unwrap();
        assert_eq!(m.range(), (2.0, 6.0));

        let score = m.score_matching(&gm, &matching);
        assert_eq!(score.matched_nodes, 3);
        // (0.5 + 1.0 + 0.0) * 0.5
        assert_close(score.node_score, 0.75);
        // Only A-B / X-Y is conserved
        assert_eq!(score.conserved_edges, 1);
        assert_close(score.edge_score, 0.4);
        assert_close(score.total, 1.15);
    }

    #[test]
    fn test_empty_matching_graph() {
        let gm = MatchingGraph::new(Graph::new("query"), Graph::new("target"));
        let m = ScoreModel::new(&gm, 0.5, 0.1).unwrap();
        assert_eq!(m.range(), (0.0, 0.0));
        let score = m.score_matching(&gm, &MatchingMap::new(&gm));
        assert_eq!(score, AlignmentScore::default());
    }
}
