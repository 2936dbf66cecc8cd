// Library exports for coexalign
pub mod graph;
pub mod input;
pub mod matching_graph;
pub mod report;
pub mod score_model;
