// Scoring pipeline: per-table row processing and the full run.

pub mod rows;
pub mod run;
