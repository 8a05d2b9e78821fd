// sentiment-sweep: batch sentiment scoring for stored social-media posts.
//
// This is the library root. Each module corresponds to a part of the
// scoring pipeline: configuration, the datastore, the scoring service
// client and aggregation, and the table-by-table run.

pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod sentiment;
pub mod status;
