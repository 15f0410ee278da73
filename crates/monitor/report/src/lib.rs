//! Cross-node snapshots of reported block hashes.
//!
//! A [`Report`] lines up what every node says the hash is at a fixed list of heights, so
//! that rows where providers agree ([`RowStatus::Consensus`]) can be told apart from rows
//! where they do not ([`RowStatus::Divergence`]).
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod report;
pub use report::{NodeColumn, Report, RowStatus};

mod builder;
pub use builder::ReportBuilder;

mod summary;
pub use summary::node_summary;
