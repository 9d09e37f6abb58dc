//! Aggregator for the NodeSet ingestion crates; see [`nodeset_loader`].

pub use nodeset_loader::*;
