//! Object-graph fixtures for Billhook tests and benchmarks.
//!
//! Provides linked payload types ([`ChainNode`], [`TreeNode`]) with
//! interior-mutable reference fields, builders that route through
//! whatever arena scope is ambient on the calling thread, and
//! drop-counting probes ([`DropCounter`]/[`DropToken`]) for asserting
//! exactly when payload teardown runs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::{
    build_chain, build_probed_chain, build_tree, tree_node_count, ChainNode, DropCounter,
    DropToken, TreeNode,
};
