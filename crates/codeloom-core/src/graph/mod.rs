//! Workflow graph engine
//!
//! A `StateGraph` is built from named async nodes and edges, validated by
//! `compile()`, and run with `CompiledGraph::invoke`. State is moved by
//! value from node to node; each node's output replaces it wholesale.

mod builder;
mod compiled;
mod node;

pub use builder::StateGraph;
pub use compiled::CompiledGraph;
pub use node::{node_fn, FnNode, Node, Router};

use thiserror::Error;

/// Reserved terminal marker. Routing to it ends the invocation.
pub const END: &str = "__end__";

/// Configuration and routing errors. None of these are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("no entry point set")]
    MissingEntryPoint,

    #[error("entry point '{0}' is not a declared node")]
    UnknownEntryPoint(String),

    #[error("node '{0}' declared twice")]
    DuplicateNode(String),

    #[error("'{0}' is reserved and cannot name a node")]
    ReservedNodeName(String),

    #[error("edge from '{from}' refers to undeclared node '{node}'")]
    UnknownNode { from: String, node: String },

    #[error("node '{0}' has no outgoing edge")]
    MissingEdge(String),

    #[error("node '{0}' has more than one outgoing edge")]
    DuplicateEdge(String),

    #[error("router after '{node}' returned undeclared label '{label}'")]
    UndeclaredLabel { node: String, label: String },

    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: usize },
}
