//! Core error types for numgraph-core.
//!
//! [`CoreError`] covers graph and node construction failures; [`ValueError`]
//! covers failures of the value arithmetic used when replaying a graph.

use crate::id::NodeId;
use thiserror::Error;

/// Errors produced while building nodes or mutating an [`OpGraph`](crate::graph::OpGraph).
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// A node index was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// A node kind received the wrong number of input descriptors.
    #[error("{kind} expects {expected} input(s), got {got}")]
    ArityMismatch {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    /// A node kind that derives its output from its inputs was built
    /// without a descriptor combiner.
    #[error("{kind} requires a descriptor combiner")]
    MissingCombiner { kind: &'static str },

    /// Two shapes cannot be broadcast together.
    #[error("cannot broadcast shapes {lhs:?} and {rhs:?}")]
    IncompatibleShapes { lhs: Vec<usize>, rhs: Vec<usize> },

    /// A raw value has no constant representation in the IR.
    #[error("value cannot be represented as a constant: {reason}")]
    UnrepresentableConstant { reason: String },

    /// A node was referenced through an output port it does not have.
    #[error("node {node} has no output {index}")]
    OutputOutOfRange { node: NodeId, index: usize },

    /// An internal graph invariant was violated.
    #[error("graph inconsistency: {reason}")]
    GraphInconsistency { reason: String },
}

/// Errors produced by value arithmetic and indexing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("integer overflow")]
    IntegerOverflow,

    #[error("divide by zero")]
    DivideByZero,

    #[error("index {index} out of bounds for axis of size {size}")]
    OutOfBounds { index: isize, size: usize },

    #[error("cannot index into a scalar")]
    IndexScalar,

    #[error("cannot broadcast shapes {lhs:?} and {rhs:?}")]
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    #[error("host function expects {expected} argument(s), got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
}
