//! Runtime error types for the graph interpreter.
//!
//! Every variant that comes from evaluating a node carries the [`NodeId`]
//! of that node.

use numgraph_core::id::NodeId;
use numgraph_core::ValueError;
use serde::{Deserialize, Serialize};

/// Errors produced while replaying a graph on one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum RuntimeError {
    #[error("integer overflow at node {node}")]
    IntegerOverflow { node: NodeId },

    #[error("divide by zero at node {node}")]
    DivideByZero { node: NodeId },

    #[error("out of bounds access at node {node}: index {index}, size {size}")]
    OutOfBoundsAccess {
        node: NodeId,
        index: isize,
        size: usize,
    },

    #[error("shape mismatch at node {node}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        node: NodeId,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    #[error("type mismatch at runtime: node {node}, expected {expected}, got {got}")]
    TypeMismatchAtRuntime {
        node: NodeId,
        expected: String,
        got: String,
    },

    #[error("node {node} called with {got} argument(s), expects {expected}")]
    ArgumentCount {
        node: NodeId,
        expected: usize,
        got: usize,
    },

    #[error("missing value: node {node} input port {port} has no value")]
    MissingValue { node: NodeId, port: u16 },

    #[error("no value bound for input {position} ({bound} value(s) provided)")]
    MissingInput { position: usize, bound: usize },

    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl RuntimeError {
    /// Attaches the failing node to a value-level error.
    pub fn at(node: NodeId, error: ValueError) -> Self {
        match error {
            ValueError::IntegerOverflow => RuntimeError::IntegerOverflow { node },
            ValueError::DivideByZero => RuntimeError::DivideByZero { node },
            ValueError::OutOfBounds { index, size } => {
                RuntimeError::OutOfBoundsAccess { node, index, size }
            }
            ValueError::IndexScalar => RuntimeError::TypeMismatchAtRuntime {
                node,
                expected: "Array".into(),
                got: "scalar".into(),
            },
            ValueError::ShapeMismatch { lhs, rhs } => {
                RuntimeError::ShapeMismatch { node, lhs, rhs }
            }
            ValueError::ArgumentCount { expected, got } => {
                RuntimeError::ArgumentCount { node, expected, got }
            }
            ValueError::TypeMismatch { expected, got } => RuntimeError::TypeMismatchAtRuntime {
                node,
                expected: expected.into(),
                got: got.into(),
            },
        }
    }
}
