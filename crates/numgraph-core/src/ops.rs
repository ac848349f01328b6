//! Op node kinds for the IR graph.
//!
//! [`NodeOp`] is a closed tagged union over every node kind the tracer can
//! produce:
//! - `Input`: a positional graph parameter.
//! - `Constant`: a value baked into the graph.
//! - `Arith`: native binary arithmetic (add, sub, mul).
//! - `IndexConstant`: indexing with a static index.
//! - `GenericFunction`: an arbitrary host function, used for operations the
//!   IR has no native primitive for (division).
//!
//! Arithmetic nodes derive their output descriptor from their inputs through
//! a descriptor combiner; all other kinds know their output up front.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::types::ValueDescriptor;
use crate::value::Value;

/// Binary arithmetic operators with a native IR node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
        }
    }

    pub fn apply(&self, lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
        match self {
            ArithOp::Add => lhs.add(rhs),
            ArithOp::Sub => lhs.sub(rhs),
            ArithOp::Mul => lhs.mul(rhs),
        }
    }
}

/// Host callable evaluated by a [`GenericFunction`] node, one value per input.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value, ValueError> + Send + Sync>;

/// Payload of a generic-function node.
#[derive(Clone)]
pub struct GenericFunction {
    pub func: HostFn,
    pub output: ValueDescriptor,
    /// Operation category, e.g. `"TLU"` for table lookups.
    pub op_kind: String,
    /// Operation name, e.g. `"truediv"`.
    pub op_name: String,
}

impl GenericFunction {
    pub fn new(
        func: HostFn,
        output: ValueDescriptor,
        op_kind: impl Into<String>,
        op_name: impl Into<String>,
    ) -> Self {
        GenericFunction {
            func,
            output,
            op_kind: op_kind.into(),
            op_name: op_name.into(),
        }
    }

    pub fn call(&self, inputs: &[Value]) -> Result<Value, ValueError> {
        (self.func)(inputs)
    }
}

impl fmt::Debug for GenericFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericFunction")
            .field("output", &self.output)
            .field("op_kind", &self.op_kind)
            .field("op_name", &self.op_name)
            .finish_non_exhaustive()
    }
}

/// The operation a node performs.
#[derive(Debug, Clone)]
pub enum NodeOp {
    /// Graph parameter bound positionally at evaluation time.
    Input {
        position: usize,
        name: String,
        descriptor: ValueDescriptor,
    },
    Constant { value: Value },
    Arith(ArithOp),
    /// `input[index]` with a static index.
    IndexConstant { index: Vec<isize> },
    GenericFunction(GenericFunction),
}

impl NodeOp {
    /// Number of inputs the kind accepts, or `None` if it is variadic.
    pub fn arity(&self) -> Option<usize> {
        match self {
            NodeOp::Input { .. } | NodeOp::Constant { .. } => Some(0),
            NodeOp::Arith(_) => Some(2),
            NodeOp::IndexConstant { .. } => Some(1),
            NodeOp::GenericFunction(_) => None,
        }
    }

    /// Whether the kind needs a descriptor combiner to compute its output.
    pub fn requires_descriptor_combiner(&self) -> bool {
        matches!(self, NodeOp::Arith(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, NodeOp::Constant { .. })
    }

    /// Kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            NodeOp::Input { .. } => "Input",
            NodeOp::Constant { .. } => "Constant",
            NodeOp::Arith(ArithOp::Add) => "Add",
            NodeOp::Arith(ArithOp::Sub) => "Sub",
            NodeOp::Arith(ArithOp::Mul) => "Mul",
            NodeOp::IndexConstant { .. } => "IndexConstant",
            NodeOp::GenericFunction(_) => "GenericFunction",
        }
    }

    /// Short label used by the printable graph form.
    pub fn label(&self) -> String {
        match self {
            NodeOp::Input { name, .. } => format!("input {}", name),
            NodeOp::Constant { value } => format!("constant {}", value),
            NodeOp::Arith(op) => op.name().to_string(),
            NodeOp::IndexConstant { index } => {
                let parts: Vec<String> = index.iter().map(|i| i.to_string()).collect();
                format!("index[{}]", parts.join(", "))
            }
            NodeOp::GenericFunction(func) => func.op_name.clone(),
        }
    }
}
