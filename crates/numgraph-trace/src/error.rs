//! Errors produced while tracing.
//!
//! Incompatible operands are not an error at this level: the builder
//! methods answer [`Traced::NotApplicable`](crate::Traced::NotApplicable)
//! instead, and only operator sugar that runs out of handlers turns that
//! into [`TraceError::IncompatibleOperands`].

use numgraph_core::CoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TraceError {
    /// A raw value could not be lifted into a constant node.
    #[error("unsupported constant: {reason}")]
    UnsupportedConstant { reason: String },

    /// Division between two traced values, neither of them constant.
    #[error("can't manage binary operator {op_name}: one operand must be a constant")]
    UnrepresentableDivision { op_name: &'static str },

    /// Neither the forward nor the reflected handler accepted the operands.
    #[error("unsupported operand families for {op_name}: {lhs} and {rhs}")]
    IncompatibleOperands {
        op_name: &'static str,
        lhs: String,
        rhs: String,
    },

    /// A tracer from another session was used as an operand.
    #[error("tracer belongs to a different trace session")]
    ForeignSession,

    /// A node kind produced a number of outputs the operator cannot wrap.
    #[error("{kind} produced {count} output(s), expected exactly one")]
    UnexpectedOutputCount { kind: &'static str, count: usize },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TraceError {
    /// Maps a failure to build a constant node onto the lifting error.
    pub(crate) fn from_lifting(error: CoreError) -> Self {
        match error {
            CoreError::UnrepresentableConstant { reason } => {
                TraceError::UnsupportedConstant { reason }
            }
            other => TraceError::Core(other),
        }
    }
}
