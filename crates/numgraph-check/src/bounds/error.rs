//! Errors produced by the bounds pass.

use crate::interpreter::error::RuntimeError;

/// Failures of [`evaluate_bounds`](super::evaluate_bounds). Any of them
/// aborts the pass; no partial bounds are returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error(
        "got input data from inputset of len: {got}, function being evaluated has {expected} \
         inputs (sample {sample}), make sure the inputset yields tuples of input values"
    )]
    InputsetArityMismatch {
        got: usize,
        expected: usize,
        sample: usize,
    },

    #[error("inputset is empty, bounds need at least one sample")]
    EmptyInputset,

    #[error("evaluating sample {sample} failed: {source}")]
    Evaluation {
        sample: usize,
        #[source]
        source: RuntimeError,
    },
}
