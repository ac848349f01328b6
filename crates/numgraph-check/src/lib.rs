pub mod bounds;
pub mod interpreter;

pub use bounds::{evaluate_bounds, evaluate_bounds_with, BoundsError, BoundsMap, NodeBounds};
pub use interpreter::{evaluate, EvaluableGraph, RuntimeError};
