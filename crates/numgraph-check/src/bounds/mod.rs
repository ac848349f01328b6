//! Bounds propagation: replays a graph over an inputset and records, for
//! every node, the smallest and largest value it produced.
//!
//! The inputset is consumed lazily, one sample at a time. Memory use grows
//! with the number of nodes, never with the number of samples.
//!
//! Comparison is pluggable. The first value a node produces is stored as
//! `min_fn(v, v)` / `max_fn(v, v)`, which lets the comparison functions
//! normalize non-scalar values before anything is kept. Later samples fold
//! in as `min_fn(current, v)` / `max_fn(current, v)`.

pub mod compare;
pub mod error;

use indexmap::IndexMap;
use numgraph_core::id::NodeId;
use numgraph_core::Value;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::interpreter::EvaluableGraph;

pub use compare::{scalar_max, scalar_min};
pub use error::BoundsError;

/// Observed value range of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBounds<V> {
    pub min: V,
    pub max: V,
}

/// Per-node bounds, in the order the graph evaluates its nodes.
pub type BoundsMap<V> = IndexMap<NodeId, NodeBounds<V>>;

/// Bounds with the default comparison, which reduces arrays to their
/// extreme element (see [`scalar_min`] and [`scalar_max`]).
///
/// Returns the number of samples consumed alongside the bounds.
pub fn evaluate_bounds<G, I>(
    graph: &G,
    inputset: I,
) -> Result<(usize, BoundsMap<Value>), BoundsError>
where
    G: EvaluableGraph<Value = Value> + ?Sized,
    I: IntoIterator<Item = Vec<Value>>,
{
    evaluate_bounds_with(graph, inputset, scalar_min, scalar_max)
}

/// Bounds with caller-supplied comparison functions.
///
/// Every sample must carry exactly one value per graph input. An empty
/// inputset is an error.
pub fn evaluate_bounds_with<G, I, Min, Max>(
    graph: &G,
    inputset: I,
    min_fn: Min,
    max_fn: Max,
) -> Result<(usize, BoundsMap<G::Value>), BoundsError>
where
    G: EvaluableGraph + ?Sized,
    I: IntoIterator<Item = Vec<G::Value>>,
    Min: Fn(&G::Value, &G::Value) -> G::Value,
    Max: Fn(&G::Value, &G::Value) -> G::Value,
{
    let expected = graph.input_count();
    let mut bounds: BoundsMap<G::Value> = IndexMap::new();
    let mut samples = 0usize;

    for sample in inputset {
        if sample.len() != expected {
            return Err(BoundsError::InputsetArityMismatch {
                got: sample.len(),
                expected,
                sample: samples,
            });
        }

        let values = graph
            .evaluate(&sample)
            .map_err(|source| BoundsError::Evaluation {
                sample: samples,
                source,
            })?;

        for (node, value) in values {
            match bounds.get_mut(&node) {
                Some(entry) => {
                    entry.min = min_fn(&entry.min, &value);
                    entry.max = max_fn(&entry.max, &value);
                }
                None => {
                    let seeded = NodeBounds {
                        min: min_fn(&value, &value),
                        max: max_fn(&value, &value),
                    };
                    bounds.insert(node, seeded);
                }
            }
        }
        samples += 1;
    }

    if samples == 0 {
        return Err(BoundsError::EmptyInputset);
    }

    info!(samples, nodes = bounds.len(), "bounds evaluation finished");
    Ok((samples, bounds))
}
