//! Graph interpreter: replays an [`OpGraph`] on concrete input values.
//!
//! Nodes are evaluated once each, in topological order, and every node's
//! value is kept in the result so callers can inspect intermediate
//! quantities, not just the graph outputs.
//!
//! [`EvaluableGraph`] is the contract the bounds pass consumes; [`OpGraph`]
//! implements it through [`evaluate`].

pub mod error;
pub mod eval;

use indexmap::IndexMap;
use numgraph_core::graph::OpGraph;
use numgraph_core::id::NodeId;
use numgraph_core::Value;
use tracing::debug;

pub use error::RuntimeError;

/// A graph that can be evaluated on positional inputs.
pub trait EvaluableGraph {
    type Value;

    /// Number of positional inputs the graph declares.
    fn input_count(&self) -> usize;

    /// Evaluates every node for one set of inputs. Position `i` of `inputs`
    /// binds the graph's `i`-th input.
    fn evaluate(
        &self,
        inputs: &[Self::Value],
    ) -> Result<IndexMap<NodeId, Self::Value>, RuntimeError>;
}

impl EvaluableGraph for OpGraph {
    type Value = Value;

    fn input_count(&self) -> usize {
        OpGraph::input_count(self)
    }

    fn evaluate(&self, inputs: &[Value]) -> Result<IndexMap<NodeId, Value>, RuntimeError> {
        evaluate(self, inputs)
    }
}

/// Evaluates every node of `graph`, returning node values in topological
/// order.
pub fn evaluate(
    graph: &OpGraph,
    inputs: &[Value],
) -> Result<IndexMap<NodeId, Value>, RuntimeError> {
    let mut values: IndexMap<NodeId, Value> = IndexMap::with_capacity(graph.node_count());

    for id in graph.topological_order() {
        let node = graph.node(id).ok_or_else(|| RuntimeError::InternalError {
            message: format!("node {} listed in topological order but missing", id),
        })?;

        let mut args = Vec::with_capacity(node.inputs.len());
        for (source, edge) in graph.node_inputs(id) {
            if edge.source_port != 0 {
                return Err(RuntimeError::InternalError {
                    message: format!(
                        "node {} reads output {} of node {}, \
                         only single-output nodes are evaluated",
                        id, edge.source_port, source
                    ),
                });
            }
            let value = values.get(&source).ok_or(RuntimeError::MissingValue {
                node: id,
                port: edge.target_port,
            })?;
            args.push(value.clone());
        }

        let value = eval::eval_op(&node.op, &args, id, inputs)?;
        values.insert(id, value);
    }

    debug!(nodes = values.len(), inputs = inputs.len(), "evaluated graph");
    Ok(values)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use numgraph_core::node::IrNode;
    use numgraph_core::ops::{ArithOp, GenericFunction, NodeOp};
    use numgraph_core::types::{combine_descriptors, DataType, DescriptorCombiner, ValueDescriptor};

    use super::*;

    fn enc(bits: u32) -> ValueDescriptor {
        ValueDescriptor::scalar(DataType::integer(bits, false), true)
    }

    /// Builds `(x * 3 - y) / 2`.
    fn build_graph() -> (OpGraph, Vec<NodeId>) {
        let combiner: DescriptorCombiner = Arc::new(combine_descriptors);
        let mut graph = OpGraph::new();
        let x = graph.add_input("x", enc(4));
        let y = graph.add_input("y", enc(4));

        let three = graph.add_node(IrNode::constant(Value::Int(3)).unwrap(), &[]).unwrap();
        let three_desc = graph.node(three).unwrap().outputs[0].clone();
        let mul = IrNode::new(NodeOp::Arith(ArithOp::Mul), [enc(4), three_desc], Some(&combiner))
            .unwrap();
        let mul_desc = mul.outputs[0].clone();
        let mul = graph.add_node(mul, &[(x, 0), (three, 0)]).unwrap();

        let sub = IrNode::new(NodeOp::Arith(ArithOp::Sub), [mul_desc, enc(4)], Some(&combiner))
            .unwrap();
        let sub_desc = sub.outputs[0].clone();
        let sub = graph.add_node(sub, &[(mul, 0), (y, 0)]).unwrap();

        let two = graph.add_node(IrNode::constant(Value::Int(2)).unwrap(), &[]).unwrap();
        let two_desc = graph.node(two).unwrap().outputs[0].clone();
        let div = GenericFunction::new(
            Arc::new(|args: &[Value]| args[0].true_div(&args[1])),
            sub_desc.clone().with_dtype(DataType::F64),
            "TLU",
            "truediv",
        );
        let div = IrNode::new(NodeOp::GenericFunction(div), [sub_desc, two_desc], None).unwrap();
        let div = graph.add_node(div, &[(sub, 0), (two, 0)]).unwrap();

        (graph, vec![x, y, three, mul, sub, two, div])
    }

    #[test]
    fn evaluates_every_node_in_order() {
        let (graph, ids) = build_graph();
        let values = evaluate(&graph, &[Value::Int(5), Value::Int(1)]).unwrap();

        let keys: Vec<NodeId> = values.keys().copied().collect();
        assert_eq!(keys, ids);
        assert_eq!(values[&ids[3]], Value::Int(15));
        assert_eq!(values[&ids[4]], Value::Int(14));
        assert_eq!(values[&ids[6]], Value::Float(7.0));
    }

    #[test]
    fn missing_binding_is_an_error() {
        let (graph, _) = build_graph();
        let result = evaluate(&graph, &[Value::Int(5)]);
        assert_eq!(
            result,
            Err(RuntimeError::MissingInput {
                position: 1,
                bound: 1
            })
        );
    }

    #[test]
    fn trait_impl_matches_free_function() {
        let (graph, _) = build_graph();
        let inputs = [Value::Int(2), Value::Int(2)];
        let via_trait = EvaluableGraph::evaluate(&graph, &inputs[..]).unwrap();
        assert_eq!(via_trait, evaluate(&graph, &inputs).unwrap());
        assert_eq!(EvaluableGraph::input_count(&graph), 2);
    }

    #[test]
    fn evaluates_arrays() {
        let combiner: DescriptorCombiner = Arc::new(combine_descriptors);
        let mut graph = OpGraph::new();
        let desc = ValueDescriptor::tensor(DataType::integer(4, false), vec![3], true);
        let x = graph.add_input("x", desc.clone());
        let one = graph.add_node(IrNode::constant(Value::Int(1)).unwrap(), &[]).unwrap();
        let one_desc = graph.node(one).unwrap().outputs[0].clone();
        let add = IrNode::new(NodeOp::Arith(ArithOp::Add), [desc, one_desc], Some(&combiner))
            .unwrap();
        let add_desc = add.outputs[0].clone();
        let add = graph.add_node(add, &[(x, 0), (one, 0)]).unwrap();
        let idx = IrNode::new(NodeOp::IndexConstant { index: vec![-1] }, [add_desc], None).unwrap();
        let idx = graph.add_node(idx, &[(add, 0)]).unwrap();

        let values = evaluate(&graph, &[Value::array([1i64, 2, 3])]).unwrap();
        assert_eq!(values[&add], Value::array([2i64, 3, 4]));
        assert_eq!(values[&idx], Value::Int(4));
    }
}
