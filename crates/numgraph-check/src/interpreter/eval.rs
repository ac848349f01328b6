//! Per-op evaluation logic for the graph interpreter.

use numgraph_core::id::NodeId;
use numgraph_core::ops::NodeOp;
use numgraph_core::Value;

use super::error::RuntimeError;

/// Evaluates one node given the values of its inputs (in operand order) and
/// the positional graph bindings.
pub fn eval_op(
    op: &NodeOp,
    inputs: &[Value],
    node_id: NodeId,
    bindings: &[Value],
) -> Result<Value, RuntimeError> {
    match op {
        NodeOp::Input { position, .. } => {
            bindings
                .get(*position)
                .cloned()
                .ok_or(RuntimeError::MissingInput {
                    position: *position,
                    bound: bindings.len(),
                })
        }

        NodeOp::Constant { value } => Ok(value.clone()),

        NodeOp::Arith(arith_op) => {
            let lhs = get_input(inputs, 0, node_id)?;
            let rhs = get_input(inputs, 1, node_id)?;
            arith_op
                .apply(lhs, rhs)
                .map_err(|e| RuntimeError::at(node_id, e))
        }

        NodeOp::IndexConstant { index } => {
            let val = get_input(inputs, 0, node_id)?;
            val.index(index).map_err(|e| RuntimeError::at(node_id, e))
        }

        NodeOp::GenericFunction(func) => {
            func.call(inputs).map_err(|e| RuntimeError::at(node_id, e))
        }
    }
}

fn get_input(inputs: &[Value], port: u16, node: NodeId) -> Result<&Value, RuntimeError> {
    inputs
        .get(port as usize)
        .ok_or(RuntimeError::MissingValue { node, port })
}
