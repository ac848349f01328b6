//! IR nodes: an operation plus its input and output descriptors.

use smallvec::SmallVec;

use crate::error::CoreError;
use crate::ops::NodeOp;
use crate::types::{DescriptorCombiner, ValueDescriptor};
use crate::value::Value;

/// A node of the IR graph.
///
/// `inputs` are the descriptors of the values the node consumes, in operand
/// order. `outputs` are the descriptors of the values it produces; every
/// built-in kind produces exactly one.
#[derive(Debug, Clone)]
pub struct IrNode {
    pub op: NodeOp,
    pub inputs: SmallVec<[ValueDescriptor; 2]>,
    pub outputs: SmallVec<[ValueDescriptor; 1]>,
}

impl IrNode {
    /// Builds a node from its operation and input descriptors.
    ///
    /// `combiner` is required for kinds whose
    /// [`requires_descriptor_combiner`](NodeOp::requires_descriptor_combiner)
    /// is true, and ignored otherwise.
    pub fn new(
        op: NodeOp,
        inputs: impl IntoIterator<Item = ValueDescriptor>,
        combiner: Option<&DescriptorCombiner>,
    ) -> Result<Self, CoreError> {
        let inputs: SmallVec<[ValueDescriptor; 2]> = inputs.into_iter().collect();
        if let Some(expected) = op.arity() {
            if inputs.len() != expected {
                return Err(CoreError::ArityMismatch {
                    kind: op.kind(),
                    expected,
                    got: inputs.len(),
                });
            }
        }

        let output = match &op {
            NodeOp::Input { descriptor, .. } => descriptor.clone(),
            NodeOp::Constant { value } => ValueDescriptor::for_constant(value)?,
            NodeOp::Arith(_) => {
                let combine = combiner.ok_or(CoreError::MissingCombiner { kind: op.kind() })?;
                combine(&inputs[0], &inputs[1])?
            }
            NodeOp::IndexConstant { index } => inputs[0].indexed(index),
            NodeOp::GenericFunction(func) => func.output.clone(),
        };

        let mut outputs = SmallVec::new();
        outputs.push(output);
        Ok(IrNode {
            op,
            inputs,
            outputs,
        })
    }

    /// Convenience: a positional graph input.
    pub fn input(position: usize, name: impl Into<String>, descriptor: ValueDescriptor) -> Self {
        let mut outputs = SmallVec::new();
        outputs.push(descriptor.clone());
        IrNode {
            op: NodeOp::Input {
                position,
                name: name.into(),
                descriptor,
            },
            inputs: SmallVec::new(),
            outputs,
        }
    }

    /// Convenience: a constant node. Fails if the value has no constant
    /// representation.
    pub fn constant(value: Value) -> Result<Self, CoreError> {
        IrNode::new(NodeOp::Constant { value }, [], None)
    }

    pub fn output(&self, index: usize) -> Option<&ValueDescriptor> {
        self.outputs.get(index)
    }

    pub fn is_constant(&self) -> bool {
        self.op.is_constant()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ops::ArithOp;
    use crate::types::{combine_descriptors, DataType};

    fn enc(bits: u32) -> ValueDescriptor {
        ValueDescriptor::scalar(DataType::integer(bits, false), true)
    }

    #[test]
    fn arith_node_uses_combiner() {
        let combiner: DescriptorCombiner = Arc::new(combine_descriptors);
        let node = IrNode::new(
            NodeOp::Arith(ArithOp::Add),
            [enc(7), enc(3)],
            Some(&combiner),
        )
        .unwrap();
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.outputs[0], enc(7));
    }

    #[test]
    fn arith_node_without_combiner_fails() {
        let result = IrNode::new(NodeOp::Arith(ArithOp::Mul), [enc(2), enc(2)], None);
        assert!(matches!(
            result,
            Err(CoreError::MissingCombiner { kind: "Mul" })
        ));
    }

    #[test]
    fn arity_is_checked() {
        let combiner: DescriptorCombiner = Arc::new(combine_descriptors);
        let result = IrNode::new(NodeOp::Arith(ArithOp::Sub), [enc(2)], Some(&combiner));
        assert!(matches!(
            result,
            Err(CoreError::ArityMismatch {
                kind: "Sub",
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn constant_node_describes_value() {
        let node = IrNode::constant(Value::Int(5)).unwrap();
        assert!(node.is_constant());
        assert!(node.inputs.is_empty());
        assert_eq!(
            node.output(0),
            Some(&ValueDescriptor::scalar(DataType::integer(3, false), false))
        );
        assert!(node.output(1).is_none());
    }

    #[test]
    fn index_node_drops_axis() {
        let input = ValueDescriptor::tensor(DataType::integer(4, false), vec![5, 2], true);
        let node = IrNode::new(NodeOp::IndexConstant { index: vec![2] }, [input], None).unwrap();
        assert_eq!(node.outputs[0].shape, vec![2]);
        assert!(node.outputs[0].is_encrypted);
    }
}
