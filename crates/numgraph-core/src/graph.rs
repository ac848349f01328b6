//! OpGraph: the IR graph container.
//!
//! [`OpGraph`] stores [`IrNode`]s in a petgraph `StableGraph` connected by
//! [`DataEdge`]s. While it is built the graph only grows: a node can only be
//! added once all of its sources exist, so insertion order is always a valid
//! topological order. A finished graph can drop the nodes its outputs do not
//! depend on with [`OpGraph::prune_unreachable`].
//! Evaluation and printing both walk nodes in that order, which keeps them
//! deterministic.
//!
//! Inputs are kept in declaration order; position `i` of an evaluation
//! binding feeds `input_nodes()[i]`.

use std::collections::BTreeSet;

use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};

use crate::edge::DataEdge;
use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::IrNode;
use crate::types::ValueDescriptor;

/// The IR graph container.
#[derive(Debug, Clone, Default)]
pub struct OpGraph {
    graph: StableGraph<IrNode, DataEdge, Directed, u32>,
    input_nodes: Vec<NodeId>,
    output_nodes: Vec<NodeId>,
}

impl OpGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Appends a graph input at the next position.
    pub fn add_input(&mut self, name: impl Into<String>, descriptor: ValueDescriptor) -> NodeId {
        let position = self.input_nodes.len();
        let idx = self.graph.add_node(IrNode::input(position, name, descriptor));
        let id = NodeId::from(idx);
        self.input_nodes.push(id);
        id
    }

    /// Appends a node fed by `sources`, given as `(node, output port)` pairs
    /// in operand order.
    ///
    /// Every source must exist, expose the referenced output, and that output
    /// must match the descriptor the node was built from.
    pub fn add_node(
        &mut self,
        node: IrNode,
        sources: &[(NodeId, usize)],
    ) -> Result<NodeId, CoreError> {
        if sources.len() != node.inputs.len() {
            return Err(CoreError::GraphInconsistency {
                reason: format!(
                    "{} node built from {} input(s) but wired to {} source(s)",
                    node.op.kind(),
                    node.inputs.len(),
                    sources.len()
                ),
            });
        }
        for (target_port, &(source, source_port)) in sources.iter().enumerate() {
            let source_node = self.node(source).ok_or(CoreError::NodeNotFound { id: source })?;
            let produced = source_node
                .output(source_port)
                .ok_or(CoreError::OutputOutOfRange {
                    node: source,
                    index: source_port,
                })?;
            if *produced != node.inputs[target_port] {
                return Err(CoreError::GraphInconsistency {
                    reason: format!(
                        "input {} of {} node expects {}, source {} produces {}",
                        target_port,
                        node.op.kind(),
                        node.inputs[target_port],
                        source,
                        produced
                    ),
                });
            }
        }

        let idx = self.graph.add_node(node);
        for (target_port, &(source, source_port)) in sources.iter().enumerate() {
            self.graph.add_edge(
                source.into(),
                idx,
                DataEdge {
                    source_port: source_port as u16,
                    target_port: target_port as u16,
                },
            );
        }
        Ok(NodeId::from(idx))
    }

    /// Marks the nodes whose values are the results of the traced computation.
    pub fn set_outputs(&mut self, outputs: Vec<NodeId>) -> Result<(), CoreError> {
        if let Some(&missing) = outputs.iter().find(|&&id| self.node(id).is_none()) {
            return Err(CoreError::NodeNotFound { id: missing });
        }
        self.output_nodes = outputs;
        Ok(())
    }

    /// Removes every node that is neither a graph input nor an ancestor of
    /// an output node. Surviving nodes keep their ids.
    ///
    /// Meant for finished graphs: petgraph reuses freed indices, so nodes
    /// appended afterwards would no longer follow insertion order.
    ///
    /// Returns the number of nodes removed.
    pub fn prune_unreachable(&mut self) -> usize {
        let mut keep: BTreeSet<NodeId> = BTreeSet::new();
        let mut pending: Vec<NodeId> = self.output_nodes.clone();
        while let Some(id) = pending.pop() {
            if keep.insert(id) {
                pending.extend(
                    self.graph
                        .neighbors_directed(id.into(), Direction::Incoming)
                        .map(NodeId::from),
                );
            }
        }
        keep.extend(self.input_nodes.iter().copied());

        let dead: Vec<NodeId> = self
            .topological_order()
            .into_iter()
            .filter(|id| !keep.contains(id))
            .collect();
        for id in &dead {
            self.graph.remove_node((*id).into());
        }
        dead.len()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&IrNode> {
        self.graph.node_weight(id.into())
    }

    /// Input nodes in declaration order.
    pub fn input_nodes(&self) -> &[NodeId] {
        &self.input_nodes
    }

    pub fn output_nodes(&self) -> &[NodeId] {
        &self.output_nodes
    }

    pub fn input_count(&self) -> usize {
        self.input_nodes.len()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All node IDs in insertion order, which is a topological order.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.graph.node_indices().map(NodeId::from).collect();
        ids.sort();
        ids
    }

    /// Sources feeding `id`, ordered by input position.
    pub fn node_inputs(&self, id: NodeId) -> Vec<(NodeId, DataEdge)> {
        let mut inputs: Vec<(NodeId, DataEdge)> = self
            .graph
            .edges_directed(id.into(), Direction::Incoming)
            .map(|edge| (NodeId::from(edge.source()), *edge.weight()))
            .collect();
        inputs.sort_by_key(|(_, edge)| edge.target_port);
        inputs
    }

    /// Human-readable listing, one node per line in topological order,
    /// followed by the output nodes.
    ///
    /// ```text
    /// %0 = input x : enc uint3
    /// %1 = constant 5 : clear uint3
    /// %2 = add(%0, %1) : enc uint3
    /// return %2
    /// ```
    pub fn format_graph(&self) -> String {
        let mut lines = Vec::with_capacity(self.node_count() + 1);
        for id in self.topological_order() {
            let Some(node) = self.node(id) else {
                continue;
            };
            let args: Vec<String> = self
                .node_inputs(id)
                .iter()
                .map(|(source, edge)| {
                    if edge.source_port == 0 {
                        format!("%{}", source)
                    } else {
                        format!("%{}.{}", source, edge.source_port)
                    }
                })
                .collect();
            let call = if node.inputs.is_empty() {
                node.op.label()
            } else {
                format!("{}({})", node.op.label(), args.join(", "))
            };
            let outputs: Vec<String> = node.outputs.iter().map(|d| d.to_string()).collect();
            lines.push(format!("%{} = {} : {}", id, call, outputs.join(", ")));
        }
        if !self.output_nodes.is_empty() {
            let outputs: Vec<String> = self
                .output_nodes
                .iter()
                .map(|id| format!("%{}", id))
                .collect();
            lines.push(format!("return {}", outputs.join(", ")));
        }
        lines.join("\n")
    }
}
