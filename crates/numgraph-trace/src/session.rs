//! Trace sessions: the graph a set of tracers grows.
//!
//! A [`TraceSession`] owns one [`OpGraph`] behind shared interior
//! mutability; every tracer keeps a handle to the session it was created
//! in and appends its nodes there. Sessions are single-threaded.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use numgraph_core::{
    combine_descriptors, DescriptorCombiner, IrNode, NodeId, OpGraph, ValueDescriptor,
};
use tracing::debug;

use crate::error::TraceError;
use crate::family::{NumericFamily, TracerFamily};
use crate::tracer::Tracer;

/// Settings for a trace session.
#[derive(Clone)]
pub struct TraceConfig {
    /// Derives the output descriptor of binary operations.
    pub combiner: DescriptorCombiner,
    /// Family given to input tracers.
    pub family: Rc<dyn TracerFamily>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            combiner: Arc::new(combine_descriptors),
            family: Rc::new(NumericFamily),
        }
    }
}

impl fmt::Debug for TraceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceConfig")
            .field("family", &self.family.name())
            .finish_non_exhaustive()
    }
}

struct SessionState {
    graph: OpGraph,
    config: TraceConfig,
}

/// Handle to a graph under construction. Clones share the same graph.
#[derive(Clone)]
pub struct TraceSession {
    state: Rc<RefCell<SessionState>>,
}

impl TraceSession {
    pub fn new(config: TraceConfig) -> Self {
        TraceSession {
            state: Rc::new(RefCell::new(SessionState {
                graph: OpGraph::new(),
                config,
            })),
        }
    }

    /// Declares the next positional input, traced with the configured family.
    pub fn input(&self, name: impl Into<String>, descriptor: ValueDescriptor) -> Tracer {
        let family = self.state.borrow().config.family.clone();
        self.input_with_family(name, descriptor, family)
    }

    /// Declares the next positional input, traced with `family`.
    pub fn input_with_family(
        &self,
        name: impl Into<String>,
        descriptor: ValueDescriptor,
        family: Rc<dyn TracerFamily>,
    ) -> Tracer {
        let name = name.into();
        let id = self.state.borrow_mut().graph.add_input(name.as_str(), descriptor.clone());
        debug!(node = %id, name = %name, family = family.name(), "traced input");
        Tracer::from_parts(Vec::new(), id, 0, descriptor, family, self.clone())
    }

    pub fn combiner(&self) -> DescriptorCombiner {
        self.state.borrow().config.combiner.clone()
    }

    pub fn same_session(&self, other: &TraceSession) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Copy of the node recorded under `id`.
    pub fn node(&self, id: NodeId) -> Option<IrNode> {
        self.state.borrow().graph.node(id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.state.borrow().graph.node_count()
    }

    /// Appends `node`, wired to `sources` in operand order.
    pub(crate) fn append(
        &self,
        node: IrNode,
        sources: &[(NodeId, usize)],
    ) -> Result<NodeId, TraceError> {
        let label = node.op.label();
        let id = self.state.borrow_mut().graph.add_node(node, sources)?;
        debug!(node = %id, op = %label, inputs = sources.len(), "traced node");
        Ok(id)
    }

    /// Snapshot of the graph with `outputs` marked as its results.
    ///
    /// The snapshot holds every declared input and the nodes the outputs
    /// depend on; intermediates that were traced and then dropped are left
    /// out. Node ids match the tracers' ids. The session stays usable
    /// afterwards.
    pub fn finish(&self, outputs: &[Tracer]) -> Result<OpGraph, TraceError> {
        if outputs.iter().any(|t| !t.session().same_session(self)) {
            return Err(TraceError::ForeignSession);
        }
        let mut graph = self.state.borrow().graph.clone();
        graph.set_outputs(outputs.iter().map(Tracer::node).collect())?;
        let pruned = graph.prune_unreachable();
        debug!(nodes = graph.node_count(), pruned, "finished trace");
        Ok(graph)
    }
}

impl fmt::Debug for TraceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSession")
            .field("nodes", &self.node_count())
            .finish_non_exhaustive()
    }
}

/// Traces `f` over one input per `(name, descriptor)` parameter and returns
/// the resulting graph, with the tracers `f` returns as outputs.
pub fn trace<F>(
    params: &[(&str, ValueDescriptor)],
    config: TraceConfig,
    f: F,
) -> Result<OpGraph, TraceError>
where
    F: FnOnce(&[Tracer]) -> Result<Vec<Tracer>, TraceError>,
{
    let session = TraceSession::new(config);
    let inputs: Vec<Tracer> = params
        .iter()
        .map(|(name, descriptor)| session.input(*name, descriptor.clone()))
        .collect();
    let outputs = f(&inputs)?;
    session.finish(&outputs)
}
