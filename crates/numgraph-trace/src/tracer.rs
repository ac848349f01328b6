//! The graph builder.
//!
//! A [`Tracer`] stands for one output of one node in a trace session. Every
//! builder method appends exactly one node and wraps its output in a new
//! tracer of the receiver's family. Tracers are immutable; sharing them
//! across several operations is how the graph gets its fan-out.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use numgraph_core::{
    ArithOp, DataType, GenericFunction, HostFn, IrNode, NodeId, NodeOp, Value, ValueDescriptor,
    ValueError,
};

use crate::error::TraceError;
use crate::family::{Operand, TracerFamily};
use crate::session::TraceSession;

/// Outcome of a builder method whose operand may belong to another family.
#[derive(Debug, Clone)]
pub enum Traced {
    Applicable(Tracer),
    /// The receiver's family cannot combine with the operand; another
    /// handler may still accept it.
    NotApplicable,
}

impl Traced {
    pub fn is_applicable(&self) -> bool {
        matches!(self, Traced::Applicable(_))
    }

    pub fn into_tracer(self) -> Option<Tracer> {
        match self {
            Traced::Applicable(t) => Some(t),
            Traced::NotApplicable => None,
        }
    }
}

/// Static index metadata for [`Tracer::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIndex(pub Vec<isize>);

impl From<isize> for StaticIndex {
    fn from(i: isize) -> Self {
        StaticIndex(vec![i])
    }
}

impl From<i32> for StaticIndex {
    fn from(i: i32) -> Self {
        StaticIndex(vec![i as isize])
    }
}

impl From<Vec<isize>> for StaticIndex {
    fn from(index: Vec<isize>) -> Self {
        StaticIndex(index)
    }
}

impl From<&[isize]> for StaticIndex {
    fn from(index: &[isize]) -> Self {
        StaticIndex(index.to_vec())
    }
}

impl<const N: usize> From<[isize; N]> for StaticIndex {
    fn from(index: [isize; N]) -> Self {
        StaticIndex(index.to_vec())
    }
}

#[derive(Clone, Copy)]
enum Division {
    True,
    Floor,
}

impl Division {
    fn name(self) -> &'static str {
        match self {
            Division::True => "truediv",
            Division::Floor => "floordiv",
        }
    }

    fn host_fn(self) -> HostFn {
        match self {
            Division::True => Arc::new(|args: &[Value]| match args {
                [x, y] => x.true_div(y),
                _ => Err(ValueError::ArgumentCount {
                    expected: 2,
                    got: args.len(),
                }),
            }),
            Division::Floor => Arc::new(|args: &[Value]| match args {
                [x, y] => x.floor_div(y),
                _ => Err(ValueError::ArgumentCount {
                    expected: 2,
                    got: args.len(),
                }),
            }),
        }
    }
}

struct TracerInner {
    inputs: Vec<Tracer>,
    node: NodeId,
    output_index: usize,
    output: ValueDescriptor,
    family: Rc<dyn TracerFamily>,
    session: TraceSession,
}

/// Builder-side handle to one output of one traced node.
#[derive(Clone)]
pub struct Tracer {
    inner: Rc<TracerInner>,
}

impl Tracer {
    pub(crate) fn from_parts(
        inputs: Vec<Tracer>,
        node: NodeId,
        output_index: usize,
        output: ValueDescriptor,
        family: Rc<dyn TracerFamily>,
        session: TraceSession,
    ) -> Self {
        Tracer {
            inner: Rc::new(TracerInner {
                inputs,
                node,
                output_index,
                output,
                family,
                session,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Tracers that fed this tracer's node, in operand order.
    pub fn inputs(&self) -> &[Tracer] {
        &self.inner.inputs
    }

    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn output_index(&self) -> usize {
        self.inner.output_index
    }

    /// Descriptor of the node output this tracer denotes.
    pub fn output(&self) -> &ValueDescriptor {
        &self.inner.output
    }

    pub fn family(&self) -> &dyn TracerFamily {
        self.inner.family.as_ref()
    }

    pub fn session(&self) -> &TraceSession {
        &self.inner.session
    }

    /// Copy of the traced node.
    pub fn traced_node(&self) -> Option<IrNode> {
        self.inner.session.node(self.inner.node)
    }

    /// Whether the traced node is a constant.
    pub fn is_constant(&self) -> bool {
        self.traced_node()
            .is_some_and(|node| matches!(node.op, NodeOp::Constant { .. }))
    }

    // -----------------------------------------------------------------------
    // Node instantiation
    // -----------------------------------------------------------------------

    /// A constant tracer in this tracer's session and family.
    pub fn constant_like(&self, value: Value) -> Result<Tracer, TraceError> {
        let node = IrNode::constant(value).map_err(TraceError::from_lifting)?;
        let output = node.outputs[0].clone();
        let id = self.inner.session.append(node, &[])?;
        Ok(self.derive(Vec::new(), id, 0, output))
    }

    /// Returns `operand` as a tracer, lifting raw values into constants.
    pub fn sanitize(&self, operand: Operand) -> Result<Tracer, TraceError> {
        match operand {
            Operand::Tracer(t) if t.session().same_session(self.session()) => Ok(t),
            Operand::Tracer(_) => Err(TraceError::ForeignSession),
            Operand::Value(v) => self.family().make_constant_tracer(self, &v),
        }
    }

    /// Descriptor `operand` has once sanitized. Does not touch the graph.
    fn operand_descriptor(&self, operand: &Operand) -> Result<ValueDescriptor, TraceError> {
        match operand {
            Operand::Tracer(t) if t.session().same_session(self.session()) => {
                Ok(t.output().clone())
            }
            Operand::Tracer(_) => Err(TraceError::ForeignSession),
            Operand::Value(v) => ValueDescriptor::for_constant(v).map_err(TraceError::from_lifting),
        }
    }

    /// Sanitizes `inputs`, builds one `op` node from their descriptors and
    /// returns one tracer per node output, all of this tracer's family.
    ///
    /// The node is built before any constant is lifted, so a failure leaves
    /// the session graph untouched.
    pub fn instantiate_output_tracers(
        &self,
        inputs: Vec<Operand>,
        op: NodeOp,
    ) -> Result<Vec<Tracer>, TraceError> {
        let descriptors = inputs
            .iter()
            .map(|input| self.operand_descriptor(input))
            .collect::<Result<Vec<_>, _>>()?;
        let combiner = op
            .requires_descriptor_combiner()
            .then(|| self.inner.session.combiner());
        let node = IrNode::new(op, descriptors, combiner.as_ref())?;
        self.append_node(inputs, node)
    }

    fn append_node(&self, inputs: Vec<Operand>, node: IrNode) -> Result<Vec<Tracer>, TraceError> {
        let sanitized = inputs
            .into_iter()
            .map(|input| self.sanitize(input))
            .collect::<Result<Vec<_>, _>>()?;
        let sources: Vec<(NodeId, usize)> = sanitized
            .iter()
            .map(|t| (t.node(), t.output_index()))
            .collect();
        let outputs = node.outputs.clone();
        let id = self.inner.session.append(node, &sources)?;
        Ok(outputs
            .into_iter()
            .enumerate()
            .map(|(index, output)| self.derive(sanitized.clone(), id, index, output))
            .collect())
    }

    fn derive(
        &self,
        inputs: Vec<Tracer>,
        node: NodeId,
        output_index: usize,
        output: ValueDescriptor,
    ) -> Tracer {
        Tracer::from_parts(
            inputs,
            node,
            output_index,
            output,
            self.inner.family.clone(),
            self.inner.session.clone(),
        )
    }

    // -----------------------------------------------------------------------
    // Arithmetic
    // -----------------------------------------------------------------------

    fn arith(&self, other: Operand, op: ArithOp, reflected: bool) -> Result<Traced, TraceError> {
        if !self.family().supports_other_operand(self, &other) {
            return Ok(Traced::NotApplicable);
        }
        let this = Operand::Tracer(self.clone());
        let inputs = if reflected { vec![other, this] } else { vec![this, other] };
        let node_op = NodeOp::Arith(op);
        let kind = node_op.kind();
        let outputs = self.instantiate_output_tracers(inputs, node_op)?;
        single_output(outputs, kind).map(Traced::Applicable)
    }

    /// `self + other`.
    pub fn add(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.arith(other.into(), ArithOp::Add, false)
    }

    /// `other + self`, traced exactly like `self + other`.
    pub fn radd(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.add(other)
    }

    /// `self - other`.
    pub fn sub(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.arith(other.into(), ArithOp::Sub, false)
    }

    /// `other - self`; the node's operands are `[other, self]`.
    pub fn rsub(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.arith(other.into(), ArithOp::Sub, true)
    }

    /// `self * other`.
    pub fn mul(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.arith(other.into(), ArithOp::Mul, false)
    }

    /// `other * self`, traced exactly like `self * other`.
    pub fn rmul(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.mul(other)
    }

    /// `-self`, traced as `0 - self`.
    pub fn neg(&self) -> Result<Traced, TraceError> {
        self.rsub(0i64)
    }

    // -----------------------------------------------------------------------
    // Division
    // -----------------------------------------------------------------------

    fn divide(
        &self,
        other: Operand,
        division: Division,
        reflected: bool,
    ) -> Result<Traced, TraceError> {
        if !self.family().supports_other_operand(self, &other) {
            return Ok(Traced::NotApplicable);
        }
        let this = Operand::Tracer(self.clone());
        let (lhs, rhs) = if reflected { (other, this) } else { (this, other) };
        let descriptors = [self.operand_descriptor(&lhs)?, self.operand_descriptor(&rhs)?];

        if !(lifts_to_constant(&lhs) || lifts_to_constant(&rhs)) {
            return Err(TraceError::UnrepresentableDivision {
                op_name: division.name(),
            });
        }

        let combine = self.inner.session.combiner();
        let mut output = combine(&descriptors[0], &descriptors[1])?;
        if let Division::True = division {
            output = output.with_dtype(DataType::F64);
        }

        let func = GenericFunction::new(division.host_fn(), output, "TLU", division.name());
        let node = IrNode::new(NodeOp::GenericFunction(func), descriptors, None)?;
        let outputs = self.append_node(vec![lhs, rhs], node)?;
        single_output(outputs, "GenericFunction").map(Traced::Applicable)
    }

    /// `self / other`. One operand must be constant; the result is a float.
    pub fn truediv(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.divide(other.into(), Division::True, false)
    }

    /// `other / self`.
    pub fn rtruediv(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.divide(other.into(), Division::True, true)
    }

    /// `self // other`. One operand must be constant.
    pub fn floordiv(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.divide(other.into(), Division::Floor, false)
    }

    /// `other // self`.
    pub fn rfloordiv(&self, other: impl Into<Operand>) -> Result<Traced, TraceError> {
        self.divide(other.into(), Division::Floor, true)
    }

    // -----------------------------------------------------------------------
    // Indexing
    // -----------------------------------------------------------------------

    /// `self[item]` with a static index. Positions are checked when the
    /// graph is evaluated, not here.
    pub fn index(&self, item: impl Into<StaticIndex>) -> Result<Tracer, TraceError> {
        let StaticIndex(index) = item.into();
        let op = NodeOp::IndexConstant { index };
        let kind = op.kind();
        let outputs = self.instantiate_output_tracers(vec![Operand::Tracer(self.clone())], op)?;
        single_output(outputs, kind)
    }
}

/// Whether `operand` is, or will be lifted into, a constant node.
fn lifts_to_constant(operand: &Operand) -> bool {
    match operand {
        Operand::Tracer(t) => t.is_constant(),
        Operand::Value(_) => true,
    }
}

fn single_output(mut outputs: Vec<Tracer>, kind: &'static str) -> Result<Tracer, TraceError> {
    match outputs.len() {
        1 => outputs.pop().ok_or(TraceError::UnexpectedOutputCount { kind, count: 0 }),
        count => Err(TraceError::UnexpectedOutputCount { kind, count }),
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("node", &self.inner.node)
            .field("output_index", &self.inner.output_index)
            .field("output", &self.inner.output)
            .field("family", &self.inner.family.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use numgraph_core::CoreError;

    use super::*;
    use crate::family::NumericFamily;
    use crate::session::{TraceConfig, TraceSession};

    fn enc(bits: u32) -> ValueDescriptor {
        ValueDescriptor::scalar(DataType::integer(bits, false), true)
    }

    fn session() -> TraceSession {
        TraceSession::new(TraceConfig::default())
    }

    fn applied(traced: Result<Traced, TraceError>) -> Tracer {
        traced.unwrap().into_tracer().expect("operation should apply")
    }

    #[test]
    fn add_records_operands_in_order() {
        let s = session();
        let a = s.input("a", enc(3));
        let b = s.input("b", enc(5));
        let sum = applied(a.add(&b));

        assert_eq!(sum.inputs().len(), 2);
        assert_eq!(sum.inputs()[0].node(), a.node());
        assert_eq!(sum.inputs()[1].node(), b.node());
        assert_eq!(sum.output_index(), 0);
        assert_eq!(sum.output(), &enc(5));
        assert_eq!(sum.family().name(), NumericFamily::NAME);
    }

    #[test]
    fn output_matches_node_declaration() {
        let s = session();
        let a = s.input("a", enc(3));
        let product = applied(a.mul(4i64));
        let node = product.traced_node().unwrap();
        assert_eq!(&node.outputs[product.output_index()], product.output());
    }

    #[test]
    fn reflected_sub_swaps_operands() {
        let s = session();
        let a = s.input("a", enc(3));
        let diff = applied(a.rsub(7i64));
        assert!(diff.inputs()[0].is_constant());
        assert_eq!(diff.inputs()[1].node(), a.node());
    }

    #[test]
    fn neg_is_subtraction_from_zero() {
        let s = session();
        let a = s.input("a", enc(3));
        let neg = applied(a.neg());
        let node = neg.traced_node().unwrap();
        assert!(matches!(node.op, NodeOp::Arith(ArithOp::Sub)));
        let zero = neg.inputs()[0].traced_node().unwrap();
        assert!(matches!(zero.op, NodeOp::Constant { value: Value::Int(0) }));
        assert_eq!(neg.inputs()[1].node(), a.node());
    }

    #[test]
    fn structurally_equal_operations_are_distinct_nodes() {
        let s = session();
        let a = s.input("a", enc(3));
        let first = applied(a.add(1i64));
        let second = applied(a.add(1i64));
        assert_ne!(first.node(), second.node());
        assert_eq!(s.node_count(), 5);
    }

    #[test]
    fn truediv_forces_float_output() {
        let s = session();
        let a = s.input("a", enc(4));
        let q = applied(a.truediv(2i64));
        assert_eq!(q.output().dtype, DataType::F64);
        assert!(q.output().is_encrypted);

        let floor = applied(a.floordiv(2i64));
        assert_eq!(floor.output(), &enc(4));
    }

    #[test]
    fn reflected_division_puts_constant_first() {
        let s = session();
        let a = s.input("a", enc(4));
        let q = applied(a.rfloordiv(100i64));
        assert!(q.inputs()[0].is_constant());
        assert_eq!(q.inputs()[1].node(), a.node());
        let node = q.traced_node().unwrap();
        let NodeOp::GenericFunction(func) = node.op else {
            panic!("expected a generic function, got {:?}", node.op);
        };
        assert_eq!(func.op_name, "floordiv");
        assert_eq!(func.call(&[Value::Int(100), Value::Int(7)]), Ok(Value::Int(14)));
    }

    #[test]
    fn division_host_fn_checks_argument_count() {
        let func = Division::True.host_fn();
        assert_eq!(
            func(&[Value::Int(1)]),
            Err(ValueError::ArgumentCount { expected: 2, got: 1 })
        );
    }

    #[test]
    fn unsupported_constant_is_a_hard_error() {
        let s = session();
        let a = s.input("a", enc(4));
        let ragged = Value::Array(vec![Value::array([1i64, 2]), Value::array([3i64])]);
        assert!(matches!(a.add(ragged), Err(TraceError::UnsupportedConstant { .. })));
        assert!(matches!(
            a.mul(Value::Array(Vec::new())),
            Err(TraceError::UnsupportedConstant { .. })
        ));
    }

    #[test]
    fn numeric_family_lifts_with_the_constant_descriptor() {
        let s = session();
        let a = s.input("a", enc(4));
        let value = Value::array([-3i64, 7]);
        let lifted = NumericFamily.make_constant_tracer(&a, &value).unwrap();
        assert_eq!(lifted.output(), &ValueDescriptor::for_constant(&value).unwrap());
        assert!(lifted.is_constant());

        let empty = Value::Array(Vec::new());
        assert!(matches!(
            NumericFamily.make_constant_tracer(&a, &empty),
            Err(TraceError::UnsupportedConstant { .. })
        ));
        assert_eq!(s.node_count(), 2);
    }

    #[test]
    fn failed_operations_leave_the_graph_untouched() {
        let s = session();
        let desc = ValueDescriptor::tensor(DataType::integer(4, false), vec![2], true);
        let t = s.input("t", desc);
        let wide = Value::array([1i64, 2, 3]);

        assert!(matches!(
            t.add(wide.clone()),
            Err(TraceError::Core(CoreError::IncompatibleShapes { .. }))
        ));
        assert!(matches!(
            t.rtruediv(wide),
            Err(TraceError::Core(CoreError::IncompatibleShapes { .. }))
        ));
        let other = s.input("u", enc(4));
        assert!(matches!(
            t.floordiv(&other),
            Err(TraceError::UnrepresentableDivision { .. })
        ));
        assert_eq!(s.node_count(), 2);
    }

    #[test]
    fn foreign_session_tracers_are_not_applicable() {
        let a = session().input("a", enc(4));
        let b = session().input("b", enc(4));
        assert!(!a.add(&b).unwrap().is_applicable());
        assert!(matches!(a.sanitize(Operand::Tracer(b)), Err(TraceError::ForeignSession)));
    }

    #[test]
    fn index_accepts_several_forms() {
        let s = session();
        let desc = ValueDescriptor::tensor(DataType::integer(4, false), vec![3, 2], true);
        let t = s.input("t", desc);
        let row = t.index(1).unwrap();
        assert_eq!(row.output().shape, vec![2]);
        let cell = t.index([1isize, -1]).unwrap();
        assert!(cell.output().is_scalar());
        let node = cell.traced_node().unwrap();
        assert!(matches!(node.op, NodeOp::IndexConstant { ref index } if index == &vec![1, -1]));
    }
}
