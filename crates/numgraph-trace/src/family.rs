//! Operand protocol: which operands a tracer family can combine with, and
//! how raw values become constant tracers.
//!
//! Families trace into different graph dialects and must not be mixed. A
//! family decides compatibility by itself, so the builder methods can
//! decline an operation softly instead of failing.

use std::fmt;

use numgraph_core::Value;

use crate::error::TraceError;
use crate::tracer::Tracer;

/// One side of a binary operation: an existing tracer or a raw value that
/// may be lifted into a constant.
#[derive(Debug, Clone)]
pub enum Operand {
    Tracer(Tracer),
    Value(Value),
}

impl Operand {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Operand::Tracer(t) => format!("{} tracer", t.family().name()),
            Operand::Value(v) => v.type_name().to_string(),
        }
    }
}

impl From<Tracer> for Operand {
    fn from(tracer: Tracer) -> Self {
        Operand::Tracer(tracer)
    }
}

impl From<&Tracer> for Operand {
    fn from(tracer: &Tracer) -> Self {
        Operand::Tracer(tracer.clone())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Value(Value::Int(value))
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Value(Value::Int(value.into()))
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Value(Value::Float(value))
    }
}

/// Capabilities every tracer family provides.
pub trait TracerFamily: fmt::Debug {
    /// Family name. Tracers of the same family share it.
    fn name(&self) -> &'static str;

    /// Whether `origin` can be combined with `other` in a binary operation.
    fn supports_other_operand(&self, origin: &Tracer, other: &Operand) -> bool;

    /// Lifts `value` into a zero-input tracer wrapping a constant node of
    /// `origin`'s session. The tracer's descriptor must be
    /// [`ValueDescriptor::for_constant`](numgraph_core::ValueDescriptor::for_constant)
    /// of `value`, which is what operations are built against.
    fn make_constant_tracer(&self, origin: &Tracer, value: &Value) -> Result<Tracer, TraceError>;
}

/// The default family: accepts numbers, arrays of numbers, and tracers of
/// its own family recorded in the same session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericFamily;

impl NumericFamily {
    pub const NAME: &'static str = "numeric";
}

impl TracerFamily for NumericFamily {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports_other_operand(&self, origin: &Tracer, other: &Operand) -> bool {
        match other {
            Operand::Tracer(t) => {
                t.family().name() == self.name() && t.session().same_session(origin.session())
            }
            Operand::Value(_) => true,
        }
    }

    fn make_constant_tracer(&self, origin: &Tracer, value: &Value) -> Result<Tracer, TraceError> {
        origin.constant_like(value.clone())
    }
}
