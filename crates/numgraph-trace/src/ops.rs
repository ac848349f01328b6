//! Operator sugar over the builder methods.
//!
//! `&a + &b`, `&a - 3`, `2.0 * &a`, `&a / 4` and `-&a` trace exactly like
//! the named methods. Each operator tries the left operand's handler first
//! and then the right operand's reflected handler; when neither applies the
//! result is [`TraceError::IncompatibleOperands`]. Floor division has no
//! operator and is only available as [`Tracer::floordiv`].

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::TraceError;
use crate::family::Operand;
use crate::tracer::{Traced, Tracer};

fn resolve(
    op_name: &'static str,
    lhs: &Operand,
    rhs: &Operand,
    forward: impl FnOnce() -> Option<Result<Traced, TraceError>>,
    reflected: impl FnOnce() -> Option<Result<Traced, TraceError>>,
) -> Result<Tracer, TraceError> {
    if let Some(result) = forward() {
        if let Traced::Applicable(t) = result? {
            return Ok(t);
        }
    }
    if let Some(result) = reflected() {
        if let Traced::Applicable(t) = result? {
            return Ok(t);
        }
    }
    Err(TraceError::IncompatibleOperands {
        op_name,
        lhs: lhs.describe(),
        rhs: rhs.describe(),
    })
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $op_name:literal, $forward:ident, $reflected:ident) => {
        impl $trait<&Tracer> for &Tracer {
            type Output = Result<Tracer, TraceError>;

            fn $method(self, rhs: &Tracer) -> Self::Output {
                let (l, r) = (Operand::from(self), Operand::from(rhs));
                resolve(
                    $op_name,
                    &l,
                    &r,
                    || Some(Tracer::$forward(self, rhs)),
                    || Some(Tracer::$reflected(rhs, self)),
                )
            }
        }

        binary_operator!(@scalar $trait, $method, $op_name, $forward, $reflected, i64);
        binary_operator!(@scalar $trait, $method, $op_name, $forward, $reflected, f64);
    };
    (
        @scalar $trait:ident,
        $method:ident,
        $op_name:literal,
        $forward:ident,
        $reflected:ident,
        $scalar:ty
    ) => {
        impl $trait<$scalar> for &Tracer {
            type Output = Result<Tracer, TraceError>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                let (l, r) = (Operand::from(self), Operand::from(rhs));
                resolve($op_name, &l, &r, || Some(Tracer::$forward(self, rhs)), || None)
            }
        }

        impl $trait<&Tracer> for $scalar {
            type Output = Result<Tracer, TraceError>;

            fn $method(self, rhs: &Tracer) -> Self::Output {
                let (l, r) = (Operand::from(self), Operand::from(rhs));
                resolve($op_name, &l, &r, || None, || Some(Tracer::$reflected(rhs, self)))
            }
        }
    };
}

binary_operator!(Add, add, "add", add, radd);
binary_operator!(Sub, sub, "sub", sub, rsub);
binary_operator!(Mul, mul, "mul", mul, rmul);
binary_operator!(Div, div, "truediv", truediv, rtruediv);

impl Neg for &Tracer {
    type Output = Result<Tracer, TraceError>;

    fn neg(self) -> Self::Output {
        match Tracer::neg(self)? {
            Traced::Applicable(t) => Ok(t),
            Traced::NotApplicable => Err(TraceError::IncompatibleOperands {
                op_name: "neg",
                lhs: "int".to_string(),
                rhs: Operand::from(self).describe(),
            }),
        }
    }
}
