//! Runtime value representation.
//!
//! [`Value`] is what flows through a graph when it is replayed on sample
//! data: scalars and nested, rectangular arrays of scalars. Arithmetic
//! follows the usual array-programming rules: integer ops are checked,
//! mixing an integer with a float produces a float, and arrays broadcast
//! against scalars and against arrays aligned on their trailing axes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A runtime value produced or consumed while evaluating a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    /// Nested array; elements of one level share a shape when well-formed.
    Array(Vec<Value>),
}

impl Value {
    /// Builds an array value from anything convertible to values.
    pub fn array<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Returns a human-readable description of the value's kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Array(_) => "Array",
        }
    }

    /// Numeric view of a scalar. `None` for arrays.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Array(_) => None,
        }
    }

    /// Number of array axes, following the first element of each level.
    pub fn rank(&self) -> usize {
        match self {
            Value::Array(items) => 1 + items.first().map_or(0, Value::rank),
            _ => 0,
        }
    }

    /// Shape of the value, or `None` if the array is ragged.
    ///
    /// Scalars have the empty shape.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Value::Array(items) => {
                let mut inner: Option<Vec<usize>> = None;
                for item in items {
                    let item_shape = item.shape()?;
                    match &inner {
                        Some(expected) if *expected != item_shape => return None,
                        Some(_) => {}
                        None => inner = Some(item_shape),
                    }
                }
                let mut shape = vec![items.len()];
                shape.extend(inner.unwrap_or_default());
                Some(shape)
            }
            _ => Some(Vec::new()),
        }
    }

    /// All scalar leaves in row-major order.
    pub fn leaves(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            Value::Array(items) => items.iter().for_each(|item| item.collect_leaves(out)),
            scalar => out.push(scalar),
        }
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, ValueError> {
        broadcast(self, rhs, &|a, b| {
            scalar_op(a, b, |x, y| x.checked_add(y).ok_or(ValueError::IntegerOverflow), |x, y| {
                Ok(x + y)
            })
        })
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, ValueError> {
        broadcast(self, rhs, &|a, b| {
            scalar_op(a, b, |x, y| x.checked_sub(y).ok_or(ValueError::IntegerOverflow), |x, y| {
                Ok(x - y)
            })
        })
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, ValueError> {
        broadcast(self, rhs, &|a, b| {
            scalar_op(a, b, |x, y| x.checked_mul(y).ok_or(ValueError::IntegerOverflow), |x, y| {
                Ok(x * y)
            })
        })
    }

    /// True division. Always produces floats, even for two integers.
    pub fn true_div(&self, rhs: &Value) -> Result<Value, ValueError> {
        broadcast(self, rhs, &|a, b| {
            let x = scalar_f64(a)?;
            let y = scalar_f64(b)?;
            if y == 0.0 {
                return Err(ValueError::DivideByZero);
            }
            Ok(Value::Float(x / y))
        })
    }

    /// Floor division, rounding toward negative infinity.
    pub fn floor_div(&self, rhs: &Value) -> Result<Value, ValueError> {
        broadcast(self, rhs, &|a, b| {
            scalar_op(a, b, floor_div_i64, |x, y| {
                if y == 0.0 {
                    Err(ValueError::DivideByZero)
                } else {
                    Ok((x / y).floor())
                }
            })
        })
    }

    /// Indexes successive axes; negative positions count from the end.
    pub fn index(&self, index: &[isize]) -> Result<Value, ValueError> {
        let mut current = self;
        for &position in index {
            let Value::Array(items) = current else {
                return Err(ValueError::IndexScalar);
            };
            let size = items.len();
            let resolved = if position < 0 {
                position + size as isize
            } else {
                position
            };
            if resolved < 0 || resolved as usize >= size {
                return Err(ValueError::OutOfBounds {
                    index: position,
                    size,
                });
            }
            current = &items[resolved as usize];
        }
        Ok(current.clone())
    }
}

fn scalar_f64(value: &Value) -> Result<f64, ValueError> {
    value.as_f64().ok_or(ValueError::TypeMismatch {
        expected: "scalar",
        got: value.type_name(),
    })
}

fn scalar_op(
    lhs: &Value,
    rhs: &Value,
    int_op: impl Fn(i64, i64) -> Result<i64, ValueError>,
    float_op: impl Fn(f64, f64) -> Result<f64, ValueError>,
) -> Result<Value, ValueError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b).map(Value::Int),
        _ => float_op(scalar_f64(lhs)?, scalar_f64(rhs)?).map(Value::Float),
    }
}

fn floor_div_i64(a: i64, b: i64) -> Result<i64, ValueError> {
    if b == 0 {
        return Err(ValueError::DivideByZero);
    }
    let quotient = a.checked_div(b).ok_or(ValueError::IntegerOverflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

fn broadcast<F>(lhs: &Value, rhs: &Value, op: &F) -> Result<Value, ValueError>
where
    F: Fn(&Value, &Value) -> Result<Value, ValueError>,
{
    let (lhs_rank, rhs_rank) = (lhs.rank(), rhs.rank());
    match (lhs, rhs) {
        (Value::Array(items), _) if lhs_rank > rhs_rank => items
            .iter()
            .map(|item| broadcast(item, rhs, op))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (_, Value::Array(items)) if rhs_rank > lhs_rank => items
            .iter()
            .map(|item| broadcast(lhs, item, op))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (Value::Array(left), Value::Array(right)) => {
            let pairs: Vec<(&Value, &Value)> = if left.len() == right.len() {
                left.iter().zip(right.iter()).collect()
            } else if left.len() == 1 {
                right.iter().map(|r| (&left[0], r)).collect()
            } else if right.len() == 1 {
                left.iter().map(|l| (l, &right[0])).collect()
            } else {
                return Err(ValueError::ShapeMismatch {
                    lhs: lhs.shape().unwrap_or_default(),
                    rhs: rhs.shape().unwrap_or_default(),
                });
            };
            pairs
                .into_iter()
                .map(|(l, r)| broadcast(l, r, op))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        _ => op(lhs, rhs),
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
