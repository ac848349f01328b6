//! Data types and value descriptors.
//!
//! Every node output carries a [`ValueDescriptor`]: the element [`DataType`],
//! the shape (empty for scalars) and whether the value is encrypted (fed by
//! a graph input) or clear (derived from constants only).
//!
//! Integer data types carry an explicit bit width and signedness so that
//! constants can be described by the smallest type that holds them, and
//! promotion can widen types to hold both operands.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::value::Value;

/// Element type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer { bit_width: u32, signed: bool },
    Float { bit_width: u32 },
}

impl DataType {
    pub const F64: DataType = DataType::Float { bit_width: 64 };

    pub fn integer(bit_width: u32, signed: bool) -> Self {
        DataType::Integer { bit_width, signed }
    }

    /// Smallest integer type able to hold `value`.
    ///
    /// Non-negative values get an unsigned type of at least one bit; negative
    /// values get a signed type including the sign bit.
    pub fn for_int(value: i64) -> Self {
        if value < 0 {
            DataType::Integer {
                bit_width: 64 - (!value).leading_zeros() + 1,
                signed: true,
            }
        } else {
            DataType::Integer {
                bit_width: (64 - value.leading_zeros()).max(1),
                signed: false,
            }
        }
    }

    /// The type able to hold values of both `self` and `other`.
    ///
    /// Floats absorb integers. Mixing signed and unsigned integers yields a
    /// signed type one bit wider than the unsigned side if needed.
    pub fn promote(self, other: DataType) -> DataType {
        match (self, other) {
            (DataType::Float { bit_width: a }, DataType::Float { bit_width: b }) => {
                DataType::Float { bit_width: a.max(b) }
            }
            (DataType::Float { .. }, DataType::Integer { .. }) => self,
            (DataType::Integer { .. }, DataType::Float { .. }) => other,
            (
                DataType::Integer {
                    bit_width: a,
                    signed: a_signed,
                },
                DataType::Integer {
                    bit_width: b,
                    signed: b_signed,
                },
            ) => {
                if a_signed == b_signed {
                    DataType::Integer {
                        bit_width: a.max(b),
                        signed: a_signed,
                    }
                } else {
                    let (signed_width, unsigned_width) = if a_signed { (a, b) } else { (b, a) };
                    DataType::Integer {
                        bit_width: signed_width.max(unsigned_width + 1),
                        signed: true,
                    }
                }
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer {
                bit_width,
                signed: true,
            } => write!(f, "int{}", bit_width),
            DataType::Integer {
                bit_width,
                signed: false,
            } => write!(f, "uint{}", bit_width),
            DataType::Float { bit_width } => write!(f, "float{}", bit_width),
        }
    }
}

/// Shape and type metadata attached to one node output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueDescriptor {
    pub dtype: DataType,
    /// Empty for scalars.
    pub shape: Vec<usize>,
    pub is_encrypted: bool,
}

impl ValueDescriptor {
    pub fn scalar(dtype: DataType, is_encrypted: bool) -> Self {
        ValueDescriptor {
            dtype,
            shape: Vec::new(),
            is_encrypted,
        }
    }

    pub fn tensor(dtype: DataType, shape: Vec<usize>, is_encrypted: bool) -> Self {
        ValueDescriptor {
            dtype,
            shape,
            is_encrypted,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Returns a copy with the element type replaced.
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Describes a clear constant.
    ///
    /// Fails for ragged arrays and for arrays without any element, neither of
    /// which has a well-defined element type and shape.
    pub fn for_constant(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::Int(v) => Ok(ValueDescriptor::scalar(DataType::for_int(*v), false)),
            Value::Float(_) => Ok(ValueDescriptor::scalar(DataType::F64, false)),
            Value::Array(_) => {
                let shape = value
                    .shape()
                    .ok_or_else(|| CoreError::UnrepresentableConstant {
                        reason: "ragged array".into(),
                    })?;
                let dtype = value
                    .leaves()
                    .into_iter()
                    .map(|leaf| match leaf {
                        Value::Int(v) => DataType::for_int(*v),
                        _ => DataType::F64,
                    })
                    .reduce(DataType::promote)
                    .ok_or_else(|| CoreError::UnrepresentableConstant {
                        reason: "empty array has no element type".into(),
                    })?;
                Ok(ValueDescriptor::tensor(dtype, shape, false))
            }
        }
    }

    /// Descriptor of `self[index]`: the indexed leading axes are dropped.
    ///
    /// Positions are not checked against the shape here; that happens when
    /// the graph is evaluated.
    pub fn indexed(&self, index: &[isize]) -> ValueDescriptor {
        let consumed = index.len().min(self.shape.len());
        ValueDescriptor {
            dtype: self.dtype,
            shape: self.shape[consumed..].to_vec(),
            is_encrypted: self.is_encrypted,
        }
    }
}

impl fmt::Display for ValueDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_encrypted { "enc" } else { "clear" };
        write!(f, "{} {}", status, self.dtype)?;
        if !self.is_scalar() {
            let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
            write!(f, "[{}]", dims.join(", "))?;
        }
        Ok(())
    }
}

/// Derives the output descriptor of a binary operation from its operands.
pub type DescriptorCombiner =
    Arc<
        dyn Fn(&ValueDescriptor, &ValueDescriptor) -> Result<ValueDescriptor, CoreError>
            + Send
            + Sync,
    >;

/// Broadcasts two shapes, aligning trailing axes. `None` if incompatible.
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Option<Vec<usize>> {
    let rank = lhs.len().max(rhs.len());
    let mut shape = Vec::with_capacity(rank);
    for i in 0..rank {
        let l = if i < rank - lhs.len() { 1 } else { lhs[i - (rank - lhs.len())] };
        let r = if i < rank - rhs.len() { 1 } else { rhs[i - (rank - rhs.len())] };
        let dim = match (l, r) {
            _ if l == r => l,
            (1, _) => r,
            (_, 1) => l,
            _ => return None,
        };
        shape.push(dim);
    }
    Some(shape)
}

/// The default descriptor combiner: promotes element types, broadcasts
/// shapes, and marks the result encrypted if either operand is.
pub fn combine_descriptors(
    lhs: &ValueDescriptor,
    rhs: &ValueDescriptor,
) -> Result<ValueDescriptor, CoreError> {
    let shape =
        broadcast_shapes(&lhs.shape, &rhs.shape).ok_or_else(|| CoreError::IncompatibleShapes {
            lhs: lhs.shape.clone(),
            rhs: rhs.shape.clone(),
        })?;
    Ok(ValueDescriptor {
        dtype: lhs.dtype.promote(rhs.dtype),
        shape,
        is_encrypted: lhs.is_encrypted || rhs.is_encrypted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_int_picks_smallest_width() {
        assert_eq!(DataType::for_int(0), DataType::integer(1, false));
        assert_eq!(DataType::for_int(1), DataType::integer(1, false));
        assert_eq!(DataType::for_int(5), DataType::integer(3, false));
        assert_eq!(DataType::for_int(255), DataType::integer(8, false));
        assert_eq!(DataType::for_int(-1), DataType::integer(1, true));
        assert_eq!(DataType::for_int(-2), DataType::integer(2, true));
        assert_eq!(DataType::for_int(-128), DataType::integer(8, true));
        assert_eq!(DataType::for_int(i64::MIN), DataType::integer(64, true));
    }

    #[test]
    fn promote_mixed_signedness_widens() {
        let u8_ = DataType::integer(8, false);
        let i8_ = DataType::integer(8, true);
        assert_eq!(u8_.promote(i8_), DataType::integer(9, true));
        assert_eq!(i8_.promote(DataType::integer(3, false)), i8_);
        assert_eq!(u8_.promote(DataType::integer(4, false)), u8_);
    }

    #[test]
    fn promote_float_absorbs_integer() {
        let f32_ = DataType::Float { bit_width: 32 };
        assert_eq!(DataType::integer(8, true).promote(f32_), f32_);
        assert_eq!(f32_.promote(DataType::F64), DataType::F64);
    }

    #[test]
    fn broadcast_shapes_aligns_trailing_axes() {
        assert_eq!(broadcast_shapes(&[], &[3]), Some(vec![3]));
        assert_eq!(broadcast_shapes(&[2, 3], &[3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shapes(&[2, 1], &[1, 4]), Some(vec![2, 4]));
        assert_eq!(broadcast_shapes(&[2, 3], &[2]), None);
    }

    #[test]
    fn combine_marks_encrypted_and_promotes() {
        let x = ValueDescriptor::scalar(DataType::integer(7, false), true);
        let c = ValueDescriptor::tensor(DataType::integer(3, true), vec![4], false);
        let out = combine_descriptors(&x, &c).unwrap();
        assert_eq!(out.dtype, DataType::integer(8, true));
        assert_eq!(out.shape, vec![4]);
        assert!(out.is_encrypted);
    }

    #[test]
    fn combine_rejects_incompatible_shapes() {
        let a = ValueDescriptor::tensor(DataType::F64, vec![2], true);
        let b = ValueDescriptor::tensor(DataType::F64, vec![3], true);
        assert!(matches!(
            combine_descriptors(&a, &b),
            Err(CoreError::IncompatibleShapes { .. })
        ));
    }

    #[test]
    fn for_constant_describes_arrays() {
        let value = Value::array([Value::array([1i64, -3]), Value::array([2i64, 4])]);
        let desc = ValueDescriptor::for_constant(&value).unwrap();
        assert_eq!(desc.shape, vec![2, 2]);
        assert_eq!(desc.dtype, DataType::integer(4, true));
        assert!(!desc.is_encrypted);

        let mixed = Value::array([Value::Int(1), Value::Float(0.5)]);
        assert_eq!(
            ValueDescriptor::for_constant(&mixed).unwrap().dtype,
            DataType::F64
        );
    }

    #[test]
    fn for_constant_rejects_ragged_and_empty_arrays() {
        let ragged = Value::array([Value::array([1i64]), Value::Int(2)]);
        assert!(matches!(
            ValueDescriptor::for_constant(&ragged),
            Err(CoreError::UnrepresentableConstant { .. })
        ));
        let empty = Value::Array(vec![]);
        assert!(matches!(
            ValueDescriptor::for_constant(&empty),
            Err(CoreError::UnrepresentableConstant { .. })
        ));
    }

    #[test]
    fn indexed_drops_leading_axes() {
        let desc = ValueDescriptor::tensor(DataType::integer(8, false), vec![3, 4], true);
        assert_eq!(desc.indexed(&[2]).shape, vec![4]);
        assert_eq!(desc.indexed(&[2, 1]).shape, Vec::<usize>::new());
        assert_eq!(desc.indexed(&[0, 0, 0]).shape, Vec::<usize>::new());
    }

    #[test]
    fn display_includes_status_and_shape() {
        let desc = ValueDescriptor::tensor(DataType::integer(8, false), vec![3, 4], true);
        assert_eq!(desc.to_string(), "enc uint8[3, 4]");
        let scalar = ValueDescriptor::scalar(DataType::integer(3, true), false);
        assert_eq!(scalar.to_string(), "clear int3");
    }
}
