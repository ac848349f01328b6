//! Default comparison functions for [`Value`] bounds.
//!
//! Both functions reduce arrays to the extreme scalar they contain, so a
//! stored bound is always a scalar even when a node produces tensors.
//! Integers compare exactly; mixed integer/float pairs compare as `f64`.
//! On ties the earlier operand wins. NaN is only kept when no other leaf
//! exists, so the result does not depend on argument order.

use std::cmp::Ordering;

use numgraph_core::Value;

/// Smallest scalar found in `a` or `b`.
pub fn scalar_min(a: &Value, b: &Value) -> Value {
    pick(a, b, Ordering::Less)
}

/// Largest scalar found in `a` or `b`.
pub fn scalar_max(a: &Value, b: &Value) -> Value {
    pick(a, b, Ordering::Greater)
}

fn pick(a: &Value, b: &Value, wanted: Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for leaf in a.leaves().into_iter().chain(b.leaves()) {
        best = match best {
            None => Some(leaf),
            Some(current) if is_nan(current) && !is_nan(leaf) => Some(leaf),
            Some(current) if compare(leaf, current) == Some(wanted) => Some(leaf),
            Some(current) => Some(current),
        };
    }
    // Arrays without elements have nothing to compare.
    best.cloned().unwrap_or_else(|| a.clone())
}

fn is_nan(value: &Value) -> bool {
    matches!(value, Value::Float(f) if f.is_nan())
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(scalar_min(&Value::Int(3), &Value::Int(-2)), Value::Int(-2));
        assert_eq!(scalar_max(&Value::Int(3), &Value::Int(-2)), Value::Int(3));
        assert_eq!(scalar_max(&Value::Int(1), &Value::Float(1.5)), Value::Float(1.5));
    }

    #[test]
    fn self_comparison_reduces_arrays() {
        let arr = Value::array([4i64, -1, 7]);
        assert_eq!(scalar_min(&arr, &arr), Value::Int(-1));
        assert_eq!(scalar_max(&arr, &arr), Value::Int(7));
    }

    #[test]
    fn ties_keep_first_operand() {
        assert_eq!(scalar_min(&Value::Int(2), &Value::Float(2.0)), Value::Int(2));
        assert_eq!(scalar_max(&Value::Float(2.0), &Value::Int(2)), Value::Float(2.0));
    }

    #[test]
    fn nan_is_ignored_in_either_position() {
        let one = Value::Float(1.0);
        let nan = Value::Float(f64::NAN);
        assert_eq!(scalar_min(&one, &nan), one);
        assert_eq!(scalar_min(&nan, &one), one);
        assert_eq!(scalar_max(&nan, &one), one);
        assert_eq!(scalar_max(&Value::array([f64::NAN, -2.0]), &nan), Value::Float(-2.0));
    }

    #[test]
    fn nan_only_values_stay_nan() {
        let nan = Value::Float(f64::NAN);
        assert!(matches!(scalar_min(&nan, &nan), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let a = Value::Int(i64::MAX);
        let b = Value::Int(i64::MAX - 1);
        assert_eq!(scalar_min(&a, &b), b);
    }
}
