//! Evaluates a parsed [`Expr`] against a cube's named variables.
//!
//! Values are either a scalar (numeric literals) or a full `(x,y,t)` array
//! (`alias.subband` references); binary operators broadcast a scalar against
//! an array the same way the reference implementation's array library does.

use std::collections::HashMap;

use dc3_common::{Array3, BuildError};
use thiserror::Error;

use crate::ast::{BinOp, Expr};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("unresolved variable reference: {0}.{1}")]
    UnresolvedVariable(String, String),
}

impl From<EvalError> for BuildError {
    fn from(err: EvalError) -> Self {
        BuildError::bad_request(err.to_string())
    }
}

#[derive(Debug, Clone)]
enum Value {
    Scalar(f64),
    Array(Array3),
}

impl Value {
    fn zip(a: Value, b: Value, scalar_op: impl Fn(f64, f64) -> f64) -> Value {
        match (a, b) {
            (Value::Scalar(x), Value::Scalar(y)) => Value::Scalar(scalar_op(x, y)),
            (Value::Array(arr), Value::Scalar(s)) | (Value::Scalar(s), Value::Array(arr)) => {
                Value::Array(arr.map(|v| scalar_op(v, s)))
            }
            (Value::Array(a), Value::Array(b)) => Value::Array(a.zip_with(&b, &scalar_op)),
        }
    }

    fn into_array(self, shape: (usize, usize, usize)) -> Array3 {
        match self {
            Value::Array(arr) => arr,
            Value::Scalar(s) => Array3::filled(shape.0, shape.1, shape.2, s),
        }
    }
}

/// Evaluate `expr` against `variables` (keyed `"alias.subband"`, matching
/// how [`crate::ast::Expr::referenced_variables`] names its tokens). `shape`
/// is the cube's (x,y,t) dimensions, used to materialize a constant array
/// when the whole expression turns out to be scalar (e.g. a malformed
/// single-literal band).
pub fn evaluate(
    expr: &Expr,
    variables: &HashMap<String, Array3>,
    shape: (usize, usize, usize),
) -> Result<Array3, EvalError> {
    Ok(eval_inner(expr, variables)?.into_array(shape))
}

fn eval_inner(expr: &Expr, variables: &HashMap<String, Array3>) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Scalar(*n)),
        Expr::Var(alias, subband) => {
            let key = format!("{alias}.{subband}");
            variables
                .get(&key)
                .cloned()
                .map(Value::Array)
                .ok_or_else(|| EvalError::UnresolvedVariable(alias.clone(), subband.clone()))
        }
        Expr::BinOp(op, a, b) => {
            let a = eval_inner(a, variables)?;
            let b = eval_inner(b, variables)?;
            let result = match op {
                BinOp::Add => Value::zip(a, b, |x, y| x + y),
                BinOp::Sub => Value::zip(a, b, |x, y| x - y),
                BinOp::Mul => Value::zip(a, b, |x, y| x * y),
                BinOp::Div => Value::zip(a, b, |x, y| {
                    if y == 0.0 {
                        f64::NAN
                    } else {
                        x / y
                    }
                }),
            };
            Ok(result)
        }
        Expr::Neg(inner) => match eval_inner(inner, variables)? {
            Value::Scalar(s) => Ok(Value::Scalar(-s)),
            Value::Array(arr) => Ok(Value::Array(arr.map(|v| -v))),
        },
        Expr::MinMax { is_min, a, b } => {
            let a = eval_inner(a, variables)?;
            let b = eval_inner(b, variables)?;
            let op = *is_min;
            Ok(Value::zip(a, b, move |x, y| {
                if op {
                    x.min(y)
                } else {
                    x.max(y)
                }
            }))
        }
        Expr::Clip { expr, lo, hi } => {
            let value = eval_inner(expr, variables)?;
            let lo = scalar_of(eval_inner(lo, variables)?);
            let hi = scalar_of(eval_inner(hi, variables)?);
            Ok(match value {
                Value::Scalar(s) => Value::Scalar(s.clamp(lo, hi)),
                Value::Array(arr) => Value::Array(arr.map(|v| {
                    if v.is_nan() {
                        v
                    } else {
                        v.clamp(lo, hi)
                    }
                })),
            })
        }
    }
}

fn scalar_of(v: Value) -> f64 {
    match v {
        Value::Scalar(s) => s,
        // clip bounds should be literals per the grammar; if a caller passes
        // an array, fall back to its first cell rather than panicking.
        Value::Array(arr) => arr.as_slice().first().copied().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn var(nx: usize, ny: usize, nt: usize, value: f64) -> Array3 {
        Array3::filled(nx, ny, nt, value)
    }

    #[test]
    fn test_ndvi_like_expression() {
        let mut vars = HashMap::new();
        vars.insert("s2.b08".to_string(), var(2, 1, 1, 0.8));
        vars.insert("s2.b04".to_string(), var(2, 1, 1, 0.2));
        let expr = parse("(s2.b08 - s2.b04) / (s2.b08 + s2.b04)").unwrap();
        let result = evaluate(&expr, &vars, (2, 1, 1)).unwrap();
        assert!((result.get(0, 0, 0) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_clip_bounds_respected() {
        let mut vars = HashMap::new();
        let mut arr = var(2, 1, 1, 0.0);
        arr.set(0, 0, 0, 5.0);
        arr.set(1, 0, 0, -5.0);
        vars.insert("s2.x".to_string(), arr);
        let expr = parse("clip(s2.x, -1, 1)").unwrap();
        let result = evaluate(&expr, &vars, (2, 1, 1)).unwrap();
        assert_eq!(result.get(0, 0, 0), 1.0);
        assert_eq!(result.get(1, 0, 0), -1.0);
    }

    #[test]
    fn test_unresolved_variable_errors() {
        let vars = HashMap::new();
        let expr = parse("s2.b04").unwrap();
        assert!(matches!(
            evaluate(&expr, &vars, (1, 1, 1)),
            Err(EvalError::UnresolvedVariable(_, _))
        ));
    }

    #[test]
    fn test_division_by_zero_yields_nan_not_panic() {
        let mut vars = HashMap::new();
        vars.insert("a.b".to_string(), var(1, 1, 1, 1.0));
        vars.insert("c.d".to_string(), var(1, 1, 1, 0.0));
        let expr = parse("a.b / c.d").unwrap();
        let result = evaluate(&expr, &vars, (1, 1, 1)).unwrap();
        assert!(result.get(0, 0, 0).is_nan());
    }
}
