// Formula evaluator - walks the AST post-order against a cell lookup seam

use serde::{Deserialize, Serialize};

use crate::error::FormulaError;
use crate::position::Position;

use super::parser::{Expr, Op};

// =============================================================================
// Value: the scalar every cell read produces
// =============================================================================

/// A computed cell value: literal text, a finite number, or an evaluation
/// error. Empty cells read as `Text("")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

/// Boundary rendering: numbers in shortest round-trip form, text verbatim,
/// errors collapsed to `#ARITHM!`.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Read access the evaluator needs into the grid.
///
/// `None` means the position holds no cell, or an empty one; the evaluator
/// treats both as 0.
pub trait ValueSource {
    fn value_at(&self, pos: Position) -> Option<Value>;
}

/// Evaluate an expression. Operands evaluate post-order, left to right, so
/// on ties the leftmost operand's error wins.
pub fn evaluate(expr: &Expr, source: &dyn ValueSource) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::CellRef(cell) => {
            if !cell.is_valid() {
                return Err(FormulaError::Ref);
            }
            match source.value_at(*cell) {
                None => Ok(0.0),
                Some(Value::Number(n)) => Ok(n),
                Some(Value::Error(e)) => Err(e),
                Some(Value::Text(s)) => number_from_text(&s),
            }
        }
        Expr::Neg(inner) => Ok(-evaluate(inner, source)?),
        Expr::BinaryOp { op, left, right } => {
            let lhs = evaluate(left, source)?;
            let rhs = evaluate(right, source)?;
            let result = match op {
                Op::Add => lhs + rhs,
                Op::Sub => lhs - rhs,
                Op::Mul => lhs * rhs,
                Op::Div => {
                    if rhs == 0.0 {
                        return Err(FormulaError::Div0);
                    }
                    lhs / rhs
                }
            };
            // Overflow and inf/nan operands surface here
            if result.is_finite() {
                Ok(result)
            } else {
                Err(FormulaError::Arithm)
            }
        }
    }
}

/// Coerce a text operand: the whole string must parse as a finite double.
fn number_from_text(s: &str) -> Result<f64, FormulaError> {
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(FormulaError::Value)
}
