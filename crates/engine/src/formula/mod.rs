// Formula parsing and evaluation

pub mod eval;
pub mod parser;
pub mod refs;

use serde::{Deserialize, Serialize};

use crate::error::{FormulaError, FormulaParseError};
use crate::position::Position;

use self::eval::ValueSource;
use self::parser::Expr;

/// A parsed formula.
///
/// Holds the AST only; the textual form is always re-derived from the AST,
/// which is what normalizes whitespace and parenthesization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    /// Parse an expression body (without the leading `=`).
    pub fn parse(body: &str) -> Result<Self, FormulaParseError> {
        Ok(Self {
            expr: parser::parse(body)?,
        })
    }

    /// Canonical expression text, without the leading `=`.
    pub fn expression(&self) -> String {
        parser::format_expr(&self.expr)
    }

    /// Evaluate against a grid.
    pub fn evaluate(&self, source: &dyn ValueSource) -> Result<f64, FormulaError> {
        eval::evaluate(&self.expr, source)
    }

    /// The valid positions this formula reads, sorted and deduplicated.
    pub fn referenced_cells(&self) -> Vec<Position> {
        refs::referenced_cells(&self.expr)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}
