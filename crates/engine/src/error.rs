//! Error types.
//!
//! Two layers, matching how failures surface:
//!
//! - [`SheetError`] aborts the operation that raised it and leaves the sheet
//!   untouched (or fully rolled back, for `CircularDependency`).
//! - [`FormulaError`] is produced while evaluating a formula and becomes the
//!   cell's value. It propagates through operators on later reads instead of
//!   being raised.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Evaluation-time failure carried inside a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaError {
    /// Reference to a position outside the valid grid.
    Ref,
    /// Non-numeric text used as an arithmetic operand.
    Value,
    /// Division by zero.
    Div0,
    /// Overflow or any other non-finite arithmetic result.
    Arithm,
}

impl FormulaError {
    /// Per-variant diagnostic code.
    pub fn code(self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Div0 => "#DIV0!",
            FormulaError::Arithm => "#ARITHM!",
        }
    }
}

/// All variants render as the single `#ARITHM!` token; printed grid output
/// does not distinguish the failure reason.
impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("#ARITHM!")
    }
}

/// A formula that failed to parse. Raised at edit time, before any part of
/// the sheet is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("formula parse error: {0}")]
pub struct FormulaParseError(pub String);

impl FormulaParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised by sheet operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    #[error("position is outside the sheet bounds")]
    InvalidPosition,

    #[error(transparent)]
    Parse(#[from] FormulaParseError),

    #[error("circular dependency detected")]
    CircularDependency,
}

pub type Result<T> = std::result::Result<T, SheetError>;
