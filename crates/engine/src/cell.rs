//! Cell content and the per-cell value cache.
//!
//! A cell is one of three variants (empty, literal text, formula). Computed
//! values are memoized under `&self`; the sheet drops caches transitively
//! when an edit lands. Dependency edges are not stored here — they live in
//! the sheet's [`crate::dep_graph::DepGraph`], keyed by position.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::formula::eval::{Value, ValueSource};
use crate::formula::Formula;
use crate::position::Position;

/// Marks a formula when it leads the raw input ("=A1+1").
pub const FORMULA_SIGN: char = '=';
/// Escapes the rest of a text cell from interpretation ("'=not a formula").
pub const ESCAPE_SIGN: char = '\'';

/// The content variant of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellBody {
    Empty,
    /// Raw text as entered, leading escape included.
    Text(String),
    Formula(Formula),
}

/// Memoization state. `cached` is `Some` only while `dirty` is false.
#[derive(Debug, Clone, Default)]
struct EvalState {
    cached: Option<Value>,
    dirty: bool,
}

/// One cell of the sheet: a content variant plus its lazily computed,
/// invalidation-aware value cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    body: CellBody,
    #[serde(skip)]
    state: RefCell<EvalState>,
}

impl Cell {
    pub fn new(body: CellBody) -> Self {
        Self {
            body,
            state: RefCell::new(EvalState::default()),
        }
    }

    pub fn body(&self) -> &CellBody {
        &self.body
    }

    /// The cell's computed value, memoized until the next invalidation.
    ///
    /// Empty reads as `""`; text reads as itself with one leading escape
    /// stripped; a formula evaluates against `source` with errors lifted
    /// into the value.
    pub fn value(&self, source: &dyn ValueSource) -> Value {
        if let Some(cached) = &self.state.borrow().cached {
            return cached.clone();
        }

        let value = match &self.body {
            CellBody::Empty => Value::default(),
            CellBody::Text(raw) => {
                let shown = raw.strip_prefix(ESCAPE_SIGN).unwrap_or(raw);
                Value::Text(shown.to_string())
            }
            CellBody::Formula(formula) => match formula.evaluate(source) {
                Ok(n) => Value::Number(n),
                Err(e) => Value::Error(e),
            },
        };

        let mut state = self.state.borrow_mut();
        state.cached = Some(value.clone());
        state.dirty = false;
        value
    }

    /// The cell's raw textual form: `""` for empty, the text verbatim
    /// (escape preserved), or `=` plus the formula's canonical expression.
    pub fn text(&self) -> String {
        match &self.body {
            CellBody::Empty => String::new(),
            CellBody::Text(raw) => raw.clone(),
            CellBody::Formula(formula) => format!("{}{}", FORMULA_SIGN, formula.expression()),
        }
    }

    /// Positions this cell's formula reads; empty for non-formula bodies.
    pub fn referenced_cells(&self) -> Vec<Position> {
        match &self.body {
            CellBody::Formula(formula) => formula.referenced_cells(),
            _ => Vec::new(),
        }
    }

    /// Drop the cached value and set the invalidation guard. Returns false
    /// if the cell was already invalidated — the caller stops walking there,
    /// since everything downstream is already dirty.
    pub(crate) fn mark_dirty(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.dirty {
            return false;
        }
        state.cached = None;
        state.dirty = true;
        true
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self) -> bool {
        self.state.borrow().cached.is_some()
    }
}
