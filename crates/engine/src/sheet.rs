//! The sheet: a sparse grid of cells plus the dependency machinery.
//!
//! All mutation funnels through [`Sheet::set_cell`] and
//! [`Sheet::clear_cell`]. An edit is accepted only after the dependency
//! graph stays acyclic with the new edges installed; otherwise the prior
//! content is reinstalled and the edit reports [`SheetError::CircularDependency`].
//! Reads are lazy: values compute on first access and stay cached until an
//! edit invalidates them transitively.

use std::io::{self, Write};

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::{Cell, CellBody, FORMULA_SIGN};
use crate::dep_graph::DepGraph;
use crate::error::{Result, SheetError};
use crate::formula::eval::{Value, ValueSource};
use crate::formula::Formula;
use crate::position::{Position, Size};

/// Sparse spreadsheet grid.
#[derive(Debug, Default, Clone)]
pub struct Sheet {
    cells: FxHashMap<Position, Cell>,
    graph: DepGraph,
    printable: Size,
}

impl ValueSource for Sheet {
    fn value_at(&self, pos: Position) -> Option<Value> {
        let cell = self.cells.get(&pos)?;
        if matches!(cell.body(), CellBody::Empty) {
            return None;
        }
        Some(cell.value(self))
    }
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `text` into the cell at `pos`.
    ///
    /// Empty text empties the cell; `=` followed by an expression makes it
    /// a formula (`=` alone is the literal text "="); anything else is
    /// literal text. Fails with `Parse` before touching the sheet when a
    /// formula does not parse, and with `CircularDependency` after a full
    /// rollback when the new references would close a loop.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        let body = body_from_text(text)?;

        let prior = self.cells.get(&pos).map(|cell| cell.body().clone());
        self.install(pos, body);

        if self.graph.creates_cycle(pos) {
            debug!("rejected edit at {}: circular dependency", pos);
            match prior {
                Some(body) => self.install(pos, body),
                None => self.remove_cell(pos),
            }
            return Err(SheetError::CircularDependency);
        }

        trace!("set {} to {:?}", pos, text);
        self.printable.cover(pos);
        Ok(())
    }

    /// Read-only handle to the cell at `pos`, if one exists.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(self.cells.get(&pos))
    }

    /// Empty the cell at `pos` and release it.
    ///
    /// Incoming dependency edges survive in the graph (they are keyed by
    /// position), so formulas that read the cleared position keep working
    /// and see it as empty. The printable rectangle is recomputed and may
    /// shrink.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        if self.cells.contains_key(&pos) {
            trace!("cleared {}", pos);
            self.remove_cell(pos);
            self.recompute_printable();
        }
        Ok(())
    }

    /// The computed value at `pos`; empty positions read as empty text.
    pub fn value(&self, pos: Position) -> Result<Value> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(self
            .cells
            .get(&pos)
            .map(|cell| cell.value(self))
            .unwrap_or_default())
    }

    /// The raw text at `pos`; empty positions read as "".
    pub fn text(&self, pos: Position) -> Result<String> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(self
            .cells
            .get(&pos)
            .map(|cell| cell.text())
            .unwrap_or_default())
    }

    /// The smallest rectangle anchored at (0,0) covering every present cell.
    pub fn printable_size(&self) -> Size {
        self.printable
    }

    /// Print computed values over the printable rectangle, row-major,
    /// tab-separated, one `\n` per row. Absent cells print nothing.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.value(self).to_string())
    }

    /// Print raw texts over the printable rectangle, same shape as
    /// [`Sheet::print_values`].
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.text())
    }

    /// The dependency graph (read-only).
    pub fn dep_graph(&self) -> &DepGraph {
        &self.graph
    }

    fn print_with<W: Write>(
        &self,
        out: &mut W,
        render: impl Fn(&Cell) -> String,
    ) -> io::Result<()> {
        for row in 0..self.printable.rows {
            for col in 0..self.printable.cols {
                if col > 0 {
                    out.write_all(b"\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    out.write_all(render(cell).as_bytes())?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Put `body` at `pos`: fresh cell state, transitive cache
    /// invalidation, then an atomic edge rewire. Also the rollback path
    /// (reinstalling a snapshotted body restores its edges the same way).
    fn install(&mut self, pos: Position, body: CellBody) {
        let refs: FxHashSet<Position> = match &body {
            CellBody::Formula(formula) => formula.referenced_cells().into_iter().collect(),
            _ => FxHashSet::default(),
        };
        self.cells.insert(pos, Cell::new(body));
        self.invalidate_from(pos);
        self.graph.replace_edges(pos, refs);
    }

    /// Drop the cell and its outgoing edges. Runs the invalidation wave
    /// first, while the edges to walk are still present.
    fn remove_cell(&mut self, pos: Position) {
        self.invalidate_from(pos);
        self.cells.remove(&pos);
        self.graph.clear_cell(pos);
    }

    /// Invalidate `start` and everything that transitively reads it.
    ///
    /// A cell that is already invalidated stops the walk: its dependents
    /// are guaranteed dirty from the wave that dirtied it.
    fn invalidate_from(&self, start: Position) {
        let mut visited = FxHashSet::default();
        let mut stack = vec![start];
        visited.insert(start);

        while let Some(pos) = stack.pop() {
            let newly_dirty = match self.cells.get(&pos) {
                Some(cell) => cell.mark_dirty(),
                // No cell, no cache; keep walking through the position
                None => true,
            };
            if !newly_dirty {
                continue;
            }
            for dep in self.graph.dependents(pos) {
                if visited.insert(dep) {
                    stack.push(dep);
                }
            }
        }
    }

    fn recompute_printable(&mut self) {
        let mut size = Size::default();
        for pos in self.cells.keys() {
            size.cover(*pos);
        }
        self.printable = size;
    }
}

fn body_from_text(text: &str) -> std::result::Result<CellBody, crate::error::FormulaParseError> {
    if text.is_empty() {
        return Ok(CellBody::Empty);
    }
    match text.strip_prefix(FORMULA_SIGN) {
        Some(body) if !body.is_empty() => Ok(CellBody::Formula(Formula::parse(body)?)),
        _ => Ok(CellBody::Text(text.to_string())),
    }
}
