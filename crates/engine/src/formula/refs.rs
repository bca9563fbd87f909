//! Reference extraction from the formula AST.
//!
//! Produces the positions a formula reads, for dependency-graph wiring.

use rustc_hash::FxHashSet;

use crate::position::Position;

use super::parser::Expr;

/// Extract every valid cell reference from an expression, sorted by
/// (row, col) and deduplicated. Out-of-range sentinel references are not
/// included; they never take part in dependency wiring.
pub fn referenced_cells(expr: &Expr) -> Vec<Position> {
    let mut refs = FxHashSet::default();
    collect_refs(expr, &mut refs);
    let mut cells: Vec<Position> = refs.into_iter().collect();
    cells.sort_unstable();
    cells
}

fn collect_refs(expr: &Expr, refs: &mut FxHashSet<Position>) {
    match expr {
        Expr::Number(_) => {}
        Expr::CellRef(cell) => {
            if cell.is_valid() {
                refs.insert(*cell);
            }
        }
        Expr::Neg(inner) => collect_refs(inner, refs),
        Expr::BinaryOp { left, right, .. } => {
            collect_refs(left, refs);
            collect_refs(right, refs);
        }
    }
}
