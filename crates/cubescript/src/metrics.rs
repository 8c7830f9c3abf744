//! Turn-count metrics over move sequences.
//!
//! The visitor accumulates the expansion of the trees it accepts and
//! reports block (btm), layer (ltm), face (ftm) and quarter (qtm) turn
//! counts plus the raw move count.
//!
//! The turn metrics are computed over *coalesced* runs: consecutive moves
//! of the same axis and layers merge into one, same-axis same-angle moves
//! of disjoint layers merge into one block, whole-cube rotations count
//! nothing and interrupt a run only when their axis differs. A run whose
//! merged angle is a multiple of four quarter turns cancels entirely and
//! contributes nothing to any turn metric. The raw move count is never
//! reduced.

use itertools::Itertools;

use cubescript_notation::Move;

use crate::ast::{Leaf, Node};

/// Accumulating move-metrics visitor.
#[derive(Debug, Default, Clone)]
pub struct MoveMetrics {
    moves: Vec<Move>,
    move_count: usize,
}

impl MoveMetrics {
    /// Creates an empty visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates the expansion of the given subtree.
    pub fn accept(&mut self, node: &Node) {
        for leaf in node.expand(false) {
            if let Leaf::Move(mv) = leaf {
                self.moves.push(mv);
                self.move_count += 1;
            }
        }
    }

    /// Returns the raw count of primitive moves, including whole-cube
    /// rotations and cancelled moves.
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Returns the block turn count.
    pub fn block_turn_count(&self) -> usize {
        self.coalesced().map(count_block_turns).sum()
    }

    /// Returns the layer turn count.
    pub fn layer_turn_count(&self) -> usize {
        self.coalesced().map(count_layer_turns).sum()
    }

    /// Returns the face turn count.
    pub fn face_turn_count(&self) -> usize {
        self.coalesced().map(count_face_turns).sum()
    }

    /// Returns the quarter turn count.
    pub fn quarter_turn_count(&self) -> usize {
        self.coalesced().map(count_quarter_turns).sum()
    }

    /// Merges runs of moves for counting and drops everything that does
    /// not twist (whole-cube rotations, cancelled runs).
    fn coalesced(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves
            .iter()
            .copied()
            .filter(|m| m.angle() != 0 && m.layer_mask() != 0)
            .coalesce(|prev, current| {
                if current.is_rotation() && prev.axis() == current.axis() {
                    // A same-axis rotation does not interrupt the run.
                    Ok(prev)
                } else if prev.axis() == current.axis()
                    && prev.layer_mask() == current.layer_mask()
                {
                    Ok(prev.with_angle(prev.angle() + current.angle()))
                } else if prev.axis() == current.axis()
                    && prev.angle() == current.angle()
                    && prev.layer_mask() & current.layer_mask() == 0
                {
                    // Same-angle twists of disjoint layers form one block.
                    Ok(Move::new(
                        prev.layer_count(),
                        prev.axis(),
                        prev.layer_mask() | current.layer_mask(),
                        prev.angle(),
                    ))
                } else {
                    Err((prev, current))
                }
            })
            .filter(|m| m.is_twist())
    }
}

/// Number of turned layers, counting a twist from the cheaper side.
fn count_layer_turns(mv: Move) -> usize {
    if mv.angle() == 0 {
        return 0;
    }
    let turned = mv.layer_mask().count_ones() as usize;
    let layer_count = mv.layer_count() as usize;
    turned.min(layer_count - turned)
}

/// Number of contiguous turned blocks, counting from the cheaper side.
fn count_block_turns(mv: Move) -> usize {
    if mv.angle() == 0 {
        return 0;
    }
    let mut turned_runs = 0;
    let mut immobile_runs = 0;
    let mut prev_turned = 0;
    let mut prev_immobile = 1;
    for i in 0..mv.layer_count() {
        let layer = (mv.layer_mask() >> i) & 1;
        if layer == 1 && layer != prev_turned {
            turned_runs += 1;
        }
        if layer == 0 && layer != prev_immobile {
            immobile_runs += 1;
        }
        prev_turned = layer;
        prev_immobile = layer;
    }
    turned_runs.min(immobile_runs)
}

/// Like the block turn count, with one extra turn for inner slices that
/// touch neither or both outer faces.
fn count_face_turns(mv: Move) -> usize {
    let mut count = count_block_turns(mv);
    let outer_faces = 1 | (1 << (mv.layer_count() - 1));
    let touched = mv.layer_mask() & outer_faces;
    if count != 0 && (touched == 0 || touched == outer_faces) {
        count += 1;
    }
    count
}

/// Face turns weighted by the number of quarter turns of the angle.
fn count_quarter_turns(mv: Move) -> usize {
    let mut qturns = (mv.angle() % 4).unsigned_abs() as usize;
    if qturns == 3 {
        qturns = 1;
    }
    count_face_turns(mv) * qturns
}
