//! ==============================================================================================
//! ============================= Intra-Node Event Processor (C4) =================================
//! ==============================================================================================
//!
//! Applies one worker's E1 queue for the current day against its owned
//! nodes. Runs without locks: a worker only ever touches nodes in its own
//! partition.

use crate::error::SimError;
use crate::events::sampling::{resolve_draw_count, sample_multivariate_hypergeometric};
use crate::events::types::{Event, EventKind};
use crate::node::NodeState;
use crate::rng::WorkerRng;
use crate::sparse::CscView;

#[inline]
fn shift_destination(s: &CscView<'_>, col: usize, row: usize) -> Option<usize> {
    let (rows, vals) = s.column(col);
    rows.iter()
        .position(|&r| r == row)
        .map(|pos| vals[pos] as usize)
}

/// Apply a sampled removal (and optional same-node shift) to `node`.
fn apply_move(
    node: &mut NodeState,
    node_id: usize,
    rows: &[usize],
    drawn: &[i32],
    shift: Option<(&CscView<'_>, usize)>,
) -> Result<(), SimError> {
    for (&r, &d) in rows.iter().zip(drawn.iter()) {
        if d == 0 {
            continue;
        }
        let new_val = node.u[r] - d;
        if new_val < 0 {
            return Err(SimError::NegativeState {
                node: node_id,
                compartment: r,
                value: new_val as i64,
            });
        }
        node.u[r] = new_val;

        if let Some((s, shift_col)) = shift {
            if let Some(dest) = shift_destination(s, shift_col, r) {
                node.u[dest] += d;
            }
        }
    }
    Ok(())
}

/// Process every event in `queue` whose `time == day` against `node`, whose
/// global id is `node_id` (used only for error reporting).
pub fn process_intra_day(
    node: &mut NodeState,
    node_id: usize,
    queue: &[Event],
    day: i64,
    e: &CscView<'_>,
    s: &CscView<'_>,
    rng: &mut WorkerRng,
) -> Result<(), SimError> {
    for ev in queue.iter().filter(|ev| ev.time == day) {
        debug_assert_eq!(ev.node, node_id);
        let rows = e.column(ev.select).0;

        match ev.kind {
            EventKind::Enter => {
                if let Some(&r) = rows.first() {
                    node.u[r] += ev.n as i32;
                }
            }
            EventKind::Exit => {
                let total: i64 = rows.iter().map(|&r| node.u[r] as i64).sum();
                let ndraw = resolve_draw_count(ev.n, ev.proportion, total);
                let counts: Vec<i32> = rows.iter().map(|&r| node.u[r]).collect();
                let drawn = sample_multivariate_hypergeometric(&counts, ndraw, rng);
                apply_move(node, node_id, rows, &drawn, None)?;
            }
            EventKind::InternalTransfer => {
                let total: i64 = rows.iter().map(|&r| node.u[r] as i64).sum();
                let ndraw = resolve_draw_count(ev.n, ev.proportion, total);
                let counts: Vec<i32> = rows.iter().map(|&r| node.u[r]).collect();
                let drawn = sample_multivariate_hypergeometric(&counts, ndraw, rng);
                apply_move(node, node_id, rows, &drawn, Some((s, ev.shift)))?;
            }
            EventKind::ExternalTransfer => {
                unreachable!("E2 events never appear in an E1 queue");
            }
        }

        node.mark_dirty();
    }
    Ok(())
}
