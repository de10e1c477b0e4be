//! ==============================================================================================
//! ============================= Inter-Node Event Processor (C5) ==================================
//! ==============================================================================================
//!
//! Applies the single global E2 queue for the current day. Executed by one
//! designated worker under the surrounding barriers: at this point no other
//! worker holds a reference into `nodes`, so indexing across partitions
//! here is race-free without locks.

use crate::error::SimError;
use crate::events::sampling::{resolve_draw_count, sample_multivariate_hypergeometric};
use crate::events::types::Event;
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

/// Process every `EXTERNAL_TRANSFER` event in `queue` whose `time == day`.
pub fn process_inter_day(
    nodes: &mut [NodeState],
    queue: &[Event],
    day: i64,
    e: &CscView<'_>,
    s: &CscView<'_>,
    rng: &mut WorkerRng,
) -> Result<(), SimError> {
    for ev in queue.iter().filter(|ev| ev.time == day) {
        let source = ev.node;
        let dest = ev.dest;
        let rows = e.column(ev.select).0;

        let counts: Vec<i32> = rows.iter().map(|&r| nodes[source].u[r]).collect();
        let total: i64 = counts.iter().map(|&c| c as i64).sum();
        let ndraw = resolve_draw_count(ev.n, ev.proportion, total);
        let drawn = sample_multivariate_hypergeometric(&counts, ndraw, rng);

        for (&r, &d) in rows.iter().zip(drawn.iter()) {
            if d == 0 {
                continue;
            }
            let new_val = nodes[source].u[r] - d;
            if new_val < 0 {
                return Err(SimError::NegativeState {
                    node: source,
                    compartment: r,
                    value: new_val as i64,
                });
            }
            nodes[source].u[r] = new_val;

            let dest_compartment = shift_destination(s, ev.shift, r).unwrap_or(r);
            nodes[dest].u[dest_compartment] += d;
        }

        nodes[source].mark_dirty();
        nodes[dest].mark_dirty();
    }
    Ok(())
}
