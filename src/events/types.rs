//! Event tuple and kind for the scheduled-event pipeline.

/// `kind` discriminant of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Exit,
    Enter,
    InternalTransfer,
    ExternalTransfer,
}

impl EventKind {
    /// E2 iff `ExternalTransfer`; all others are E1.
    #[inline]
    pub fn is_inter_node(self) -> bool {
        matches!(self, EventKind::ExternalTransfer)
    }
}

/// One scheduled event `(kind, time, node, dest, n, proportion, select, shift)`.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub kind: EventKind,
    /// Integer day the event fires on.
    pub time: i64,
    pub node: usize,
    /// Destination node; only meaningful for `ExternalTransfer`.
    pub dest: usize,
    /// Verbatim individual count, used when `proportion <= 0`.
    pub n: u32,
    /// Proportion in `[0, 1]`; when `> 0`, `n` is sampled instead of verbatim.
    pub proportion: f64,
    /// Column index into `E` selecting affected compartments.
    pub select: usize,
    /// Column index into `S` giving the compartment-identity shift.
    pub shift: usize,
}
