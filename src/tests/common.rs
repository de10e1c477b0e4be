//! Shared propensities and tiny sparse-matrix builders for the scenario
//! tests in this module. Kept deliberately minimal: each builder returns
//! owned `(ir, jc, pr)` triples so each test can build its own
//! [`crate::sparse::CscView`] borrowing locals with the right lifetime.

use crate::model::Propensity;
use std::sync::Once;

type Triples = (Vec<usize>, Vec<usize>, Vec<f64>);

static LOGGER: Once = Once::new();

/// Installs the `env_logger` subscriber exactly once per test process, so
/// `RUST_LOG=simnet_rs=debug cargo test -- --nocapture` surfaces the
/// `log::debug!`/`warn!`/`error!` calls made at phase boundaries. Idempotent
/// across the many test binaries/threads that call it.
pub(crate) fn init_logging() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// `rate = coef * u[compartment]` — a linear death/recovery-style term.
pub(crate) struct LinearRate {
    pub coef: f64,
    pub compartment: usize,
}

impl Propensity for LinearRate {
    fn rate(&self, u: &[i32], _v: &[f64], _ldata: &[f64], _gdata: &[f64], _t: f64) -> f64 {
        self.coef * u[self.compartment] as f64
    }
}

/// `rate = beta * u[a] * u[b]` — a mass-action term (e.g. S-I infection).
pub(crate) struct MassAction {
    pub beta: f64,
    pub a: usize,
    pub b: usize,
}

impl Propensity for MassAction {
    fn rate(&self, u: &[i32], _v: &[f64], _ldata: &[f64], _gdata: &[f64], _t: f64) -> f64 {
        self.beta * u[self.a] as f64 * u[self.b] as f64
    }
}

/// A constant rate, independent of state.
pub(crate) struct ConstantRate(pub f64);

impl Propensity for ConstantRate {
    fn rate(&self, _u: &[i32], _v: &[f64], _ldata: &[f64], _gdata: &[f64], _t: f64) -> f64 {
        self.0
    }
}

/// `N`/`G` for a 1-compartment pure-death process: the single transition
/// removes one individual from compartment 0 and invalidates only itself.
pub(crate) fn death_matrices() -> (Triples, Triples) {
    let n = (vec![0usize], vec![0usize, 1], vec![-1.0]);
    let g = (vec![0usize], vec![0usize, 1], vec![1.0]);
    (n, g)
}

/// `N`/`G` for a 2-compartment (S, I) SIS model: transition 0 is infection
/// (S -> I), transition 1 is recovery (I -> S); each invalidates both
/// cached rates since both read S and I.
pub(crate) fn sis_matrices() -> (Triples, Triples) {
    let n = (
        vec![0usize, 1, 0, 1],
        vec![0usize, 2, 4],
        vec![-1.0, 1.0, 1.0, -1.0],
    );
    let g = (
        vec![0usize, 1, 0, 1],
        vec![0usize, 2, 4],
        vec![1.0, 1.0, 1.0, 1.0],
    );
    (n, g)
}

/// `E`/`S` with zero selection columns — for models with no scheduled
/// events, where the event-processing matrices are never indexed.
pub(crate) fn no_event_matrices() -> (Triples, Triples) {
    let e = (Vec::new(), vec![0usize], Vec::new());
    let s = (Vec::new(), vec![0usize], Vec::new());
    (e, s)
}

/// `E` with one column selecting `row`, and `S` with one empty (identity)
/// shift column — enough for an `EXTERNAL_TRANSFER`/`EXIT` event that moves
/// individuals out of a single compartment without relabeling them.
pub(crate) fn single_row_select(row: usize) -> (Triples, Triples) {
    let e = (vec![row], vec![0usize, 1], vec![1.0]);
    let s = (Vec::new(), vec![0usize, 0], Vec::new());
    (e, s)
}
