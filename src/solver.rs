//! ==============================================================================================
//! ===================================== Solver Entry Point =======================================
//! ==============================================================================================
//!
//! The single external entry point: `Solver::new` validates the host's
//! inputs up front (shape/structural checks, rather than failing deep
//! inside the day loop), `Solver::run` drives the orchestrator to
//! completion and hands back the populated output targets. The upfront
//! validation pass plays the same role as a free-standing `run` function's
//! leading shape assertions, generalized from debug-only assertions to an
//! explicit `Result`-returning check, since these are host-supplied
//! invariants that must hold in release builds too.

use crate::error::{SimError, SimResult};
use crate::events::{split_events, Event};
use crate::model::Model;
use crate::node::NetworkState;
use crate::orchestrator::{self, StaticInputs};
use crate::partition::{partition_nodes, Partition};
use crate::rng::RngService;
use crate::sampler::{OutputTarget, Sampler};
use crate::sparse::CscView;

/// Thread count and RNG seeding. `nthread = 0` means "auto" (the ambient
/// `rayon` global pool size); `seed = None` means "seed from OS entropy".
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub nthread: usize,
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            nthread: 0,
            seed: None,
        }
    }
}

/// Owns every piece of per-run state: node arrays, the static sparse-matrix
/// views (borrowed from the caller for the run's lifetime), the split event
/// queues, per-worker RNG streams, and the sampler writing into the caller's
/// output targets.
pub struct Solver<'a> {
    network: NetworkState,
    partitions: Vec<Partition>,
    e1: Vec<Vec<Event>>,
    e2: Vec<Event>,
    model: Model,
    inputs: StaticInputs<'a>,
    rngs: RngService,
    sampler: Sampler,
    progress: Option<Box<dyn FnMut(u64) + 'a>>,
}

#[allow(clippy::too_many_arguments)]
fn validate_shapes(
    nn: usize,
    nc: usize,
    nt: usize,
    g: &CscView<'_>,
    n: &CscView<'_>,
    e: &CscView<'_>,
    s: &CscView<'_>,
    tspan: &[f64],
) -> SimResult<()> {
    if nn == 0 {
        return Err(SimError::InvalidInput("Nn must be positive".into()));
    }
    if nt == 0 {
        return Err(SimError::InvalidInput(
            "at least one transition (Nt > 0) is required".into(),
        ));
    }
    if g.nrows() != nt || g.ncols() != nt {
        return Err(SimError::InvalidInput(format!(
            "G must be {nt}x{nt}, got {}x{}",
            g.nrows(),
            g.ncols()
        )));
    }
    if n.nrows() != nc || n.ncols() != nt {
        return Err(SimError::InvalidInput(format!(
            "N must be {nc}x{nt}, got {}x{}",
            n.nrows(),
            n.ncols()
        )));
    }
    if e.nrows() != nc {
        return Err(SimError::InvalidInput(format!(
            "E must have {nc} rows, got {}",
            e.nrows()
        )));
    }
    if s.nrows() != nc {
        return Err(SimError::InvalidInput(format!(
            "S must have {nc} rows, got {}",
            s.nrows()
        )));
    }
    if tspan.is_empty() {
        return Err(SimError::InvalidInput("tspan must be non-empty".into()));
    }
    if !tspan.windows(2).all(|w| w[0] < w[1]) {
        return Err(SimError::InvalidInput(
            "tspan must be strictly increasing".into(),
        ));
    }
    Ok(())
}

impl<'a> Solver<'a> {
    /// Validate inputs and build a solver ready to `run`. All slices backing
    /// `g`/`n`/`e`/`s` must outlive the solver (they are read-only and
    /// shared across every worker for the whole run).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        u0: Vec<Vec<i32>>,
        v0: Vec<Vec<f64>>,
        ldata: Vec<Vec<f64>>,
        gdata: Vec<f64>,
        tspan: Vec<f64>,
        g: CscView<'a>,
        n: CscView<'a>,
        e: CscView<'a>,
        s: CscView<'a>,
        events: Vec<Event>,
        model: Model,
        config: SolverConfig,
        u_target: OutputTarget<i32>,
        v_target: OutputTarget<f64>,
    ) -> SimResult<Self> {
        let nn = u0.len();
        if v0.len() != nn || ldata.len() != nn {
            return Err(SimError::InvalidInput(format!(
                "u0 ({nn}), v0 ({}), ldata ({}) must have the same node count",
                v0.len(),
                ldata.len()
            )));
        }
        let nc = u0.first().map(|row| row.len()).unwrap_or(0);
        let nd = v0.first().map(|row| row.len()).unwrap_or(0);
        let nld = ldata.first().map(|row| row.len()).unwrap_or(0);
        if u0.iter().any(|row| row.len() != nc) {
            return Err(SimError::InvalidInput("u0 rows have inconsistent Nc".into()));
        }
        if v0.iter().any(|row| row.len() != nd) {
            return Err(SimError::InvalidInput("v0 rows have inconsistent Nd".into()));
        }
        if ldata.iter().any(|row| row.len() != nld) {
            return Err(SimError::InvalidInput(
                "ldata rows have inconsistent Nld".into(),
            ));
        }

        let nt = model.nt();
        validate_shapes(nn, nc, nt, &g, &n, &e, &s, &tspan)?;

        let nthread = if config.nthread == 0 {
            rayon::current_num_threads().max(1)
        } else {
            config.nthread
        };
        let nthread = nthread.min(nn).max(1);

        let partitions = partition_nodes(nn, nthread);
        let (e1, e2) = split_events(&events, &partitions, nn)?;
        let network = NetworkState::new(u0, v0, ldata, gdata, nt);
        let rngs = RngService::new(config.seed, nthread);
        let sampler = Sampler::new(tspan, u_target, v_target);

        Ok(Self {
            network,
            partitions,
            e1,
            e2,
            model,
            inputs: StaticInputs { n, g, e, s },
            rngs,
            sampler,
            progress: None,
        })
    }

    /// Register a callback invoked once after every day the orchestrator
    /// finishes, with the count of days completed so far. Driven serially by
    /// the orchestrator's own outer loop (never from a worker thread spawned
    /// inside a `rayon::scope`), so the callback need not be `Send`.
    pub fn with_progress(mut self, cb: impl FnMut(u64) + 'a) -> Self {
        self.progress = Some(Box::new(cb));
        self
    }

    /// Drive the simulation to completion (`tspan` fully sampled) or the
    /// first fatal error. Consumes `self`; the caller recovers the output
    /// targets it supplied to `new` regardless of outcome.
    pub fn run(mut self) -> (SimResult<()>, OutputTarget<i32>, OutputTarget<f64>) {
        let mut progress = self.progress;
        let result = orchestrator::run(
            &mut self.network,
            &self.partitions,
            &self.e1,
            &self.e2,
            &self.model,
            &self.inputs,
            &mut self.rngs,
            &mut self.sampler,
            progress
                .as_mut()
                .map(|cb| cb.as_mut() as &mut dyn FnMut(u64)),
        );
        (result, self.sampler.u_target, self.sampler.v_target)
    }
}
