//! ==============================================================================================
//! =================================== Model Callback Surface ====================================
//! ==============================================================================================
//!
//! The host delivers propensity and post-timestep functions as opaque
//! callable handles. The idiomatic Rust rendition is a trait pair
//! dispatched through `Box<dyn _>`, rather than raw function pointers —
//! this lets a model close over its own parameters without an extra
//! `void*` context argument.

/// Outcome of a post-timestep callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStepCode {
    /// Fatal: abort the simulation with this error code.
    Error(i32),
    /// Rates are still valid; no refresh needed.
    NoUpdate,
    /// Rates are stale; trigger a full refresh for this node.
    Update,
}

/// A single transition's instantaneous rate, a function of state and time.
pub trait Propensity: Send + Sync {
    /// `u`: this node's compartment counts. `v`: this node's current
    /// auxiliary variables. `ldata`: this node's read-only parameters.
    /// `gdata`: global read-only parameters. `t`: current simulated time.
    fn rate(&self, u: &[i32], v: &[f64], ldata: &[f64], gdata: &[f64], t: f64) -> f64;
}

/// Per-day post-timestep update of the continuous auxiliary variables.
pub trait PostStep: Send + Sync {
    /// Writes into `v_new`; reads `u`/`v`/`ldata`/`gdata` for this node.
    #[allow(clippy::too_many_arguments)]
    fn post_step(
        &self,
        v_new: &mut [f64],
        u: &[i32],
        v: &[f64],
        ldata: &[f64],
        gdata: &[f64],
        node: usize,
        t: f64,
    ) -> PostStepCode;
}

/// No-op post-timestep callback for models with no continuous auxiliaries.
pub struct NoPostStep;

impl PostStep for NoPostStep {
    fn post_step(
        &self,
        _v_new: &mut [f64],
        _u: &[i32],
        _v: &[f64],
        _ldata: &[f64],
        _gdata: &[f64],
        _node: usize,
        _t: f64,
    ) -> PostStepCode {
        PostStepCode::NoUpdate
    }
}

/// A model's full callback table: one propensity per transition, one shared
/// post-timestep callback.
pub struct Model {
    pub propensities: Vec<Box<dyn Propensity>>,
    pub post_step: Box<dyn PostStep>,
}

impl Model {
    pub fn new(propensities: Vec<Box<dyn Propensity>>, post_step: Box<dyn PostStep>) -> Self {
        Self {
            propensities,
            post_step,
        }
    }

    pub fn without_post_step(propensities: Vec<Box<dyn Propensity>>) -> Self {
        Self::new(propensities, Box::new(NoPostStep))
    }

    #[inline]
    pub fn nt(&self) -> usize {
        self.propensities.len()
    }
}
