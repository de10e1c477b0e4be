//! ==============================================================================================
//! ===================================== Error Taxonomy ==========================================
//! ==============================================================================================

use thiserror::Error;

/// Fatal conditions the solver can raise.
///
/// Five base categories (`Alloc`, `InvalidRate`, `NegativeState`,
/// `InvalidEvent`, `InvalidInput`); `PostStep` is the callback-fatal
/// condition of the `POST` phase and shares `InvalidRate`-class severity,
/// not a sixth independent category.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("allocation failure: {0}")]
    Alloc(String),

    #[error("invalid rate at node {node} transition {transition}: {value}")]
    InvalidRate {
        node: usize,
        transition: usize,
        value: f64,
    },

    #[error("negative compartment count at node {node} compartment {compartment}: {value}")]
    NegativeState {
        node: usize,
        compartment: usize,
        value: i64,
    },

    #[error("invalid event at index {index}: {reason}")]
    InvalidEvent { index: usize, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("post-timestep callback returned error code {code} at node {node}")]
    PostStep { code: i32, node: usize },
}

impl SimError {
    /// Stable integer code for a host marshaling this error back across an
    /// FFI boundary (0 reserved for success on the host side).
    pub fn code(&self) -> i32 {
        match self {
            SimError::Alloc(_) => 1,
            SimError::InvalidRate { .. } => 2,
            SimError::NegativeState { .. } => 3,
            SimError::InvalidEvent { .. } => 4,
            SimError::InvalidInput(_) => 5,
            SimError::PostStep { .. } => 2,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
