//! ==============================================================================================
//! ======================================== Sampler (C8) ==========================================
//! ==============================================================================================
//!
//! Copies node state into the caller's dense output matrices at every
//! `tspan` crossing, or accumulates the same samples into a sparse triple
//! sink. Column 0 is always `u0`/`v0` written directly before the day loop
//! starts; the day loop then uses the strict inequality `tt > tspan[k]`
//! (see `DESIGN.md`) so column 0 is never revisited.

use ndarray::Array2;
use serde::Serialize;

use crate::node::NodeState;

/// Dense vs. sparse output selection, mutually exclusive per matrix.
pub enum OutputTarget<T> {
    /// Shape `(Nn * width, tlen)`, row-major over `(node, component)`.
    Dense(Array2<T>),
    Sparse(SparseBuilder<T>),
}

/// Column-at-a-time sparse-triple accumulator; only non-default entries are
/// recorded (a `T::default()` reading is implicitly absent).
#[derive(Serialize)]
pub struct SparseBuilder<T> {
    ir: Vec<usize>,
    jc: Vec<usize>,
    pr: Vec<T>,
    #[serde(skip)]
    width: usize,
}

impl<T: Copy + PartialEq + Default> SparseBuilder<T> {
    pub fn new(width: usize) -> Self {
        Self {
            ir: Vec::new(),
            jc: vec![0],
            pr: Vec::new(),
            width,
        }
    }

    /// Append one dense column (`Nn * width` entries) as a sparse column.
    fn push_column(&mut self, values: &[T]) {
        let zero = T::default();
        for (row, &v) in values.iter().enumerate() {
            if v != zero {
                self.ir.push(row);
                self.pr.push(v);
            }
        }
        self.jc.push(self.ir.len());
    }

    pub fn into_triples(self) -> (Vec<usize>, Vec<usize>, Vec<T>) {
        (self.ir, self.jc, self.pr)
    }
}

impl<T: Serialize> SparseBuilder<T> {
    /// Pretty-printed JSON rendition of the sparse triples, for a host that
    /// wants to persist a trajectory without holding the dense matrix.
    pub fn to_json(&self) -> Result<String, crate::error::SimError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::SimError::Alloc(format!("sparse output serialize: {e}")))
    }
}

/// Drives sampling against both the `U` (counts) and `V` (auxiliaries)
/// output targets.
pub struct Sampler {
    pub tspan: Vec<f64>,
    pub cursor: usize,
    pub u_target: OutputTarget<i32>,
    pub v_target: OutputTarget<f64>,
}

impl Sampler {
    pub fn new(tspan: Vec<f64>, u_target: OutputTarget<i32>, v_target: OutputTarget<f64>) -> Self {
        let cursor = if tspan.first().is_some_and(|&t0| t0 <= 0.0) {
            1
        } else {
            0
        };
        Self {
            tspan,
            cursor,
            u_target,
            v_target,
        }
    }

    /// Write column 0 directly from the initial state (invariant 3:
    /// `U[:,0] == u0`, `V[:,0] == v0`).
    pub fn write_initial(&mut self, nodes: &[NodeState]) {
        self.write_column(0, nodes, AuxSource::Current);
    }

    /// Write every `tspan[k]` satisfied by `tt > tspan[k]` that hasn't been
    /// written yet, sampling `v_new` (the state just computed by `POST` for
    /// this day, ahead of the end-of-day swap).
    pub fn sample_crossings(&mut self, nodes: &[NodeState], tt: f64) {
        while self.cursor < self.tspan.len() && tt > self.tspan[self.cursor] {
            self.write_column(self.cursor, nodes, AuxSource::New);
            self.cursor += 1;
        }
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.tspan.len()
    }

    fn write_column(&mut self, col: usize, nodes: &[NodeState], aux: AuxSource) {
        let nc = nodes.first().map(|n| n.nc()).unwrap_or(0);
        let nd = nodes.first().map(|n| n.nd()).unwrap_or(0);

        match &mut self.u_target {
            OutputTarget::Dense(arr) => {
                for (node_id, node) in nodes.iter().enumerate() {
                    for (c, &val) in node.u.iter().enumerate() {
                        arr[(node_id * nc + c, col)] = val;
                    }
                }
            }
            OutputTarget::Sparse(builder) => {
                let mut flat = vec![0i32; nodes.len() * nc];
                for (node_id, node) in nodes.iter().enumerate() {
                    flat[node_id * nc..node_id * nc + nc].copy_from_slice(&node.u);
                }
                builder.push_column(&flat);
            }
        }

        match &mut self.v_target {
            OutputTarget::Dense(arr) => {
                for (node_id, node) in nodes.iter().enumerate() {
                    let src = match aux {
                        AuxSource::Current => &node.v,
                        AuxSource::New => &node.v_new,
                    };
                    for (d, &val) in src.iter().enumerate() {
                        arr[(node_id * nd + d, col)] = val;
                    }
                }
            }
            OutputTarget::Sparse(builder) => {
                let mut flat = vec![0.0f64; nodes.len() * nd];
                for (node_id, node) in nodes.iter().enumerate() {
                    let src = match aux {
                        AuxSource::Current => &node.v,
                        AuxSource::New => &node.v_new,
                    };
                    flat[node_id * nd..node_id * nd + nd].copy_from_slice(src);
                }
                builder.push_column(&flat);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum AuxSource {
    Current,
    New,
}
