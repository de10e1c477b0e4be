//! ==============================================================================================
//! ====================================== Node State ==============================================
//! ==============================================================================================
//!
//! Per-node state lives in one `Vec<NodeState>`, one entry per node. Workers
//! own a contiguous node range; because `Vec<T>::split_at_mut` yields two
//! genuinely disjoint `&mut [T]` slices, a worker's partition is a single
//! ordinary slice with no `unsafe` needed to hand it to a `rayon` task —
//! disjoint-by-construction mutable access instead of locking.
//!
//! `v`/`v_new` are double-buffered per node and swapped at day boundaries
//! with a plain `std::mem::swap`.

/// All per-node state: discrete counts, continuous auxiliaries (double
/// buffered), cached propensities, and bookkeeping flags.
#[derive(Clone)]
pub struct NodeState {
    /// Non-negative integer compartment counts, length `Nc`.
    pub u: Vec<i32>,
    /// Current continuous auxiliary variables, length `Nd`.
    pub v: Vec<f64>,
    /// Next-day continuous auxiliary variables, length `Nd`.
    pub v_new: Vec<f64>,
    /// Read-only per-node parameters, length `Nld`.
    pub ldata: Vec<f64>,
    /// Cached propensities, length `Nt`.
    pub t_rate: Vec<f64>,
    /// Cached sum of `t_rate`.
    pub sum_t_rate: f64,
    /// Per-node simulated time.
    pub t_time: f64,
    /// Requests a full rate refresh on the next SSA step.
    pub update_node: bool,
    /// Whether `t_rate`/`sum_t_rate` has ever been computed.
    pub initialized: bool,
}

impl NodeState {
    pub fn new(u: Vec<i32>, v: Vec<f64>, ldata: Vec<f64>, nt: usize) -> Self {
        let nd = v.len();
        Self {
            u,
            v,
            v_new: vec![0.0; nd],
            ldata,
            t_rate: vec![0.0; nt],
            sum_t_rate: 0.0,
            t_time: 0.0,
            update_node: false,
            initialized: false,
        }
    }

    #[inline]
    pub fn nc(&self) -> usize {
        self.u.len()
    }

    #[inline]
    pub fn nd(&self) -> usize {
        self.v.len()
    }

    #[inline]
    pub fn nt(&self) -> usize {
        self.t_rate.len()
    }

    /// Swap `v` and `v_new` — a cheap buffer exchange, no per-cell copy.
    #[inline]
    pub fn swap_aux_buffers(&mut self) {
        std::mem::swap(&mut self.v, &mut self.v_new);
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.update_node = true;
    }
}

/// The whole network: one [`NodeState`] per node plus global read-only data.
pub struct NetworkState {
    pub nodes: Vec<NodeState>,
    pub gdata: Vec<f64>,
}

impl NetworkState {
    pub fn new(
        u0: Vec<Vec<i32>>,
        v0: Vec<Vec<f64>>,
        ldata: Vec<Vec<f64>>,
        gdata: Vec<f64>,
        nt: usize,
    ) -> Self {
        let nodes = u0
            .into_iter()
            .zip(v0)
            .zip(ldata)
            .map(|((u, v), ld)| NodeState::new(u, v, ld, nt))
            .collect();
        Self { nodes, gdata }
    }

    #[inline]
    pub fn nn(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_buffers_without_copy() {
        let mut ns = NodeState::new(vec![0], vec![1.0], vec![], 1);
        ns.v_new[0] = 2.0;
        ns.swap_aux_buffers();
        assert_eq!(ns.v[0], 2.0);
        assert_eq!(ns.v_new[0], 1.0);
    }

    #[test]
    fn partition_slices_are_disjoint() {
        let net = NetworkState::new(
            vec![vec![1], vec![2], vec![3], vec![4]],
            vec![vec![], vec![], vec![], vec![]],
            vec![vec![], vec![], vec![], vec![]],
            vec![],
            1,
        );
        let mut nodes = net.nodes;
        let (left, right) = nodes.split_at_mut(2);
        left[0].u[0] += 100;
        right[0].u[0] += 100;
        assert_eq!(nodes[0].u[0], 101);
        assert_eq!(nodes[2].u[0], 103);
    }
}
