//! ==============================================================================================
//! ======================================= SSA Kernel (C6) ========================================
//! ==============================================================================================
//!
//! Per-node direct-method Gillespie stepping bounded by the next day, using
//! the dependency graph `G` to incrementally refresh only the propensities a
//! firing transition invalidates. Reuses the node's own `t_rate` buffer as
//! scratch — no per-step allocation.

use crate::error::SimError;
use crate::model::Model;
use crate::node::NodeState;
use crate::rng::WorkerRng;
use crate::sparse::CscView;

#[inline]
fn validate_rate(node_id: usize, transition: usize, value: f64) -> Result<(), SimError> {
    if !value.is_finite() || value < 0.0 {
        Err(SimError::InvalidRate {
            node: node_id,
            transition,
            value,
        })
    } else {
        Ok(())
    }
}

/// Recompute every cached propensity for `node` and return the new sum.
fn recompute_all_rates(
    node: &mut NodeState,
    gdata: &[f64],
    model: &Model,
    node_id: usize,
    t: f64,
) -> Result<f64, SimError> {
    let mut sum = 0.0;
    for j in 0..model.nt() {
        let rate = model.propensities[j].rate(&node.u, &node.v, &node.ldata, gdata, t);
        validate_rate(node_id, j, rate)?;
        node.t_rate[j] = rate;
        sum += rate;
    }
    Ok(sum)
}

/// Draw which transition fires given `sum` and a uniform draw `u = r / sum`
/// in `[0, 1)`. Clamps cumulative-sum overshoot to `Nt - 1` and walks back
/// from an exactly-zero rate to the nearest non-zero one. Returns `None` if
/// no non-zero transition exists (null event).
fn pick_transition(rates: &[f64], sum: f64, u: f64) -> Option<usize> {
    let target = u * sum;
    let mut cum = 0.0;
    let mut chosen = rates.len().saturating_sub(1);
    for (j, &rate) in rates.iter().enumerate() {
        cum += rate;
        if cum > target {
            chosen = j;
            break;
        }
    }
    if chosen >= rates.len() {
        chosen = rates.len() - 1;
    }
    if rates[chosen] != 0.0 {
        return Some(chosen);
    }
    for j in (0..=chosen).rev() {
        if rates[j] != 0.0 {
            return Some(j);
        }
    }
    None
}

/// Run the SSA kernel for `node` up to `next_day`.
#[allow(clippy::too_many_arguments)]
pub fn step_node(
    node: &mut NodeState,
    gdata: &[f64],
    model: &Model,
    n_matrix: &CscView<'_>,
    g_matrix: &CscView<'_>,
    node_id: usize,
    next_day: f64,
    rng: &mut WorkerRng,
) -> Result<(), SimError> {
    if !node.initialized || node.update_node {
        let t = node.t_time;
        let sum = recompute_all_rates(node, gdata, model, node_id, t)?;
        node.sum_t_rate = sum;
        node.initialized = true;
        node.update_node = false;
    }

    loop {
        let sum = node.sum_t_rate;
        if sum <= 0.0 {
            node.t_time = next_day;
            return Ok(());
        }

        let u1 = rng.open01();
        let tau = -u1.ln() / sum;
        if node.t_time + tau >= next_day {
            node.t_time = next_day;
            return Ok(());
        }
        node.t_time += tau;

        let u2 = rng.unit();
        let Some(tr) = pick_transition(&node.t_rate, sum, u2) else {
            // Accumulated floating-point drift: sum says positive, every
            // individual rate reads zero. Treat as a null event.
            node.sum_t_rate = 0.0;
            continue;
        };

        let (rows, deltas) = n_matrix.column_int(tr);
        for (&r, &delta) in rows.iter().zip(deltas.iter()) {
            let new_val = node.u[r] as i64 + delta;
            if new_val < 0 {
                return Err(SimError::NegativeState {
                    node: node_id,
                    compartment: r,
                    value: new_val,
                });
            }
            node.u[r] = new_val as i32;
        }

        let (dep_rows, _) = g_matrix.column(tr);
        let t = node.t_time;
        let mut delta_sum = 0.0;
        for &i in dep_rows {
            let new_rate = model.propensities[i].rate(&node.u, &node.v, &node.ldata, gdata, t);
            validate_rate(node_id, i, new_rate)?;
            delta_sum += new_rate - node.t_rate[i];
            node.t_rate[i] = new_rate;
        }
        node.sum_t_rate += delta_sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, PostStep, PostStepCode, Propensity};
    use crate::rng::RngService;

    struct ConstantRate(f64);
    impl Propensity for ConstantRate {
        fn rate(&self, _u: &[i32], _v: &[f64], _ldata: &[f64], _gdata: &[f64], _t: f64) -> f64 {
            self.0
        }
    }
    struct NoPost;
    impl PostStep for NoPost {
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

    #[test]
    fn zero_rate_jumps_straight_to_next_day() {
        let mut node = NodeState::new(vec![100], vec![], vec![], 1);
        let model = Model::without_post_step(vec![Box::new(ConstantRate(0.0))]);
        let n = CscView::new(&[0usize], &[0usize, 1], &[1.0], 1).unwrap();
        let g = CscView::new(&[0usize], &[0usize, 1], &[1.0], 1).unwrap();
        let mut svc = RngService::new(Some(1), 1);
        step_node(&mut node, &[], &model, &n, &g, 0, 1.0, svc.worker_mut(0)).unwrap();
        assert_eq!(node.t_time, 1.0);
        assert_eq!(node.u[0], 100);
    }

    #[test]
    fn positive_rate_fires_and_advances_time() {
        let mut node = NodeState::new(vec![100], vec![], vec![], 1);
        let model = Model::without_post_step(vec![Box::new(ConstantRate(50.0))]);
        let n = CscView::new(&[0usize], &[0usize, 1], &[-1.0], 1).unwrap();
        let g = CscView::new(&[0usize], &[0usize, 1], &[1.0], 1).unwrap();
        let mut svc = RngService::new(Some(2), 1);
        step_node(&mut node, &[], &model, &n, &g, 0, 1.0, svc.worker_mut(0)).unwrap();
        assert_eq!(node.t_time, 1.0);
        assert!(node.u[0] < 100);
        assert!(node.u[0] >= 0);
    }

    #[test]
    fn pick_transition_clamps_overshoot() {
        let rates = [1.0, 1.0, 1.0];
        let chosen = pick_transition(&rates, 3.0, 0.999_999_999_9);
        assert_eq!(chosen, Some(2));
    }

    #[test]
    fn pick_transition_walks_back_from_zero_rate() {
        let rates = [1.0, 0.0];
        let chosen = pick_transition(&rates, 1.0, 0.9999999999);
        assert_eq!(chosen, Some(0));
    }

    #[test]
    fn pick_transition_null_event_when_all_zero() {
        let rates = [0.0, 0.0];
        let chosen = pick_transition(&rates, 0.0001, 0.5);
        assert_eq!(chosen, None);
    }
}
