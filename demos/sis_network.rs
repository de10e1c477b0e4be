//! ==============================================================================================
//! =================================== SIS Network Demo ===========================================
//! ==============================================================================================
//!
//! Two-node SIS (Susceptible-Infected-Susceptible) network. Node 0 starts
//! with an active outbreak; at day 5 every infected individual is
//! transferred to node 1 via a single `EXTERNAL_TRANSFER` event. A thin
//! demo binary: builds a small model and drives the solver end to end.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use simnet_rs::{CscView, Event, EventKind, Model, OutputTarget, Propensity, Solver, SolverConfig};

struct MassAction {
    beta: f64,
    a: usize,
    b: usize,
}

impl Propensity for MassAction {
    fn rate(&self, u: &[i32], _v: &[f64], _ldata: &[f64], _gdata: &[f64], _t: f64) -> f64 {
        self.beta * u[self.a] as f64 * u[self.b] as f64
    }
}

struct LinearRate {
    coef: f64,
    compartment: usize,
}

impl Propensity for LinearRate {
    fn rate(&self, u: &[i32], _v: &[f64], _ldata: &[f64], _gdata: &[f64], _t: f64) -> f64 {
        self.coef * u[self.compartment] as f64
    }
}

fn main() -> Result<()> {
    // Compartments: 0 = S, 1 = I. Transitions: 0 = infection (S -> I),
    // 1 = recovery (I -> S). Both are conservative (columns sum to zero)
    // and each invalidates both cached rates.
    let ir_n = [0usize, 1, 0, 1];
    let jc_n = [0usize, 2, 4];
    let pr_n = [-1.0, 1.0, 1.0, -1.0];
    let n = CscView::new(&ir_n, &jc_n, &pr_n, 2).context("building N matrix")?;

    let ir_g = [0usize, 1, 0, 1];
    let jc_g = [0usize, 2, 4];
    let pr_g = [1.0, 1.0, 1.0, 1.0];
    let g = CscView::new(&ir_g, &jc_g, &pr_g, 2).context("building G matrix")?;

    // Selection matrix: column 0 picks compartment I (row 1), used by the
    // external-transfer event below. Shift matrix: one empty (identity)
    // column, since the transfer doesn't relabel compartments.
    let ir_e = [1usize];
    let jc_e = [0usize, 1];
    let pr_e = [1.0];
    let e = CscView::new(&ir_e, &jc_e, &pr_e, 2).context("building E matrix")?;

    let jc_s = [0usize, 0];
    let s = CscView::new(&[], &jc_s, &[], 2).context("building S matrix")?;

    let model = Model::without_post_step(vec![
        Box::new(MassAction { beta: 0.002, a: 0, b: 1 }),
        Box::new(LinearRate { coef: 0.1, compartment: 1 }),
    ]);

    let event = Event {
        kind: EventKind::ExternalTransfer,
        time: 5,
        node: 0,
        dest: 1,
        n: 0,
        proportion: 1.0, // move every infected individual, whatever the count
        select: 0,
        shift: 0,
    };

    let tspan: Vec<f64> = (0..=20).map(|t| t as f64).collect();
    let u_target = OutputTarget::Dense(ndarray::Array2::zeros((4, tspan.len())));
    let v_target = OutputTarget::Dense(ndarray::Array2::<f64>::zeros((0, tspan.len())));

    let bar = ProgressBar::new(tspan.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} day {pos}/{len}")
            .context("building progress bar style")?,
    );
    let bar_tick = bar.clone();

    let solver = Solver::new(
        vec![vec![490, 10], vec![500, 0]],
        vec![vec![], vec![]],
        vec![vec![], vec![]],
        vec![],
        tspan.clone(),
        g,
        n,
        e,
        s,
        vec![event],
        model,
        SolverConfig {
            nthread: 0,
            seed: Some(42),
        },
        u_target,
        v_target,
    )
    .context("invalid solver configuration")?
    .with_progress(move |day| bar_tick.set_position(day));

    let (result, u_out, _v_out) = solver.run();
    bar.finish_and_clear();
    result.context("simulation run failed")?;

    let arr = match u_out {
        OutputTarget::Dense(arr) => arr,
        _ => unreachable!(),
    };

    println!("day   node0:S  node0:I  node1:S  node1:I");
    for (col, t) in tspan.iter().enumerate() {
        println!(
            "{:>3}   {:>7}  {:>7}  {:>7}  {:>7}",
            *t as i64,
            arr[(0, col)],
            arr[(1, col)],
            arr[(2, col)],
            arr[(3, col)],
        );
    }

    Ok(())
}
