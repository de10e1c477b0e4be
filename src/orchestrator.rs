//! ==============================================================================================
//! ====================================== Orchestrator (C7) =======================================
//! ==============================================================================================
//!
//! Day-stepped outer loop: `SSA -> E1 -> BARRIER -> E2 -> BARRIER -> POST ->
//! SAMPLE -> SWAP`. Each `rayon::scope` call is itself a barrier: the scope
//! only returns once every task it spawned has finished, so no explicit
//! `std::sync::Barrier` object is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::SimError;
use crate::events::{inter, intra, types::Event};
use crate::logging;
use crate::model::{Model, PostStepCode};
use crate::node::NetworkState;
use crate::partition::Partition;
use crate::rng::RngService;
use crate::sampler::Sampler;
use crate::sparse::CscView;
use crate::ssa;

/// First-error-wins latch, checked at every barrier.
struct ErrorLatch {
    set: AtomicBool,
    err: Mutex<Option<SimError>>,
}

impl ErrorLatch {
    fn new() -> Self {
        Self {
            set: AtomicBool::new(false),
            err: Mutex::new(None),
        }
    }

    fn set(&self, err: SimError) {
        if !self.set.swap(true, Ordering::SeqCst) {
            *self.err.lock().unwrap() = Some(err);
        }
    }

    fn is_set(&self) -> bool {
        self.set.load(Ordering::SeqCst)
    }

    fn take(&self) -> Option<SimError> {
        self.err.lock().unwrap().take()
    }
}

/// Static inputs shared read-only across every worker for the whole run.
pub struct StaticInputs<'a> {
    pub n: CscView<'a>,
    pub g: CscView<'a>,
    pub e: CscView<'a>,
    pub s: CscView<'a>,
}

/// Drive the full day-stepped simulation to completion.
#[allow(clippy::too_many_arguments)]
pub fn run(
    network: &mut NetworkState,
    partitions: &[Partition],
    e1: &[Vec<Event>],
    e2: &[Event],
    model: &Model,
    inputs: &StaticInputs<'_>,
    rngs: &mut RngService,
    sampler: &mut Sampler,
    mut on_day_complete: Option<&mut dyn FnMut(u64)>,
) -> Result<(), SimError> {
    sampler.write_initial(&network.nodes);
    let mut tt: f64 = 0.0;
    let gdata = network.gdata.clone();
    let latch = ErrorLatch::new();

    while !sampler.is_done() {
        let next_day = tt.floor() + 1.0;
        let day = next_day as i64 - 1;
        logging::debug(&format!("day {day}: starting SSA+E1 phase"));

        // Phase 1: SSA + E1, parallel across workers' disjoint node ranges.
        {
            let mut rest = network.nodes.as_mut_slice();
            let mut chunks = Vec::with_capacity(partitions.len());
            for p in partitions {
                let (head, tail) = rest.split_at_mut(p.len());
                chunks.push(head);
                rest = tail;
            }
            let rng_slice = rngs.workers_mut();

            rayon::scope(|scope| {
                for (i, ((chunk, part), rng)) in chunks
                    .into_iter()
                    .zip(partitions.iter())
                    .zip(rng_slice.iter_mut())
                    .enumerate()
                {
                    let latch = &latch;
                    let gdata = &gdata;
                    let queue = &e1[i];
                    let n = &inputs.n;
                    let g = &inputs.g;
                    let e = &inputs.e;
                    let s = &inputs.s;
                    scope.spawn(move |_| {
                        for (local_idx, node) in chunk.iter_mut().enumerate() {
                            if latch.is_set() {
                                return;
                            }
                            let node_id = part.start + local_idx;
                            if let Err(err) =
                                ssa::step_node(node, gdata, model, n, g, node_id, next_day, rng)
                            {
                                latch.set(err);
                                return;
                            }
                            if let Err(err) =
                                intra::process_intra_day(node, node_id, queue, day, e, s, rng)
                            {
                                latch.set(err);
                                return;
                            }
                        }
                    });
                }
            });
        }
        if let Some(err) = latch.take() {
            logging::error(&format!("day {day}: SSA+E1 phase failed: {err}"));
            return Err(err);
        }

        // Phase 2: E2, single designated worker, full cross-partition access.
        logging::debug(&format!("day {day}: E2 phase"));
        {
            let rng = rngs.workers_mut().first_mut().expect("at least one worker");
            inter::process_inter_day(&mut network.nodes, e2, day, &inputs.e, &inputs.s, rng)?;
        }

        // Phase 3: POST + SAMPLE + SWAP, parallel across workers.
        logging::debug(&format!("day {day}: POST phase"));
        {
            let mut rest = network.nodes.as_mut_slice();
            let mut chunks = Vec::with_capacity(partitions.len());
            for p in partitions {
                let (head, tail) = rest.split_at_mut(p.len());
                chunks.push(head);
                rest = tail;
            }

            rayon::scope(|scope| {
                for (part, chunk) in partitions.iter().zip(chunks.into_iter()) {
                    let latch = &latch;
                    let gdata = &gdata;
                    let model = &model;
                    scope.spawn(move |_| {
                        for (local_idx, node) in chunk.iter_mut().enumerate() {
                            if latch.is_set() {
                                return;
                            }
                            let node_id = part.start + local_idx;
                            let code = model.post_step.post_step(
                                &mut node.v_new,
                                &node.u,
                                &node.v,
                                &node.ldata,
                                gdata,
                                node_id,
                                next_day,
                            );
                            match code {
                                PostStepCode::Error(code) => {
                                    latch.set(SimError::PostStep { code, node: node_id });
                                    return;
                                }
                                PostStepCode::Update => node.mark_dirty(),
                                PostStepCode::NoUpdate => {}
                            }
                        }
                    });
                }
            });
        }
        if let Some(err) = latch.take() {
            logging::error(&format!("day {day}: POST phase failed: {err}"));
            return Err(err);
        }

        sampler.sample_crossings(&network.nodes, next_day);

        for node in network.nodes.iter_mut() {
            node.swap_aux_buffers();
        }

        tt = next_day;
        if let Some(cb) = on_day_complete.as_deref_mut() {
            cb(day as u64 + 1);
        }
    }

    Ok(())
}
