//! ==============================================================================================
//! ===================================== Event Splitter (C3) =====================================
//! ==============================================================================================
//!
//! Partitions the input event stream into per-worker intra-node (E1) queues
//! and a single global inter-node (E2) queue, preserving scheduled-time
//! order within each queue.

use crate::error::SimError;
use crate::events::types::{Event, EventKind};
use crate::partition::{owner_of, Partition};

/// Validate and route one event. Returns the target E1 worker index, or
/// `None` if the event belongs to the global E2 queue.
fn validate_and_route(
    idx: usize,
    ev: &Event,
    partitions: &[Partition],
    nn: usize,
) -> Result<Option<usize>, SimError> {
    if ev.node >= nn {
        return Err(SimError::InvalidEvent {
            index: idx,
            reason: format!("node {} out of range (Nn={})", ev.node, nn),
        });
    }
    if ev.kind.is_inter_node() && ev.dest >= nn {
        return Err(SimError::InvalidEvent {
            index: idx,
            reason: format!("dest {} out of range (Nn={})", ev.dest, nn),
        });
    }
    if !(0.0..=1.0).contains(&ev.proportion) {
        return Err(SimError::InvalidEvent {
            index: idx,
            reason: format!("proportion {} outside [0,1]", ev.proportion),
        });
    }
    if ev.kind.is_inter_node() {
        Ok(None)
    } else {
        let owner = owner_of(partitions, ev.node).ok_or_else(|| SimError::InvalidEvent {
            index: idx,
            reason: format!("node {} has no owning partition", ev.node),
        })?;
        Ok(Some(owner))
    }
}

/// Split `events` into `nthread` per-worker E1 queues plus one global E2
/// queue. Each returned queue is stable-sorted by `time`, so events on the
/// same day keep their input relative order.
pub fn split_events(
    events: &[Event],
    partitions: &[Partition],
    nn: usize,
) -> Result<(Vec<Vec<Event>>, Vec<Event>), SimError> {
    let nthread = partitions.len();
    let mut e1: Vec<Vec<Event>> = Vec::new();
    e1.try_reserve(nthread)
        .map_err(|e| SimError::Alloc(e.to_string()))?;
    e1.resize_with(nthread, Vec::new);
    let mut e2: Vec<Event> = Vec::new();

    for (idx, ev) in events.iter().enumerate() {
        match validate_and_route(idx, ev, partitions, nn)? {
            Some(owner) => {
                e1[owner]
                    .try_reserve(1)
                    .map_err(|e| SimError::Alloc(e.to_string()))?;
                e1[owner].push(*ev);
            }
            None => {
                e2.try_reserve(1).map_err(|e| SimError::Alloc(e.to_string()))?;
                e2.push(*ev);
            }
        }
    }

    for q in e1.iter_mut() {
        q.sort_by_key(|e| e.time);
    }
    e2.sort_by_key(|e| e.time);

    Ok((e1, e2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition_nodes;

    fn ev(kind: EventKind, time: i64, node: usize, dest: usize) -> Event {
        Event {
            kind,
            time,
            node,
            dest,
            n: 1,
            proportion: 0.0,
            select: 0,
            shift: 0,
        }
    }

    #[test]
    fn intra_events_route_to_owning_worker() {
        let parts = partition_nodes(4, 2); // worker 0: [0,2), worker 1: [2,4)
        let events = vec![
            ev(EventKind::Exit, 1, 0, 0),
            ev(EventKind::Enter, 2, 3, 0),
        ];
        let (e1, e2) = split_events(&events, &parts, 4).unwrap();
        assert_eq!(e1[0].len(), 1);
        assert_eq!(e1[1].len(), 1);
        assert!(e2.is_empty());
    }

    #[test]
    fn external_transfer_goes_to_global_queue() {
        let parts = partition_nodes(4, 2);
        let events = vec![ev(EventKind::ExternalTransfer, 5, 0, 3)];
        let (e1, e2) = split_events(&events, &parts, 4).unwrap();
        assert!(e1.iter().all(Vec::is_empty));
        assert_eq!(e2.len(), 1);
    }

    #[test]
    fn preserves_input_order_within_a_day() {
        let parts = partition_nodes(4, 1);
        let events = vec![
            ev(EventKind::Exit, 3, 0, 0),
            ev(EventKind::Enter, 3, 1, 0),
            ev(EventKind::Exit, 1, 2, 0),
        ];
        let (e1, _) = split_events(&events, &parts, 4).unwrap();
        let times: Vec<i64> = e1[0].iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1, 3, 3]);
        // the two day-3 events keep their relative input order
        assert_eq!(e1[0][1].node, 0);
        assert_eq!(e1[0][2].node, 1);
    }

    #[test]
    fn rejects_out_of_range_node() {
        let parts = partition_nodes(4, 1);
        let events = vec![ev(EventKind::Exit, 1, 99, 0)];
        assert!(split_events(&events, &parts, 4).is_err());
    }

    #[test]
    fn rejects_bad_proportion() {
        let parts = partition_nodes(4, 1);
        let mut e = ev(EventKind::Exit, 1, 0, 0);
        e.proportion = 1.5;
        assert!(split_events(&[e], &parts, 4).is_err());
    }
}
