// src/roulette/grouping.rs
//! Radius-linked clustering of candidate locations with a hard size cap.
//!
//! Depth-first expansion from a start point: every unvisited pool point within
//! `radius` of the current point joins and is expanded in turn, until the
//! cluster hits `max_group_size`. This is single-linkage with truncation, so
//! *which* points make the cap depends on pool order; callers must hand in a
//! deterministically shuffled pool.

use bevy::prelude::*;

/// Result of one expansion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grouping {
    /// Start point first, then members in discovery order.
    pub cluster: Vec<Vec3>,
    /// Pool indices consumed by the cluster (discovery order; start excluded).
    pub visited: Vec<usize>,
}

impl Grouping {
    #[inline]
    pub fn is_single(&self) -> bool {
        self.cluster.len() == 1
    }
}

/// Expand a cluster from `start` over `pool`.
///
/// Uses an explicit stack of `(point, scan cursor)` frames so the visit order is
/// identical to the recursive formulation without its depth limit.
pub fn group_locations(start: Vec3, pool: &[Vec3], max_group_size: usize, radius: f32) -> Grouping {
    let cap = max_group_size.max(1);
    let r2 = radius * radius;

    let mut seen = vec![false; pool.len()];
    let mut out = Grouping { cluster: vec![start], visited: Vec::new() };
    let mut stack: Vec<(Vec3, usize)> = vec![(start, 0)];

    while let Some(frame) = stack.last_mut() {
        if out.cluster.len() >= cap {
            break;
        }

        let (center, cursor) = *frame;
        let next = (cursor..pool.len())
            .find(|&i| !seen[i] && pool[i].distance_squared(center) <= r2);

        match next {
            Some(i) => {
                frame.1 = i + 1;
                seen[i] = true;
                out.visited.push(i);
                out.cluster.push(pool[i]);
                stack.push((pool[i], 0));
            }
            None => {
                stack.pop();
            }
        }
    }

    out
}

/// Drop the indices a cluster consumed, keeping the rest in order.
pub fn remove_visited<T>(pool: &mut Vec<T>, visited: &[usize]) {
    if visited.is_empty() {
        return;
    }
    let mut gone = vec![false; pool.len()];
    for &i in visited {
        if let Some(slot) = gone.get_mut(i) {
            *slot = true;
        }
    }
    let mut ix = 0;
    pool.retain(|_| {
        let keep = !gone[ix];
        ix += 1;
        keep
    });
}
