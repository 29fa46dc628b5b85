// src/roulette/conform.rs
//! Terrain conformance: settle a placed deposit onto the ground under it.
//!
//! Probes a Vogel disk straight down, keeps the first static-terrain hit per
//! probe, blends the elevation toward the sampled mean and tilts the deposit
//! onto a RANSAC-fitted plane. Plane sampling uses the thread RNG, not the
//! session seed: orientation is cosmetic and need not reproduce.

use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::PI;

use super::config::ConformSettings;
use super::core::{DepositRecord, SurfaceKind, WorldProbe, WORLD_UP};

/// Outcome of one conformance attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conformance {
    /// Location and orientation updated this call.
    Refined,
    /// Nothing to do (already refined, or a liquid).
    Skipped,
    /// Too few terrain hits; record untouched, try again later.
    Deferred { hits: usize, needed: usize },
}

impl Conformance {
    #[inline]
    pub fn is_settled(self) -> bool {
        !matches!(self, Conformance::Deferred { .. })
    }
}

/// Vogel (golden-angle) disk of `n` points around the origin, evenly spread.
pub fn vogel_disk(n: usize, radius: f32) -> impl Iterator<Item = Vec2> {
    let golden = PI * (3.0 - 5f32.sqrt());
    (0..n).map(move |i| {
        let r = radius * ((i as f32 + 0.5) / n as f32).sqrt();
        let theta = i as f32 * golden;
        Vec2::new(r * theta.cos(), r * theta.sin())
    })
}

/// First static-terrain hit under each disk sample.
pub fn sample_ground(center: Vec3, probe: &dyn WorldProbe, s: &ConformSettings) -> Vec<Vec3> {
    let top = center.z + s.lift;
    vogel_disk(s.samples, s.disk_radius)
        .filter_map(|offset| {
            let origin = Vec3::new(center.x + offset.x, center.y + offset.y, top);
            probe
                .probe_downward(origin, s.probe_extent)
                .into_iter()
                .find(|hit| hit.surface == SurfaceKind::Terrain)
                .map(|hit| hit.point)
        })
        .collect()
}

/// Best plane normal by inlier count over `iterations` random triples.
/// `None` when fewer than three points or every triple was degenerate.
pub fn fit_plane(points: &[Vec3], iterations: usize, inlier_distance: f32, rng: &mut impl Rng) -> Option<Vec3> {
    if points.len() < 3 {
        return None;
    }

    let mut best: Option<(usize, Vec3)> = None;
    for _ in 0..iterations {
        let a = points[rng.random_range(0..points.len())];
        let b = points[rng.random_range(0..points.len())];
        let c = points[rng.random_range(0..points.len())];

        let Some(n) = (b - a).cross(c - a).try_normalize() else {
            continue;
        };
        let inliers = points.iter().filter(|p| n.dot(**p - a).abs() <= inlier_distance).count();
        if best.is_none_or(|(count, _)| inliers > count) {
            best = Some((inliers, n));
        }
    }

    best.map(|(_, n)| if n.z < 0.0 { -n } else { n })
}

/// Refine `deposit` in place. See [`Conformance`] for the outcomes; on
/// `Deferred` the record is left exactly as it was.
pub fn conform(deposit: &mut DepositRecord, probe: &dyn WorldProbe, s: &ConformSettings) -> Conformance {
    if deposit.refined || !deposit.wants_conformance() {
        return Conformance::Skipped;
    }

    let hits = sample_ground(deposit.location, probe, s);
    let needed = s.min_hits();
    if hits.len() < needed {
        trace!("Deposit {:?}: {} ground hits, need {}", deposit.id, hits.len(), needed);
        return Conformance::Deferred { hits: hits.len(), needed };
    }

    let mean_z = hits.iter().map(|p| p.z).sum::<f32>() / hits.len() as f32;
    deposit.location.z += (mean_z - deposit.location.z) * s.elevation_blend;

    let normal = fit_plane(&hits, s.ransac_iterations, s.inlier_distance, &mut rand::rng()).unwrap_or(WORLD_UP);
    // Keep the deposit's heading, tilt its up axis onto the ground normal.
    let (yaw, _, _) = deposit.orientation.to_euler(EulerRot::ZYX);
    deposit.orientation = Quat::from_rotation_arc(WORLD_UP, normal) * Quat::from_rotation_z(yaw);
    deposit.refined = true;

    Conformance::Refined
}

/// `true` once the deposit needs no further work.
pub fn refine(deposit: &mut DepositRecord, probe: &dyn WorldProbe, s: &ConformSettings) -> bool {
    conform(deposit, probe, s).is_settled()
}
