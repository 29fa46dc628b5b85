// src/roulette/systems.rs

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use super::config::RouletteConfig;
use super::conform::{conform, Conformance};
use super::core::{DepositId, DepositRecord};
use super::plugin::{DepositMarker, RouletteObserver, WorldAccess};
use super::session::RouletteSession;

/// Spawned entity per deposit, for the generation they were spawned from.
#[derive(Resource, Default)]
pub struct SpawnedDeposits {
    pub generation: u32,
    pub entities: HashMap<DepositId, Entity>,
}

/// In-flight conformance batch (at most one) plus the throttle clock.
#[derive(Resource, Default)]
pub struct ConformTasks {
    task: Option<(u32, Task<Vec<DepositRecord>>)>,
    last_run: Option<f32>,
}

impl ConformTasks {
    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }
}

fn transform_of(d: &DepositRecord) -> Transform {
    Transform::from_translation(d.location).with_rotation(d.orientation)
}

/// Update: respawn the deposit set whenever a new pass was committed.
pub fn sync_deposit_entities(
    mut commands: Commands,
    session: Res<RouletteSession>,
    mut spawned: ResMut<SpawnedDeposits>,
) {
    if spawned.generation == session.generation() {
        return;
    }

    for (_, entity) in spawned.entities.drain() {
        commands.entity(entity).despawn();
    }
    for d in session.deposits() {
        let e = commands.spawn((DepositMarker { id: d.id }, transform_of(d))).id();
        spawned.entities.insert(d.id, e);
    }
    spawned.generation = session.generation();
    debug!(
        "Roulette: spawned {} deposit entities for generation {}",
        spawned.entities.len(),
        spawned.generation
    );
}

/// Update: every `update_interval_secs`, conform deposits near observers
/// off the main thread.
pub fn schedule_conformance(
    time: Res<Time>,
    config: Res<RouletteConfig>,
    session: Res<RouletteSession>,
    world: Option<Res<WorldAccess>>,
    observers: Query<&Transform, With<RouletteObserver>>,
    mut tasks: ResMut<ConformTasks>,
) {
    let Some(world) = world else { return };
    if tasks.is_busy() {
        return;
    }
    let now = time.elapsed_secs();
    if tasks.last_run.is_some_and(|t| now - t < config.update_interval_secs) {
        return;
    }
    tasks.last_run = Some(now);

    let pending: HashSet<DepositId> = observers
        .iter()
        .flat_map(|t| session.pending_refinement(t.translation, config.update_radius))
        .collect();
    if pending.is_empty() {
        return;
    }

    let batch: Vec<DepositRecord> = session.deposits().iter().filter(|d| pending.contains(&d.id)).cloned().collect();
    let probe = world.probe.clone();
    let settings = config.conform;
    let generation = session.generation();

    trace!("Roulette: conforming {} deposits (generation {})", batch.len(), generation);
    let task = AsyncComputeTaskPool::get().spawn(async move {
        let mut done = Vec::with_capacity(batch.len());
        for mut d in batch {
            if conform(&mut d, probe.as_ref(), &settings) == Conformance::Refined {
                done.push(d);
            }
        }
        done
    });
    tasks.task = Some((generation, task));
}

/// Update: write finished conformance results back into the session.
pub fn collect_conformance_results(mut tasks: ResMut<ConformTasks>, mut session: ResMut<RouletteSession>) {
    let finished = tasks.task.as_ref().is_some_and(|(_, task)| task.is_finished());
    if !finished {
        return;
    }
    let Some((generation, mut task)) = tasks.task.take() else { return };

    if let Some(records) = future::block_on(future::poll_once(&mut task)) {
        let n = session.apply_refined(generation, records);
        if n > 0 {
            debug!("Roulette: {} deposits settled onto terrain", n);
        }
    }
}

/// Update: push refined records onto their entities' transforms.
pub fn sync_refined_transforms(
    session: Res<RouletteSession>,
    spawned: Res<SpawnedDeposits>,
    mut q: Query<(&DepositMarker, &mut Transform)>,
) {
    if !session.is_changed() || spawned.generation != session.generation() {
        return;
    }
    let by_id: HashMap<DepositId, &DepositRecord> = session.deposits().iter().map(|d| (d.id, d)).collect();
    for (marker, mut tf) in &mut q {
        if let Some(d) = by_id.get(&marker.id) {
            let target = transform_of(d);
            if *tf != target {
                *tf = target;
            }
        }
    }
}
