//! Roulette plugin wiring (glue).
//! - Settings + config + seed
//! - Scan/randomize at startup, reroll on request
//! - Deposit entities + lazy terrain conformance (systems.rs)

use bevy::prelude::*;
use std::sync::Arc;

use super::config::RouletteConfig;
use super::core::{DepositId, DepositSource, WorldProbe};
use super::procedural::RouletteSeed;
use super::session::{PassReport, RouletteSession};
use super::systems::{
    collect_conformance_results, schedule_conformance, sync_deposit_entities, sync_refined_transforms,
    ConformTasks, SpawnedDeposits,
};

/// Where the config lives and which seed to start from.
#[derive(Resource, Clone, Default)]
pub struct RouletteSettings {
    /// `*.roulette.ron`; `None` keeps `RouletteConfig::default()`.
    pub config_path: Option<String>,
    /// `None` draws a fresh seed.
    pub seed: Option<i32>,
}

/// Host-supplied world: the deposit scan and the ground probe.
#[derive(Resource, Clone)]
pub struct WorldAccess {
    pub source: Arc<dyn DepositSource>,
    pub probe: Arc<dyn WorldProbe>,
}

/// Ask for a new layout. `seed: None` draws a fresh one.
#[derive(Event, Clone, Copy, Debug)]
pub struct RerollRequested {
    pub seed: Option<i32>,
}

/// Fired after every committed pass.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositsRandomized {
    pub generation: u32,
    pub placed: usize,
    pub dropped: usize,
}

impl From<PassReport> for DepositsRandomized {
    fn from(r: PassReport) -> Self {
        Self { generation: r.generation, placed: r.placed, dropped: r.dropped }
    }
}

/// Anything whose proximity triggers terrain conformance (players, cameras).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct RouletteObserver;

/// Links a spawned entity back to its deposit record.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositMarker {
    pub id: DepositId,
}

pub struct RoulettePlugin;
impl Plugin for RoulettePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RouletteSettings>()
            .init_resource::<RouletteConfig>()
            .init_resource::<SpawnedDeposits>()
            .init_resource::<ConformTasks>()
            .insert_resource(RouletteSession::new(RouletteSeed(0)))
            .add_event::<RerollRequested>()
            .add_event::<DepositsRandomized>()
            .add_systems(Startup, (load_config, start_session).chain())
            .add_systems(
                Update,
                (
                    handle_reroll_requests,
                    sync_deposit_entities,
                    collect_conformance_results,
                    sync_refined_transforms,
                    schedule_conformance,
                )
                    .chain(),
            );
    }
}

/// Startup: replace the default config with the file named in settings.
fn load_config(settings: Res<RouletteSettings>, mut config: ResMut<RouletteConfig>) {
    let Some(path) = settings.config_path.as_deref() else {
        debug!("Roulette: no config path, using defaults");
        return;
    };
    match RouletteConfig::load(path) {
        Ok(loaded) => {
            info!("Roulette: loaded config from '{}'", path);
            *config = loaded;
        }
        Err(e) => error!("Roulette: failed to load config '{}': {}; using defaults", path, e),
    }
}

/// Startup: seed, scan and run the first pass.
fn start_session(
    settings: Res<RouletteSettings>,
    config: Res<RouletteConfig>,
    world: Option<Res<WorldAccess>>,
    mut session: ResMut<RouletteSession>,
    mut randomized: EventWriter<DepositsRandomized>,
) {
    let seed = settings.seed.map_or_else(RouletteSeed::generate, RouletteSeed);
    *session = RouletteSession::new(seed);
    info!("Roulette: session seed={}", seed.0);

    let Some(world) = world else {
        warn!("Roulette: no WorldAccess resource; nothing to randomize");
        return;
    };

    session.scan(world.source.list_deposits(), &config);
    match session.randomize(&config) {
        Ok(report) => {
            randomized.write(report.into());
        }
        Err(e) => error!("Roulette: initial pass failed: {}", e),
    }
}

/// Update: apply the last reroll request of the frame.
fn handle_reroll_requests(
    mut requests: EventReader<RerollRequested>,
    config: Res<RouletteConfig>,
    mut session: ResMut<RouletteSession>,
    mut randomized: EventWriter<DepositsRandomized>,
) {
    let Some(req) = requests.read().last().copied() else { return };

    let seed = req.seed.map_or_else(RouletteSeed::generate, RouletteSeed);
    match session.reroll(seed, &config) {
        Ok(report) => {
            randomized.write(report.into());
        }
        Err(e) => warn!("Roulette: reroll ignored: {}", e),
    }
}
