use std::sync::Arc;
use std::time::Duration;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use deposit_roulette::heightmap_data::{HeightField, Obstacle};
use deposit_roulette::roulette::core::{DepositRecord, NodeKind, Purity, ResourceForm, StaticScan};
use deposit_roulette::roulette::plugin::{
    DepositsRandomized, RerollRequested, RouletteObserver, RouletteSettings, WorldAccess,
};
use deposit_roulette::roulette::session::RouletteSession;
use deposit_roulette::RoulettePlugin;

const MAP_HALF: f32 = 200_000.0;
const FRAMES: u32 = 600;
const FRAME_TIME: Duration = Duration::from_millis(16);
const SOLIDS: [&str; 6] = ["Iron", "Copper", "Coal", "Caterium", "Quartz", "Bauxite"];

// usage: deposit_roulette [seed] [snapshot.ron] [config.roulette.ron]
fn main() {
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse::<i32>().ok());
    let out_path = args.next().unwrap_or_else(|| "roulette_session.ron".to_string());
    let config_path = args.next().or_else(|| {
        let default = "config/default.roulette.ron";
        std::path::Path::new(default).exists().then(|| default.to_string())
    });

    let field = demo_terrain();
    let inventory = demo_inventory(&field);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin {
            filter: "info,deposit_roulette=debug".to_string(),
            ..Default::default()
        })
        .insert_resource(RouletteSettings { config_path, seed })
        .insert_resource(WorldAccess {
            source: Arc::new(StaticScan(inventory)),
            probe: Arc::new(field),
        })
        .add_plugins(RoulettePlugin)
        .add_systems(Startup, spawn_walker)
        .add_systems(Update, (walk_observer, log_passes));

    for frame in 0..FRAMES {
        app.update();
        // Halfway through, roll a fresh layout.
        if frame == FRAMES / 2 {
            app.world_mut().send_event(RerollRequested { seed: None });
        }
        std::thread::sleep(FRAME_TIME);
    }

    let session = app.world().resource::<RouletteSession>();
    let refined = session.deposits().iter().filter(|d| d.refined).count();
    info!(
        "Demo done: seed={}, {} deposits, {} settled onto terrain",
        session.seed().0,
        session.deposits().len(),
        refined
    );

    match session.snapshot().to_ron() {
        Ok(text) => match std::fs::write(&out_path, text) {
            Ok(()) => info!("Wrote session snapshot to '{}'", out_path),
            Err(e) => error!("Could not write '{}': {}", out_path, e),
        },
        Err(e) => error!("Could not serialize session: {}", e),
    }
}

/// Rolling hills with a few plateaus.
fn demo_terrain() -> HeightField {
    let hills = |x: f32, y: f32| {
        let a = (x * 0.000_03).sin() * (y * 0.000_02).cos() * 4_000.0;
        let b = ((x + y) * 0.000_11).sin() * 600.0;
        a + b
    };
    HeightField::from_fn(Vec2::splat(-MAP_HALF), Vec2::splat(MAP_HALF * 2.0), UVec2::splat(513), hills).with_obstacles(vec![
        Obstacle { min: Vec2::new(-5_000.0, -5_000.0), max: Vec2::new(5_000.0, 5_000.0), top: 6_000.0 },
        Obstacle { min: Vec2::new(40_000.0, 10_000.0), max: Vec2::new(48_000.0, 16_000.0), top: 5_000.0 },
    ])
}

/// Clumped solids, a few liquids and some well satellites.
fn demo_inventory(field: &HeightField) -> Vec<DepositRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(2_024);
    let mut out = Vec::new();
    let mut next_id = 0u64;
    let mut push = |kind: &str, purity: Purity, x: f32, y: f32, out: &mut Vec<DepositRecord>| {
        let z = field.sample_height(x, y).unwrap_or_default();
        let d = DepositRecord::new(next_id, kind, purity, Vec3::new(x, y, z));
        next_id += 1;
        out.push(d);
        out.len() - 1
    };

    for _ in 0..40 {
        let cx = rng.random_range(-MAP_HALF * 0.9..MAP_HALF * 0.9);
        let cy = rng.random_range(-MAP_HALF * 0.9..MAP_HALF * 0.9);
        let kind = SOLIDS[rng.random_range(0..SOLIDS.len())];
        for _ in 0..rng.random_range(1..=6) {
            let x = cx + rng.random_range(-4_000.0..4_000.0);
            let y = cy + rng.random_range(-4_000.0..4_000.0);
            let purity = Purity::ALL[rng.random_range(0..Purity::ALL.len())];
            push(kind, purity, x, y, &mut out);
        }
    }

    for _ in 0..6 {
        let x = rng.random_range(-MAP_HALF * 0.9..MAP_HALF * 0.9);
        let y = rng.random_range(-MAP_HALF * 0.9..MAP_HALF * 0.9);
        let i = push("Water", Purity::Normal, x, y, &mut out);
        out[i] = out[i].clone().with_form(ResourceForm::Liquid);
    }

    for _ in 0..3 {
        let x = rng.random_range(-MAP_HALF * 0.9..MAP_HALF * 0.9);
        let y = rng.random_range(-MAP_HALF * 0.9..MAP_HALF * 0.9);
        let core = push("Nitrogen", Purity::Normal, x, y, &mut out);
        out[core] = out[core].clone().with_node(NodeKind::Core).with_form(ResourceForm::Liquid);
        for k in 0..3 {
            let i = push("Nitrogen", Purity::Impure, x + 800.0 * (k as f32 - 1.0), y + 600.0, &mut out);
            out[i] = out[i].clone().with_node(NodeKind::Satellite).with_form(ResourceForm::Liquid);
        }
    }

    out
}

fn spawn_walker(mut commands: Commands) {
    commands.spawn((RouletteObserver, Transform::from_xyz(-MAP_HALF, 0.0, 0.0)));
}

/// Sweep the observer across the map so conformance happens in waves.
fn walk_observer(time: Res<Time>, mut q: Query<&mut Transform, With<RouletteObserver>>) {
    for mut tf in &mut q {
        tf.translation.x += 60_000.0 * time.delta_secs();
        if tf.translation.x > MAP_HALF {
            tf.translation.x = -MAP_HALF;
            tf.translation.y = (tf.translation.y + 50_000.0 + MAP_HALF) % (MAP_HALF * 2.0) - MAP_HALF;
        }
    }
}

fn log_passes(mut events: EventReader<DepositsRandomized>) {
    for ev in events.read() {
        info!("Pass {} committed: {} placed, {} dropped", ev.generation, ev.placed, ev.dropped);
    }
}
