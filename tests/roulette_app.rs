//! Headless plugin tests: `MinimalPlugins` + `RoulettePlugin`, driven by hand.

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;

use deposit_roulette::heightmap_data::HeightField;
use deposit_roulette::roulette::config::{ResourceOptions, RouletteConfig};
use deposit_roulette::roulette::core::{DepositRecord, Purity, StaticScan};
use deposit_roulette::roulette::plugin::{
    DepositMarker, RerollRequested, RouletteObserver, RouletteSettings, WorldAccess,
};
use deposit_roulette::roulette::session::{RouletteSession, SessionStage};
use deposit_roulette::RoulettePlugin;

struct TestWorld {
    app: App,
}

impl TestWorld {
    fn new(seed: i32) -> Self {
        let field = HeightField::from_fn(Vec2::splat(-20_000.0), Vec2::splat(40_000.0), UVec2::splat(65), |x, y| {
            (x * 0.0002).sin() * 100.0 + y * 0.002
        });
        let deposits: Vec<DepositRecord> = (0..24u64)
            .map(|i| {
                let kind = ["Iron", "Copper", "Coal"][(i % 3) as usize];
                let x = -15_000.0 + (i % 6) as f32 * 6_000.0;
                let y = -15_000.0 + (i / 6) as f32 * 9_000.0;
                DepositRecord::new(i, kind, Purity::ALL[(i % 3) as usize], Vec3::new(x, y, 0.0))
            })
            .collect();

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(RouletteSettings { config_path: None, seed: Some(seed) })
            .insert_resource(RouletteConfig {
                update_interval_secs: 0.0,
                update_radius: 100_000.0,
                resources: ["Iron", "Copper", "Coal"].into_iter().map(ResourceOptions::new).collect(),
                ..Default::default()
            })
            .insert_resource(WorldAccess { source: Arc::new(StaticScan(deposits)), probe: Arc::new(field) })
            .add_plugins(RoulettePlugin);
        Self { app }
    }

    fn with_observer(mut self) -> Self {
        self.app.world_mut().spawn((RouletteObserver, Transform::default()));
        self
    }

    fn tick(&mut self, n: usize) {
        for _ in 0..n {
            self.app.update();
        }
    }

    fn session(&self) -> &RouletteSession {
        self.app.world().resource::<RouletteSession>()
    }

    fn marker_count(&mut self) -> usize {
        let world = self.app.world_mut();
        world.query::<&DepositMarker>().iter(world).count()
    }
}

#[test]
fn startup_scans_randomizes_and_spawns() {
    let mut w = TestWorld::new(42);
    w.tick(2);

    assert_eq!(w.session().stage(), SessionStage::Randomized);
    assert_eq!(w.session().generation(), 1);
    assert_eq!(w.session().deposits().len(), 24);
    assert_eq!(w.marker_count(), 24);
}

#[test]
fn reroll_with_same_seed_respawns_same_layout() {
    let mut w = TestWorld::new(7);
    w.tick(2);
    let before = w.session().deposits().to_vec();

    w.app.world_mut().send_event(RerollRequested { seed: Some(7) });
    w.tick(2);

    assert_eq!(w.session().generation(), 2);
    assert_eq!(w.session().deposits(), before.as_slice());
    assert_eq!(w.marker_count(), 24);
}

#[test]
fn observer_triggers_conformance() {
    let mut w = TestWorld::new(3).with_observer();
    w.tick(1);

    let mut settled = 0;
    for _ in 0..400 {
        w.tick(1);
        settled = w.session().deposits().iter().filter(|d| d.refined).count();
        if settled == 24 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(settled, 24);

    // Entities follow the refined records.
    w.tick(2);
    let expected: Vec<(u64, Vec3)> = w.session().deposits().iter().map(|d| (d.id.0, d.location)).collect();
    let world = w.app.world_mut();
    for (marker, tf) in world.query::<(&DepositMarker, &Transform)>().iter(world) {
        let loc = expected.iter().find(|(id, _)| *id == marker.id.0).map(|(_, l)| *l);
        assert_eq!(loc, Some(tf.translation));
    }
}

#[test]
fn missing_world_access_leaves_session_unscanned() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(RoulettePlugin);
    app.update();
    assert_eq!(app.world().resource::<RouletteSession>().stage(), SessionStage::Unscanned);
}
