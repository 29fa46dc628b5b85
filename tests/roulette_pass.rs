//! Whole-pass properties through the public API.

use std::collections::BTreeMap;

use bevy::prelude::*;

use deposit_roulette::heightmap_data::HeightField;
use deposit_roulette::roulette::config::{ResourceOptions, RouletteConfig};
use deposit_roulette::roulette::conform::refine;
use deposit_roulette::roulette::core::{DepositRecord, Purity};
use deposit_roulette::roulette::procedural::RouletteSeed;
use deposit_roulette::roulette::purity::PurityLedger;
use deposit_roulette::roulette::randomizer::{randomize, SinglesCounter};
use deposit_roulette::roulette::session::{RouletteSession, SessionSnapshot};

const KINDS: [&str; 4] = ["Iron", "Copper", "Coal", "Sulfur"];

fn config() -> RouletteConfig {
    RouletteConfig {
        grouping_radius: 3_000.0,
        max_group_size: 4,
        resources: KINDS.into_iter().map(ResourceOptions::new).collect(),
        ..Default::default()
    }
}

/// Clumps of 1..=5 deposits scattered over a 100 km square.
fn scan() -> Vec<DepositRecord> {
    let mut out = Vec::new();
    for clump in 0..30u64 {
        let cx = ((clump * 7_919) % 100_000) as f32;
        let cy = ((clump * 104_729) % 100_000) as f32;
        for j in 0..(clump % 5 + 1) {
            let id = clump * 10 + j;
            let kind = KINDS[((clump + j / 3) % 4) as usize];
            let loc = Vec3::new(cx + j as f32 * 900.0, cy - j as f32 * 400.0, (j * 50) as f32);
            out.push(DepositRecord::new(id, kind, Purity::ALL[(id % 3) as usize], loc));
        }
    }
    out
}

fn tally(deposits: &[DepositRecord]) -> BTreeMap<(String, Purity), usize> {
    let mut m = BTreeMap::new();
    for d in deposits {
        *m.entry((d.kind.as_str().to_string(), d.purity)).or_insert(0) += 1;
    }
    m
}

fn pass(deposits: &[DepositRecord], cfg: &RouletteConfig, seed: i32) -> Vec<DepositRecord> {
    let ledger = PurityLedger::from_deposits(deposits, cfg.zones.clone());
    randomize(deposits, &ledger, cfg, RouletteSeed(seed), &mut SinglesCounter::default())
        .expect("pass succeeds")
        .deposits
}

#[test]
fn identical_inputs_give_identical_output() {
    let d = scan();
    let cfg = config();
    for seed in [0, 42, -17, i32::MAX] {
        assert_eq!(pass(&d, &cfg, seed), pass(&d, &cfg, seed));
    }
}

#[test]
fn supply_is_conserved_per_kind_and_grade() {
    let d = scan();
    let cfg = config();
    for seed in [1, 2, 3] {
        assert_eq!(tally(&pass(&d, &cfg, seed)), tally(&d));
    }
}

#[test]
fn zones_never_create_supply() {
    let d = scan();
    let mut cfg = config();
    cfg.use_purity_zones = true;
    cfg.zones = vec![deposit_roulette::roulette::purity::PurityZone {
        center: Vec2::new(50_000.0, 50_000.0),
        radius: 30_000.0,
        purity: Purity::Impure,
    }];
    let before = tally(&d);
    for (key, n) in tally(&pass(&d, &cfg, 9)) {
        assert!(n <= before.get(&key).copied().unwrap_or(0), "{key:?} over-assigned");
    }
}

#[test]
fn different_seeds_move_things_around() {
    let d = scan();
    let cfg = config();
    let a = pass(&d, &cfg, 10);
    let b = pass(&d, &cfg, 11);
    assert_ne!(a, b);
}

#[test]
fn snapshot_file_resumes_exactly() {
    let cfg = config();
    let mut session = RouletteSession::new(RouletteSeed(2_718));
    session.scan(scan(), &cfg);
    session.randomize(&cfg).expect("pass");

    let path = std::env::temp_dir().join(format!("roulette_snapshot_{}.ron", std::process::id()));
    let text = session.snapshot().to_ron().expect("serializes");
    std::fs::write(&path, &text).expect("write snapshot");
    let read = std::fs::read_to_string(&path).expect("read snapshot");
    let _ = std::fs::remove_file(&path);

    let snapshot = SessionSnapshot::from_ron(&read).expect("parses");
    let resumed = RouletteSession::resume(snapshot, &cfg);
    assert_eq!(resumed.deposits(), session.deposits());

    // Re-running the engine from the saved seed and scan gives the same list.
    let mut replay = RouletteSession::new(resumed.seed());
    replay.scan(resumed.original().to_vec(), &cfg);
    replay.randomize(&cfg).expect("pass");
    assert_eq!(replay.deposits(), session.deposits());
}

#[test]
fn randomized_deposits_settle_onto_a_height_field() {
    let field = HeightField::from_fn(Vec2::splat(-1_000.0), Vec2::splat(120_000.0), UVec2::splat(129), |_, _| 80.0);
    let cfg = config();
    let mut placed = pass(&scan(), &cfg, 5);

    for d in &mut placed {
        assert!(refine(d, &field, &cfg.conform), "deposit {:?} deferred", d.id);
        assert!(d.refined);
        let up = d.orientation * Vec3::Z;
        assert!(up.abs_diff_eq(Vec3::Z, 1e-4));
    }
}
