// src/roulette/randomizer.rs
//! One randomization pass: filter → shuffle → assign.
//!
//! A pass never touches caller state: it works on copies of the deposit list and
//! ledger and hands back an `Outcome` that the caller commits in one go.

use bevy::prelude::*;
use std::collections::BTreeSet;

use super::config::RouletteConfig;
use super::core::{DepositRecord, NodeKind, Purity, ResourceKind};
use super::error::RouletteError;
use super::grouping::{group_locations, remove_visited};
use super::procedural::{shuffle_in_place, ProceduralGenerator, RouletteSeed};
use super::purity::PurityLedger;

/// Counter behind the "isolated deposit" coin flip. Must start from zero on
/// every pass, or the same seed stops reproducing the same layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinglesCounter(u32);

impl SinglesCounter {
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Advance and report whether this isolated deposit should be deferred
    /// to the singles pool (three times out of four).
    pub fn defer_next(&mut self) -> bool {
        self.0 = self.0.wrapping_add(1);
        self.0 % 4 != 0
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassPhase {
    Idle,
    Filtering,
    Shuffling,
    Assigning,
    Done,
}

/// Everything a committed pass produces.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// Placed deposits followed by untouched pass-through deposits.
    pub deposits: Vec<DepositRecord>,
    /// Ledger after every consumed grade.
    pub ledger: PurityLedger,
    pub placed: usize,
    pub untouched: usize,
    /// Deposits skipped because their kind ran out of grades.
    pub dropped: usize,
    /// Malformed deposits thrown out during filtering.
    pub rejected: usize,
}

/// Deposits split by the filtering phase.
struct Filtered {
    eligible: Vec<DepositRecord>,
    untouched: Vec<DepositRecord>,
    rejected: usize,
}

pub struct Randomizer<'a> {
    config: &'a RouletteConfig,
    generator: ProceduralGenerator,
    phase: PassPhase,
}

impl<'a> Randomizer<'a> {
    pub fn new(config: &'a RouletteConfig, seed: RouletteSeed) -> Self {
        Self { config, generator: ProceduralGenerator::new(seed), phase: PassPhase::Idle }
    }

    pub fn phase(&self) -> PassPhase {
        self.phase
    }

    fn enter(&mut self, phase: PassPhase) {
        trace!("Randomizer: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Run a full pass. `ledger` must hold the scan's found counts; it is
    /// cloned, never mutated.
    pub fn run(
        &mut self,
        deposits: &[DepositRecord],
        ledger: &PurityLedger,
        singles: &mut SinglesCounter,
    ) -> Result<Outcome, RouletteError> {
        let eligible_kinds = self.config.enabled_kinds();
        if self.config.full_randomization && eligible_kinds.is_empty() {
            error!("Randomization aborted: full randomization enabled with no enabled resource kinds");
            return Err(RouletteError::NoEligibleKinds);
        }

        let mut ledger = ledger.clone();

        self.enter(PassPhase::Filtering);
        let Filtered { mut eligible, untouched, rejected } = self.filter(deposits, &mut ledger);

        self.enter(PassPhase::Shuffling);
        // Canonical order first so the shuffle only depends on the seed.
        eligible.sort_by(|a, b| a.kind.cmp(&b.kind));
        let mut locations: Vec<Vec3> = eligible.iter().map(|d| d.location).collect();
        locations.sort_by(|a, b| a.x.total_cmp(&b.x));
        shuffle_in_place(&mut locations, &self.generator);

        self.enter(PassPhase::Assigning);
        let (mut placed, dropped) = if self.config.full_randomization {
            (self.assign_chaos(eligible, &locations, &eligible_kinds), 0)
        } else {
            self.assign_clustered(eligible, locations, &mut ledger, singles)
        };

        let placed_count = placed.len();
        let untouched_count = untouched.len();
        placed.extend(untouched);

        self.enter(PassPhase::Done);
        info!(
            "Randomized {} deposits ({} untouched, {} dropped, {} rejected) with seed {}",
            placed_count,
            untouched_count,
            dropped,
            rejected,
            self.generator.seed().0
        );
        ledger.log_counts();

        Ok(Outcome {
            deposits: placed,
            ledger,
            placed: placed_count,
            untouched: untouched_count,
            dropped,
            rejected,
        })
    }

    fn filter(&self, deposits: &[DepositRecord], ledger: &mut PurityLedger) -> Filtered {
        let mut out = Filtered { eligible: Vec::new(), untouched: Vec::new(), rejected: 0 };

        for d in deposits {
            if d.kind.is_missing() || !self.config.knows(&d.kind) {
                warn!("Dropping deposit {:?}: unknown resource kind '{}'", d.id, d.kind);
                out.rejected += 1;
                continue;
            }
            if d.node == NodeKind::Satellite || !self.config.is_randomized(&d.kind) {
                // Still occupies its grade in the ledger.
                ledger.decrement(&d.kind, d.purity);
                out.untouched.push(d.clone());
                continue;
            }
            out.eligible.push(d.clone());
        }

        debug!(
            "Filtering: {} eligible, {} untouched, {} rejected",
            out.eligible.len(),
            out.untouched.len(),
            out.rejected
        );
        out
    }

    /// Random kind + grade per location; ledger and clustering ignored.
    fn assign_chaos(
        &self,
        mut deposits: Vec<DepositRecord>,
        locations: &[Vec3],
        kinds: &BTreeSet<ResourceKind>,
    ) -> Vec<DepositRecord> {
        let kinds: Vec<&ResourceKind> = kinds.iter().collect();
        let last_kind = kinds.len() as i32 - 1;
        let last_grade = Purity::ALL.len() as i32 - 1;

        let mut out = Vec::with_capacity(locations.len());
        for &loc in locations {
            let Some(deposit) = deposits.pop() else { break };
            let k = self.generator.range_int_by_point(loc, 0, last_kind) as usize;
            let g = self.generator.range_int_by_scalar(loc.x + loc.y + loc.z, 0, last_grade) as usize;
            out.push(deposit.placed_at(kinds[k].clone(), Purity::ALL[g], loc));
        }
        out
    }

    /// Cluster-aware assignment. Returns placed deposits and the drop count.
    fn assign_clustered(
        &self,
        mut deposits: Vec<DepositRecord>,
        mut locations: Vec<Vec3>,
        ledger: &mut PurityLedger,
        singles: &mut SinglesCounter,
    ) -> (Vec<DepositRecord>, usize) {
        let zones = self.config.use_purity_zones;
        let radius = self.config.grouping_radius;
        let cap = self.config.max_group_size;

        let mut out = Vec::with_capacity(deposits.len());
        let mut single_deposits: Vec<DepositRecord> = Vec::new();
        let mut single_locations: Vec<Vec3> = Vec::new();
        let mut dropped = 0;

        while let Some(deposit) = deposits.pop() {
            let Some(location) = locations.pop() else {
                single_deposits.push(deposit);
                break;
            };

            if !self.config.is_groupable(&deposit.kind) {
                single_deposits.push(deposit);
                single_locations.push(location);
                continue;
            }

            let grouping = group_locations(location, &locations, cap, radius);
            if grouping.is_single() && singles.defer_next() {
                single_deposits.push(deposit);
                single_locations.push(location);
                continue;
            }
            remove_visited(&mut locations, &grouping.visited);

            let kind = deposit.kind.clone();
            let anchor = grouping.cluster[0];
            match ledger.take_purity(&kind, anchor, zones) {
                Some(p) => out.push(deposit.placed_at(kind.clone(), p, anchor)),
                None => {
                    warn!("No purity left for {} (deposit {:?}); skipping", kind, deposit.id);
                    dropped += 1;
                    single_locations.push(anchor);
                }
            }

            for &target in &grouping.cluster[1..] {
                let mate = deposits.iter().rposition(|d| d.kind == kind);
                let purity = mate.and_then(|_| ledger.take_purity(&kind, target, zones));
                match (mate, purity) {
                    (Some(i), Some(p)) => {
                        let d = deposits.remove(i);
                        out.push(d.placed_at(kind.clone(), p, target));
                    }
                    _ => single_locations.push(target),
                }
            }
        }

        // Whatever is left gets paired up one-to-one.
        single_deposits.extend(deposits.drain(..).rev());
        single_locations.extend(locations.drain(..).rev());
        debug!(
            "Pairing {} single deposits with {} single locations",
            single_deposits.len(),
            single_locations.len()
        );

        for (deposit, loc) in single_deposits.into_iter().zip(single_locations) {
            match ledger.take_purity(&deposit.kind, loc, zones) {
                Some(p) => {
                    let kind = deposit.kind.clone();
                    out.push(deposit.placed_at(kind, p, loc));
                }
                None => {
                    warn!("No purity left for {} (deposit {:?}); skipping", deposit.kind, deposit.id);
                    dropped += 1;
                }
            }
        }

        (out, dropped)
    }
}

/// Convenience wrapper for a one-off pass.
pub fn randomize(
    deposits: &[DepositRecord],
    ledger: &PurityLedger,
    config: &RouletteConfig,
    seed: RouletteSeed,
    singles: &mut SinglesCounter,
) -> Result<Outcome, RouletteError> {
    Randomizer::new(config, seed).run(deposits, ledger, singles)
}
