// src/roulette/session.rs
//! Session state: one scan, any number of committed passes, persistence.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::RouletteConfig;
use super::core::{DepositId, DepositRecord};
use super::error::RouletteError;
use super::procedural::RouletteSeed;
use super::purity::PurityLedger;
use super::randomizer::{Outcome, Randomizer, SinglesCounter};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStage {
    #[default]
    Unscanned,
    Scanned,
    Randomized,
}

/// Summary of a committed pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassReport {
    pub generation: u32,
    pub placed: usize,
    pub untouched: usize,
    pub dropped: usize,
}

#[derive(Resource, Debug)]
pub struct RouletteSession {
    seed: RouletteSeed,
    /// Scan ledger; never consumed directly, passes work on clones.
    ledger: PurityLedger,
    /// Ledger as left by the last committed pass.
    consumed: PurityLedger,
    original: Vec<DepositRecord>,
    randomized: Vec<DepositRecord>,
    stage: SessionStage,
    generation: u32,
}

impl RouletteSession {
    pub fn new(seed: RouletteSeed) -> Self {
        Self {
            seed,
            ledger: PurityLedger::default(),
            consumed: PurityLedger::default(),
            original: Vec::new(),
            randomized: Vec::new(),
            stage: SessionStage::Unscanned,
            generation: 0,
        }
    }

    pub fn seed(&self) -> RouletteSeed {
        self.seed
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Bumped on every committed pass; conformance results tagged with an
    /// older generation are stale.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn original(&self) -> &[DepositRecord] {
        &self.original
    }

    pub fn deposits(&self) -> &[DepositRecord] {
        &self.randomized
    }

    pub fn ledger(&self) -> &PurityLedger {
        &self.consumed
    }

    pub fn deposit(&self, id: DepositId) -> Option<&DepositRecord> {
        self.randomized.iter().find(|d| d.id == id)
    }

    /// Take a fresh scan. Replaces everything from any earlier scan.
    pub fn scan(&mut self, deposits: Vec<DepositRecord>, config: &RouletteConfig) {
        self.ledger = PurityLedger::from_deposits(&deposits, config.zones.clone());
        self.consumed = self.ledger.clone();
        self.original = deposits;
        self.randomized.clear();
        self.stage = SessionStage::Scanned;
        info!("Scanned {} deposits ({} kinds)", self.original.len(), self.ledger.kinds().count());
        self.ledger.log_counts();
    }

    /// Run one pass over the scanned originals with the current seed and
    /// commit it. On error nothing changes.
    pub fn randomize(&mut self, config: &RouletteConfig) -> Result<PassReport, RouletteError> {
        if self.stage == SessionStage::Unscanned {
            return Err(RouletteError::NotScanned);
        }
        let outcome = self.run_pass(self.seed, config)?;
        Ok(self.commit(outcome))
    }

    /// Every pass starts from a fresh singles counter, so (seed, scan)
    /// always yields the same layout.
    fn run_pass(&self, seed: RouletteSeed, config: &RouletteConfig) -> Result<Outcome, RouletteError> {
        let mut singles = SinglesCounter::default();
        Randomizer::new(config, seed).run(&self.original, &self.ledger, &mut singles)
    }

    /// Start over from the scan with a new seed.
    pub fn reroll(&mut self, seed: RouletteSeed, config: &RouletteConfig) -> Result<PassReport, RouletteError> {
        if self.stage == SessionStage::Unscanned {
            return Err(RouletteError::NotScanned);
        }
        info!("Rerolling deposits with seed {}", seed.0);

        for d in &mut self.original {
            d.refined = false;
        }
        self.ledger.reset();

        let outcome = self.run_pass(seed, config)?;
        self.seed = seed;
        Ok(self.commit(outcome))
    }

    fn commit(&mut self, outcome: Outcome) -> PassReport {
        self.randomized = outcome.deposits;
        self.consumed = outcome.ledger;
        self.stage = SessionStage::Randomized;
        self.generation = self.generation.wrapping_add(1);
        PassReport {
            generation: self.generation,
            placed: outcome.placed,
            untouched: outcome.untouched,
            dropped: outcome.dropped,
        }
    }

    /// Unrefined deposits within `radius` of `observer` that still want
    /// conformance.
    pub fn pending_refinement(&self, observer: Vec3, radius: f32) -> Vec<DepositId> {
        let r2 = radius * radius;
        self.randomized
            .iter()
            .filter(|d| !d.refined && d.wants_conformance() && d.location.distance_squared(observer) <= r2)
            .map(|d| d.id)
            .collect()
    }

    /// Write back conformed records. Results from an older generation are
    /// dropped; returns how many records were updated.
    pub fn apply_refined(&mut self, generation: u32, records: impl IntoIterator<Item = DepositRecord>) -> usize {
        if generation != self.generation {
            debug!("Discarding conformance results from generation {} (now {})", generation, self.generation);
            return 0;
        }
        let mut applied = 0;
        for rec in records {
            if let Some(slot) = self.randomized.iter_mut().find(|d| d.id == rec.id) {
                *slot = rec;
                applied += 1;
            }
        }
        applied
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            seed: self.seed,
            original: self.original.clone(),
            randomized: self.randomized.clone(),
        }
    }

    /// Rebuild a session from a snapshot without running a pass.
    pub fn resume(snapshot: SessionSnapshot, config: &RouletteConfig) -> Self {
        let mut session = Self::new(snapshot.seed);
        session.scan(snapshot.original, config);
        if !snapshot.randomized.is_empty() {
            let mut consumed = session.ledger.clone();
            for d in &snapshot.randomized {
                consumed.decrement(&d.kind, d.purity);
            }
            session.consumed = consumed;
            session.randomized = snapshot.randomized;
            session.stage = SessionStage::Randomized;
            session.generation = 1;
        }
        session
    }
}

/// What gets saved between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub seed: RouletteSeed,
    pub original: Vec<DepositRecord>,
    pub randomized: Vec<DepositRecord>,
}

impl SessionSnapshot {
    pub fn to_ron(&self) -> Result<String, RouletteError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| RouletteError::RonWrite(e.to_string()))
    }

    pub fn from_ron(src: &str) -> Result<Self, RouletteError> {
        ron::de::from_str(src).map_err(|e| RouletteError::Ron(e.to_string()))
    }
}
