// src/roulette/purity.rs
//! Per-kind purity quotas. Filled once from a scan, only ever drawn down
//! during a pass, re-seeded wholesale on reroll.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::core::{DepositRecord, Purity, ResourceKind};

// ---------- Zones ----------

/// Circular area (X/Y plane) where a specific grade is forced when available.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurityZone {
    pub center: Vec2,
    pub radius: f32,
    pub purity: Purity,
}

impl PurityZone {
    #[inline]
    pub fn contains(&self, location: Vec3) -> bool {
        location.truncate().distance(self.center) <= self.radius
    }
}

/// Starter areas: keep the first deposits a player sees impure.
pub fn default_zones() -> Vec<PurityZone> {
    vec![
        PurityZone { center: Vec2::new(-50_000.0, 240_000.0), radius: 80_000.0, purity: Purity::Impure },
        PurityZone { center: Vec2::new(50_000.0, -90_000.0), radius: 80_000.0, purity: Purity::Impure },
        PurityZone { center: Vec2::new(300_000.0, -175_000.0), radius: 120_000.0, purity: Purity::Impure },
        PurityZone { center: Vec2::new(-220_000.0, -35_000.0), radius: 80_000.0, purity: Purity::Impure },
    ]
}

// ---------- Counts ----------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurityCounts([u32; 3]);

impl PurityCounts {
    #[inline]
    pub fn get(&self, purity: Purity) -> u32 {
        self.0[purity.index()]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

// ---------- Ledger ----------

#[derive(Clone, Debug, Default)]
pub struct PurityLedger {
    found: BTreeMap<ResourceKind, PurityCounts>,
    remaining: BTreeMap<ResourceKind, PurityCounts>,
    zones: Vec<PurityZone>,
}

impl PurityLedger {
    pub fn new(zones: Vec<PurityZone>) -> Self {
        Self { zones, ..Default::default() }
    }

    /// Build from a full scan; remaining starts equal to found.
    pub fn from_deposits<'a>(
        deposits: impl IntoIterator<Item = &'a DepositRecord>,
        zones: Vec<PurityZone>,
    ) -> Self {
        let mut ledger = Self::new(zones);
        for d in deposits {
            ledger.record_found(&d.kind, d.purity);
        }
        ledger
    }

    pub fn record_found(&mut self, kind: &ResourceKind, purity: Purity) {
        self.found.entry(kind.clone()).or_default().0[purity.index()] += 1;
        self.remaining.entry(kind.clone()).or_default().0[purity.index()] += 1;
    }

    /// Raw-grade entry point for scans that carry untyped grades.
    /// Out-of-range grades are ignored; returns whether anything was recorded.
    pub fn record_found_grade(&mut self, kind: &ResourceKind, grade: u8) -> bool {
        match Purity::try_from(grade) {
            Ok(p) => {
                self.record_found(kind, p);
                true
            }
            Err(e) => {
                debug!("Ignoring grade for {}: {}", kind, e);
                false
            }
        }
    }

    pub fn is_available(&self, kind: &ResourceKind, purity: Purity) -> bool {
        self.remaining(kind, purity) > 0
    }

    pub fn remaining(&self, kind: &ResourceKind, purity: Purity) -> u32 {
        self.remaining.get(kind).map_or(0, |c| c.get(purity))
    }

    pub fn found(&self, kind: &ResourceKind, purity: Purity) -> u32 {
        self.found.get(kind).map_or(0, |c| c.get(purity))
    }

    pub fn remaining_total(&self, kind: &ResourceKind) -> u32 {
        self.remaining.get(kind).map_or(0, PurityCounts::total)
    }

    /// No-op when nothing is left; never fails the caller.
    pub fn decrement(&mut self, kind: &ResourceKind, purity: Purity) {
        if let Some(counts) = self.remaining.get_mut(kind) {
            let slot = &mut counts.0[purity.index()];
            *slot = slot.saturating_sub(1);
        }
    }

    /// First zone (declaration order) containing `location`.
    pub fn zone_purity(&self, location: Vec3) -> Option<Purity> {
        self.zones.iter().find(|z| z.contains(location)).map(|z| z.purity)
    }

    /// Grade a deposit of `kind` at `location` would receive, without consuming
    /// it. `None` means the kind is exhausted.
    pub fn assign_purity(&self, kind: &ResourceKind, location: Vec3, use_zones: bool) -> Option<Purity> {
        if use_zones {
            if let Some(forced) = self.zone_purity(location) {
                if self.is_available(kind, forced) {
                    return Some(forced);
                }
            }
        }
        Purity::PREFERENCE.into_iter().find(|&p| self.is_available(kind, p))
    }

    /// `assign_purity` followed by `decrement`.
    pub fn take_purity(&mut self, kind: &ResourceKind, location: Vec3, use_zones: bool) -> Option<Purity> {
        let purity = self.assign_purity(kind, location, use_zones)?;
        self.decrement(kind, purity);
        Some(purity)
    }

    /// Restore remaining counts from the scan.
    pub fn reset(&mut self) {
        self.remaining = self.found.clone();
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ResourceKind> {
        self.found.keys()
    }

    pub fn log_counts(&self) {
        for (kind, counts) in &self.found {
            let left = self.remaining.get(kind).copied().unwrap_or_default();
            debug!(
                "{} | Pure: {}/{} | Normal: {}/{} | Impure: {}/{}",
                kind,
                left.get(Purity::Pure),
                counts.get(Purity::Pure),
                left.get(Purity::Normal),
                counts.get(Purity::Normal),
                left.get(Purity::Impure),
                counts.get(Purity::Impure),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iron() -> ResourceKind {
        ResourceKind::new("Iron")
    }

    #[test]
    fn prefers_highest_grade_first() {
        let mut ledger = PurityLedger::new(Vec::new());
        ledger.record_found(&iron(), Purity::Impure);
        ledger.record_found(&iron(), Purity::Pure);

        assert_eq!(ledger.take_purity(&iron(), Vec3::ZERO, false), Some(Purity::Pure));
        assert_eq!(ledger.take_purity(&iron(), Vec3::ZERO, false), Some(Purity::Impure));
        assert_eq!(ledger.take_purity(&iron(), Vec3::ZERO, false), None);
        assert_eq!(ledger.found(&iron(), Purity::Pure), 1);
    }

    #[test]
    fn empty_kind_is_exhausted() {
        let ledger = PurityLedger::new(Vec::new());
        assert_eq!(ledger.assign_purity(&iron(), Vec3::ZERO, false), None);
    }

    #[test]
    fn decrement_never_underflows() {
        let mut ledger = PurityLedger::new(Vec::new());
        ledger.record_found(&iron(), Purity::Normal);
        ledger.decrement(&iron(), Purity::Normal);
        ledger.decrement(&iron(), Purity::Normal);
        ledger.decrement(&ResourceKind::new("Copper"), Purity::Normal);
        assert_eq!(ledger.remaining(&iron(), Purity::Normal), 0);
    }

    #[test]
    fn zone_forces_grade_while_available() {
        let zone = PurityZone { center: Vec2::new(100.0, 100.0), radius: 50.0, purity: Purity::Impure };
        let mut ledger = PurityLedger::new(vec![zone]);
        ledger.record_found(&iron(), Purity::Pure);
        ledger.record_found(&iron(), Purity::Impure);

        let inside = Vec3::new(120.0, 90.0, 5_000.0);
        assert_eq!(ledger.zone_purity(inside), Some(Purity::Impure));
        assert_eq!(ledger.take_purity(&iron(), inside, true), Some(Purity::Impure));
        // Zone grade gone: fall back to preference order.
        assert_eq!(ledger.take_purity(&iron(), inside, true), Some(Purity::Pure));
    }

    #[test]
    fn zones_ignored_when_disabled() {
        let zone = PurityZone { center: Vec2::ZERO, radius: 10.0, purity: Purity::Impure };
        let mut ledger = PurityLedger::new(vec![zone]);
        ledger.record_found(&iron(), Purity::Pure);
        ledger.record_found(&iron(), Purity::Impure);
        assert_eq!(ledger.assign_purity(&iron(), Vec3::ZERO, false), Some(Purity::Pure));
    }

    #[test]
    fn first_declared_zone_wins() {
        let a = PurityZone { center: Vec2::ZERO, radius: 10.0, purity: Purity::Normal };
        let b = PurityZone { center: Vec2::ZERO, radius: 20.0, purity: Purity::Impure };
        let ledger = PurityLedger::new(vec![a, b]);
        assert_eq!(ledger.zone_purity(Vec3::new(5.0, 0.0, 0.0)), Some(Purity::Normal));
        assert_eq!(ledger.zone_purity(Vec3::new(15.0, 0.0, 0.0)), Some(Purity::Impure));
        assert_eq!(ledger.zone_purity(Vec3::new(25.0, 0.0, 0.0)), None);
    }

    #[test]
    fn raw_grades_out_of_range_are_ignored() {
        let mut ledger = PurityLedger::new(Vec::new());
        assert!(ledger.record_found_grade(&iron(), 1));
        assert!(!ledger.record_found_grade(&iron(), 9));
        assert_eq!(ledger.remaining_total(&iron()), 1);
    }

    #[test]
    fn reset_restores_scan_counts() {
        let deposits = vec![
            DepositRecord::new(1, "Iron", Purity::Pure, Vec3::ZERO),
            DepositRecord::new(2, "Iron", Purity::Normal, Vec3::X),
        ];
        let mut ledger = PurityLedger::from_deposits(&deposits, Vec::new());
        ledger.take_purity(&iron(), Vec3::ZERO, false);
        ledger.take_purity(&iron(), Vec3::ZERO, false);
        assert_eq!(ledger.remaining_total(&iron()), 0);
        ledger.reset();
        assert_eq!(ledger.remaining(&iron(), Purity::Pure), 1);
        assert_eq!(ledger.remaining(&iron(), Purity::Normal), 1);
    }
}
