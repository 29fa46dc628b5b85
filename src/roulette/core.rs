// src/roulette/core.rs
//! Core types/traits for deterministic deposit shuffling.
//! Keep this file dependency-light; everything else in `roulette` builds on it.

use bevy::prelude::*; // Vec3, Quat
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::RouletteError;

/// The deposit world is Z-up (X/Y is the ground plane).
pub const WORLD_UP: Vec3 = Vec3::Z;

// ---------- Ids ----------

/// Stable identity of a deposit; survives randomization, rerolls and save/load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepositId(pub u64);

/// Resource type of a deposit (e.g. "Iron"). Ordered so ledgers and type lists
/// iterate the same way every run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKind(pub String);

impl ResourceKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scans occasionally hand back deposits without a resource class.
    pub fn is_missing(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------- Purity ----------

/// Ordinal quality tier. Declaration order is the ordering (Impure < Pure).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Purity {
    Impure,
    Normal,
    Pure,
}

impl Purity {
    pub const ALL: [Purity; 3] = [Purity::Impure, Purity::Normal, Purity::Pure];

    /// Order in which the ledger hands out grades when nothing forces one.
    pub const PREFERENCE: [Purity; 3] = [Purity::Pure, Purity::Normal, Purity::Impure];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Purity {
    type Error = RouletteError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Purity::Impure),
            1 => Ok(Purity::Normal),
            2 => Ok(Purity::Pure),
            other => Err(RouletteError::InvalidPurity(other)),
        }
    }
}

// ---------- Deposit shape / form ----------

/// How a deposit relates to its neighbours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Ordinary standalone deposit.
    #[default]
    Node,
    /// Centre of a well field; randomizable like a node.
    Core,
    /// Shares geometry with its core; never shuffled, passed through untouched.
    Satellite,
}

/// Physical form; liquids are flat decals and never terrain-conformed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceForm {
    #[default]
    Solid,
    Liquid,
    Heat,
}

// ---------- Deposit record ----------

/// The unit handed in by a world scan and handed back to the spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub id: DepositId,
    pub kind: ResourceKind,
    pub purity: Purity,
    pub location: Vec3,
    pub orientation: Quat,
    /// Set once terrain conformance has settled this deposit.
    #[serde(default)]
    pub refined: bool,
    #[serde(default)]
    pub node: NodeKind,
    #[serde(default)]
    pub form: ResourceForm,
}

impl DepositRecord {
    pub fn new(id: u64, kind: impl Into<String>, purity: Purity, location: Vec3) -> Self {
        Self {
            id: DepositId(id),
            kind: ResourceKind(kind.into()),
            purity,
            location,
            orientation: Quat::IDENTITY,
            refined: false,
            node: NodeKind::Node,
            form: ResourceForm::Solid,
        }
    }

    pub fn with_node(mut self, node: NodeKind) -> Self {
        self.node = node;
        self
    }

    pub fn with_form(mut self, form: ResourceForm) -> Self {
        self.form = form;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Copy of this record moved to `location` with a new grade. The refined
    /// flag is cleared because the ground under it changed.
    pub fn placed_at(&self, kind: ResourceKind, purity: Purity, location: Vec3) -> Self {
        Self {
            kind,
            purity,
            location,
            refined: false,
            ..self.clone()
        }
    }

    /// Terrain conformance only applies to solid/heat deposits.
    #[inline]
    pub fn wants_conformance(&self) -> bool {
        self.form != ResourceForm::Liquid
    }
}

// ---------- External collaborators ----------

/// Coarse classification of whatever a downward probe hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Static level geometry.
    Terrain,
    /// Buildings, vehicles, anything placed at runtime.
    Dynamic,
    /// Geometry belonging to a deposit (including the one being conformed).
    Deposit(DepositId),
}

/// One hit along a downward probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub point: Vec3,
    pub surface: SurfaceKind,
}

/// Synchronous world scan (required).
pub trait DepositSource: Send + Sync + 'static {
    fn list_deposits(&self) -> Vec<DepositRecord>;
}

/// Downward ray probe (required for conformance).
pub trait WorldProbe: Send + Sync + 'static {
    /// Every hit from `origin` straight down over `max_distance`, nearest first.
    fn probe_downward(&self, origin: Vec3, max_distance: f32) -> Vec<Intersection>;
}

/// Fixed deposit list used as a scan (save data, tests, demo).
#[derive(Clone, Debug, Default)]
pub struct StaticScan(pub Vec<DepositRecord>);

impl DepositSource for StaticScan {
    fn list_deposits(&self) -> Vec<DepositRecord> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purity_from_raw_grade() {
        assert_eq!(Purity::try_from(0).ok(), Some(Purity::Impure));
        assert_eq!(Purity::try_from(2).ok(), Some(Purity::Pure));
        assert!(matches!(Purity::try_from(3), Err(RouletteError::InvalidPurity(3))));
    }

    #[test]
    fn placed_at_clears_refined_and_keeps_identity() {
        let mut rec = DepositRecord::new(7, "Iron", Purity::Impure, Vec3::ZERO);
        rec.refined = true;
        let moved = rec.placed_at("Copper".into(), Purity::Pure, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(moved.id, DepositId(7));
        assert_eq!(moved.kind.as_str(), "Copper");
        assert!(!moved.refined);
    }

    #[test]
    fn liquids_skip_conformance() {
        let rec = DepositRecord::new(1, "Oil", Purity::Normal, Vec3::ZERO).with_form(ResourceForm::Liquid);
        assert!(!rec.wants_conformance());
    }
}
