// src/roulette/config.rs
//! Data-driven roulette options + loader (`*.roulette.ron`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use super::core::ResourceKind;
use super::error::RouletteError;
use super::purity::{default_zones, PurityZone};

// ---------- Per-kind toggles ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceOptions {
    pub kind: ResourceKind,
    /// Shuffle this kind at all (otherwise passed through untouched).
    #[serde(default = "default_true")]
    pub randomize: bool,
    /// Allow this kind to form clusters (otherwise always placed alone).
    #[serde(default = "default_true")]
    pub group: bool,
}

impl ResourceOptions {
    pub fn new(kind: &str) -> Self {
        Self { kind: ResourceKind::new(kind), randomize: true, group: true }
    }
}

fn default_true() -> bool {
    true
}

/// Stock solid resource list.
pub fn default_resources() -> Vec<ResourceOptions> {
    [
        "Stone", "Iron", "Copper", "Caterium", "Coal", "Quartz", "Sulfur", "Bauxite", "Uranium", "SAM",
    ]
    .into_iter()
    .map(ResourceOptions::new)
    .collect()
}

// ---------- Terrain conformance ----------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConformSettings {
    /// Probes in the Vogel disk.
    pub samples: usize,
    /// Disk radius around the deposit (world units).
    pub disk_radius: f32,
    /// Probe start height above the deposit's current elevation.
    pub lift: f32,
    /// Probe length straight down.
    pub probe_extent: f32,
    /// Misses allowed before the attempt is deferred.
    pub miss_tolerance: usize,
    /// Weight toward the newly sampled elevation (0 = keep, 1 = snap).
    pub elevation_blend: f32,
    pub ransac_iterations: usize,
    /// Max perpendicular distance for a hit to count as a plane inlier.
    pub inlier_distance: f32,
}

impl Default for ConformSettings {
    fn default() -> Self {
        Self {
            samples: 50,
            disk_radius: 400.0,
            lift: 200.0,
            probe_extent: 3_000.0,
            miss_tolerance: 30,
            elevation_blend: 0.75,
            ransac_iterations: 50,
            inlier_distance: 15.0,
        }
    }
}

impl ConformSettings {
    #[inline]
    pub fn min_hits(&self) -> usize {
        self.samples.saturating_sub(self.miss_tolerance).max(3)
    }
}

// ---------- Top-level config ----------

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouletteConfig {
    /// Locations closer than this (3D) chain into one cluster. 7000 = 70 m.
    pub grouping_radius: f32,
    pub max_group_size: usize,
    pub use_purity_zones: bool,
    /// Ignore clustering and the ledger; random kind + grade per location.
    pub full_randomization: bool,
    /// Deposits within this distance of an observer get conformed.
    pub update_radius: f32,
    pub update_interval_secs: f32,
    pub resources: Vec<ResourceOptions>,
    pub zones: Vec<PurityZone>,
    pub conform: ConformSettings,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self {
            grouping_radius: 7_000.0,
            max_group_size: 6,
            use_purity_zones: false,
            full_randomization: false,
            update_radius: 25_000.0,
            update_interval_secs: 2.5,
            resources: default_resources(),
            zones: default_zones(),
            conform: ConformSettings::default(),
        }
    }
}

impl RouletteConfig {
    pub fn from_ron_str(src: &str) -> Result<Self, RouletteError> {
        let cfg: Self = ron::de::from_str(src).map_err(|e| RouletteError::Ron(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RouletteError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_ron_str(&src)
    }

    pub fn validate(&self) -> Result<(), RouletteError> {
        if !self.grouping_radius.is_finite() || self.grouping_radius < 0.0 {
            return Err(RouletteError::InvalidRadius(self.grouping_radius));
        }
        if self.max_group_size == 0 {
            return Err(RouletteError::InvalidGroupSize);
        }
        let mut seen = HashSet::with_capacity(self.resources.len());
        for opt in &self.resources {
            if !seen.insert(&opt.kind) {
                return Err(RouletteError::DuplicateKind(opt.kind.clone()));
            }
        }
        Ok(())
    }

    pub fn options(&self, kind: &ResourceKind) -> Option<&ResourceOptions> {
        self.resources.iter().find(|o| &o.kind == kind)
    }

    /// Known to the config at all (unknown kinds are malformed scan data).
    pub fn knows(&self, kind: &ResourceKind) -> bool {
        self.options(kind).is_some()
    }

    pub fn is_randomized(&self, kind: &ResourceKind) -> bool {
        self.options(kind).is_some_and(|o| o.randomize)
    }

    pub fn is_groupable(&self, kind: &ResourceKind) -> bool {
        self.options(kind).is_some_and(|o| o.group)
    }

    /// Enabled kinds in stable order.
    pub fn enabled_kinds(&self) -> BTreeSet<ResourceKind> {
        self.resources
            .iter()
            .filter(|o| o.randomize)
            .map(|o| o.kind.clone())
            .collect()
    }
}
