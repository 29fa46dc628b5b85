//! Seeded deposit shuffling: reassigns resource deposits to new locations while
//! keeping per-kind purity supply, then settles them onto the terrain.

pub mod heightmap_data;
pub mod roulette;

pub use roulette::RoulettePlugin;
