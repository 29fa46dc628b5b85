pub mod core;
pub mod error;
pub mod procedural;
pub mod purity;
pub mod grouping;
pub mod config;
pub mod randomizer;
pub mod conform;
pub mod session;
pub mod plugin;
pub mod systems;

pub use plugin::RoulettePlugin;
