use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World-shaping mode. Amplified exaggerates positive biome terrain heights;
/// sea depth is unaffected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldShape {
    Normal,
    Amplified,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct WorldgenConfig {
    pub world_seed: i64,
    /// Blocks at or above this absolute height are never water.
    pub sea_level: i32,
    /// Approximate maximum terrain elevation, in blocks.
    pub max_elevation: f64,
    pub shape: WorldShape,
}

pub const FILENAME: &str = "worldgen.ron";

impl Default for WorldgenConfig {
    fn default() -> Self {
        Self {
            world_seed: 0,
            sea_level: 64,
            max_elevation: 200.0,
            shape: WorldShape::Normal,
        }
    }
}

pub fn load(data_dir: &Path) -> Result<WorldgenConfig> {
    let config_file = data_dir.join(FILENAME);
    if !config_file.exists() {
        log::info!("No worldgen settings found; using defaults");
        return Ok(Default::default());
    }
    let config = ron::from_str::<WorldgenConfig>(
        &std::fs::read_to_string(&config_file)
            .with_context(|| format!("reading {}", config_file.display()))?,
    )
    .with_context(|| format!("parsing {}", config_file.display()))?;
    log::info!("Loaded worldgen settings from {}", config_file.display());
    Ok(config)
}
