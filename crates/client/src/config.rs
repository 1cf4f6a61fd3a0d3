use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use spar::AnimationSet;

/// Startup configuration, loadable from a TOML file. Anything not set in
/// the file keeps its default; command-line flags win over both.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: String,
    pub tick_rate: u32,
    /// Clip names of the loaded character model.
    pub animations: AnimationSet,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: format!("127.0.0.1:{}", spar::DEFAULT_PORT),
            tick_rate: spar::DEFAULT_TICK_RATE,
            animations: AnimationSet::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}
