use std::{fs, path::Path};

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// Simulation tuning.
///
/// Loaded from an IDM file, every field is optional and falls back to the
/// default value.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Seed for terrain, placement and unit decisions.
    pub seed: u64,
    pub map_width: i32,
    pub map_height: i32,
    /// Radius of the clear area around the home base.
    pub base_radius: i32,
    pub scout_sight_radius: i32,
    pub gather_sight_radius: i32,
    /// Unit speed in tiles per second at full stamina.
    pub move_speed: f32,
    /// Fog opacity change per second while clearing.
    pub fog_clear_rate: f32,
    /// Fog opacity change per second while returning.
    pub fog_return_rate: f32,
    /// Seconds spent unloading at the base.
    pub deposit_duration: f32,
    /// Seconds spent unloading at a structure.
    pub build_duration: f32,
    pub rest_duration: f32,
    /// Seconds an idle unit with nothing to do waits before looking again.
    pub idle_retry: f32,
    /// Seconds a unit ignores a task it couldn't path to.
    pub unreachable_cooldown: f32,
    /// Seconds for a harvested node to become available again.
    pub node_regrow_duration: f32,
    /// Most tiles a frontier search looks at.
    pub frontier_budget: usize,
    /// Seconds between automatic store syncs.
    pub sync_interval: f32,
    /// Completion percentage points added per delivery, lower bound.
    pub progress_min: f32,
    /// Completion percentage points added per delivery, upper bound.
    pub progress_max: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: 1,
            map_width: 64,
            map_height: 64,
            base_radius: 4,
            scout_sight_radius: 4,
            gather_sight_radius: 2,
            move_speed: 2.5,
            fog_clear_rate: 2.5,
            fog_return_rate: 0.4,
            deposit_duration: 1.5,
            build_duration: 3.0,
            rest_duration: 5.0,
            idle_retry: 1.0,
            unreachable_cooldown: 20.0,
            node_regrow_duration: 8.0,
            frontier_budget: 2500,
            sync_interval: 5.0,
            progress_min: 15.0,
            progress_max: 25.0,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Config::load: can't read {path:?}"))?;
        let ret: Config = idm::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Config::load: {path:?}: {e}"))?;
        ret.validate()?;
        Ok(ret)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.map_width >= 8 && self.map_height >= 8,
            "map must be at least 8x8, got {}x{}",
            self.map_width,
            self.map_height
        );
        ensure!(self.base_radius >= 1, "base-radius must be positive");
        ensure!(
            2 * (self.base_radius + 3) < self.map_width.min(self.map_height),
            "base-radius {} too large for map",
            self.base_radius
        );
        ensure!(
            self.scout_sight_radius >= 1 && self.gather_sight_radius >= 1,
            "sight radii must be positive"
        );
        ensure!(self.move_speed > 0.0, "move-speed must be positive");
        ensure!(
            self.fog_clear_rate > 0.0 && self.fog_return_rate > 0.0,
            "fog rates must be positive"
        );
        for (name, d) in [
            ("deposit-duration", self.deposit_duration),
            ("build-duration", self.build_duration),
            ("rest-duration", self.rest_duration),
            ("idle-retry", self.idle_retry),
            ("unreachable-cooldown", self.unreachable_cooldown),
            ("node-regrow-duration", self.node_regrow_duration),
        ] {
            ensure!(d >= 0.0, "{name} can't be negative");
        }
        ensure!(self.frontier_budget > 0, "frontier-budget must be positive");
        ensure!(self.sync_interval > 0.0, "sync-interval must be positive");
        ensure!(
            0.0 < self.progress_min
                && self.progress_min <= self.progress_max
                && self.progress_max <= 100.0,
            "bad progress range {}..{}",
            self.progress_min,
            self.progress_max
        );
        Ok(())
    }
}
