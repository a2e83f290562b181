//! Optional TOML tuning file shared by every subcommand.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use vector_grid_core::CollisionPolicy;
use vector_grid_system_difficulty::{DifficultyCurve, Tier};
use vector_grid_world::SessionConfig;

/// Session rules and difficulty curve resolved from defaults and the tuning file.
#[derive(Clone, Debug)]
pub(crate) struct Tuning {
    pub(crate) session: SessionConfig,
    pub(crate) curve: DifficultyCurve,
}

impl Tuning {
    /// Loads the tuning file when a path is provided, falling back to the built-in defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no tuning file given, using built-in defaults");
            return Ok(Self {
                session: SessionConfig::default(),
                curve: DifficultyCurve::default(),
            });
        };

        debug!("loading tuning file from {}", path.display());
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read tuning file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid tuning file at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let file: TuningFile =
            toml::from_str(contents).context("failed to parse tuning toml contents")?;

        let curve = if file.tiers.is_empty() {
            DifficultyCurve::default()
        } else {
            DifficultyCurve::from_tiers(file.tiers).context("rejected [[tiers]] table")?
        };
        let session = file.session.apply(SessionConfig::default());
        session.validate().context("rejected [session] table")?;

        Ok(Self { session, curve })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TuningFile {
    #[serde(default)]
    session: SessionSection,
    #[serde(default)]
    tiers: Vec<Tier>,
}

/// Overrides for [`SessionConfig`]; absent keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionSection {
    lock_window_ms: Option<u64>,
    buffer_capacity: Option<usize>,
    time_penalty_ms: Option<u64>,
    hit_flag_ms: Option<u64>,
    stun_ms: Option<u64>,
    clock_interval_ms: Option<u64>,
    fragile_policy: Option<CollisionPolicy>,
    seed: Option<u64>,
}

impl SessionSection {
    fn apply(self, defaults: SessionConfig) -> SessionConfig {
        let millis = |value: Option<u64>, fallback: Duration| {
            value.map_or(fallback, Duration::from_millis)
        };

        SessionConfig {
            lock_window: millis(self.lock_window_ms, defaults.lock_window),
            buffer_capacity: self.buffer_capacity.unwrap_or(defaults.buffer_capacity),
            time_penalty: millis(self.time_penalty_ms, defaults.time_penalty),
            hit_flag_duration: millis(self.hit_flag_ms, defaults.hit_flag_duration),
            stun_duration: millis(self.stun_ms, defaults.stun_duration),
            clock_interval: millis(self.clock_interval_ms, defaults.clock_interval),
            fragile_policy: self.fragile_policy.unwrap_or(defaults.fragile_policy),
            seed: self.seed.unwrap_or(defaults.seed),
        }
    }
}
