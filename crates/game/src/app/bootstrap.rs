use std::fs;
use std::path::{Path, PathBuf};

use fieldwalk_engine::{
    resolve_asset_layout, AssetLayout, SpawnTable, SpawnTableError, StartupError, Vec2,
    WorldConfig,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const START_MAP_ENV_VAR: &str = "FIELDWALK_START_MAP";
const TICKS_ENV_VAR: &str = "FIELDWALK_TICKS";
const SEED_ENV_VAR: &str = "FIELDWALK_SEED";
const DRIVER_CONFIG_FILE: &str = "fieldwalk.json";
const SPAWN_TABLE_FILE: &str = "spawns.json";

const DEFAULT_START_MAP: &str = "field";
const DEFAULT_TICKS: u32 = 600;
const DEFAULT_TICK_SECONDS: f32 = 1.0 / 60.0;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    SpawnTable(#[from] SpawnTableError),
    #[error("failed to read driver config {path}: {source}")]
    ReadDriverConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse driver config {path} at {json_path}: {source}")]
    ParseDriverConfig {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{var} must be {expected}, got '{value}'")]
    InvalidEnvValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Knobs for the headless run. Read from `fieldwalk.json` under the asset root,
/// then overridden by environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DriverSettings {
    pub(crate) start_map: String,
    pub(crate) ticks: u32,
    pub(crate) tick_seconds: f32,
    pub(crate) seed: Option<u64>,
    pub(crate) avatar_start: [f32; 2],
    pub(crate) avatar_sprite: Option<PathBuf>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            start_map: DEFAULT_START_MAP.to_string(),
            ticks: DEFAULT_TICKS,
            tick_seconds: DEFAULT_TICK_SECONDS,
            seed: None,
            avatar_start: [64.0, 64.0],
            avatar_sprite: None,
        }
    }
}

impl DriverSettings {
    pub(crate) fn avatar_start(&self) -> Vec2 {
        Vec2::new(self.avatar_start[0], self.avatar_start[1])
    }
}

pub(crate) struct AppWiring {
    pub(crate) layout: AssetLayout,
    pub(crate) world: WorldConfig,
    pub(crate) spawn_table: SpawnTable,
    pub(crate) settings: DriverSettings,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    let layout = resolve_asset_layout()?;
    info!(root = %layout.root.display(), "asset_root_resolved");

    let settings = load_driver_settings(&layout.root.join(DRIVER_CONFIG_FILE))?;
    let settings = apply_env_overrides(settings, |var| std::env::var(var).ok())?;
    let spawn_table = load_spawn_table(&layout.root.join(SPAWN_TABLE_FILE))?;
    let world = WorldConfig {
        rng_seed: settings.seed,
        ..WorldConfig::default()
    };
    info!(
        start_map = %settings.start_map,
        ticks = settings.ticks,
        seed = ?settings.seed,
        "driver_configured"
    );

    Ok(AppWiring {
        layout,
        world,
        spawn_table,
        settings,
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_driver_settings(path: &Path) -> Result<DriverSettings, BootstrapError> {
    if !path.is_file() {
        return Ok(DriverSettings::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| BootstrapError::ReadDriverConfig {
        path: path.to_path_buf(),
        source,
    })?;
    parse_driver_settings(&raw, path)
}

fn parse_driver_settings(raw: &str, path: &Path) -> Result<DriverSettings, BootstrapError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        BootstrapError::ParseDriverConfig {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

fn load_spawn_table(path: &Path) -> Result<SpawnTable, BootstrapError> {
    if !path.is_file() {
        return Ok(SpawnTable::builtin());
    }
    let table = SpawnTable::load(path)?;
    info!(path = %path.display(), maps = table.map_names().count(), "spawn_table_override_loaded");
    Ok(table)
}

fn apply_env_overrides(
    mut settings: DriverSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<DriverSettings, BootstrapError> {
    if let Some(map) = lookup(START_MAP_ENV_VAR) {
        let map = map.trim();
        if !map.is_empty() {
            settings.start_map = map.to_string();
        }
    }
    if let Some(raw) = lookup(TICKS_ENV_VAR) {
        settings.ticks = raw
            .trim()
            .parse()
            .map_err(|_| BootstrapError::InvalidEnvValue {
                var: TICKS_ENV_VAR,
                expected: "a non-negative integer",
                value: raw.clone(),
            })?;
    }
    if let Some(raw) = lookup(SEED_ENV_VAR) {
        settings.seed = Some(raw.trim().parse().map_err(|_| {
            BootstrapError::InvalidEnvValue {
                var: SEED_ENV_VAR,
                expected: "an unsigned 64-bit integer",
                value: raw.clone(),
            }
        })?);
    }
    Ok(settings)
}
