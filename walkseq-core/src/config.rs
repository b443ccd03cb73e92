use std::path::{Path, PathBuf};

use serde::Deserialize;

use walkseq_types::{PatternKind, RateIndex, SequencerParams};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

const SAMPLE_RATE_MIN: u32 = 8_000;
const SAMPLE_RATE_MAX: u32 = 384_000;
const BLOCK_SIZE_MIN: usize = 16;
const BLOCK_SIZE_MAX: usize = 8_192;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    rate: Option<String>,
    density: Option<i64>,
    offset: Option<i64>,
    gate: Option<f32>,
    root: Option<i64>,
    bpm: Option<f64>,
    sync_to_host: Option<bool>,
    manual_step_mode: Option<bool>,
    pattern: Option<String>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    sample_rate: Option<u32>,
    block_size: Option<usize>,
    midi_port: Option<usize>,
}

pub struct Config {
    defaults: DefaultsConfig,
    runtime: RuntimeConfig,
}

impl Config {
    /// Embedded defaults overridden by the user's config file, if any.
    pub fn load() -> Self {
        match user_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::embedded(),
        }
    }

    /// Embedded defaults overridden by `path`. A missing file is not an
    /// error; an unreadable or malformed one is logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Self::embedded();
        if !path.exists() {
            return config;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                Ok(user) => config.merge(user),
                Err(e) => {
                    log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                }
            },
            Err(e) => {
                log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
            }
        }
        config
    }

    /// Embedded defaults overridden by a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let user: ConfigFile = toml::from_str(contents)?;
        let mut config = Self::embedded();
        config.merge(user);
        Ok(config)
    }

    fn embedded() -> Self {
        let base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });
        Config {
            defaults: base.defaults,
            runtime: base.runtime,
        }
    }

    fn merge(&mut self, user: ConfigFile) {
        merge_defaults(&mut self.defaults, user.defaults);
        merge_runtime(&mut self.runtime, user.runtime);
    }

    /// Startup parameters. Every value goes through the clamping setters.
    pub fn sequencer_params(&self) -> SequencerParams {
        let mut params = SequencerParams::default();
        if let Some(label) = self.defaults.rate.as_deref() {
            match RateIndex::from_label(label) {
                Some(rate) => params.rate = rate,
                None => log::warn!(target: "config", "unknown rate '{}', using {}", label, params.rate),
            }
        }
        if let Some(density) = self.defaults.density {
            params.set_density(density);
        }
        if let Some(offset) = self.defaults.offset {
            params.set_offset(offset);
        }
        if let Some(gate) = self.defaults.gate {
            params.set_gate(gate);
        }
        if let Some(root) = self.defaults.root {
            params.set_root(root);
        }
        if let Some(bpm) = self.defaults.bpm {
            params.set_internal_bpm(bpm);
        }
        params.sync_to_host = self.defaults.sync_to_host.unwrap_or(params.sync_to_host);
        params.manual_step_mode = self
            .defaults
            .manual_step_mode
            .unwrap_or(params.manual_step_mode);
        params
    }

    pub fn pattern_kind(&self) -> PatternKind {
        match self.defaults.pattern.as_deref() {
            None => PatternKind::default(),
            Some(name) => PatternKind::parse(name).unwrap_or_else(|| {
                log::warn!(target: "config", "unknown pattern '{}', using random walk", name);
                PatternKind::default()
            }),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.runtime
            .sample_rate
            .unwrap_or(48_000)
            .clamp(SAMPLE_RATE_MIN, SAMPLE_RATE_MAX) as f64
    }

    pub fn block_size(&self) -> usize {
        self.runtime
            .block_size
            .unwrap_or(512)
            .clamp(BLOCK_SIZE_MIN, BLOCK_SIZE_MAX)
    }

    /// Output port index for live mode; `None` means the first available.
    pub fn midi_port(&self) -> Option<usize> {
        self.runtime.midi_port
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("walkseq").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.rate.is_some() {
        base.rate = user.rate;
    }
    if user.density.is_some() {
        base.density = user.density;
    }
    if user.offset.is_some() {
        base.offset = user.offset;
    }
    if user.gate.is_some() {
        base.gate = user.gate;
    }
    if user.root.is_some() {
        base.root = user.root;
    }
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.sync_to_host.is_some() {
        base.sync_to_host = user.sync_to_host;
    }
    if user.manual_step_mode.is_some() {
        base.manual_step_mode = user.manual_step_mode;
    }
    if user.pattern.is_some() {
        base.pattern = user.pattern;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.sample_rate.is_some() {
        base.sample_rate = user.sample_rate;
    }
    if user.block_size.is_some() {
        base.block_size = user.block_size;
    }
    if user.midi_port.is_some() {
        base.midi_port = user.midi_port;
    }
}
