use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::hal::env::{EmulationOverrides, NO_OVERRIDE};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "XRT_HAL_CONFIG";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,          // e.g., "info" | "debug"
    pub emulation: Option<EmulationConfig>,
}

/// Emulation driver overrides; unset or "null" means the default library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EmulationConfig {
    pub hw_em_driver: Option<String>,
    pub sw_em_driver: Option<String>,
}

impl EmulationOverrides for Config {
    fn hw_em_driver(&self) -> String {
        self.emulation.as_ref()
            .and_then(|e| e.hw_em_driver.clone())
            .unwrap_or_else(|| NO_OVERRIDE.to_string())
    }

    fn sw_em_driver(&self) -> String {
        self.emulation.as_ref()
            .and_then(|e| e.sw_em_driver.clone())
            .unwrap_or_else(|| NO_OVERRIDE.to_string())
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "xrt-hal-loader", version, about = "Discover XRT HAL devices")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Hardware emulation driver library ("null" for the default)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub hw_em_driver: Option<String>,
    /// Software emulation driver library ("null" for the default)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub sw_em_driver: Option<String>,
    /// load the XDP diagnostics library before probing
    #[arg(long, action = ArgAction::SetTrue)]
    pub xdp: bool,
    /// print devices as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Read YAML, merge CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of the effective config
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_PATH_VAR) {
        let p = PathBuf::from(p);
        if p.exists() { return Some(p) }
    }
    // XDG-style: ~/.config/xrt/hal.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/xrt/hal.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    let p = PathBuf::from("xrt-hal.yaml");
    if p.exists() { return Some(p) }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    match (&mut dst.emulation, src.emulation) {
        (None, Some(e)) => dst.emulation = Some(e),
        (Some(d), Some(s)) => merge_emulation(d, s),
        _ => {}
    }
}

fn merge_emulation(dst: &mut EmulationConfig, src: EmulationConfig) {
    if src.hw_em_driver.is_some() { dst.hw_em_driver = src.hw_em_driver; }
    if src.sw_em_driver.is_some() { dst.sw_em_driver = src.sw_em_driver; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }

    let any_emulation = cli.hw_em_driver.is_some() || cli.sw_em_driver.is_some();
    if any_emulation && cfg.emulation.is_none() {
        cfg.emulation = Some(EmulationConfig::default());
    }
    if let Some(emulation) = cfg.emulation.as_mut() {
        if cli.hw_em_driver.is_some() { emulation.hw_em_driver = cli.hw_em_driver.clone(); }
        if cli.sw_em_driver.is_some() { emulation.sw_em_driver = cli.sw_em_driver.clone(); }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(emulation) = cfg.emulation.as_ref() {
        for (key, value) in [
            ("hw_em_driver", &emulation.hw_em_driver),
            ("sw_em_driver", &emulation.sw_em_driver),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "emulation {key} must be a path or \"{NO_OVERRIDE}\""
                )));
            }
        }
    }
    if let Some(level) = cfg.log_level.as_deref() {
        match level {
            "error" | "warn" | "info" | "debug" | "trace" | "off" => {},
            _ => return Err(ConfigError::Validation(format!("unknown log_level: {level}")))
        }
    }
    Ok(())
}
