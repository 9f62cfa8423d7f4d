use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::{debug, info};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use evlist::codes::{ABS_MAX, CODE_CEILING, CodeLimits, EventType};
use evlist::format::Format;

/// Contents of `~/.config/evlist/config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub format: Option<String>,
    pub input_dir: Option<PathBuf>,
    /// Maximum code per event type, keyed by short type name (`KEY`, `ABS`, ...).
    #[serde(default)]
    pub limits: BTreeMap<String, u16>,
}

fn config_dir() -> Option<PathBuf> {
    let home = UserDirs::new()?.home_dir().to_path_buf();
    Some(home.join(".config").join("evlist"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

impl Config {
    /// Loads `explicit` if given (it must exist), otherwise the default file if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("no config file; using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let cfg = Self::from_file(&path)?;
        info!("loaded config from {}", path.display());
        Ok(cfg)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Self::parse(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
    }

    pub fn parse(txt: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(txt)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if let Some(fmt) = &self.format {
            fmt.parse::<Format>().map_err(|e| anyhow!(e))?;
        }
        for (name, max) in &self.limits {
            let ty = EventType::from_short_name(name)
                .ok_or_else(|| anyhow!("limits: unknown event type '{name}'"))?;
            if !ty.has_code_bitmap() {
                return Err(anyhow!("limits: {} has no code range", ty.name()));
            }
            if *max > CODE_CEILING {
                return Err(anyhow!(
                    "limits: {name} = {max} exceeds the kernel maximum {CODE_CEILING}"
                ));
            }
            if ty == EventType::Absolute && *max > ABS_MAX {
                return Err(anyhow!("limits: {name} = {max} exceeds ABS_MAX ({ABS_MAX})"));
            }
        }
        Ok(())
    }

    pub fn code_limits(&self) -> CodeLimits {
        let mut limits = CodeLimits::default();
        for (name, max) in &self.limits {
            if let Some(ty) = EventType::from_short_name(name) {
                limits.set_max_code(ty, *max);
            }
        }
        limits
    }

    pub fn format(&self) -> Option<Format> {
        self.format.as_deref().and_then(|f| f.parse().ok())
    }
}
