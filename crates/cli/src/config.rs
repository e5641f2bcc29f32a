use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use trainerdeck_runtime_config::{
    CONFIG_FILE_NAME, DeckConfig, apply_env_overrides, apply_fallbacks,
};

/// Get the config directory path (~/.config/trainerdeck/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("trainerdeck"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Read the file at `path`, or defaults when it does not exist.
/// Environment overrides are not applied here.
pub fn read_config(path: &Path) -> Result<DeckConfig> {
    if !path.exists() {
        return Ok(DeckConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let mut config: DeckConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    apply_fallbacks(&mut config);
    Ok(config)
}

pub fn write_config(path: &Path, config: &DeckConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config dir at {}", dir.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}

/// Effective config: file values, then `TRAINERDECK_SERVER_URL`.
pub fn load_config() -> Result<DeckConfig> {
    let mut config = read_config(&config_path()?)?;
    if apply_env_overrides(&mut config, |key| std::env::var(key).ok()) {
        tracing::debug!(url = %config.server.url, "server url taken from environment");
    }
    Ok(config)
}

/// Print current config.
pub fn show_config() -> Result<()> {
    let path = config_path()?;
    let config = load_config()?;
    println!("Config file: {}", path.display());
    println!();
    print!("{}", render_config(&config)?);
    Ok(())
}

fn render_config(config: &DeckConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

/// Values accepted by `trainerdeck config`.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub server: Option<String>,
    pub timeout_secs: Option<u64>,
    pub reconnect_delay_ms: Option<u64>,
    pub reopen_delay_ms: Option<u64>,
    pub default_profile: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.server.is_none()
            && self.timeout_secs.is_none()
            && self.reconnect_delay_ms.is_none()
            && self.reopen_delay_ms.is_none()
            && self.default_profile.is_none()
    }

    fn apply(self, config: &mut DeckConfig) -> Result<()> {
        if let Some(url) = self.server {
            let url = url.trim().trim_end_matches('/');
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("server url must start with http:// or https://");
            }
            config.server.url = url.to_string();
        }
        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                bail!("timeout must be at least one second");
            }
            config.server.timeout_secs = secs;
        }
        if let Some(ms) = self.reconnect_delay_ms {
            config.stream.reconnect_delay_ms = ms;
        }
        if let Some(ms) = self.reopen_delay_ms {
            config.stream.reopen_delay_ms = ms;
        }
        if let Some(profile) = self.default_profile {
            config.editor.default_profile = profile;
        }
        Ok(())
    }
}

/// Update the file at `path`. Only the file's own values are written, never
/// environment overrides.
pub fn update_config_at(path: &Path, update: ConfigUpdate) -> Result<DeckConfig> {
    let mut config = read_config(path)?;
    update.apply(&mut config)?;
    apply_fallbacks(&mut config);
    write_config(path, &config)?;
    Ok(config)
}

/// Update config with provided values.
pub fn set_config(update: ConfigUpdate) -> Result<()> {
    update_config_at(&config_path()?, update)?;
    println!("Configuration updated.");
    show_config()
}
