//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use loot_core::loadout::find_loadout;
use loot_core::{Loadout, LoadoutError, ToolCatalog};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Chat log to follow.
    pub log_path: Option<PathBuf>,
    /// Directory holding run records and the markup store.
    pub data_dir: PathBuf,
    /// Character name; only globals by this player count toward a run.
    pub player_name: String,
    pub screenshot: ScreenshotConfig,
    pub loadouts: Vec<Loadout>,
    pub selected_loadout: Option<String>,
    pub catalog: ToolCatalog,
    /// Milliseconds between ticks of the watch loop.
    pub tick_interval_ms: u64,
    /// Most lines processed per tick.
    pub batch_size: usize,
    /// Seconds between saves of a changed run.
    pub autosave_secs: u64,
    /// Milliseconds the tailer waits when the log has no new data.
    pub tail_poll_ms: u64,
    /// Wait after splitting the legacy run file.
    pub migration_settle_ms: u64,
}

/// Screenshots of the player's own globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    pub delay_ms: u64,
    /// Globals worth less than this are not captured.
    pub threshold: Decimal,
    /// Capture program and arguments. `{path}` is replaced with the
    /// destination file; without it the path is appended.
    pub command: Option<Vec<String>>,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        let directory = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Globals");
        Self {
            enabled: true,
            directory,
            delay_ms: 500,
            threshold: Decimal::ZERO,
            command: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_path: None,
            data_dir,
            player_name: String::new(),
            screenshot: ScreenshotConfig::default(),
            loadouts: Vec::new(),
            selected_loadout: None,
            catalog: ToolCatalog::default(),
            tick_interval_ms: 100,
            batch_size: 6,
            autosave_secs: 10,
            tail_poll_ms: 10,
            migration_settle_ms: 0,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = default_config_file() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // LOOTLOG_DATA_DIR, LOOTLOG_SCREENSHOT__ENABLED, ...
        figment = figment.merge(Env::prefixed("LOOTLOG_").split("__"));

        figment.extract()
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize configuration")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved configuration");
        Ok(())
    }

    pub fn markup_path(&self) -> PathBuf {
        self.data_dir.join("markup.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(".lock")
    }

    /// The selected loadout, if one is configured.
    pub fn selected(&self) -> Result<Option<&Loadout>, LoadoutError> {
        self.selected_loadout
            .as_deref()
            .map(|name| find_loadout(&self.loadouts, name))
            .transpose()
    }

    /// Cost per shot of the selected loadout; zero when none is selected.
    pub fn cost_per_shot(&self) -> Result<Decimal, LoadoutError> {
        match self.selected()? {
            Some(loadout) => loadout.cost_per_shot(&self.catalog),
            None => Ok(Decimal::ZERO),
        }
    }
}

/// Returns the platform-specific config directory for lootlog.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("lootlog"))
}

/// The config file read on every start.
///
/// On Linux: `~/.config/lootlog/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs_config_path().map(|p| p.join("config.toml"))
}

/// Returns the platform-specific data directory for lootlog.
///
/// On Linux: `~/.local/share/lootlog`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("lootlog"))
}

#[cfg(test)]
mod tests {
    use loot_core::{EnhancerCount, ToolStats};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_lootlog() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "lootlog");
    }

    #[test]
    fn test_default_config_file_is_toml() {
        let path = default_config_file().unwrap();
        assert_eq!(path.file_name().unwrap(), "config.toml");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, dirs_data_path().unwrap());
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.batch_size, 6);
        assert_eq!(config.autosave_secs, 10);
        assert_eq!(config.migration_settle_ms, 0);
        assert_eq!(config.screenshot.delay_ms, 500);
        assert!(config.screenshot.enabled);
        assert_eq!(config.cost_per_shot().unwrap(), Decimal::ZERO);
    }

    fn armed() -> Config {
        let mut config = Config::default();
        config.catalog.weapons.insert(
            "ArMatrix LR-35".to_string(),
            ToolStats {
                ammo: dec!(2000),
                decay: dec!(0.1),
            },
        );
        config.loadouts.push(Loadout {
            name: "lr35".to_string(),
            weapon: "ArMatrix LR-35".to_string(),
            damage_enhancers: EnhancerCount::clamped(2),
            ..Loadout::default()
        });
        config.selected_loadout = Some("lr35".to_string());
        config
    }

    #[test]
    fn test_cost_per_shot_uses_selected_loadout() {
        // (2000 / 10000 + 0.1) * 1.2
        assert_eq!(armed().cost_per_shot().unwrap(), dec!(0.36));
    }

    #[test]
    fn test_unknown_selected_loadout_is_an_error() {
        let mut config = armed();
        config.selected_loadout = Some("missing".to_string());
        assert!(matches!(
            config.cost_per_shot(),
            Err(LoadoutError::UnknownLoadout(_))
        ));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("lootlog").join("config.toml");
        let mut config = armed();
        config.player_name = "Jane Doe".to_string();
        config.log_path = Some(temp.path().join("chat.log"));
        config.data_dir = temp.path().join("data");
        config.screenshot.command = Some(vec!["grim".to_string(), "{path}".to_string()]);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.player_name, "Jane Doe");
        assert_eq!(loaded.log_path, config.log_path);
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.loadouts, config.loadouts);
        assert_eq!(loaded.catalog, config.catalog);
        assert_eq!(loaded.screenshot.command, config.screenshot.command);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "batch_size = 20\n[screenshot]\nenabled = false\n").unwrap();

        let loaded = Config::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.batch_size, 20);
        assert!(!loaded.screenshot.enabled);
        assert_eq!(loaded.screenshot.delay_ms, 500);
        assert_eq!(loaded.tick_interval_ms, 100);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "batch_size = \"many\"\n").unwrap();
        assert!(Config::load_from(Some(&path)).is_err());
    }
}
