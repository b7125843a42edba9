// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub version: String,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub triage: TriageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OracleConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageConfig {
    #[serde(default = "default_clone_threshold")]
    pub clone_threshold: f64,
    #[serde(default = "default_similarity_flag_threshold")]
    pub similarity_flag_threshold: f64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            clone_threshold: default_clone_threshold(),
            similarity_flag_threshold: default_similarity_flag_threshold(),
        }
    }
}

fn default_clone_threshold() -> f64 {
    0.6
}
fn default_similarity_flag_threshold() -> f64 {
    0.85
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self {
            config_dir,
            config_file,
        }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("codetriage"))
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        // Create backup if file exists
        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content).map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Get the oracle base URL override, if any
    pub fn get_oracle_url(&self) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.oracle.base_url)
    }

    /// Set the oracle base URL override
    pub fn set_oracle_url(&self, url: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.oracle.base_url = Some(url.to_string());
        self.save(&config)
    }

    /// Get the configured clone-verdict threshold
    pub fn get_clone_threshold(&self) -> Result<f64, String> {
        let config = self.load()?;
        Ok(config.triage.clone_threshold)
    }

    /// Set the clone-verdict threshold
    pub fn set_clone_threshold(&self, threshold: f64) -> Result<(), String> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(format!("Threshold {} outside [0, 1]", threshold));
        }
        let mut config = self.load()?;
        config.triage.clone_threshold = threshold;
        self.save(&config)
    }

    /// Create a backup of current config
    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)?;

        Ok(())
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &PathBuf, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Sort by modification time (oldest first)
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        // Remove oldest entries
        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}
