use crate::domain::schedule::ScheduleConfig;
use crate::infrastructure::error::InfraError;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const CONFIG_DIR_NAME: &str = "auto-grayscale";
const CONFIG_FILE_NAME: &str = "schedule_config.json";

/// Disk persistence for [`ScheduleConfig`].
///
/// Reads never fail to the caller: any read or parse problem is logged and
/// replaced with defaults. Writes validate first so malformed times never
/// reach disk, and go through a temp-file-then-rename so a crash mid-write
/// leaves the previous good file intact.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
    legacy_path: PathBuf,
}

impl ConfigStore {
    pub fn new(config_path: PathBuf, legacy_path: PathBuf) -> Self {
        Self {
            config_path,
            legacy_path,
        }
    }

    /// Canonical location: `<per-user config dir>/auto-grayscale/
    /// schedule_config.json`. The legacy location is the same filename in
    /// the process working directory, where early releases kept it.
    pub fn at_default_location() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME);
        Self::new(
            config_dir.join(CONFIG_FILE_NAME),
            PathBuf::from(CONFIG_FILE_NAME),
        )
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the persisted config, merged field-by-field over defaults.
    /// Performs the one-time legacy-location migration when the canonical
    /// file is absent.
    pub fn load(&self) -> ScheduleConfig {
        if self.config_path.exists() {
            return match self.read_config(&self.config_path) {
                Ok(config) => config,
                Err(error) => {
                    warn!(
                        path = %self.config_path.display(),
                        %error,
                        "failed to load schedule config; using defaults"
                    );
                    ScheduleConfig::default()
                }
            };
        }

        if self.legacy_path.exists() {
            return self.migrate_legacy();
        }

        ScheduleConfig::default()
    }

    /// Persist the config. Validation happens before the write; invalid
    /// times are refused rather than persisted.
    pub fn save(&self, config: &ScheduleConfig) -> Result<(), InfraError> {
        config.validate().map_err(InfraError::InvalidTime)?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(config)?;
        let tmp_path = self.config_path.with_extension("json.tmp");
        fs::write(&tmp_path, format!("{serialized}\n"))?;
        fs::rename(&tmp_path, &self.config_path)?;
        Ok(())
    }

    fn read_config(&self, path: &PathBuf) -> Result<ScheduleConfig, InfraError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn migrate_legacy(&self) -> ScheduleConfig {
        let config = match self.read_config(&self.legacy_path) {
            Ok(config) => config,
            Err(error) => {
                warn!(
                    path = %self.legacy_path.display(),
                    %error,
                    "failed to read legacy schedule config; using defaults"
                );
                return ScheduleConfig::default();
            }
        };

        info!(
            from = %self.legacy_path.display(),
            to = %self.config_path.display(),
            "migrating schedule config from legacy location"
        );
        if let Err(error) = self.save(&config) {
            warn!(%error, "failed to persist migrated schedule config");
            return config;
        }
        if let Err(error) = fs::remove_file(&self.legacy_path) {
            warn!(
                path = %self.legacy_path.display(),
                %error,
                "failed to remove legacy schedule config"
            );
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(
            dir.path().join("config").join(CONFIG_FILE_NAME),
            dir.path().join(CONFIG_FILE_NAME),
        )
    }

    #[test]
    fn load_without_any_file_returns_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        assert_eq!(store.load(), ScheduleConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        let config = ScheduleConfig {
            start_time: "21:15".to_string(),
            end_time: "07:45".to_string(),
            enabled: true,
        };

        store.save(&config).expect("save succeeds");
        assert_eq!(store.load(), config);
    }

    #[test]
    fn save_refuses_invalid_times() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        let config = ScheduleConfig {
            start_time: "8:00".to_string(),
            end_time: "17:00".to_string(),
            enabled: false,
        };

        let result = store.save(&config);
        assert!(matches!(result, Err(InfraError::InvalidTime(_))));
        assert!(!store.config_path().exists());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        fs::create_dir_all(store.config_path().parent().expect("parent")).expect("mkdir");
        fs::write(store.config_path(), "not json {").expect("write corrupt file");

        assert_eq!(store.load(), ScheduleConfig::default());
    }

    #[test]
    fn unknown_and_missing_fields_fall_back_per_field() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        fs::create_dir_all(store.config_path().parent().expect("parent")).expect("mkdir");
        fs::write(
            store.config_path(),
            r#"{"start_time": "20:30", "flux_capacitor": 88}"#,
        )
        .expect("write partial file");

        let config = store.load();
        assert_eq!(config.start_time, "20:30");
        assert_eq!(config.end_time, "06:00");
        assert!(!config.enabled);
    }

    #[test]
    fn legacy_file_is_migrated_once() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        let legacy = ScheduleConfig {
            start_time: "23:00".to_string(),
            end_time: "05:30".to_string(),
            enabled: true,
        };
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            serde_json::to_string(&legacy).expect("serialize"),
        )
        .expect("write legacy file");

        let loaded = store.load();
        assert_eq!(loaded, legacy);
        assert!(store.config_path().exists(), "canonical file created");
        assert!(
            !dir.path().join(CONFIG_FILE_NAME).exists(),
            "legacy file removed"
        );

        // Second load reads the canonical file directly.
        assert_eq!(store.load(), legacy);
    }

    #[test]
    fn canonical_file_wins_over_legacy() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        let canonical = ScheduleConfig {
            start_time: "22:00".to_string(),
            end_time: "06:00".to_string(),
            enabled: true,
        };
        store.save(&canonical).expect("save canonical");
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"start_time": "01:00", "end_time": "02:00", "enabled": false}"#,
        )
        .expect("write legacy file");

        assert_eq!(store.load(), canonical);
        assert!(
            dir.path().join(CONFIG_FILE_NAME).exists(),
            "legacy file untouched when canonical exists"
        );
    }

    fn valid_time() -> impl Strategy<Value = String> {
        (0u32..24, 0u32..60).prop_map(|(hour, minute)| format!("{hour:02}:{minute:02}"))
    }

    proptest! {
        #[test]
        fn round_trip_preserves_all_valid_values(
            start in valid_time(),
            end in valid_time(),
            enabled in any::<bool>(),
        ) {
            let dir = TempDir::new().expect("temp dir");
            let store = store_in(&dir);
            let config = ScheduleConfig {
                start_time: start,
                end_time: end,
                enabled,
            };

            store.save(&config).expect("save succeeds");
            prop_assert_eq!(store.load(), config);
        }
    }
}
