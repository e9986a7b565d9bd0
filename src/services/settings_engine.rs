// Step recorder settings engine
// Loads, saves, updates and resets recorder settings.
// Settings are stored as a JSON file at the platform-specific config path.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::RecorderSettings;

pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<RecorderSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &RecorderSettings;
    fn get_value(&self, key: &str) -> Result<serde_json::Value, SettingsError>;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Persists [`RecorderSettings`] as pretty-printed JSON.
pub struct SettingsEngine {
    config_path: String,
    settings: RecorderSettings,
}

impl SettingsEngine {
    /// Uses `path_override` when given, otherwise `<config dir>/settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string()
        });

        Self {
            config_path,
            settings: RecorderSettings::default(),
        }
    }

    fn to_json(&self) -> Result<serde_json::Value, SettingsError> {
        serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })
    }
}

/// Rejects settings the layout and capture loops cannot work with.
pub fn validate(settings: &RecorderSettings) -> Result<(), SettingsError> {
    let page = &settings.page;
    if page.font_size <= 0.0 {
        return Err(SettingsError::InvalidValue("page.font_size must be positive".to_string()));
    }
    if page.line_height_factor <= 0.0 {
        return Err(SettingsError::InvalidValue(
            "page.line_height_factor must be positive".to_string(),
        ));
    }
    for (name, value) in [
        ("page.margin", page.margin),
        ("page.padding", page.padding),
        ("page.image_max_height", page.image_max_height),
    ] {
        if value < 0.0 {
            return Err(SettingsError::InvalidValue(format!("{} cannot be negative", name)));
        }
    }
    if page.content_width() <= 0.0 || page.height <= 2.0 * page.margin + page.line_height() {
        return Err(SettingsError::InvalidValue(
            "page margins leave no room for content".to_string(),
        ));
    }
    if settings.timing.screenshot_interval_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "timing.screenshot_interval_ms must be positive".to_string(),
        ));
    }
    if settings.export.base_name.trim().is_empty() {
        return Err(SettingsError::InvalidValue("export.base_name cannot be empty".to_string()));
    }
    Ok(())
}

fn split_key(key: &str) -> Result<Vec<&str>, SettingsError> {
    let parts: Vec<&str> = key.split('.').collect();
    if key.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return Err(SettingsError::InvalidKey(format!("Malformed key '{}'", key)));
    }
    Ok(parts)
}

impl SettingsEngineTrait for SettingsEngine {
    /// Missing file yields defaults; a malformed one is a serialization error.
    fn load(&mut self) -> Result<RecorderSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!(path = %self.config_path, "no settings file, using defaults");
            self.settings = RecorderSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: RecorderSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        validate(&settings)?;

        info!(path = %self.config_path, "settings loaded");
        self.settings = settings;
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Reads one value by dotted path, e.g. `"page.margin"`.
    fn get_value(&self, key: &str) -> Result<serde_json::Value, SettingsError> {
        let parts = split_key(key)?;
        let json = self.to_json()?;
        let mut current = &json;
        for part in parts {
            current = current
                .get(part)
                .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;
        }
        Ok(current.clone())
    }

    /// Updates one value by dotted path, validates the result, then saves.
    /// The host pushes the result into its running services afterwards.
    ///
    /// - `"timing.screenshot_interval_ms"` updates the capture period
    /// - `"export.base_name"` updates the download file stem
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let parts = split_key(key)?;
        let mut json_value = self.to_json()?;

        {
            let (last, parents) = match parts.split_last() {
                Some(split) => split,
                None => return Err(SettingsError::InvalidKey("Key cannot be empty".to_string())),
            };
            let mut current = &mut json_value;
            for part in parents {
                current = current.get_mut(*part).ok_or_else(|| {
                    SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))
                })?;
            }
            match current {
                serde_json::Value::Object(map) if map.contains_key(*last) => {
                    map.insert(last.to_string(), value);
                }
                serde_json::Value::Object(_) => {
                    return Err(SettingsError::InvalidKey(format!(
                        "Key '{}' not found in settings",
                        key
                    )));
                }
                _ => {
                    return Err(SettingsError::InvalidKey(format!(
                        "Cannot navigate to key '{}': intermediate value is not an object",
                        key
                    )));
                }
            }
        }

        let new_settings: RecorderSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&new_settings)?;

        self.settings = new_settings;
        debug!(key, "setting updated");
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = RecorderSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
