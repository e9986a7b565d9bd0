//! App Core for the step recorder host.
//!
//! Wires settings, the download manager and the background service together.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::background::{BackgroundService, ImageFileCapturer, ScreenCapturer, UnavailableCapturer};
use crate::managers::download_manager::DownloadManager;
use crate::platform;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::settings::RecorderSettings;

pub struct App {
    pub settings_engine: SettingsEngine,
    pub downloads: Arc<Mutex<DownloadManager>>,
    pub background: Arc<BackgroundService>,
}

impl App {
    /// Loads settings from `settings_path` (or the platform default) and
    /// builds the services. A broken settings file falls back to defaults.
    pub fn new(settings_path: Option<String>) -> Self {
        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            warn!(path = settings_engine.get_config_path(), error = %e, "settings not loaded, using defaults");
        }
        Self::with_engine(settings_engine)
    }

    /// Builds the services from whatever `settings_engine` currently holds.
    pub fn with_engine(settings_engine: SettingsEngine) -> Self {
        let settings = settings_engine.get_settings().clone();

        let downloads = Arc::new(Mutex::new(DownloadManager::new(download_dir(&settings))));
        let background = Arc::new(BackgroundService::new(&settings, capturer(&settings), downloads.clone()));
        info!(config = settings_engine.get_config_path(), "step recorder host initialized");

        Self {
            settings_engine,
            downloads,
            background,
        }
    }

    pub fn settings(&self) -> &RecorderSettings {
        self.settings_engine.get_settings()
    }

    /// Pushes the engine's current settings into the running services.
    /// Recorded tab state and the download history survive.
    pub fn apply_settings(&self) -> Result<(), String> {
        let settings = self.settings_engine.get_settings();
        self.downloads
            .lock()
            .map_err(|e| e.to_string())?
            .set_download_dir(download_dir(settings));
        self.background.apply_settings(settings, capturer(settings));
        info!("settings applied");
        Ok(())
    }
}

fn download_dir(settings: &RecorderSettings) -> PathBuf {
    settings
        .export
        .download_dir
        .clone()
        .unwrap_or_else(platform::get_download_dir)
}

fn capturer(settings: &RecorderSettings) -> Arc<dyn ScreenCapturer> {
    match &settings.capture.source_path {
        Some(path) => Arc::new(ImageFileCapturer::new(path.clone())),
        None => Arc::new(UnavailableCapturer),
    }
}
