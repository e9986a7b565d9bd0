// Step recorder paths for Windows
// Config:    %APPDATA%/StepRecorder
// Downloads: %USERPROFILE%/Downloads

use std::env;
use std::path::PathBuf;

pub fn get_config_dir() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("StepRecorder")
}

pub fn get_download_dir() -> PathBuf {
    let profile = env::var("USERPROFILE").unwrap_or_else(|_| String::from("C:\\Users\\Default"));
    PathBuf::from(profile).join("Downloads")
}
