use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level recorder settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecorderSettings {
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub page: PageSettings,
    #[serde(default)]
    pub annotation: AnnotationSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
}

/// Delays, periods and retry budgets. The values were picked empirically and
/// are kept configurable rather than derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingSettings {
    pub screenshot_interval_ms: u64,
    pub sanitize_window_ms: u64,
    /// Consecutive waits before a navigation step is captured.
    pub navigation_settle_ms: Vec<u64>,
    pub ready_delay_ms: u64,
    pub start_retry_delay_ms: u64,
    pub cleanup_suppress_ms: u64,
    pub start_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub probe_retries: u32,
    pub probe_delay_ms: u64,
    pub reload_retry_delay_ms: u64,
    pub start_command_delay_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            screenshot_interval_ms: 550,
            sanitize_window_ms: 5000,
            navigation_settle_ms: vec![300, 80],
            ready_delay_ms: 200,
            start_retry_delay_ms: 300,
            cleanup_suppress_ms: 2000,
            start_delay_ms: 1600,
            request_timeout_ms: 10_000,
            probe_retries: 10,
            probe_delay_ms: 100,
            reload_retry_delay_ms: 700,
            start_command_delay_ms: 100,
        }
    }
}

impl TimingSettings {
    pub fn screenshot_interval(&self) -> Duration {
        Duration::from_millis(self.screenshot_interval_ms)
    }

    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }

    pub fn start_retry_delay(&self) -> Duration {
        Duration::from_millis(self.start_retry_delay_ms)
    }

    pub fn cleanup_suppress(&self) -> Duration {
        Duration::from_millis(self.cleanup_suppress_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn reload_retry_delay(&self) -> Duration {
        Duration::from_millis(self.reload_retry_delay_ms)
    }

    pub fn start_command_delay(&self) -> Duration {
        Duration::from_millis(self.start_command_delay_ms)
    }
}

/// Page geometry and typography of the paged export, in PDF points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageSettings {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub image_max_height: f64,
    pub font_size: f64,
    pub line_height_factor: f64,
    pub padding: f64,
    pub border_gray: f64,
    pub border_width: f64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin: 40.0,
            image_max_height: 400.0,
            font_size: 12.0,
            line_height_factor: 1.2,
            padding: 32.0,
            border_gray: 0.8,
            border_width: 1.0,
        }
    }
}

impl PageSettings {
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn line_height(&self) -> f64 {
        self.line_height_factor * self.font_size
    }

    /// Tallest image that still leaves room for one text line on a fresh page.
    pub fn usable_image_height(&self) -> f64 {
        let room = self.height - 2.0 * self.margin - self.line_height() - self.padding;
        self.image_max_height.min(room).max(0.0)
    }
}

/// Colors and geometry of the highlight rectangle and pointer arrow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnotationSettings {
    pub highlight_color: String,
    pub highlight_width: f64,
    pub arrow_color: String,
    pub arrow_width: f64,
    pub arrow_head_length: f64,
    pub arrow_head_angle: f64,
    pub arrow_offset_x: f64,
    pub arrow_offset_y: f64,
    pub navigation_strip_height: f64,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            highlight_color: "#ff0000".to_string(),
            highlight_width: 8.0,
            arrow_color: "#006400".to_string(),
            arrow_width: 9.0,
            arrow_head_length: 22.0,
            arrow_head_angle: std::f64::consts::PI / 7.0,
            arrow_offset_x: -80.0,
            arrow_offset_y: 120.0,
            navigation_strip_height: 60.0,
        }
    }
}

/// Naming and destination of exported documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    pub base_name: String,
    pub document_title: String,
    pub download_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            base_name: "recorded_steps".to_string(),
            document_title: "Recorded Steps".to_string(),
            download_dir: None,
        }
    }
}

/// Where the host reads visible-tab captures from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CaptureSettings {
    pub source_path: Option<PathBuf>,
}
