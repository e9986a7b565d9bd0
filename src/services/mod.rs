// Step recorder services
// Services hold behaviour: capture, observation, editing, layout, rendering, export and settings.

pub mod annotator;
pub mod editor_session;
pub mod event_observer;
pub mod exporter;
pub mod layout_engine;
pub mod markup_renderer;
pub mod messaging;
pub mod pdf_renderer;
pub mod popup_controller;
pub mod screenshot_cache;
pub mod settings_engine;
pub mod text_metrics;
