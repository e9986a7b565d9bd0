//! RPC method handler for the step recorder host protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! Message-contract methods are named after their wire actions
//! (`GET_TAB_STATE`, `SET_TAB_STATE`, ...) and take the same camelCase fields.

use std::sync::Mutex;

use serde_json::{json, Map, Value};

use crate::app::App;
use crate::managers::download_manager::DownloadManagerTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::message::{BackgroundRequest, TabLoadStatus};
use crate::types::tab_state::TabId;

fn tab_param(params: &Value, key: &str) -> Option<TabId> {
    params.get(key).and_then(|v| v.as_i64()).map(TabId)
}

/// Builds a [`BackgroundRequest`] from a wire action and its params.
///
/// The older per-format export actions map onto `GENERATE_DOCUMENT`.
pub fn parse_request(method: &str, params: &Value) -> Result<BackgroundRequest, String> {
    let mut fields = match params {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => return Err("params must be an object".to_string()),
    };
    fields.remove("senderTabId");

    let action = match method {
        "GENERATE_PDF" => {
            fields.insert("kind".to_string(), json!("pdf"));
            "GENERATE_DOCUMENT"
        }
        "GENERATE_HTML" => {
            fields.insert("kind".to_string(), json!("html"));
            "GENERATE_DOCUMENT"
        }
        "GENERATE_WORD" => {
            fields.insert("kind".to_string(), json!("word"));
            "GENERATE_DOCUMENT"
        }
        other => other,
    };
    fields.insert("action".to_string(), json!(action));

    serde_json::from_value(Value::Object(fields)).map_err(|e| format!("invalid {} request: {}", method, e))
}

/// Dispatch a method call to the background service or the settings engine.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Tab lifecycle ───
        "tab.updated" => {
            let tab_id = tab_param(params, "tabId").ok_or("missing tabId")?;
            let status: TabLoadStatus = params
                .get("status")
                .cloned()
                .ok_or("missing status")
                .and_then(|v| serde_json::from_value(v).map_err(|_| "invalid status"))?;
            let url = params.get("url").and_then(|v| v.as_str()).map(str::to_string);
            let background = app.lock().map_err(|e| e.to_string())?.background.clone();
            let command = background.on_tab_updated(tab_id, status, url);
            Ok(json!({"command": command}))
        }
        "tab.removed" => {
            let tab_id = tab_param(params, "tabId").ok_or("missing tabId")?;
            let background = app.lock().map_err(|e| e.to_string())?.background.clone();
            Ok(json!({"removed": background.on_tab_removed(tab_id)}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            match params.get("key").and_then(|v| v.as_str()) {
                Some(key) => a.settings_engine.get_value(key).map_err(|e| e.to_string()),
                None => serde_json::to_value(a.settings()).map_err(|e| e.to_string()),
            }
        }
        "settings.set" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            a.apply_settings()?;
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.reset().map_err(|e| e.to_string())?;
            a.apply_settings()?;
            Ok(json!({"ok": true}))
        }

        // ─── Downloads ───
        "downloads.list" => {
            let downloads = app.lock().map_err(|e| e.to_string())?.downloads.clone();
            let manager = downloads.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(manager.list_downloads()).map_err(|e| e.to_string())
        }

        // ─── Message contract ───
        _ if method.chars().all(|c| c.is_ascii_uppercase() || c == '_') && !method.is_empty() => {
            let request = parse_request(method, params)?;
            let sender = tab_param(params, "senderTabId");
            let background = app.lock().map_err(|e| e.to_string())?.background.clone();
            let response = background.handle(sender, request);
            serde_json::to_value(response).map_err(|e| e.to_string())
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
