// Step recorder state managers
// Managers own stateful stores: per-tab recording state and saved downloads.

pub mod download_manager;
pub mod tab_state_manager;
