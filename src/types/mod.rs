// Step recorder shared type definitions
// Each submodule defines types used across the page script, popup and background process.

pub mod download;
pub mod errors;
pub mod export;
pub mod layout;
pub mod message;
pub mod page;
pub mod settings;
pub mod step;
pub mod tab_state;
