//! Step recorder: records on-page interactions as annotated screenshot steps
//! and exports them as PDF, HTML or Word documents.
//!
//! This library crate exposes all modules for use by the host binary and integration tests.

pub mod app;
pub mod background;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
