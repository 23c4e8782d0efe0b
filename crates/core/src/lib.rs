//! Core data model for settle
//!
//! This crate provides:
//! - Folder watch definitions and their transient activity state
//! - The registry of watched folders, keyed by name
//! - The on-disk JSON configuration store

pub mod error;
pub mod folder;
pub mod registry;
pub mod store;

// Re-exports
pub use error::{Error, Result};
pub use folder::{
    render_template, ActivityStamp, FolderSpec, FolderStatus, FolderWatch, PendingDispatch,
    DEFAULT_INACTIVITY_SECS, DEFAULT_MESSAGE_TEMPLATE, DEFAULT_TITLE,
};
pub use registry::Registry;
pub use store::{ConfigStore, LoadedConfig, Settings};
