// src/config.rs

//! Configuration structures for initial window setup.
//!
//! A [`WindowConfig`] can be deserialized from a JSON file and fed to
//! [`crate::window::Window::with_config`]. Every field has a sensible
//! default, so a partial file (or none at all) always yields a usable
//! configuration.

use crate::geometry::{Position, Size};
use crate::window::WindowState;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initial properties of a window.
///
/// The window is always created hidden; `position` and `state` are queued
/// and take effect on the first `show`, like any command issued while
/// hidden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WindowConfig {
    /// Title handed to the windowing system at creation.
    pub title: String,
    /// Initial client-area size.
    pub size: Size,
    /// Initial position; `None` lets the window manager place the window.
    pub position: Option<Position>,
    /// Display mode to enter on the first show.
    pub state: WindowState,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "core-window".to_string(),
            size: Size::new(800, 600),
            position: None,
            state: WindowState::Normal,
        }
    }
}

impl WindowConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse window configuration")
    }

    /// Loads a configuration file, falling back to the defaults (with a
    /// warning) when the file is missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("ignoring invalid config {}: {:#}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("config {} not readable ({}); using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
