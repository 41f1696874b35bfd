// src/lib.rs

//! A reconciling window state machine over native windowing systems.
//!
//! One [`window::Window`] tracks the visibility, display mode, geometry,
//! and input focus of a single native window. Application commands go
//! down through a [`platform::PlatformBackend`]; what the windowing
//! system actually did comes back asynchronously as
//! [`platform::Notification`]s and is reconciled into the model, which
//! then informs observers through the [`events`] dispatcher: exactly one
//! event per real change, in a stable order, with window-manager noise
//! deduplicated and coalesced away.
//!
//! An X11 backend is built in on Linux; [`platform::PlatformBackend`] is
//! the seam for anything else.

pub mod config;
pub mod events;
pub mod geometry;
pub mod platform;
pub mod window;

pub use config::WindowConfig;
pub use events::{EventKind, Subscription};
pub use geometry::{Position, Size};
pub use platform::{NativeHandle, Notification, PlatformBackend};
pub use window::{Window, WindowState};
