// src/platform/mod.rs

//! Platform abstraction for native windowing systems.
//!
//! The [`PlatformBackend`] trait is the seam between the portable window
//! model in [`crate::window`] and whatever native API actually owns the
//! window. Backends are deliberately dumb: they forward requests to the
//! windowing system and report back what the system actually did as
//! [`Notification`]s. They never decide window semantics themselves; the
//! model reconciles requests against notifications and owns all bookkeeping.

#[cfg(test)]
pub mod mock;

#[cfg(target_os = "linux")]
pub mod x11;

use crate::geometry::{Position, Size};
use crate::window::WindowState;

use anyhow::Result;

/// Opaque identifier for a native window owned by a backend.
///
/// On X11 this is the `xlib::Window` id; the mock backend hands out
/// sequential ids. The model treats it as a token and never inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// A state change reported by the windowing system.
///
/// Notifications describe what *happened*, not what was asked for. A
/// window manager is free to ignore, delay, or modify any request, and
/// may change a window spontaneously (user drags, `wmctrl`, taskbar
/// clicks), so the model treats these as the only source of truth for
/// geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The window became viewable on screen.
    Shown,
    /// The window was unmapped from the screen.
    Hidden,
    /// The window's client area is now this size.
    Resized(Size),
    /// The window's top-left corner is now at this position.
    Moved(Position),
    /// The window received keyboard focus.
    FocusGained,
    /// The window lost keyboard focus.
    FocusLost,
    /// The window manager put the window into this display mode.
    StateChanged(WindowState),
}

/// Interface every native windowing backend implements.
///
/// All request methods are fire-and-forget: they submit the request to the
/// windowing system and return. Outcomes arrive later through
/// [`PlatformBackend::poll_notifications`], which the window model drains
/// after each command it issues.
pub trait PlatformBackend {
    /// Creates a native window with the given title and client-area size.
    /// The window starts hidden; nothing appears on screen until
    /// [`PlatformBackend::show`] is called.
    fn create(&mut self, title: &str, size: Size) -> Result<NativeHandle>;

    /// Destroys the native window and releases its resources. The handle
    /// is invalid afterwards.
    fn destroy(&mut self, handle: NativeHandle);

    /// Asks the windowing system to map the window onto the screen.
    fn show(&mut self, handle: NativeHandle);

    /// Asks the windowing system to unmap the window from the screen.
    fn hide(&mut self, handle: NativeHandle);

    /// Asks the windowing system to put the window into the given display
    /// mode. The mode actually reached arrives later as
    /// [`Notification::StateChanged`].
    fn request_state(&mut self, handle: NativeHandle, state: WindowState);

    /// Asks the windowing system to move the window.
    fn request_position(&mut self, handle: NativeHandle, position: Position);

    /// Asks the windowing system to resize the window's client area.
    fn request_size(&mut self, handle: NativeHandle, size: Size);

    /// Drains every notification the windowing system has produced for
    /// this window since the last call, in the order they occurred.
    fn poll_notifications(&mut self, handle: NativeHandle) -> Vec<Notification>;
}
