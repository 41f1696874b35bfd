// src/window/mod.rs

//! The portable window model.
//!
//! [`Window`] tracks one native window: its display mode, visibility,
//! focus, and geometry. It sits between application commands (`show`,
//! `set_state`, ...) and the asynchronous notifications a
//! [`PlatformBackend`] delivers about what the windowing system actually
//! did. Geometry is never taken from a request; it is reconciled from
//! notifications, because a window manager is free to ignore or modify
//! anything it is asked for.


use crate::config::WindowConfig;
use crate::events::{EventDispatcher, Subscription};
use crate::geometry::{Position, Size};
use crate::platform::{NativeHandle, Notification, PlatformBackend};

use anyhow::{Context, Result};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

/// Display mode of a window.
///
/// Exactly one mode holds at a time. The mode is sticky across `hide`:
/// a window hidden while fullscreen is still fullscreen when shown again.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    #[default]
    Normal,
    Fullscreen,
    Maximized,
    Iconified,
}

/// Commands issued while the window is hidden, replayed on `show`.
///
/// Only the last value per slot is kept; replay order is fixed
/// (state, then position, then size) regardless of issue order.
#[derive(Debug, Default, Clone, Copy)]
struct PendingCommands {
    state: Option<WindowState>,
    position: Option<Position>,
    size: Option<Size>,
}

/// A single native window and its reconciled model state.
pub struct Window {
    backend: Box<dyn PlatformBackend>,
    handle: NativeHandle,
    title: String,

    state: WindowState,
    visible: bool,
    focused: bool,
    size: Size,
    position: Position,

    // Geometry of the last Normal-mode configuration, restored when the
    // window returns to Normal from fullscreen/maximized/iconified.
    restore_size: Size,
    restore_position: Position,

    // Last geometry announced to subscribers; `None` until the first
    // announcement. Reconciliation emits at most one resize and one move
    // per batch, and only when the final value differs from these.
    observed_size: Option<Size>,
    observed_position: Option<Position>,

    pending: PendingCommands,
    events: EventDispatcher,
}

impl Window {
    /// Creates a hidden window with the given title and client-area size.
    pub fn new(
        mut backend: Box<dyn PlatformBackend>,
        title: &str,
        size: Size,
    ) -> Result<Self> {
        let handle = backend
            .create(title, size)
            .with_context(|| format!("failed to create native window '{}'", title))?;
        info!("created window '{}' at {} (handle {:?})", title, size, handle);
        Ok(Self {
            backend,
            handle,
            title: title.to_string(),
            state: WindowState::Normal,
            visible: false,
            focused: false,
            size,
            position: Position::default(),
            restore_size: size,
            restore_position: Position::default(),
            observed_size: None,
            observed_position: None,
            pending: PendingCommands::default(),
            events: EventDispatcher::new(),
        })
    }

    /// Creates a hidden window from a [`WindowConfig`]; position and
    /// non-Normal state are queued and take effect on the first `show`.
    pub fn with_config(backend: Box<dyn PlatformBackend>, config: &WindowConfig) -> Result<Self> {
        let mut window = Self::new(backend, &config.title, config.size)?;
        if let Some(position) = config.position {
            window.set_position(position);
        }
        if config.state != WindowState::Normal {
            window.set_state(config.state);
        }
        Ok(window)
    }

    // --- Queries ---

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Whether the window is mapped on screen. An iconified window counts
    /// as visible: it still occupies a taskbar entry and can be restored
    /// by the user without the application's involvement.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Client-area size as last reported by the windowing system.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Top-left position as last reported by the windowing system.
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    // --- Subscriptions ---

    pub fn on_show(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        self.events.subscribe_show(callback)
    }

    pub fn on_hide(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        self.events.subscribe_hide(callback)
    }

    pub fn on_resize(&self, callback: impl Fn(&Window, Size) + 'static) -> Subscription {
        self.events.subscribe_resize(callback)
    }

    pub fn on_move(&self, callback: impl Fn(&Window, Position) + 'static) -> Subscription {
        self.events.subscribe_move(callback)
    }

    pub fn on_focus(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        self.events.subscribe_focus(callback)
    }

    pub fn on_lost_focus(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        self.events.subscribe_lost_focus(callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.events.unsubscribe(subscription)
    }

    // --- Commands ---

    /// Maps the window onto the screen and gives it focus.
    ///
    /// Commands queued while hidden are replayed first (state, position,
    /// size). Showing an already-visible window is a no-op unless it is
    /// iconified, in which case it is de-iconified instead.
    pub fn show(&mut self) {
        if self.visible {
            if self.state == WindowState::Iconified {
                debug!("show on iconified window '{}': de-iconifying", self.title);
                self.backend.request_state(self.handle, WindowState::Normal);
                self.process_events();
            }
            return;
        }

        let pending = std::mem::take(&mut self.pending);
        if let Some(state) = pending.state {
            if self.state == WindowState::Normal && state != WindowState::Normal {
                self.restore_size = self.size;
                self.restore_position = self.position;
            }
            self.backend.request_state(self.handle, state);
            if state == WindowState::Normal && self.state != WindowState::Normal {
                self.backend.request_position(self.handle, self.restore_position);
                self.backend.request_size(self.handle, self.restore_size);
                self.position = self.restore_position;
                self.size = self.restore_size;
            }
            self.state = state;
        }
        if let Some(position) = pending.position {
            self.backend.request_position(self.handle, position);
            self.position = position;
        }
        if let Some(size) = pending.size {
            self.backend.request_size(self.handle, size);
            self.size = size;
        }

        info!("showing window '{}' as {:?}", self.title, self.state);
        self.backend.show(self.handle);
        self.visible = true;
        self.events.emit_show(self);

        // Focus is claimed before draining so the backend's own
        // FocusGained report does not fire a second on_focus; ordering
        // demands that focus is announced after geometry.
        self.focused = true;
        self.process_events();
        self.events.emit_focus(self);
    }

    /// Unmaps the window. The display mode is kept; hiding a maximized
    /// window and showing it again yields a maximized window.
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        info!("hiding window '{}'", self.title);
        self.backend.hide(self.handle);
        self.drop_focus();
        self.visible = false;
        self.events.emit_hide(self);
        self.process_events();
    }

    /// Switches the window to another display mode.
    ///
    /// Requesting the current mode is a no-op and fires no events. While
    /// hidden the request is queued for the next `show`. Returning to
    /// `Normal` restores the geometry of the last Normal-mode
    /// configuration.
    pub fn set_state(&mut self, state: WindowState) {
        if !self.visible {
            debug!("queueing state {:?} for hidden window '{}'", state, self.title);
            self.pending.state = Some(state);
            return;
        }
        if state == self.state {
            return;
        }
        let old = self.state;
        debug!("window '{}': {:?} -> {:?}", self.title, old, state);

        if old == WindowState::Normal {
            self.restore_size = self.size;
            self.restore_position = self.position;
        }

        self.backend.request_state(self.handle, state);
        if state == WindowState::Normal {
            self.backend.request_position(self.handle, self.restore_position);
            self.backend.request_size(self.handle, self.restore_size);
        }
        self.state = state;

        if state == WindowState::Iconified {
            self.drop_focus();
        } else if old == WindowState::Iconified {
            self.gain_focus();
        }

        self.process_events();
    }

    /// Asks the windowing system to move the window. While hidden the
    /// position is queued for the next `show`; while visible the model
    /// only updates once the move is reported back.
    pub fn set_position(&mut self, position: Position) {
        if !self.visible {
            self.pending.position = Some(position);
            return;
        }
        self.backend.request_position(self.handle, position);
        self.process_events();
    }

    /// Asks the windowing system to resize the client area. Same queueing
    /// and reconciliation rules as [`Window::set_position`].
    pub fn set_size(&mut self, size: Size) {
        if !self.visible {
            self.pending.size = Some(size);
            return;
        }
        self.backend.request_size(self.handle, size);
        self.process_events();
    }

    /// Drains pending backend notifications and reconciles them into the
    /// model, emitting observer events for real changes.
    ///
    /// Commands call this internally; applications embedding the window
    /// in an event loop call it whenever the native connection is
    /// readable, so user-initiated changes (drags, taskbar clicks) are
    /// picked up too.
    pub fn process_events(&mut self) {
        let batch = self.backend.poll_notifications(self.handle);
        for notification in batch {
            self.apply_notification(notification);
        }
        self.flush_geometry_events();
    }

    // --- Reconciliation ---

    fn apply_notification(&mut self, notification: Notification) {
        trace!("window '{}': {:?}", self.title, notification);
        match notification {
            Notification::Shown => self.notify_shown(),
            Notification::Hidden => self.notify_hidden(),
            Notification::Resized(size) => self.notify_resized(size),
            Notification::Moved(position) => self.notify_moved(position),
            Notification::FocusGained => self.gain_focus(),
            Notification::FocusLost => self.drop_focus(),
            Notification::StateChanged(state) => self.notify_state_changed(state),
        }
    }

    fn notify_shown(&mut self) {
        if !self.visible {
            self.visible = true;
            self.events.emit_show(self);
        }
    }

    fn notify_hidden(&mut self) {
        if self.visible {
            self.drop_focus();
            self.visible = false;
            self.events.emit_hide(self);
        }
    }

    fn notify_resized(&mut self, size: Size) {
        self.size = size;
        if self.state == WindowState::Normal && self.visible {
            self.restore_size = size;
        }
    }

    fn notify_moved(&mut self, position: Position) {
        self.position = position;
        if self.state == WindowState::Normal && self.visible {
            self.restore_position = position;
        }
    }

    /// Handles a mode change the windowing system reports, whether as the
    /// acknowledgement of our own request (already reflected in
    /// `self.state`, hence the dedup) or as a user-initiated change.
    fn notify_state_changed(&mut self, state: WindowState) {
        if state == self.state {
            return;
        }
        let old = self.state;
        debug!(
            "window '{}': system changed state {:?} -> {:?}",
            self.title, old, state
        );
        if old == WindowState::Normal && self.visible {
            self.restore_size = self.size;
            self.restore_position = self.position;
        }
        self.state = state;
        if state == WindowState::Iconified {
            self.drop_focus();
        } else if old == WindowState::Iconified {
            self.gain_focus();
        }
    }

    fn gain_focus(&mut self) {
        if self.visible && !self.focused {
            self.focused = true;
            self.events.emit_focus(self);
        }
    }

    fn drop_focus(&mut self) {
        if self.focused {
            self.focused = false;
            self.events.emit_lost_focus(self);
        }
    }

    /// Announces geometry changes accumulated during reconciliation: at
    /// most one resize and one move per batch, and only when the final
    /// value differs from what subscribers last saw. Intermediate values
    /// a converging window manager reported are coalesced away.
    fn flush_geometry_events(&mut self) {
        if !self.visible {
            return;
        }
        if self.observed_size != Some(self.size) {
            let size = self.size;
            debug!("window '{}' resized to {}", self.title, size);
            self.observed_size = Some(size);
            self.events.emit_resize(self, size);
        }
        if self.observed_position != Some(self.position) {
            let position = self.position;
            debug!("window '{}' moved to {}", self.title, position);
            self.observed_position = Some(position);
            self.events.emit_move(self, position);
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        debug!("destroying window '{}'", self.title);
        self.backend.destroy(self.handle);
    }
}
