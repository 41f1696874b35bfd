// src/platform/x11/mod.rs

//! X11 implementation of [`PlatformBackend`].
//!
//! Display modes are driven through EWMH: `_NET_WM_STATE` client
//! messages for fullscreen and maximized, `XIconifyWindow` for
//! iconification. What the window manager actually did comes back as
//! `PropertyNotify` on `_NET_WM_STATE` and `ConfigureNotify` events,
//! which [`X11Backend::poll_notifications`] translates into the portable
//! [`Notification`] stream.

mod connection;
mod event;

pub use connection::Connection;
pub use event::{state_from_net_wm, NetWmState};

use crate::geometry::{Position, Size};
use crate::platform::{NativeHandle, Notification, PlatformBackend};
use crate::window::WindowState;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::ffi::CString;
use std::mem;

use libc::{c_char, c_int, c_long, c_uint};
use x11::xlib;

// Source indication in `_NET_WM_STATE` client messages: 1 = normal
// application request.
const MESSAGE_SOURCE_APPLICATION: c_long = 1;

/// Backend speaking Xlib to one X server connection.
///
/// Several windows can live on one backend; events are routed to
/// per-window queues so each [`NativeHandle`] only sees its own.
pub struct X11Backend {
    connection: Connection,
    windows: HashSet<xlib::Window>,
    pending: HashMap<xlib::Window, Vec<Notification>>,
}

impl X11Backend {
    /// Connects to the X server named by `DISPLAY`.
    pub fn new() -> Result<Self> {
        let connection = Connection::new().context("X11 backend initialization failed")?;
        Ok(Self {
            connection,
            windows: HashSet::new(),
            pending: HashMap::new(),
        })
    }

    /// File descriptor to poll for readability before calling
    /// [`PlatformBackend::poll_notifications`] from an event loop.
    pub fn event_fd(&self) -> std::os::unix::io::RawFd {
        self.connection.event_fd()
    }

    fn send_net_wm_state(
        &self,
        window: xlib::Window,
        action: c_long,
        first: xlib::Atom,
        second: xlib::Atom,
    ) {
        let atoms = self.connection.atoms();
        // SAFETY: an all-zero XClientMessageEvent is a valid starting
        // point; every field the server reads is filled in below.
        let mut message: xlib::XClientMessageEvent = unsafe { mem::zeroed() };
        message.type_ = xlib::ClientMessage;
        message.display = self.connection.display();
        message.window = window;
        message.message_type = atoms.net_wm_state;
        message.format = 32;
        message.data.set_long(0, action);
        message.data.set_long(1, first as c_long);
        message.data.set_long(2, second as c_long);
        message.data.set_long(3, MESSAGE_SOURCE_APPLICATION);

        // _NET_WM_STATE messages go to the root window so the window
        // manager, not the client, receives them.
        let mask = xlib::SubstructureNotifyMask | xlib::SubstructureRedirectMask;
        // SAFETY: display and root are valid for this connection; the
        // event pointer is a live local.
        let status = unsafe {
            xlib::XSendEvent(
                self.connection.display(),
                self.connection.root(),
                xlib::False,
                mask,
                &mut xlib::XEvent {
                    client_message: message,
                },
            )
        };
        if status == 0 {
            warn!("XSendEvent for _NET_WM_STATE on 0x{:x} failed", window);
        }
    }

    fn drain_server_events(&mut self) {
        let display = self.connection.display();
        // SAFETY: XPending and XNextEvent are safe on a valid display;
        // the loop condition guarantees XNextEvent will not block.
        while unsafe { xlib::XPending(display) } > 0 {
            let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
            unsafe { xlib::XNextEvent(display, &mut xevent) };
            if let Some((window, notifications)) = event::translate(&self.connection, &xevent) {
                if self.windows.contains(&window) {
                    self.pending.entry(window).or_default().extend(notifications);
                } else {
                    trace!("dropping event for unknown window 0x{:x}", window);
                }
            }
        }
    }
}

impl PlatformBackend for X11Backend {
    fn create(&mut self, title: &str, size: Size) -> Result<NativeHandle> {
        let display = self.connection.display();
        let screen = self.connection.screen();
        let root = self.connection.root();
        let atoms = *self.connection.atoms();

        // SAFETY: Xlib FFI over a valid connection; `attributes` lives
        // until XCreateWindow returns.
        let window = unsafe {
            let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
            attributes.background_pixel = xlib::XBlackPixel(display, screen);
            attributes.border_pixel = xlib::XBlackPixel(display, screen);
            attributes.event_mask =
                xlib::StructureNotifyMask | xlib::FocusChangeMask | xlib::PropertyChangeMask;

            xlib::XCreateWindow(
                display,
                root,
                0,
                0,
                size.width as c_uint,
                size.height as c_uint,
                0,                                    // border width
                xlib::XDefaultDepth(display, screen),
                xlib::InputOutput as c_uint,
                xlib::XDefaultVisual(display, screen),
                xlib::CWBackPixel | xlib::CWBorderPixel | xlib::CWEventMask,
                &mut attributes,
            )
        };
        if window == 0 {
            return Err(anyhow!("XCreateWindow failed"));
        }

        let title_cstr = CString::new(title).context("window title contains NUL")?;
        // SAFETY: `window` was just created on this display and
        // `title_cstr` outlives every call that reads it.
        unsafe {
            xlib::XStoreName(display, window, title_cstr.as_ptr() as *mut c_char);
            // Modern window managers prefer the UTF-8 title property.
            xlib::XChangeProperty(
                display,
                window,
                atoms.net_wm_name,
                atoms.utf8_string,
                8,
                xlib::PropModeReplace,
                title_cstr.as_ptr() as *const u8,
                title.len() as c_int,
            );
            xlib::XSetWMProtocols(display, window, [atoms.wm_delete_window].as_mut_ptr(), 1);
        }
        self.connection.flush();

        info!("created X11 window 0x{:x} ('{}', {})", window, title, size);
        self.windows.insert(window);
        Ok(NativeHandle(window as u64))
    }

    fn destroy(&mut self, handle: NativeHandle) {
        let window = handle.0 as xlib::Window;
        if !self.windows.remove(&window) {
            warn!("destroy for unknown window 0x{:x}", window);
            return;
        }
        self.pending.remove(&window);
        debug!("destroying X11 window 0x{:x}", window);
        // SAFETY: `window` belongs to this connection and is destroyed
        // exactly once.
        unsafe {
            xlib::XDestroyWindow(self.connection.display(), window);
        }
        self.connection.flush();
    }

    fn show(&mut self, handle: NativeHandle) {
        // SAFETY: MapRaised on a window of this connection.
        unsafe {
            xlib::XMapRaised(self.connection.display(), handle.0 as xlib::Window);
        }
        self.connection.flush();
    }

    fn hide(&mut self, handle: NativeHandle) {
        // Withdraw rather than plain unmap so the window manager also
        // forgets taskbar entries and iconified placeholders.
        // SAFETY: valid display, window, and screen.
        unsafe {
            xlib::XWithdrawWindow(
                self.connection.display(),
                handle.0 as xlib::Window,
                self.connection.screen(),
            );
        }
        self.connection.flush();
    }

    fn request_state(&mut self, handle: NativeHandle, state: WindowState) {
        let window = handle.0 as xlib::Window;
        let atoms = *self.connection.atoms();
        debug!("requesting {:?} for X11 window 0x{:x}", state, window);
        match state {
            WindowState::Normal => {
                self.send_net_wm_state(
                    window,
                    event::NET_WM_STATE_REMOVE,
                    atoms.net_wm_state_fullscreen,
                    0,
                );
                self.send_net_wm_state(
                    window,
                    event::NET_WM_STATE_REMOVE,
                    atoms.net_wm_state_maximized_horz,
                    atoms.net_wm_state_maximized_vert,
                );
                // Mapping an iconified window asks the manager to
                // restore it.
                // SAFETY: valid display and window.
                unsafe {
                    xlib::XMapWindow(self.connection.display(), window);
                }
            }
            WindowState::Fullscreen => {
                self.send_net_wm_state(
                    window,
                    event::NET_WM_STATE_REMOVE,
                    atoms.net_wm_state_maximized_horz,
                    atoms.net_wm_state_maximized_vert,
                );
                self.send_net_wm_state(
                    window,
                    event::NET_WM_STATE_ADD,
                    atoms.net_wm_state_fullscreen,
                    0,
                );
            }
            WindowState::Maximized => {
                self.send_net_wm_state(
                    window,
                    event::NET_WM_STATE_REMOVE,
                    atoms.net_wm_state_fullscreen,
                    0,
                );
                self.send_net_wm_state(
                    window,
                    event::NET_WM_STATE_ADD,
                    atoms.net_wm_state_maximized_horz,
                    atoms.net_wm_state_maximized_vert,
                );
            }
            WindowState::Iconified => {
                // SAFETY: valid display, window, and screen.
                let status = unsafe {
                    xlib::XIconifyWindow(
                        self.connection.display(),
                        window,
                        self.connection.screen(),
                    )
                };
                if status == 0 {
                    warn!("XIconifyWindow failed for 0x{:x}", window);
                }
            }
        }
        self.connection.flush();
    }

    fn request_position(&mut self, handle: NativeHandle, position: Position) {
        // SAFETY: valid display and window.
        unsafe {
            xlib::XMoveWindow(
                self.connection.display(),
                handle.0 as xlib::Window,
                position.x,
                position.y,
            );
        }
        self.connection.flush();
    }

    fn request_size(&mut self, handle: NativeHandle, size: Size) {
        // SAFETY: valid display and window; zero sizes are rejected by
        // the server, not by us.
        unsafe {
            xlib::XResizeWindow(
                self.connection.display(),
                handle.0 as xlib::Window,
                size.width as c_uint,
                size.height as c_uint,
            );
        }
        self.connection.flush();
    }

    fn poll_notifications(&mut self, handle: NativeHandle) -> Vec<Notification> {
        self.drain_server_events();
        self.pending
            .remove(&(handle.0 as xlib::Window))
            .unwrap_or_default()
    }
}
