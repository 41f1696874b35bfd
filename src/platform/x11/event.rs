// src/platform/x11/event.rs

//! Translation of raw `XEvent`s into backend [`Notification`]s.

use super::connection::Connection;
use crate::geometry::{Position, Size};
use crate::platform::Notification;
use crate::window::WindowState;

use bitflags::bitflags;
use log::{debug, trace};
use std::ffi::c_void;
use std::ptr;

use libc::{c_int, c_long, c_ulong};
use x11::xlib;

bitflags! {
    /// `_NET_WM_STATE` atoms relevant to the display mode, as a set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NetWmState: u8 {
        const FULLSCREEN     = 1 << 0;
        const MAXIMIZED_HORZ = 1 << 1;
        const MAXIMIZED_VERT = 1 << 2;
        const HIDDEN         = 1 << 3;
    }
}

impl NetWmState {
    const MAXIMIZED: NetWmState = NetWmState::MAXIMIZED_HORZ.union(NetWmState::MAXIMIZED_VERT);
}

/// Derives the display mode from the `_NET_WM_STATE` set. `HIDDEN` wins
/// over everything (an iconified fullscreen window is iconified), and a
/// window maximized in only one direction does not count as maximized.
pub fn state_from_net_wm(flags: NetWmState) -> WindowState {
    if flags.contains(NetWmState::HIDDEN) {
        WindowState::Iconified
    } else if flags.contains(NetWmState::FULLSCREEN) {
        WindowState::Fullscreen
    } else if flags.contains(NetWmState::MAXIMIZED) {
        WindowState::Maximized
    } else {
        WindowState::Normal
    }
}

/// Translates one `XEvent` into zero or more notifications for the
/// window it targets. Returns the target window id alongside so the
/// backend can route the batch.
pub fn translate(
    connection: &Connection,
    xevent: &xlib::XEvent,
) -> Option<(xlib::Window, Vec<Notification>)> {
    // SAFETY: `type_` is the common discriminant of every XEvent variant;
    // each union field below is only read after the discriminant matched.
    let event_type = unsafe { xevent.type_ };
    match event_type {
        xlib::MapNotify => {
            let event = unsafe { xevent.map };
            trace!("XEvent: MapNotify on 0x{:x}", event.window);
            Some((event.window, vec![Notification::Shown]))
        }
        xlib::UnmapNotify => {
            let event = unsafe { xevent.unmap };
            trace!("XEvent: UnmapNotify on 0x{:x}", event.window);
            Some((event.window, vec![Notification::Hidden]))
        }
        xlib::FocusIn => {
            let event = unsafe { xevent.focus_change };
            Some((event.window, vec![Notification::FocusGained]))
        }
        xlib::FocusOut => {
            let event = unsafe { xevent.focus_change };
            Some((event.window, vec![Notification::FocusLost]))
        }
        xlib::ConfigureNotify => {
            let event = unsafe { xevent.configure };
            let position = configure_position(connection, &event);
            trace!(
                "XEvent: ConfigureNotify on 0x{:x}: {}x{} at {}",
                event.window,
                event.width,
                event.height,
                position
            );
            Some((
                event.window,
                vec![
                    Notification::Resized(Size::new(event.width as u32, event.height as u32)),
                    Notification::Moved(position),
                ],
            ))
        }
        xlib::ClientMessage => {
            let event = unsafe { xevent.client_message };
            if event.message_type == connection.atoms().wm_protocols
                && event.data.as_longs()[0] as xlib::Atom == connection.atoms().wm_delete_window
            {
                // Close requests are the embedding application's concern;
                // the backend only acknowledges having seen one.
                debug!("WM_DELETE_WINDOW for 0x{:x}", event.window);
            }
            None
        }
        xlib::PropertyNotify => {
            let event = unsafe { xevent.property };
            if event.atom == connection.atoms().net_wm_state {
                let flags = read_net_wm_state(connection, event.window);
                let state = state_from_net_wm(flags);
                debug!(
                    "XEvent: _NET_WM_STATE on 0x{:x} -> {:?} ({:?})",
                    event.window, state, flags
                );
                Some((event.window, vec![Notification::StateChanged(state)]))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Root-relative position of a configured window.
///
/// Synthetic ConfigureNotify events carry root coordinates already; real
/// ones are relative to the frame the window manager reparented us into
/// and need translating.
fn configure_position(connection: &Connection, event: &xlib::XConfigureEvent) -> Position {
    if event.send_event != 0 {
        return Position::new(event.x, event.y);
    }
    let mut x: c_int = 0;
    let mut y: c_int = 0;
    let mut child: xlib::Window = 0;
    // SAFETY: display, window, and root are all valid for this
    // connection; the out-pointers point at the locals above.
    let ok = unsafe {
        xlib::XTranslateCoordinates(
            connection.display(),
            event.window,
            connection.root(),
            0,
            0,
            &mut x,
            &mut y,
            &mut child,
        )
    };
    if ok != 0 {
        Position::new(x, y)
    } else {
        Position::new(event.x, event.y)
    }
}

/// Reads the window's `_NET_WM_STATE` property into a [`NetWmState`] set.
/// A missing property means no mode atoms are set, i.e. Normal.
fn read_net_wm_state(connection: &Connection, window: xlib::Window) -> NetWmState {
    let atoms = connection.atoms();
    let mut actual_type: xlib::Atom = 0;
    let mut actual_format: c_int = 0;
    let mut item_count: c_ulong = 0;
    let mut bytes_after: c_ulong = 0;
    let mut data: *mut u8 = ptr::null_mut();

    // SAFETY: all out-pointers are valid locals; on success X allocates
    // `data`, which is released with XFree below before returning.
    let status = unsafe {
        xlib::XGetWindowProperty(
            connection.display(),
            window,
            atoms.net_wm_state,
            0,
            1024,
            xlib::False,
            xlib::XA_ATOM,
            &mut actual_type,
            &mut actual_format,
            &mut item_count,
            &mut bytes_after,
            &mut data,
        )
    };

    let mut flags = NetWmState::empty();
    if status == xlib::Success as c_int && !data.is_null() {
        if actual_type == xlib::XA_ATOM && actual_format == 32 {
            // SAFETY: a 32-bit-format property is delivered as c_ulong
            // items; `item_count` is the element count X reported.
            let items =
                unsafe { std::slice::from_raw_parts(data as *const c_ulong, item_count as usize) };
            for &atom in items {
                if atom == atoms.net_wm_state_fullscreen {
                    flags |= NetWmState::FULLSCREEN;
                } else if atom == atoms.net_wm_state_maximized_horz {
                    flags |= NetWmState::MAXIMIZED_HORZ;
                } else if atom == atoms.net_wm_state_maximized_vert {
                    flags |= NetWmState::MAXIMIZED_VERT;
                } else if atom == atoms.net_wm_state_hidden {
                    flags |= NetWmState::HIDDEN;
                }
            }
        }
        // SAFETY: `data` was allocated by XGetWindowProperty.
        unsafe {
            xlib::XFree(data as *mut c_void);
        }
    }
    flags
}

// `_NET_WM_STATE` client message actions.
pub(super) const NET_WM_STATE_REMOVE: c_long = 0;
pub(super) const NET_WM_STATE_ADD: c_long = 1;
