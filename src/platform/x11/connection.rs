// src/platform/x11/connection.rs

//! Xlib display connection and the atoms the backend relies on.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::ptr;

use libc::c_int;
use x11::xlib;

/// Owns the raw `*mut xlib::Display` and closes it on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    fn open() -> Result<Self> {
        // NULL means "use the DISPLAY environment variable".
        let ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if ptr.is_null() {
            return Err(anyhow!(
                "failed to open X display; check DISPLAY or the X server status"
            ));
        }
        debug!("X display opened: {:p}", ptr);
        Ok(Self { ptr })
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            info!("closing X display connection {:p}", self.ptr);
            // SAFETY: `ptr` came from a successful XOpenDisplay and is
            // closed exactly once, here.
            let status = unsafe { xlib::XCloseDisplay(self.ptr) };
            if status != 0 {
                warn!("XCloseDisplay returned {}", status);
            }
        }
    }
}

/// Atoms interned once at connection time.
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_protocols: xlib::Atom,
    pub wm_delete_window: xlib::Atom,
    pub net_wm_name: xlib::Atom,
    pub utf8_string: xlib::Atom,
    pub net_wm_state: xlib::Atom,
    pub net_wm_state_fullscreen: xlib::Atom,
    pub net_wm_state_maximized_horz: xlib::Atom,
    pub net_wm_state_maximized_vert: xlib::Atom,
    pub net_wm_state_hidden: xlib::Atom,
}

/// Connection to the X server: display pointer, default screen and root,
/// and the interned [`Atoms`].
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: c_int,
    root: xlib::Window,
    atoms: Atoms,
}

impl Connection {
    pub fn new() -> Result<Self> {
        info!("establishing X11 server connection");
        let managed_display = ManagedDisplay::open()?;
        let display = managed_display.ptr;

        // SAFETY: `display` is valid for the lifetime of `managed_display`;
        // these queries only read connection defaults.
        let (screen, root) = unsafe {
            let screen = xlib::XDefaultScreen(display);
            (screen, xlib::XRootWindow(display, screen))
        };
        debug!("default screen {}, root window 0x{:x}", screen, root);

        let atoms = Atoms {
            wm_protocols: intern(display, "WM_PROTOCOLS")?,
            wm_delete_window: intern(display, "WM_DELETE_WINDOW")?,
            net_wm_name: intern(display, "_NET_WM_NAME")?,
            utf8_string: intern(display, "UTF8_STRING")?,
            net_wm_state: intern(display, "_NET_WM_STATE")?,
            net_wm_state_fullscreen: intern(display, "_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_maximized_horz: intern(display, "_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_state_maximized_vert: intern(display, "_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_hidden: intern(display, "_NET_WM_STATE_HIDDEN")?,
        };

        Ok(Connection {
            managed_display,
            screen,
            root,
            atoms,
        })
    }

    /// Raw display pointer for Xlib calls. Valid as long as the
    /// `Connection` is alive.
    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.ptr
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }

    #[inline]
    pub fn root(&self) -> xlib::Window {
        self.root
    }

    #[inline]
    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    /// File descriptor of the X connection, for event-loop integration.
    pub fn event_fd(&self) -> RawFd {
        // SAFETY: XConnectionNumber only reads from a valid display.
        unsafe { xlib::XConnectionNumber(self.display()) }
    }

    pub fn flush(&self) {
        // SAFETY: XFlush is safe on a valid display.
        unsafe {
            xlib::XFlush(self.display());
        }
    }
}

fn intern(display: *mut xlib::Display, name: &str) -> Result<xlib::Atom> {
    let c_name = CString::new(name).map_err(|_| anyhow!("atom name contains NUL: {}", name))?;
    // SAFETY: `display` is valid and `c_name` is a NUL-terminated string
    // that outlives the call. only_if_exists=False always yields an atom.
    let atom = unsafe { xlib::XInternAtom(display, c_name.as_ptr(), xlib::False) };
    if atom == 0 {
        return Err(anyhow!("failed to intern atom {}", name));
    }
    Ok(atom)
}
