// src/platform/mock.rs

//! In-memory backend for tests.
//!
//! [`MockBackend`] records every command it receives and, by default,
//! plays the part of a compliant window manager: each request is
//! acknowledged with the notifications a real windowing system would
//! produce for it. Tests drive edge cases through the paired
//! [`MockHandle`], which shares state with the backend and can inject
//! arbitrary notification sequences or silence the auto-acknowledgement
//! entirely.

use crate::geometry::{Position, Size};
use crate::platform::{NativeHandle, Notification, PlatformBackend};
use crate::window::WindowState;

use anyhow::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A command the window model issued to the backend, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    Create { title: String, size: Size },
    Destroy,
    Show,
    Hide,
    RequestState(WindowState),
    RequestPosition(Position),
    RequestSize(Size),
}

#[derive(Debug)]
struct MockInner {
    commands: Vec<MockCommand>,
    queue: VecDeque<Notification>,
    auto_ack: bool,

    mapped: bool,
    state: WindowState,
    size: Size,
    position: Position,

    display_size: Size,
    work_area_position: Position,
    work_area_size: Size,
}

impl MockInner {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            queue: VecDeque::new(),
            auto_ack: true,
            mapped: false,
            state: WindowState::Normal,
            size: Size::new(0, 0),
            position: Position::default(),
            display_size: Size::new(1920, 1080),
            work_area_position: Position::default(),
            work_area_size: Size::new(1920, 1040),
        }
    }

    fn queue_if_mapped(&mut self, notification: Notification) {
        if self.mapped {
            self.queue.push_back(notification);
        }
    }

    fn move_to(&mut self, position: Position) {
        if self.position != position {
            self.position = position;
            self.queue_if_mapped(Notification::Moved(position));
        }
    }

    fn resize_to(&mut self, size: Size) {
        if self.size != size {
            self.size = size;
            self.queue_if_mapped(Notification::Resized(size));
        }
    }

    // What a cooperative window manager does with a state request.
    fn ack_state(&mut self, state: WindowState) {
        if state == self.state {
            return;
        }
        let old = self.state;
        self.state = state;
        self.queue_if_mapped(Notification::StateChanged(state));
        match state {
            WindowState::Fullscreen => {
                self.move_to(Position::default());
                let display = self.display_size;
                self.resize_to(display);
            }
            WindowState::Maximized => {
                let position = self.work_area_position;
                let size = self.work_area_size;
                self.move_to(position);
                self.resize_to(size);
            }
            WindowState::Iconified => {
                self.queue_if_mapped(Notification::FocusLost);
            }
            WindowState::Normal => {
                if old == WindowState::Iconified {
                    self.queue_if_mapped(Notification::FocusGained);
                }
            }
        }
    }
}

/// Backend half; hand it to [`crate::window::Window::new`].
pub struct MockBackend {
    inner: Rc<RefCell<MockInner>>,
}

/// Test half; inspects recorded commands and injects notifications.
#[derive(Clone)]
pub struct MockHandle {
    inner: Rc<RefCell<MockInner>>,
}

impl MockBackend {
    pub fn new() -> (Self, MockHandle) {
        let inner = Rc::new(RefCell::new(MockInner::new()));
        (
            Self {
                inner: Rc::clone(&inner),
            },
            MockHandle { inner },
        )
    }
}

impl PlatformBackend for MockBackend {
    fn create(&mut self, title: &str, size: Size) -> Result<NativeHandle> {
        let mut inner = self.inner.borrow_mut();
        inner.commands.push(MockCommand::Create {
            title: title.to_string(),
            size,
        });
        inner.size = size;
        Ok(NativeHandle(1))
    }

    fn destroy(&mut self, _handle: NativeHandle) {
        self.inner.borrow_mut().commands.push(MockCommand::Destroy);
    }

    fn show(&mut self, _handle: NativeHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.commands.push(MockCommand::Show);
        if !inner.mapped {
            inner.mapped = true;
            if inner.auto_ack {
                let size = inner.size;
                let position = inner.position;
                inner.queue.push_back(Notification::Shown);
                inner.queue.push_back(Notification::Resized(size));
                inner.queue.push_back(Notification::Moved(position));
                inner.queue.push_back(Notification::FocusGained);
            }
        }
    }

    fn hide(&mut self, _handle: NativeHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.commands.push(MockCommand::Hide);
        if inner.mapped {
            inner.mapped = false;
            if inner.auto_ack {
                inner.queue.push_back(Notification::FocusLost);
                inner.queue.push_back(Notification::Hidden);
            }
        }
    }

    fn request_state(&mut self, _handle: NativeHandle, state: WindowState) {
        let mut inner = self.inner.borrow_mut();
        inner.commands.push(MockCommand::RequestState(state));
        if inner.auto_ack {
            inner.ack_state(state);
        }
    }

    fn request_position(&mut self, _handle: NativeHandle, position: Position) {
        let mut inner = self.inner.borrow_mut();
        inner.commands.push(MockCommand::RequestPosition(position));
        // Fullscreen and maximized windows ignore move requests, like a
        // real window manager would.
        if inner.auto_ack
            && matches!(inner.state, WindowState::Normal | WindowState::Iconified)
        {
            inner.move_to(position);
        }
    }

    fn request_size(&mut self, _handle: NativeHandle, size: Size) {
        let mut inner = self.inner.borrow_mut();
        inner.commands.push(MockCommand::RequestSize(size));
        if inner.auto_ack
            && matches!(inner.state, WindowState::Normal | WindowState::Iconified)
        {
            inner.resize_to(size);
        }
    }

    fn poll_notifications(&mut self, _handle: NativeHandle) -> Vec<Notification> {
        self.inner.borrow_mut().queue.drain(..).collect()
    }
}

impl MockHandle {
    pub fn commands(&self) -> Vec<MockCommand> {
        self.inner.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.inner.borrow_mut().commands.clear();
    }

    /// Queues a raw notification, bypassing the auto-acknowledgement
    /// logic. Used to simulate user-initiated or noisy window managers.
    pub fn push_notification(&self, notification: Notification) {
        self.inner.borrow_mut().queue.push_back(notification);
    }

    /// Disables the built-in compliant-window-manager behaviour; after
    /// this, only [`MockHandle::push_notification`] produces
    /// notifications.
    pub fn set_auto_ack(&self, auto_ack: bool) {
        self.inner.borrow_mut().auto_ack = auto_ack;
    }

    pub fn state(&self) -> WindowState {
        self.inner.borrow().state
    }

    pub fn size(&self) -> Size {
        self.inner.borrow().size
    }

    pub fn position(&self) -> Position {
        self.inner.borrow().position
    }

    pub fn is_mapped(&self) -> bool {
        self.inner.borrow().mapped
    }

    pub fn display_size(&self) -> Size {
        self.inner.borrow().display_size
    }

    pub fn work_area(&self) -> (Position, Size) {
        let inner = self.inner.borrow();
        (inner.work_area_position, inner.work_area_size)
    }
}
