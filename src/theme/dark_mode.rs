//! Host dark-mode signal shared by every diagram on a page.
//!
//! The host creates one [`DarkModeContext`] at startup and hands a clone
//! to each runtime. Hosts without a dark-mode feature use
//! [`DarkModeContext::unavailable`], which always reports light.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Default)]
struct DarkModeState {
    available: bool,
    is_dark: bool,
    subscribers: Vec<UnboundedSender<bool>>,
}

/// Cheaply cloneable handle to the host dark-mode flag.
#[derive(Debug, Clone, Default)]
pub struct DarkModeContext {
    state: Rc<RefCell<DarkModeState>>,
}

impl DarkModeContext {
    /// A context whose host exposes a dark-mode flag.
    pub fn new(is_dark: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(DarkModeState {
                available: true,
                is_dark,
                subscribers: Vec::new(),
            })),
        }
    }

    /// A context for hosts without dark mode. Permanently light.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    pub fn is_dark(&self) -> bool {
        self.state.borrow().is_dark
    }

    /// Push a new host value. Subscribers only hear about actual changes.
    pub fn set_dark(&self, is_dark: bool) {
        let mut state = self.state.borrow_mut();
        if !state.available {
            tracing::debug!(is_dark, "dark mode unavailable, ignoring host update");
            return;
        }
        if state.is_dark == is_dark {
            return;
        }
        state.is_dark = is_dark;
        // Closed receivers belong to dropped runtimes.
        state
            .subscribers
            .retain(|tx| tx.unbounded_send(is_dark).is_ok());
    }

    /// Receive every future change of the flag.
    pub fn subscribe(&self) -> UnboundedReceiver<bool> {
        let (tx, rx) = mpsc::unbounded();
        self.state.borrow_mut().subscribers.push(tx);
        rx
    }

    /// Drop all subscribers and return to light. Availability is kept.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.is_dark = false;
        state.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }
}
