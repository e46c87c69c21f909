//! Per-diagram state and the runtime that drives it.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete state of one embedded diagram
//! - [`Message`]: All possible input changes, host signals and engine results
//! - [`update`]: Pure function for state transitions
//! - [`DiagramRuntime`]: Single-threaded event loop that batches messages,
//!   starts compiles and dispatches notifications

mod effects;
mod event_loop;
mod model;
mod update;

pub use model::{DiagramEvent, Model};
pub use update::{Message, update};

use std::cell::Cell;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::executor::LocalPool;

use crate::compiler::{CompileState, Compiler};
use crate::engine::DiagramEngine;
use crate::options::DiagramProps;
use crate::theme::DarkModeContext;
use crate::ui::Slots;

type Listener = Box<dyn FnMut(&DiagramEvent)>;

/// Owns one diagram's model, its compiler and a cooperative executor.
///
/// Nothing runs in the background: engine futures only make progress inside
/// [`DiagramRuntime::tick`] and [`DiagramRuntime::run_until_settled`].
pub struct DiagramRuntime<E: DiagramEngine + 'static> {
    model: Model,
    compiler: Rc<Compiler<E>>,
    pool: LocalPool,
    inbox_tx: UnboundedSender<Message>,
    inbox_rx: UnboundedReceiver<Message>,
    dark_mode: DarkModeContext,
    dark_rx: UnboundedReceiver<bool>,
    in_flight: Rc<Cell<usize>>,
    listeners: Vec<Listener>,
}

impl<E: DiagramEngine + 'static> std::fmt::Debug for DiagramRuntime<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramRuntime")
            .field("model", &self.model)
            .field("compiler", &self.compiler)
            .field("in_flight", &self.in_flight.get())
            .finish_non_exhaustive()
    }
}

impl<E: DiagramEngine + 'static> DiagramRuntime<E> {
    /// Create a runtime and start the initial compile.
    ///
    /// `engine` is called lazily, the first time a compile needs it.
    pub fn new(
        props: DiagramProps,
        engine: impl Fn() -> E + 'static,
        dark_mode: &DarkModeContext,
    ) -> Self {
        Self::with_compiler(props, Compiler::new(engine), dark_mode)
    }

    pub fn with_compiler(
        props: DiagramProps,
        compiler: Compiler<E>,
        dark_mode: &DarkModeContext,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded();
        let mut runtime = Self {
            model: Model::new(props, dark_mode.is_dark()),
            compiler: Rc::new(compiler),
            pool: LocalPool::new(),
            inbox_tx,
            inbox_rx,
            dark_mode: dark_mode.clone(),
            dark_rx: dark_mode.subscribe(),
            in_flight: Rc::new(Cell::new(0)),
            listeners: Vec::new(),
        };
        runtime.flush_compile();
        runtime
    }

    pub const fn model(&self) -> &Model {
        &self.model
    }

    pub const fn state(&self) -> &CompileState {
        &self.model.state
    }

    pub fn props(&self) -> &DiagramProps {
        &self.model.props
    }

    pub fn compiler(&self) -> &Compiler<E> {
        &self.compiler
    }

    /// The compiled diagram handle, for callers that need more than markup.
    pub fn diagram(&self) -> Option<Rc<E::Diagram>> {
        self.compiler.diagram()
    }

    pub const fn dark_mode(&self) -> &DarkModeContext {
        &self.dark_mode
    }

    /// Requests still waiting on the engine.
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// A handle for posting messages from elsewhere; they are applied on
    /// the next tick.
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.inbox_tx.clone()
    }

    /// Register a listener for compile notifications.
    pub fn on_event(&mut self, listener: impl FnMut(&DiagramEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Apply a message now. Any recompile it causes starts on the next tick.
    pub fn send(&mut self, msg: Message) {
        self.model = update(std::mem::take(&mut self.model), msg);
    }

    /// Start a compile immediately, whether or not anything changed.
    pub fn recompile(&mut self) {
        self.send(Message::Recompile);
        self.flush_compile();
    }

    /// The container markup for the current state.
    pub fn render_html(&self, slots: &Slots) -> String {
        crate::ui::render(&self.model, slots)
    }
}
