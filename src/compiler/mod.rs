//! Compile/render orchestration around a [`DiagramEngine`].
//!
//! The [`Compiler`] owns the engine (created on first use), the current
//! diagram handle and the request sequence. It turns a [`CompileJob`] into
//! a [`CompileOutcome`]; the state machine that reacts to outcomes lives in
//! [`crate::app`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::engine::{CompileInput, DiagramEngine, EngineError};
use crate::options::{CompileOptions, DiagramProps, RenderOptions};

/// Lifecycle of one diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompileState {
    /// No source to compile.
    #[default]
    Idle,
    Loading,
    Ready {
        svg: String,
    },
    Failed {
        message: String,
    },
}

impl CompileState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn svg(&self) -> Option<&str> {
        match self {
            Self::Ready { svg } => Some(svg),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Which settled results may update state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Only the most recently issued request may settle; older responses
    /// are dropped.
    #[default]
    LatestIssued,
    /// Every response settles in completion order, so a slow older request
    /// can overwrite a newer one.
    LastSettled,
}

/// Snapshot of everything one compile needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileJob {
    pub input: CompileInput,
    pub compile: CompileOptions,
    pub render: RenderOptions,
}

impl CompileJob {
    pub fn from_props(props: &DiagramProps, active_theme_id: u32) -> Self {
        Self {
            input: props.compile_input(),
            compile: props.compile_options(active_theme_id),
            render: props.render_options(active_theme_id),
        }
    }
}

/// Result of one settled request: markup, or the message to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub seq: u64,
    pub result: Result<String, String>,
}

pub struct Compiler<E: DiagramEngine> {
    factory: Box<dyn Fn() -> E>,
    engine: OnceCell<Rc<E>>,
    diagram: RefCell<Option<Rc<E::Diagram>>>,
    issued: Cell<u64>,
    policy: SettlePolicy,
}

impl<E: DiagramEngine> fmt::Debug for Compiler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("engine_created", &self.engine_created())
            .field("issued", &self.issued.get())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<E: DiagramEngine> Compiler<E> {
    /// `factory` runs once, the first time the engine is needed.
    pub fn new(factory: impl Fn() -> E + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            engine: OnceCell::new(),
            diagram: RefCell::new(None),
            issued: Cell::new(0),
            policy: SettlePolicy::default(),
        }
    }

    pub const fn with_policy(mut self, policy: SettlePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn policy(&self) -> SettlePolicy {
        self.policy
    }

    pub fn engine(&self) -> Rc<E> {
        Rc::clone(self.engine.get_or_init(|| {
            tracing::debug!("creating diagram engine");
            Rc::new((self.factory)())
        }))
    }

    pub fn engine_created(&self) -> bool {
        self.engine.get().is_some()
    }

    /// The handle of the last successful compile, if still current.
    pub fn diagram(&self) -> Option<Rc<E::Diagram>> {
        self.diagram.borrow().clone()
    }

    pub fn clear(&self) {
        self.diagram.borrow_mut().take();
    }

    /// Allocate the sequence number for a new request.
    pub fn issue(&self) -> u64 {
        let seq = self.issued.get() + 1;
        self.issued.set(seq);
        seq
    }

    pub fn latest_issued(&self) -> u64 {
        self.issued.get()
    }

    fn is_current(&self, seq: u64) -> bool {
        match self.policy {
            SettlePolicy::LatestIssued => seq == self.issued.get(),
            SettlePolicy::LastSettled => true,
        }
    }

    /// Compile and render `job`.
    ///
    /// Returns `None` when the request was superseded under
    /// [`SettlePolicy::LatestIssued`]. Engine failures never escape: they
    /// become the outcome's error message and drop the diagram handle.
    pub async fn run(&self, seq: u64, job: CompileJob) -> Option<CompileOutcome> {
        let engine = self.engine();
        let result = self.compile_and_render(&engine, seq, job).await;

        if !self.is_current(seq) {
            tracing::debug!(seq, latest = self.issued.get(), "dropping superseded compile");
            return None;
        }

        let result = result.map_err(|err| {
            let message = err.message();
            tracing::warn!(seq, error = %message, "diagram compilation failed");
            self.clear();
            message
        });
        Some(CompileOutcome { seq, result })
    }

    async fn compile_and_render(
        &self,
        engine: &E,
        seq: u64,
        job: CompileJob,
    ) -> Result<String, EngineError> {
        let CompileJob {
            input,
            compile,
            render,
        } = job;

        let compiled = engine.compile(input, &compile).await?;
        let diagram = Rc::new(compiled.diagram);
        if self.is_current(seq) {
            *self.diagram.borrow_mut() = Some(Rc::clone(&diagram));
        }

        let render = render.merged_with(&compiled.render_options);
        engine.render(&diagram, &render).await
    }
}
