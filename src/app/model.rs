use crate::compiler::{CompileJob, CompileState};
use crate::options::DiagramProps;

/// Outward notification, one per settled compile attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramEvent {
    /// Rendered markup, exactly as the engine returned it.
    Compiled(String),
    /// Human-readable failure message.
    Error(String),
}

/// The complete state of one embedded diagram.
///
/// All state lives here - no global or scattered state.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Current inputs
    pub props: DiagramProps,
    /// Last host dark-mode value seen
    pub is_dark: bool,
    pub state: CompileState,
    /// Set by input changes; consumed once per tick by the runtime
    compile_requested: bool,
    /// Notifications not yet handed to listeners
    events: Vec<DiagramEvent>,
}

impl Model {
    /// A model that compiles on the first tick.
    pub fn new(props: DiagramProps, is_dark: bool) -> Self {
        Self {
            props,
            is_dark,
            state: CompileState::Idle,
            compile_requested: true,
            events: Vec::new(),
        }
    }

    pub fn active_theme_id(&self) -> u32 {
        self.props.theme_selection().active_theme_id(self.is_dark)
    }

    /// Everything a compile would be started with right now.
    pub fn compile_job(&self) -> CompileJob {
        CompileJob::from_props(&self.props, self.active_theme_id())
    }

    /// The job to start, or `None` when the source is blank.
    pub fn prepare_compile(&self) -> Option<CompileJob> {
        if self.props.is_blank() {
            return None;
        }
        Some(self.compile_job())
    }

    pub const fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn svg(&self) -> Option<&str> {
        self.state.svg()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub(super) const fn request_compile(&mut self) {
        self.compile_requested = true;
    }

    pub const fn compile_requested(&self) -> bool {
        self.compile_requested
    }

    /// Consume the pending recompile, if any.
    pub(super) const fn take_compile_request(&mut self) -> bool {
        let requested = self.compile_requested;
        self.compile_requested = false;
        requested
    }

    pub(super) fn push_event(&mut self, event: DiagramEvent) {
        self.events.push(event);
    }

    pub(super) fn take_events(&mut self) -> Vec<DiagramEvent> {
        std::mem::take(&mut self.events)
    }
}
