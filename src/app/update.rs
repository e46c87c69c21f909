use crate::app::Model;
use crate::app::model::DiagramEvent;
use crate::compiler::{CompileOutcome, CompileState};
use crate::options::{Dimension, DiagramProps, FileSet, LayoutEngine};

/// All possible events and actions for one diagram.
///
/// These represent host input changes, host signals, and engine results.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Source and engine options
    /// Replace the D2 source
    SetCode(String),
    /// Light theme by catalog name
    SetTheme(Option<String>),
    /// Light theme by id
    SetThemeId(Option<u32>),
    SetDarkTheme(Option<String>),
    SetDarkThemeId(Option<u32>),
    /// Follow (or stop following) the host dark-mode flag
    SetAutoSyncDarkMode(bool),
    SetSketch(bool),
    SetCenter(bool),
    SetScale(f64),
    SetPad(f64),
    SetLayoutEngine(LayoutEngine),
    SetAnimateInterval(Option<u32>),
    SetTarget(Option<String>),
    /// Replace the virtual file set used for imports
    SetFiles(Option<FileSet>),
    SetInputPath(String),
    SetForceAppendix(bool),

    // Container
    SetWidth(Option<Dimension>),
    SetHeight(Option<Dimension>),
    SetMaxWidth(Dimension),
    SetMaxHeight(Dimension),
    SetFit(bool),
    SetAriaLabel(String),

    /// Replace every prop at once
    SetProps(Box<DiagramProps>),

    // Host
    /// Host dark mode toggled
    DarkModeChanged(bool),

    // Compile lifecycle
    /// Compile again even though nothing changed
    Recompile,
    /// Blank source: no engine call was made
    CompileSkipped,
    /// Request `seq` was handed to the engine
    CompileStarted(u64),
    /// The engine finished a request
    CompileSettled(CompileOutcome),
}

impl Message {
    /// Messages that change what a compile would be started with.
    const fn affects_compile_inputs(&self) -> bool {
        !matches!(
            self,
            Self::SetWidth(_)
                | Self::SetHeight(_)
                | Self::SetMaxWidth(_)
                | Self::SetMaxHeight(_)
                | Self::SetFit(_)
                | Self::SetAriaLabel(_)
                | Self::Recompile
                | Self::CompileSkipped
                | Self::CompileStarted(_)
                | Self::CompileSettled(_)
        )
    }
}

/// Pure function that updates the model based on a message.
///
/// Input changes only flag a recompile when the compile they would start
/// differs from the current one; the runtime starts at most one compile per
/// tick no matter how many flags were raised.
pub fn update(mut model: Model, msg: Message) -> Model {
    let before = msg.affects_compile_inputs().then(|| model.compile_job());

    match msg {
        Message::SetCode(code) => model.props.code = code,
        Message::SetTheme(theme) => model.props.theme = theme,
        Message::SetThemeId(id) => model.props.theme_id = id,
        Message::SetDarkTheme(theme) => model.props.dark_theme = theme,
        Message::SetDarkThemeId(id) => model.props.dark_theme_id = id,
        Message::SetAutoSyncDarkMode(enabled) => model.props.auto_sync_dark_mode = enabled,
        Message::SetSketch(enabled) => model.props.sketch = enabled,
        Message::SetCenter(enabled) => model.props.center = enabled,
        Message::SetScale(scale) => model.props.scale = scale,
        Message::SetPad(pad) => model.props.pad = pad,
        Message::SetLayoutEngine(layout) => model.props.layout_engine = layout,
        Message::SetAnimateInterval(interval) => model.props.animate_interval = interval,
        Message::SetTarget(target) => model.props.target = target,
        Message::SetFiles(files) => model.props.fs = files,
        Message::SetInputPath(path) => model.props.input_path = path,
        Message::SetForceAppendix(enabled) => model.props.force_appendix = enabled,

        Message::SetWidth(width) => model.props.width = width,
        Message::SetHeight(height) => model.props.height = height,
        Message::SetMaxWidth(max_width) => model.props.max_width = max_width,
        Message::SetMaxHeight(max_height) => model.props.max_height = max_height,
        Message::SetFit(fit) => model.props.fit = fit,
        Message::SetAriaLabel(label) => model.props.aria_label = label,

        Message::SetProps(props) => model.props = *props,

        Message::DarkModeChanged(is_dark) => model.is_dark = is_dark,

        Message::Recompile => model.request_compile(),
        Message::CompileSkipped => {
            tracing::debug!("blank diagram source, skipping compile");
            model.state = CompileState::Idle;
        }
        Message::CompileStarted(seq) => {
            tracing::debug!(seq, "compile started");
            model.state = CompileState::Loading;
        }
        Message::CompileSettled(CompileOutcome { seq, result }) => match result {
            Ok(svg) => {
                tracing::debug!(seq, bytes = svg.len(), "diagram ready");
                model.push_event(DiagramEvent::Compiled(svg.clone()));
                model.state = CompileState::Ready { svg };
            }
            Err(message) => {
                model.push_event(DiagramEvent::Error(message.clone()));
                model.state = CompileState::Failed { message };
            }
        },
    }

    if let Some(before) = before
        && model.compile_job() != before
    {
        model.request_compile();
    }

    model
}
