//! In-crate engine for tests: records every call and answers from a script.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;

use super::{CompileInput, Compiled, DiagramEngine, EngineError};
use crate::options::{CompileOptions, RenderOptions, RenderOverrides};

pub(crate) const DEFAULT_SVG: &str = "<svg><rect /></svg>";

#[derive(Debug)]
pub(crate) struct Script {
    /// Render output; `{code}` is replaced with the compiled source.
    pub svg: String,
    pub compile_error: Option<String>,
    pub render_error: Option<String>,
    pub overrides: RenderOverrides,
    /// When non-empty, each compile waits for the next gate to open.
    pub gates: VecDeque<oneshot::Receiver<()>>,
    pub engines_created: usize,
    pub compiles: Vec<(CompileInput, CompileOptions)>,
    pub renders: Vec<RenderOptions>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            svg: DEFAULT_SVG.to_string(),
            compile_error: None,
            render_error: None,
            overrides: RenderOverrides::default(),
            gates: VecDeque::new(),
            engines_created: 0,
            compiles: Vec::new(),
            renders: Vec::new(),
        }
    }
}

/// Shared handle to a [`Script`]; tests keep one clone, engines another.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptHandle(Rc<RefCell<Script>>);

impl ScriptHandle {
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, Script> {
        self.0.borrow_mut()
    }

    pub fn compile_count(&self) -> usize {
        self.0.borrow().compiles.len()
    }

    pub fn render_count(&self) -> usize {
        self.0.borrow().renders.len()
    }

    pub fn engines_created(&self) -> usize {
        self.0.borrow().engines_created
    }

    pub fn last_compile(&self) -> Option<(CompileInput, CompileOptions)> {
        self.0.borrow().compiles.last().cloned()
    }

    pub fn last_render(&self) -> Option<RenderOptions> {
        self.0.borrow().renders.last().cloned()
    }

    /// Make the next compile wait; send on the returned sender to release it.
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.0.borrow_mut().gates.push_back(rx);
        tx
    }

    /// A factory for [`crate::compiler::Compiler::new`].
    pub fn factory(&self) -> impl Fn() -> ScriptedEngine + 'static {
        let handle = self.clone();
        move || {
            handle.0.borrow_mut().engines_created += 1;
            ScriptedEngine {
                script: handle.clone(),
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedEngine {
    script: ScriptHandle,
}

fn source_of(input: &CompileInput) -> String {
    match input {
        CompileInput::Source(code) => code.clone(),
        CompileInput::Files { files, input_path } => {
            files.get(input_path).cloned().unwrap_or_default()
        }
    }
}

#[async_trait(?Send)]
impl DiagramEngine for ScriptedEngine {
    type Diagram = String;

    async fn compile(
        &self,
        input: CompileInput,
        options: &CompileOptions,
    ) -> Result<Compiled<String>, EngineError> {
        let gate = {
            let mut script = self.script.0.borrow_mut();
            script.compiles.push((input.clone(), options.clone()));
            script.gates.pop_front()
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let script = self.script.0.borrow();
        if let Some(message) = &script.compile_error {
            return Err(EngineError::Compile(message.clone()));
        }
        Ok(Compiled::new(source_of(&input)).with_render_options(script.overrides.clone()))
    }

    async fn render(&self, diagram: &String, options: &RenderOptions) -> Result<String, EngineError> {
        let mut script = self.script.0.borrow_mut();
        script.renders.push(options.clone());
        if let Some(message) = &script.render_error {
            return Err(EngineError::Render(message.clone()));
        }
        Ok(script.svg.replace("{code}", diagram))
    }
}
