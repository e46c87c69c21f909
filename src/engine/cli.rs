//! Engine backed by the `d2` executable.
//!
//! Compiling materializes the source (or file set) in a temporary
//! directory and validates it with `d2 validate`; rendering runs `d2` on
//! that directory. Process work happens on a worker thread and is awaited
//! through a oneshot channel, so the cooperative event loop keeps running.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Output};
use std::thread;

use async_trait::async_trait;
use futures::channel::oneshot;
use tempfile::TempDir;

use super::{CompileInput, Compiled, DiagramEngine, EngineError};
use crate::options::{CompileOptions, LayoutEngine, RenderOptions};

const OUTPUT_FILE: &str = "out.svg";

/// A validated diagram on disk. The directory lives as long as the handle.
#[derive(Debug)]
pub struct CliDiagram {
    dir: TempDir,
    input: PathBuf,
    layout: LayoutEngine,
}

impl CliDiagram {
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    pub fn work_dir(&self) -> &Path {
        self.dir.path()
    }
}

#[derive(Debug, Clone)]
pub struct D2CliEngine {
    binary: PathBuf,
}

impl Default for D2CliEngine {
    fn default() -> Self {
        Self::new("d2")
    }
}

impl D2CliEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait(?Send)]
impl DiagramEngine for D2CliEngine {
    type Diagram = CliDiagram;

    async fn compile(
        &self,
        input: CompileInput,
        options: &CompileOptions,
    ) -> Result<Compiled<CliDiagram>, EngineError> {
        let binary = self.binary.clone();
        let layout = options.layout;
        run_blocking(move || {
            let dir = tempfile::Builder::new().prefix("d2-slides-").tempdir()?;
            let input = write_input(dir.path(), &input)?;
            let output = run_d2(&binary, &[OsString::from("validate"), input.clone().into()])?;
            check_status(&output, EngineError::Compile)?;
            Ok(Compiled::new(CliDiagram { dir, input, layout }))
        })
        .await
    }

    async fn render(
        &self,
        diagram: &CliDiagram,
        options: &RenderOptions,
    ) -> Result<String, EngineError> {
        let binary = self.binary.clone();
        let output_path = diagram.work_dir().join(OUTPUT_FILE);
        let args = render_args(options, diagram.layout, &diagram.input, &output_path);
        tracing::debug!(binary = %binary.display(), ?args, "running d2");
        run_blocking(move || {
            let output = run_d2(&binary, &args)?;
            check_status(&output, EngineError::Render)?;
            Ok(std::fs::read_to_string(&output_path)?)
        })
        .await
    }
}

/// Run `job` on a worker thread and await its result.
async fn run_blocking<T, F>(job: F) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    thread::spawn(move || {
        let _ = sender.send(job());
    });
    receiver
        .await
        .unwrap_or_else(|_| Err(EngineError::Other("d2 worker thread unexpectedly closed".to_string())))
}

fn run_d2(binary: &Path, args: &[OsString]) -> Result<Output, EngineError> {
    Command::new(binary).args(args).output().map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            EngineError::Unavailable(format!("{} not found on PATH", binary.display()))
        } else {
            EngineError::Io(err)
        }
    })
}

fn check_status(output: &Output, wrap: fn(String) -> EngineError) -> Result<(), EngineError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Err(wrap(message))
}

/// Write the engine input below `root`, returning the entry file path.
fn write_input(root: &Path, input: &CompileInput) -> Result<PathBuf, EngineError> {
    match input {
        CompileInput::Source(code) => {
            let path = root.join(crate::options::DEFAULT_INPUT_PATH);
            std::fs::write(&path, code)?;
            Ok(path)
        }
        CompileInput::Files { files, input_path } => {
            for (name, content) in files {
                let path = root.join(checked_relative(name)?);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, content)?;
            }
            Ok(root.join(checked_relative(input_path)?))
        }
    }
}

/// File set paths must stay inside the working directory.
fn checked_relative(name: &str) -> Result<&Path, EngineError> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if name.is_empty() || escapes {
        return Err(EngineError::Compile(format!("invalid import path: {name}")));
    }
    Ok(path)
}

fn render_args(
    options: &RenderOptions,
    layout: LayoutEngine,
    input: &Path,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        format!("--theme={}", options.theme_id).into(),
        format!("--sketch={}", options.sketch).into(),
        format!("--center={}", options.center).into(),
        format!("--scale={}", options.scale).into(),
        format!("--pad={}", options.pad).into(),
        format!("--layout={layout}").into(),
        format!("--force-appendix={}", options.force_appendix).into(),
    ];
    if let Some(dark) = options.dark_theme_id {
        args.push(format!("--dark-theme={dark}").into());
    }
    if let Some(interval) = options.animate_interval {
        args.push(format!("--animate-interval={interval}").into());
    }
    if let Some(target) = &options.target {
        args.push(format!("--target={target}").into());
    }
    if options.no_xml_tag {
        args.push("--no-xml-tag".into());
    }
    args.push(input.into());
    args.push(output.into());
    args
}
