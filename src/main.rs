//! d2-slides - Render D2 diagrams into embeddable HTML.
//!
//! # Usage
//!
//! ```bash
//! d2-slides flow.d2 > flow.html
//! d2-slides --theme grape-soda --fit --output flow.html flow.d2
//! d2-slides --watch --standalone --import shared.d2 -o preview.html flow.d2
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use d2_slides::app::{DiagramEvent, DiagramRuntime, Message};
use d2_slides::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use d2_slides::engine::D2CliEngine;
use d2_slides::options::{DiagramProps, Dimension, FileSet, LayoutEngine};
use d2_slides::ui::{Slots, page};
use d2_slides::watcher::FileWatcher;

const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);
const WATCH_POLL: Duration = Duration::from_millis(250);

/// Render a D2 diagram into an embeddable HTML fragment
#[derive(Parser, Debug)]
#[command(name = "d2-slides", version, about, long_about = None)]
struct Cli {
    /// D2 source file to render
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Write the HTML here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Re-render whenever the source or an imported file changes
    #[arg(short, long)]
    watch: bool,

    /// Light theme, by catalog name or numeric id
    #[arg(long, value_name = "NAME|ID")]
    theme: Option<String>,

    /// Theme used when the appearance is dark
    #[arg(long, value_name = "NAME|ID")]
    dark_theme: Option<String>,

    /// Page appearance the diagram should match
    #[arg(long, value_enum, default_value = "auto")]
    appearance: ThemeMode,

    /// Hand-drawn rendering style
    #[arg(long)]
    sketch: bool,

    #[arg(long, value_enum)]
    layout: Option<LayoutEngine>,

    /// Padding around the diagram, in pixels
    #[arg(long)]
    pad: Option<f64>,

    #[arg(long)]
    scale: Option<f64>,

    /// Do not center the diagram in its viewBox
    #[arg(long)]
    no_center: bool,

    /// Board to render, for multi-board diagrams
    #[arg(long)]
    target: Option<String>,

    /// Milliseconds between boards when animating
    #[arg(long, value_name = "MS")]
    animate_interval: Option<u32>,

    /// Render tooltips and links as an appendix
    #[arg(long)]
    force_appendix: bool,

    /// Let the container size the diagram
    #[arg(long)]
    fit: bool,

    /// Container width (bare numbers are pixels)
    #[arg(long)]
    width: Option<String>,

    /// Container height (bare numbers are pixels)
    #[arg(long)]
    height: Option<String>,

    #[arg(long)]
    max_width: Option<String>,

    #[arg(long)]
    max_height: Option<String>,

    /// Accessible label for the diagram
    #[arg(long)]
    aria_label: Option<String>,

    /// Extra file the diagram imports (repeatable)
    #[arg(long = "import", value_name = "FILE")]
    imports: Vec<PathBuf>,

    /// JSON file with diagram props (camelCase, as hosts pass them)
    #[arg(long, value_name = "JSON")]
    props: Option<PathBuf>,

    /// Path to the d2 executable
    #[arg(long, value_name = "PATH")]
    d2_bin: Option<PathBuf>,

    /// Emit a complete HTML page instead of a fragment
    #[arg(long)]
    standalone: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Key an imported file is stored under: its path relative to the entry
/// file's directory when possible, so D2 import paths resolve.
fn import_key(entry: &Path, import: &Path) -> String {
    let base = entry.parent().unwrap_or_else(|| Path::new(""));
    import
        .strip_prefix(base)
        .unwrap_or(import)
        .to_string_lossy()
        .replace('\\', "/")
}

fn entry_name(entry: &Path) -> String {
    entry
        .file_name()
        .map_or_else(|| "index.d2".to_string(), |name| name.to_string_lossy().into_owned())
}

fn load_imports(entry: &Path, imports: &[PathBuf]) -> Result<Option<FileSet>> {
    if imports.is_empty() {
        return Ok(None);
    }
    let mut files = FileSet::new();
    for import in imports {
        files.insert(import_key(entry, import), read_source(import)?);
    }
    Ok(Some(files))
}

/// Overlay `imports` on the file set the props already carry.
fn merge_files(base: Option<&FileSet>, imports: FileSet) -> FileSet {
    let mut files = base.cloned().unwrap_or_default();
    files.extend(imports);
    files
}

fn load_props(path: &Path) -> Result<DiagramProps> {
    let json = read_source(path)?;
    serde_json::from_str(&json).with_context(|| format!("Invalid props in {}", path.display()))
}

fn build_props(cli: &Cli, flags: &ConfigFlags) -> Result<DiagramProps> {
    let mut props = match &cli.props {
        Some(path) => load_props(path)?,
        None => DiagramProps::default(),
    };
    props.code = read_source(&cli.file)?;
    if let Some(imports) = load_imports(&cli.file, &cli.imports)? {
        props.fs = Some(merge_files(props.fs.as_ref(), imports));
        props.input_path = entry_name(&cli.file);
    }

    let mut props = flags.apply_to(props);
    if let Some(target) = &cli.target {
        props.target = Some(target.clone());
    }
    if let Some(interval) = cli.animate_interval {
        props.animate_interval = Some(interval);
    }
    if let Some(width) = &cli.width {
        props.width = Some(Dimension::parse_arg(width));
    }
    if let Some(height) = &cli.height {
        props.height = Some(Dimension::parse_arg(height));
    }
    if let Some(label) = &cli.aria_label {
        props.aria_label = label.clone();
    }
    Ok(props)
}

fn write_output(
    cli: &Cli,
    flags: &ConfigFlags,
    runtime: &DiagramRuntime<D2CliEngine>,
) -> Result<()> {
    let fragment = runtime.render_html(&Slots::default());
    let html = if flags.standalone {
        page(&entry_name(&cli.file), &fragment)
    } else {
        format!("{fragment}\n")
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote diagram");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

/// Messages that bring `current` up to date with the files on disk.
///
/// Without `--import` flags the file set from `--props` is left alone.
fn reload_messages(cli: &Cli, current: &DiagramProps) -> Result<Vec<Message>> {
    let mut messages = vec![Message::SetCode(read_source(&cli.file)?)];
    if let Some(imports) = load_imports(&cli.file, &cli.imports)? {
        let files = merge_files(current.fs.as_ref(), imports);
        messages.push(Message::SetFiles(Some(files)));
    }
    Ok(messages)
}

fn rerender(cli: &Cli, flags: &ConfigFlags, runtime: &mut DiagramRuntime<D2CliEngine>) -> Result<()> {
    for message in reload_messages(cli, runtime.props())? {
        runtime.send(message);
    }
    runtime.run_until_settled();
    write_output(cli, flags, runtime)
}

fn watch(cli: &Cli, flags: &ConfigFlags, runtime: &mut DiagramRuntime<D2CliEngine>) -> Result<()> {
    let mut paths = vec![cli.file.clone()];
    paths.extend(cli.imports.iter().cloned());
    let mut watcher = FileWatcher::new(&paths, WATCH_DEBOUNCE).context("Failed to watch sources")?;
    tracing::info!(file = %cli.file.display(), "watching for changes");

    loop {
        std::thread::sleep(WATCH_POLL);
        if !watcher.take_change_ready() {
            continue;
        }
        tracing::info!("source changed, re-rendering");
        if let Err(err) = rerender(cli, flags, runtime) {
            tracing::warn!(error = %format!("{err:#}"), "re-render failed");
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let props = build_props(&cli, &effective)?;
    let dark_mode = effective.appearance.unwrap_or(ThemeMode::Auto).dark_mode_context();
    let binary = effective.d2_bin.clone().unwrap_or_else(|| PathBuf::from("d2"));
    let mut runtime = DiagramRuntime::new(props, move || D2CliEngine::new(binary.clone()), &dark_mode);
    runtime.on_event(|event| match event {
        DiagramEvent::Compiled(svg) => tracing::info!(bytes = svg.len(), "diagram rendered"),
        DiagramEvent::Error(message) => tracing::error!(%message, "diagram failed"),
    });

    runtime.run_until_settled();
    write_output(&cli, &effective, &runtime)?;

    if effective.watch {
        return watch(&cli, &effective, &mut runtime);
    }
    if let Some(message) = runtime.model().error() {
        anyhow::bail!("{message}");
    }
    Ok(())
}
