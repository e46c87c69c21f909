//! Source watching for live re-rendering.
//!
//! A diagram is its entry file plus any files it imports, so the watcher
//! follows a set of paths and reports one debounced change for all of them.
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

struct Target {
    path: PathBuf,
    name: Option<OsString>,
}

/// Watches a set of files and emits debounced change notifications.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    roots: BTreeSet<PathBuf>,
    targets: Vec<Target>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("roots", &self.roots)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Create a watcher for every path in `paths`.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or a directory
    /// cannot be watched.
    pub fn new<P: AsRef<Path>>(paths: &[P], debounce: Duration) -> notify::Result<Self> {
        // Event paths from the OS are canonical, so ours must be too.
        let targets = paths
            .iter()
            .map(|path| {
                let path = path
                    .as_ref()
                    .canonicalize()
                    .unwrap_or_else(|_| path.as_ref().to_path_buf());
                let name = path.file_name().map(std::ffi::OsStr::to_os_string);
                Target { path, name }
            })
            .collect::<Vec<_>>();
        let roots = targets
            .iter()
            .map(|target| watch_root_for(&target.path))
            .collect::<BTreeSet<_>>();

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        for root in &roots {
            watcher.watch(root, RecursiveMode::NonRecursive)?;
        }
        tracing::debug!(files = targets.len(), roots = roots.len(), "watching diagram sources");

        Ok(Self {
            _watcher: watcher,
            rx,
            roots,
            targets,
            debounce,
            pending_since: None,
        })
    }

    /// Canonical paths of the watched files.
    pub fn target_paths(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(|target| target.path.as_path())
    }

    /// Returns true once a debounced change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => {
                    saw_relevant_event = true;
                }
                Ok(ev) => {
                    tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "ignoring unrelated change");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                }
            }
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    /// Many backends report the directory rather than the file, so a
    /// directory event counts as a change to everything in it.
    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            self.roots.contains(path)
                || self.targets.iter().any(|target| {
                    path == &target.path
                        || target
                            .name
                            .as_ref()
                            .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
                })
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
