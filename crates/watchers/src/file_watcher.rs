// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem condition watching, polling-based

use crate::{FileError, Handler};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, ErrorKind, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// The kind of filesystem change a condition is watching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOperation {
    Create,
    Remove,
    Rename,
    Update,
}

/// A registered condition: a path, the operation to watch for on it, and
/// (for directories) whether nested subdirectories should be covered too.
#[derive(Debug, Clone)]
pub struct FileCondition {
    pub path: PathBuf,
    pub operation: FileOperation,
    pub recursive: bool,
}

struct FileEntry {
    path: PathBuf,
    dir: bool,
    op: FileOperation,
    handler: Handler,
}

impl FileEntry {
    /// A path fires a match only against its direct parent entry — there is
    /// no "ancestor" matching. Recursive coverage of a directory tree comes
    /// from registering an entry per discovered subdirectory, not from
    /// relaxing this rule.
    fn matches(&self, op: FileOperation, path: &Path, old_path: Option<&Path>) -> bool {
        if op != self.op {
            return false;
        }
        if path == self.path {
            return true;
        }
        if self.op == FileOperation::Rename {
            if let Some(old_path) = old_path {
                if old_path == self.path {
                    return true;
                }
            }
        }
        if self.dir && path.parent() == Some(self.path.as_path()) {
            return true;
        }
        false
    }
}

/// Default interval at which the underlying poll watcher rescans watched
/// paths for changes. Chosen to match the daemon's general condition
/// granularity rather than anything filesystem-specific.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

type ClassifiedEvent = (FileOperation, PathBuf, Option<PathBuf>);

/// Watches the filesystem by polling, dispatching registered handlers when
/// a matching event is observed.
pub struct FileWatcher {
    running: Mutex<bool>,
    entries: Mutex<Vec<FileEntry>>,
    watcher: Mutex<Option<PollWatcher>>,
    poll_interval: Duration,
    event_tx: mpsc::Sender<ClassifiedEvent>,
    event_rx: Mutex<Option<mpsc::Receiver<ClassifiedEvent>>>,
    /// Carries unrecoverable backend errors out of the poll callback; kept
    /// alive for the watcher's lifetime so `run`'s receiver never observes
    /// a spurious sender-dropped close.
    failure_tx: mpsc::Sender<notify::Error>,
    failure_rx: Mutex<Option<mpsc::Receiver<notify::Error>>>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
    done_rx: Mutex<Option<oneshot::Receiver<()>>>,
    /// Roots registered with `recursive: true`, kept around so the run loop
    /// can extend coverage to subdirectories created after registration —
    /// the ones `discover_subdirectories` couldn't have seen yet.
    recursive_roots: Mutex<Vec<(PathBuf, FileOperation, Handler)>>,
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FileWatcher {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (failure_tx, failure_rx) = mpsc::channel(1);
        Self {
            running: Mutex::new(false),
            entries: Mutex::new(Vec::new()),
            watcher: Mutex::new(None),
            poll_interval,
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
            failure_tx,
            failure_rx: Mutex::new(Some(failure_rx)),
            close_tx: Mutex::new(None),
            done_rx: Mutex::new(None),
            recursive_roots: Mutex::new(Vec::new()),
        }
    }

    /// Registers `handler` to fire when `condition` is satisfied.
    ///
    /// Watching for the creation of a path that already exists as a regular
    /// file is rejected — that condition can never fire. Watching a
    /// directory recursively walks its current subdirectories and registers
    /// an entry (and an underlying watch) for each, so nested changes are
    /// still matched by the direct-child rule above; subdirectories created
    /// later are picked up as they're discovered, by `extend_recursive_coverage`.
    pub fn handle_func(
        &self,
        condition: &FileCondition,
        handler: Handler,
    ) -> Result<(), FileError> {
        let path = resolve_path(&condition.path);
        let meta = std::fs::metadata(&path).ok();
        let is_dir = meta.as_ref().map(|m| m.is_dir()).unwrap_or(false);

        if meta.is_some() && !is_dir && condition.operation == FileOperation::Create {
            return Err(FileError::WatchCreateExistingFile);
        }

        self.ensure_watcher()?;
        self.register_path(&path, is_dir, condition.operation, handler.clone())?;

        if is_dir && condition.recursive {
            for sub in discover_subdirectories(&path) {
                self.register_path(&sub, true, condition.operation, handler.clone())?;
            }
            self.recursive_roots
                .lock()
                .push((path, condition.operation, handler));
        }

        Ok(())
    }

    /// Called for every `Create` event observed by the run loop. If the
    /// created path is itself a directory nested under a recursive root,
    /// registers it the same way `handle_func`'s initial walk would have,
    /// so a directory created after registration still gets its own watch
    /// and its own direct-child-matching entry.
    fn extend_recursive_coverage(&self, path: &Path) {
        let Ok(meta) = std::fs::metadata(path) else {
            return;
        };
        if !meta.is_dir() {
            return;
        }
        let roots = self.recursive_roots.lock().clone();
        for (root, op, handler) in roots {
            if path != root.as_path() && path.starts_with(&root) {
                let _ = self.register_path(path, true, op, handler);
            }
        }
    }

    fn ensure_watcher(&self) -> Result<(), FileError> {
        let mut guard = self.watcher.lock();
        if guard.is_some() {
            return Ok(());
        }
        let tx = self.event_tx.clone();
        let failure_tx = self.failure_tx.clone();
        let config = Config::default().with_poll_interval(self.poll_interval);
        let watcher = PollWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for classified in classify(&event) {
                        let _ = tx.blocking_send(classified);
                    }
                }
                Err(e) if backend_is_unrecoverable(&e.kind) => {
                    tracing::error!(error = %e, "file watcher backend reported an unrecoverable error");
                    let _ = failure_tx.blocking_send(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transient error from file watcher poll, continuing");
                }
            },
            config,
        )?;
        *guard = Some(watcher);
        Ok(())
    }

    fn register_path(
        &self,
        path: &Path,
        is_dir: bool,
        op: FileOperation,
        handler: Handler,
    ) -> Result<(), FileError> {
        if let Some(watcher) = self.watcher.lock().as_mut() {
            watcher.watch(path, RecursiveMode::NonRecursive)?;
        }
        self.entries.lock().push(FileEntry {
            path: path.to_path_buf(),
            dir: is_dir,
            op,
            handler,
        });
        Ok(())
    }

    /// Runs until [`stop`](Self::stop) is called, dispatching handlers for
    /// matching events as they are observed.
    pub async fn run(&self) -> Result<(), FileError> {
        let (mut event_rx, mut failure_rx) = {
            let mut running = self.running.lock();
            if *running {
                return Err(FileError::AlreadyRunning);
            }
            let event_rx = self
                .event_rx
                .lock()
                .take()
                .expect("run invoked twice without observing AlreadyRunning");
            let failure_rx = self
                .failure_rx
                .lock()
                .take()
                .expect("run invoked twice without observing AlreadyRunning");
            *running = true;
            (event_rx, failure_rx)
        };

        let (close_tx, mut close_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        *self.close_tx.lock() = Some(close_tx);
        *self.done_rx.lock() = Some(done_rx);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut close_rx => break Ok(()),
                failure = failure_rx.recv() => {
                    if let Some(e) = failure {
                        break Err(FileError::BackendFailed(e));
                    }
                }
                fired = event_rx.recv() => {
                    match fired {
                        Some((op, path, old_path)) => {
                            {
                                let entries = self.entries.lock();
                                for entry in entries.iter() {
                                    if entry.matches(op, &path, old_path.as_deref()) {
                                        let handler = entry.handler.clone();
                                        tokio::spawn(async move { (handler)().await; });
                                    }
                                }
                            }
                            if op == FileOperation::Create {
                                self.extend_recursive_coverage(&path);
                            }
                        }
                        None => break Ok(()),
                    }
                }
            }
        };

        let _ = done_tx.send(());
        *self.running.lock() = false;
        outcome
    }

    /// Signals the run loop to stop and waits for it to finish, bounded by
    /// `deadline`. Returns an error if the watcher was never started, or had
    /// already been stopped.
    pub async fn stop(&self, deadline: Duration) -> Result<(), FileError> {
        let close_tx = self.close_tx.lock().take();
        let Some(close_tx) = close_tx else {
            return Err(FileError::AlreadyClosed);
        };
        let _ = close_tx.send(());

        let done_rx = self.done_rx.lock().take();
        if let Some(done_rx) = done_rx {
            let _ = tokio::time::timeout(deadline, done_rx).await;
        }
        Ok(())
    }
}

fn classify(event: &Event) -> Vec<ClassifiedEvent> {
    match &event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .map(|p| (FileOperation::Create, p.clone(), None))
            .collect(),
        EventKind::Remove(_) => event
            .paths
            .iter()
            .map(|p| (FileOperation::Remove, p.clone(), None))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            vec![(
                FileOperation::Rename,
                event.paths[1].clone(),
                Some(event.paths[0].clone()),
            )]
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| (FileOperation::Rename, p.clone(), None))
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .map(|p| (FileOperation::Update, p.clone(), None))
            .collect(),
        _ => Vec::new(),
    }
}

/// Resolves a registered path to an absolute form before it's stored or
/// handed to the underlying watcher. Existing paths are canonicalized
/// (resolving `.`/`..` and symlinks); a path that doesn't exist yet (the
/// target of a `create` watch) can't be canonicalized, so it's just made
/// absolute against the current directory.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Distinguishes a backend condition the watcher can't recover from (the
/// poll thread itself is unusable) from a one-off error on a single poll.
fn backend_is_unrecoverable(kind: &ErrorKind) -> bool {
    matches!(kind, ErrorKind::MaxFilesWatch | ErrorKind::Generic(_))
}

fn discover_subdirectories(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(read_dir) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.is_dir() {
                found.push(path.clone());
                stack.push(path);
            }
        }
    }
    found
}

#[cfg(test)]
#[path = "file_watcher_tests.rs"]
mod tests;
