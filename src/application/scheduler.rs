// Scheduler - Owns every timer and listener task so teardown is one call
use std::fmt;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Why a refresh was issued. Only used for logging and scheduling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Initial,
    Timer,
    WindowFocus,
    CredentialChange,
    Manual,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshTrigger::Initial => "initial",
            RefreshTrigger::Timer => "timer",
            RefreshTrigger::WindowFocus => "focus",
            RefreshTrigger::CredentialChange => "credential",
            RefreshTrigger::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Collection of background tasks. Dropping it aborts them all.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!("Starting {} task", name);
        self.tasks.push((name, tokio::spawn(task)));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every registered task.
    pub fn shutdown(&mut self) {
        for (name, handle) in self.tasks.drain(..) {
            tracing::debug!("Stopping {} task", name);
            handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if !self.is_empty() {
            self.shutdown();
        }
    }
}

/// Broadcast of "the client regained focus" events.
#[derive(Clone)]
pub struct FocusSignal {
    tx: broadcast::Sender<()>,
}

impl Default for FocusSignal {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }
}

impl FocusSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        // No listener registered yet is fine
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}
