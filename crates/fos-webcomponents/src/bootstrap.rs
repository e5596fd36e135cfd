//! Document readiness
//!
//! The initial full-document upgrade sweep waits for the document to leave
//! the loading state. Once it has run, the realm is ready and its ready
//! listeners fire exactly once, from a queued task.

use fos_dom::NodeId;

use crate::error::CallbackSource;
use crate::Realm;

/// Document loading state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}

/// Ready listener
pub type ReadyListener = Box<dyn FnOnce(&mut Realm) -> anyhow::Result<()>>;

#[derive(Default)]
pub(crate) struct Readiness {
    state: ReadyState,
    bootstrapped: bool,
    ready: bool,
    fired: bool,
    listeners: Vec<ReadyListener>,
}

impl std::fmt::Debug for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readiness")
            .field("state", &self.state)
            .field("ready", &self.ready)
            .field("fired", &self.fired)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Realm {
    pub fn ready_state(&self) -> ReadyState {
        self.readiness.state
    }

    /// Advance the document's loading state.
    ///
    /// Leaving `Loading` bootstraps the realm. The state never goes back.
    pub fn set_ready_state(&mut self, state: ReadyState) {
        if state < self.readiness.state {
            tracing::warn!("ignoring ready state {:?} after {:?}", state, self.readiness.state);
            return;
        }
        self.readiness.state = state;
        if state != ReadyState::Loading {
            self.bootstrap();
        }
    }

    /// Whether the initial upgrade sweep has completed
    pub fn is_ready(&self) -> bool {
        self.readiness.ready
    }

    pub(crate) fn is_bootstrapped(&self) -> bool {
        self.readiness.bootstrapped
    }

    /// Whether the ready listeners have run
    pub fn ready_fired(&self) -> bool {
        self.readiness.fired
    }

    /// Add a ready listener.
    ///
    /// Returns false, dropping the listener, when the ready event already
    /// fired.
    pub fn on_ready<F>(&mut self, listener: F) -> bool
    where
        F: FnOnce(&mut Realm) -> anyhow::Result<()> + 'static,
    {
        if self.readiness.fired {
            tracing::debug!("ready already fired, listener dropped");
            return false;
        }
        self.readiness.listeners.push(Box::new(listener));
        true
    }

    /// Run the initial sweep once and queue the ready event
    pub(crate) fn bootstrap(&mut self) {
        if self.readiness.bootstrapped {
            return;
        }
        self.readiness.bootstrapped = true;
        tracing::info!("bootstrapping custom elements for {}", self.document.url());

        self.upgrade_document_tree(NodeId::ROOT);
        self.readiness.ready = true;

        let strategy = self.scheduler.strategy();
        self.tasks.push(strategy, "ready", Box::new(|realm: &mut Realm| realm.fire_ready()));
    }

    fn fire_ready(&mut self) {
        if self.readiness.fired {
            return;
        }
        self.readiness.fired = true;
        let listeners = std::mem::take(&mut self.readiness.listeners);
        tracing::info!("ready, notifying {} listeners", listeners.len());
        for listener in listeners {
            if let Err(error) = listener(self) {
                self.report_error(CallbackSource::Ready, error);
            }
        }
    }
}
