//! Realm - one document and everything observing it
//!
//! Owns the document, the observer engine, the delivery scheduler and task
//! queue, and the custom element state. Tree edits that should be observable
//! go through the realm, which forwards each low-level edit to the observer
//! engine as it happens.

use fos_dom::{Document, DomResult, DomTree, NodeId, TreeAccess, TreeEdit};

use crate::bootstrap::Readiness;
use crate::config::RealmConfig;
use crate::elements::CustomElements;
use crate::error::{CallbackSource, UnhandledError};
use crate::observer::ObserverEngine;
use crate::scheduler::{DeliveryScheduler, TaskQueue, TickStrategy};

/// Document realm
pub struct Realm {
    pub(crate) document: Document,
    pub(crate) observers: ObserverEngine,
    pub(crate) scheduler: DeliveryScheduler,
    pub(crate) tasks: TaskQueue,
    pub(crate) elements: CustomElements,
    pub(crate) readiness: Readiness,
    pub(crate) config: RealmConfig,
    errors: Vec<UnhandledError>,
}

impl Realm {
    /// Create a realm with a fresh `html > head, body` document
    pub fn new(config: RealmConfig) -> Self {
        let strategy = TickStrategy::detect(&config.capabilities);
        tracing::info!("realm for {} initialized ({:?} ticks)", config.url, strategy);

        let mut realm = Self {
            document: Document::new(&config.url),
            observers: ObserverEngine::new(),
            scheduler: DeliveryScheduler::new(strategy),
            tasks: TaskQueue::new(),
            elements: CustomElements::new(),
            readiness: Readiness::default(),
            config,
            errors: Vec::new(),
        };
        if realm.config.eager {
            realm.bootstrap();
        }
        realm
    }

    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Read access to the tree
    pub fn tree(&self) -> &DomTree {
        &self.document.tree
    }

    pub fn scheduler(&self) -> &DeliveryScheduler {
        &self.scheduler
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.document.tree.create_element(tag)
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.document.tree.create_text(content)
    }

    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.document.tree.create_comment(content)
    }

    /// Create a detached sub-document
    pub fn create_document(&mut self) -> NodeId {
        self.document.tree.create_document()
    }

    // ------------------------------------------------------------------
    // Observable edits
    // ------------------------------------------------------------------

    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let edits = self.document.tree.append_child(parent, child)?;
        self.notify_all(&edits);
        Ok(())
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<()> {
        let edits = self.document.tree.insert_before(parent, child, reference)?;
        self.notify_all(&edits);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let edit = self.document.tree.remove_child(parent, child)?;
        self.notify(&edit);
        Ok(())
    }

    /// Set an attribute, reporting to `attributeChanged` when the value
    /// changes on an upgraded element
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<()> {
        let edit = self.document.tree.set_attribute(element, name, value)?;
        self.attribute_edit(element, edit, Some(value));
        Ok(())
    }

    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        name: &str,
        value: &str,
    ) -> DomResult<()> {
        let edit = self.document.tree.set_attribute_ns(element, namespace, name, value)?;
        self.attribute_edit(element, edit, Some(value));
        Ok(())
    }

    /// Remove an attribute; removing an absent attribute changes nothing
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> DomResult<()> {
        if let Some(edit) = self.document.tree.remove_attribute(element, name)? {
            self.attribute_edit(element, edit, None);
        }
        Ok(())
    }

    pub fn remove_attribute_ns(&mut self, element: NodeId, namespace: Option<&str>, name: &str) -> DomResult<()> {
        if let Some(edit) = self.document.tree.remove_attribute_ns(element, namespace, name)? {
            self.attribute_edit(element, edit, None);
        }
        Ok(())
    }

    fn attribute_edit(&mut self, element: NodeId, edit: TreeEdit, new_value: Option<&str>) {
        self.notify(&edit);
        if let TreeEdit::Attribute { name, old_value, .. } = edit {
            self.attribute_changed(element, &name, old_value, new_value.map(str::to_string));
        }
    }

    pub fn get_attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.document.tree.get_attribute(element, name)
    }

    /// Replace the data of a text or comment node
    pub fn set_text(&mut self, node: NodeId, content: &str) -> DomResult<()> {
        let edit = self.document.tree.set_text(node, content)?;
        self.notify(&edit);
        Ok(())
    }

    /// Attach a shadow root; after bootstrap it is watched for upgrades
    pub fn attach_shadow(&mut self, host: NodeId) -> DomResult<NodeId> {
        let root = self.document.tree.attach_shadow(host)?;
        if self.is_bootstrapped() {
            self.watch_root(root);
        }
        Ok(root)
    }

    /// Load `document` as the import of `link`; after bootstrap its
    /// elements are upgraded right away
    pub fn link_import(&mut self, link: NodeId, document: NodeId) -> DomResult<()> {
        self.document.tree.set_import(link, document)?;
        if self.is_bootstrapped() {
            self.upgrade_document_tree(document);
        }
        Ok(())
    }

    fn notify_all(&mut self, edits: &[TreeEdit]) {
        for edit in edits {
            self.notify(edit);
        }
    }

    fn notify(&mut self, edit: &TreeEdit) {
        let woken = self.observers.notify(&self.document.tree, edit);
        for observer in woken {
            self.schedule_delivery(observer);
        }
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Run the oldest queued task; false when the queue is empty
    pub fn run_next_task(&mut self) -> bool {
        let Some(task) = self.tasks.pop() else {
            return false;
        };
        tracing::trace!("running task {:?} '{}' ({:?})", task.id, task.label, task.source);
        (task.run)(self);
        true
    }

    /// Run tasks until the queue is empty, returning how many ran
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while self.run_next_task() {
            ran += 1;
        }
        ran
    }

    /// Run at most `limit` tasks, returning how many ran
    pub fn run_tasks(&mut self, limit: usize) -> usize {
        let mut ran = 0;
        while ran < limit && self.run_next_task() {
            ran += 1;
        }
        ran
    }

    /// Number of queued tasks
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    // ------------------------------------------------------------------
    // Unhandled errors
    // ------------------------------------------------------------------

    pub(crate) fn report_error(&mut self, source: CallbackSource, error: anyhow::Error) {
        tracing::error!("unhandled error in {:?} callback: {:#}", source, error);
        self.errors.push(UnhandledError { source, error });
    }

    /// Drain the callback failures reported so far
    pub fn take_unhandled_errors(&mut self) -> Vec<UnhandledError> {
        std::mem::take(&mut self.errors)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new(RealmConfig::default())
    }
}

impl TreeAccess for Realm {
    fn tree(&self) -> &DomTree {
        &self.document.tree
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("url", &self.config.url)
            .field("observers", &self.observers)
            .field("scheduler", &self.scheduler)
            .field("tasks", &self.tasks)
            .field("elements", &self.elements.registry.len())
            .field("readiness", &self.readiness)
            .field("errors", &self.errors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostCapabilities;

    #[test]
    fn test_new_realm() {
        let realm = Realm::default();
        assert_eq!(realm.document().url(), "about:blank");
        assert!(realm.tree().is_connected(realm.document().body()));
        assert_eq!(realm.scheduler().strategy(), TickStrategy::Timer);
        assert_eq!(realm.pending_tasks(), 0);
    }

    #[test]
    fn test_strategy_from_capabilities() {
        let config = RealmConfig {
            capabilities: HostCapabilities {
                immediate_callbacks: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(Realm::new(config).scheduler().strategy(), TickStrategy::Immediate);
    }

    #[test]
    fn test_edit_errors_propagate() {
        let mut realm = Realm::default();
        let text = realm.create_text("x");
        assert!(realm.set_attribute(text, "a", "b").is_err());
        let el = realm.create_element("div");
        assert!(realm.set_text(el, "x").is_err());
        assert!(realm.remove_attribute(el, "missing").is_ok());
    }

    #[test]
    fn test_run_tasks_limit() {
        let mut realm = Realm::default();
        for label in ["a", "b", "c"] {
            realm.tasks.push(TickStrategy::Timer, label, Box::new(|_| {}));
        }
        assert_eq!(realm.run_tasks(2), 2);
        assert_eq!(realm.pending_tasks(), 1);
        assert_eq!(realm.run_until_idle(), 1);
        assert!(!realm.run_next_task());
    }

    #[test]
    fn test_eager_bootstrap() {
        let config = RealmConfig { eager: true, ..Default::default() };
        let mut realm = Realm::new(config);
        assert!(realm.is_ready());
        assert!(realm.is_watched(NodeId::ROOT));
        realm.run_until_idle();
        assert!(realm.ready_fired());
    }

    #[test]
    fn test_shadow_roots_watched_after_bootstrap() {
        let mut realm = Realm::default();
        let host = realm.create_element("div");
        let early = realm.attach_shadow(host).unwrap();
        assert!(!realm.is_watched(early));

        realm.set_ready_state(crate::ReadyState::Interactive);
        let late = realm.attach_shadow(host).unwrap();
        assert!(realm.is_watched(late));
    }
}
