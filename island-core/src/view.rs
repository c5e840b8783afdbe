//! Minimal retained element tree the widget renders into.
//!
//! Elements carry a class name used for lookups, text, extra classes,
//! inline styles and event listeners. Events bubble from the target up
//! through its ancestors until a handler stops propagation.

use parking_lot::Mutex;
use std::{
    cell::Cell,
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PointerEnter,
    PointerLeave,
    Click,
}

pub struct Event {
    kind: EventKind,
    target: Element,
    stopped: Cell<bool>,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Element the event was dispatched on, not the one whose listener runs.
    pub fn target(&self) -> &Element {
        &self.target
    }

    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }
}

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

struct Node {
    name: String,
    id: Option<String>,
    text: String,
    classes: BTreeSet<String>,
    styles: BTreeMap<String, String>,
    children: Vec<Element>,
    parent: Weak<Mutex<Node>>,
    listeners: Vec<(u64, EventKind, Handler)>,
}

#[derive(Clone)]
pub struct Element {
    node: Arc<Mutex<Node>>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.lock();
        f.debug_struct("Element")
            .field("name", &node.name)
            .field("text", &node.text)
            .field("children", &node.children.len())
            .finish()
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            node: Arc::new(Mutex::new(Node {
                name: name.into(),
                id: None,
                text: String::new(),
                classes: BTreeSet::new(),
                styles: BTreeMap::new(),
                children: Vec::new(),
                parent: Weak::new(),
                listeners: Vec::new(),
            })),
        }
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.node.lock().id = Some(id.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn name(&self) -> String {
        self.node.lock().name.clone()
    }

    pub fn id(&self) -> Option<String> {
        self.node.lock().id.clone()
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Appends `child`, detaching it from any previous parent first.
    pub fn append(&self, child: &Element) {
        child.remove();
        child.node.lock().parent = Arc::downgrade(&self.node);
        self.node.lock().children.push(child.clone());
    }

    /// Creates a new child named `name` and returns it.
    pub fn append_new(&self, name: &str) -> Element {
        let child = Element::new(name);
        self.append(&child);
        child
    }

    /// Detaches this element from its parent. No-op for roots.
    pub fn remove(&self) {
        let parent = {
            let mut node = self.node.lock();
            let parent = node.parent.upgrade();
            node.parent = Weak::new();
            parent
        };
        if let Some(parent) = parent {
            parent.lock().children.retain(|c| !Arc::ptr_eq(&c.node, &self.node));
        }
    }

    pub fn parent(&self) -> Option<Element> {
        self.node.lock().parent.upgrade().map(|node| Element { node })
    }

    pub fn children(&self) -> Vec<Element> {
        self.node.lock().children.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.parent().is_some()
    }

    /// First descendant (depth-first, excluding `self`) named `name`.
    pub fn find(&self, name: &str) -> Option<Element> {
        self.find_where(&|node: &Node| node.name == name)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Element> {
        self.find_where(&|node: &Node| node.id.as_deref() == Some(id))
    }

    fn find_where(&self, predicate: &dyn Fn(&Node) -> bool) -> Option<Element> {
        for child in self.children() {
            if predicate(&child.node.lock()) {
                return Some(child);
            }
            if let Some(found) = child.find_where(predicate) {
                return Some(found);
            }
        }
        None
    }

    pub fn text(&self) -> String {
        self.node.lock().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.node.lock().text = text.into();
    }

    pub fn add_class(&self, class: &str) {
        self.node.lock().classes.insert(class.to_string());
    }

    pub fn remove_class(&self, class: &str) {
        self.node.lock().classes.remove(class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node.lock().classes.contains(class)
    }

    pub fn set_style(&self, property: &str, value: impl Into<String>) {
        self.node.lock().styles.insert(property.to_string(), value.into());
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.node.lock().styles.get(property).cloned()
    }

    /// Registers `handler` for `kind`. The listener stays until disposed.
    pub fn on(&self, kind: EventKind, handler: impl Fn(&Event) + Send + Sync + 'static) -> Listener {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        let handler: Handler = Arc::new(handler);
        self.node.lock().listeners.push((id, kind, handler));
        Listener { node: Arc::downgrade(&self.node), id }
    }

    pub fn listener_count(&self) -> usize {
        self.node.lock().listeners.len()
    }

    /// Dispatches `kind` on this element, bubbling to its ancestors.
    pub fn dispatch(&self, kind: EventKind) {
        let event = Event { kind, target: self.clone(), stopped: Cell::new(false) };
        let mut current = Some(self.clone());

        while let Some(element) = current {
            // Handlers may touch the tree, so none may run under the lock.
            let handlers: Vec<Handler> = element
                .node
                .lock()
                .listeners
                .iter()
                .filter(|(_, k, _)| *k == kind)
                .map(|(_, _, h)| h.clone())
                .collect();

            for handler in handlers {
                handler(&event);
            }

            if event.stopped.get() {
                break;
            }
            current = element.parent();
        }
    }
}

/// Disposer returned by [`Element::on`].
#[must_use = "a dropped Listener can no longer be detached"]
#[derive(Debug)]
pub struct Listener {
    node: Weak<Mutex<Node>>,
    id: u64,
}

impl Listener {
    pub fn dispose(self) {
        if let Some(node) = self.node.upgrade() {
            node.lock().listeners.retain(|(id, _, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&Event) + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        (hits, move |_: &Event| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn find_searches_descendants_depth_first() {
        let root = Element::new("body");
        let panel = root.append_new("panel");
        let value = panel.append_new("value");
        root.append_new("value");

        assert!(root.find("value").unwrap().ptr_eq(&value));
        assert!(root.find("missing").is_none());
        assert!(panel.find("panel").is_none());
    }

    #[test]
    fn remove_detaches_from_parent() {
        let root = Element::new("body");
        let child = root.append_new("child");

        child.remove();

        assert!(root.children().is_empty());
        assert!(!child.is_attached());
        child.remove();
    }

    #[test]
    fn events_bubble_to_ancestors() {
        let root = Element::new("backdrop");
        let content = root.append_new("content");
        let (hits, handler) = counter();
        let _listener = root.on(EventKind::Click, handler);

        content.dispatch(EventKind::Click);
        root.dispatch(EventKind::Click);
        root.dispatch(EventKind::PointerEnter);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stop_propagation_halts_bubbling() {
        let root = Element::new("backdrop");
        let content = root.append_new("content");
        let (hits, handler) = counter();
        let _outer = root.on(EventKind::Click, handler);
        let _inner = content.on(EventKind::Click, |e| e.stop_propagation());

        content.dispatch(EventKind::Click);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn target_is_the_dispatching_element() {
        let root = Element::new("backdrop");
        let content = root.append_new("content");
        let matched = Arc::new(AtomicUsize::new(0));
        let seen = matched.clone();
        let backdrop = root.clone();
        let _listener = root.on(EventKind::Click, move |e| {
            if e.target().ptr_eq(&backdrop) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        content.dispatch(EventKind::Click);
        root.dispatch(EventKind::Click);

        assert_eq!(matched.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disposed_listener_no_longer_fires() {
        let el = Element::new("circle");
        let (hits, handler) = counter();
        let listener = el.on(EventKind::Click, handler);

        listener.dispose();
        el.dispatch(EventKind::Click);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(el.listener_count(), 0);
    }

    #[test]
    fn handlers_may_mutate_the_tree() {
        let root = Element::new("circle");
        let details = root.append_new("details");
        let target = details.clone();
        let _listener = root.on(EventKind::PointerEnter, move |_| target.add_class("active"));

        root.dispatch(EventKind::PointerEnter);

        assert!(details.has_class("active"));
    }
}
