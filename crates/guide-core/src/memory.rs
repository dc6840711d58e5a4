#![forbid(unsafe_code)]

//! In-memory [`Page`] for native hosts and tests.
//!
//! A tiny element tree with explicit rectangles, attributes and accumulated
//! styles. Layout is not computed: each element's page rectangle is whatever
//! the host set. Listeners are recorded and fired on demand; firing returns
//! the [`GuideEvent`]s the host should deliver, which keeps the page free of
//! references back to any guide.
//!
//! [`MemoryPage`] is a cheap shared handle, so a test can keep one clone for
//! inspection while a guide owns another.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::geometry::{Rect, Viewport};
use crate::page::{GuideEvent, ListenerId, Page, Trigger};
use crate::style::{StyleMap, StyleValue};

/// Element handle in a [`MemoryPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: BTreeMap<String, String>,
    rect: Rect,
    style: StyleMap,
}

#[derive(Debug, Clone)]
struct Listener {
    trigger: Trigger<NodeId>,
    event: GuideEvent,
}

#[derive(Debug)]
struct Document {
    nodes: Vec<Node>,
    viewport: Viewport,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener: u64,
    style_writes: usize,
}

impl Document {
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Descendants of `root` in document order, `root` excluded.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    fn is_connected(&self, mut id: NodeId) -> bool {
        loop {
            if id == BODY {
                return true;
            }
            match self.node(id).parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn matches(&self, id: NodeId, selector: &str) -> bool {
        let node = self.node(id);
        if let Some(want) = selector.strip_prefix('#') {
            node.attrs.get("id").is_some_and(|v| v == want)
        } else if let Some(want) = selector.strip_prefix('.') {
            node.attrs
                .get("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == want))
        } else {
            node.tag.eq_ignore_ascii_case(selector)
        }
    }
}

const BODY: NodeId = NodeId(0);

/// Shared in-memory page.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    doc: Rc<RefCell<Document>>,
}

impl MemoryPage {
    /// Empty page with an unscrolled viewport of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let body = Node {
            tag: "body".to_owned(),
            parent: None,
            children: Vec::new(),
            attrs: BTreeMap::new(),
            rect: Rect::new(0.0, 0.0, width, height),
            style: StyleMap::new(),
        };
        Self {
            doc: Rc::new(RefCell::new(Document {
                nodes: vec![body],
                viewport: Viewport::unscrolled(width, height),
                listeners: BTreeMap::new(),
                next_listener: 0,
                style_writes: 0,
            })),
        }
    }

    /// Append a `<div>` under `parent`.
    pub fn append(&self, parent: NodeId, rect: Rect, attrs: &[(&str, &str)]) -> NodeId {
        self.append_tag(parent, "div", rect, attrs)
    }

    /// Append an element with an explicit tag under `parent`.
    pub fn append_tag(
        &self,
        parent: NodeId,
        tag: &str,
        rect: Rect,
        attrs: &[(&str, &str)],
    ) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        let id = NodeId(doc.nodes.len());
        doc.nodes.push(Node {
            tag: tag.to_owned(),
            parent: Some(parent),
            children: Vec::new(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            rect,
            style: StyleMap::new(),
        });
        doc.node_mut(parent).children.push(id);
        id
    }

    /// Set an element's page rectangle.
    pub fn set_rect(&self, id: NodeId, rect: Rect) {
        self.doc.borrow_mut().node_mut(id).rect = rect;
    }

    /// Set an attribute.
    pub fn set_attr(&self, id: NodeId, name: &str, value: &str) {
        self.doc
            .borrow_mut()
            .node_mut(id)
            .attrs
            .insert(name.to_owned(), value.to_owned());
    }

    /// Replace the viewport.
    pub fn set_viewport(&self, viewport: Viewport) {
        self.doc.borrow_mut().viewport = viewport;
    }

    /// Scroll the viewport.
    pub fn scroll_to(&self, left: f64, top: f64) {
        let mut doc = self.doc.borrow_mut();
        doc.viewport.scroll_left = left;
        doc.viewport.scroll_top = top;
    }

    /// Resize the viewport.
    pub fn resize(&self, width: f64, height: f64) {
        let mut doc = self.doc.borrow_mut();
        doc.viewport.width = width;
        doc.viewport.height = height;
    }

    /// Current value of a style property.
    #[must_use]
    pub fn style(&self, id: NodeId, property: &str) -> Option<StyleValue> {
        self.doc.borrow().node(id).style.get(property).cloned()
    }

    /// Numeric value of a style property.
    #[must_use]
    pub fn style_number(&self, id: NodeId, property: &str) -> Option<f64> {
        self.style(id, property).as_ref().and_then(StyleValue::as_number)
    }

    /// Whether `display` is anything but `none`.
    #[must_use]
    pub fn is_displayed(&self, id: NodeId) -> bool {
        !matches!(self.style(id, "display"), Some(StyleValue::Text(ref d)) if d == "none")
    }

    /// Whether the element is still in the document.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.doc.borrow().is_connected(id)
    }

    /// Children of `id` in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.doc.borrow().node(id).children.clone()
    }

    /// Number of `apply_style` calls so far.
    #[must_use]
    pub fn style_writes(&self) -> usize {
        self.doc.borrow().style_writes
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.doc.borrow().listeners.len()
    }

    /// Number of live window-level listeners.
    #[must_use]
    pub fn window_listener_count(&self) -> usize {
        self.doc
            .borrow()
            .listeners
            .values()
            .filter(|l| l.trigger.is_window())
            .count()
    }

    /// Fire `trigger`, returning the events of every matching listener in
    /// registration order.
    #[must_use]
    pub fn fire(&self, trigger: &Trigger<NodeId>) -> Vec<GuideEvent> {
        self.doc
            .borrow()
            .listeners
            .values()
            .filter(|l| &l.trigger == trigger)
            .map(|l| l.event)
            .collect()
    }

    /// Fire a click on `id`.
    #[must_use]
    pub fn click(&self, id: NodeId) -> Vec<GuideEvent> {
        self.fire(&Trigger::Click(id))
    }
}

impl Page for MemoryPage {
    type Element = NodeId;

    fn body(&self) -> NodeId {
        BODY
    }

    fn select(&self, selector: &str) -> Vec<NodeId> {
        let doc = self.doc.borrow();
        let selector = selector.trim();
        let mut out: Vec<NodeId> = Vec::new();
        if doc.matches(BODY, selector) {
            out.push(BODY);
        }
        out.extend(
            doc.descendants(BODY)
                .into_iter()
                .filter(|id| doc.matches(*id, selector)),
        );
        out
    }

    fn find_tagged(&self, root: &NodeId, attr: &str, value: Option<&str>) -> Vec<NodeId> {
        let doc = self.doc.borrow();
        doc.descendants(*root)
            .into_iter()
            .filter(|id| match (doc.node(*id).attrs.get(attr), value) {
                (Some(found), Some(want)) => found == want,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .collect()
    }

    fn attribute(&self, el: &NodeId, name: &str) -> Option<String> {
        self.doc.borrow().node(*el).attrs.get(name).cloned()
    }

    fn element_rect(&self, el: &NodeId) -> Rect {
        self.doc.borrow().node(*el).rect
    }

    fn viewport(&self) -> Viewport {
        self.doc.borrow().viewport
    }

    fn apply_style(&mut self, el: &NodeId, style: &StyleMap) {
        let mut doc = self.doc.borrow_mut();
        doc.node_mut(*el).style.extend(style);
        doc.style_writes += 1;
    }

    fn clear_style(&mut self, el: &NodeId, properties: &[&str]) {
        let mut doc = self.doc.borrow_mut();
        let node = doc.node_mut(*el);
        for property in properties {
            node.style.remove(property);
        }
        doc.style_writes += 1;
    }

    fn create_mask(&mut self, parent: &NodeId) -> NodeId {
        self.append(*parent, Rect::default(), &[("class", "guide-mask")])
    }

    fn remove(&mut self, el: &NodeId) {
        let mut doc = self.doc.borrow_mut();
        if let Some(parent) = doc.node_mut(*el).parent.take() {
            doc.node_mut(parent).children.retain(|c| c != el);
        }
    }

    fn listen(&mut self, trigger: Trigger<NodeId>, event: GuideEvent) -> ListenerId {
        let mut doc = self.doc.borrow_mut();
        let id = ListenerId(doc.next_listener);
        doc.next_listener += 1;
        doc.listeners.insert(id, Listener { trigger, event });
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.doc.borrow_mut().listeners.remove(&id);
    }
}
