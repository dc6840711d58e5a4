#![forbid(unsafe_code)]

//! Host page capabilities.
//!
//! The guide never touches a document directly. Everything it needs from the
//! host (element lookup, measurement, style application and event wiring) goes
//! through [`Page`]. Hosts are event-driven: when a listener registered via
//! [`Page::listen`] fires, the host delivers the paired [`GuideEvent`] to
//! [`Guide::handle_event`](crate::controller::Guide::handle_event).

use crate::geometry::{Rect, Viewport};
use crate::style::StyleMap;

/// Opaque identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// What a listener is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger<E> {
    /// Window `resize`.
    WindowResize,
    /// Window `scroll`.
    WindowScroll,
    /// `click` on an element.
    Click(E),
}

impl<E> Trigger<E> {
    /// Whether the listener lives on the window.
    #[must_use]
    pub const fn is_window(&self) -> bool {
        matches!(self, Self::WindowResize | Self::WindowScroll)
    }
}

/// Event delivered back to the guide when a listener fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideEvent {
    /// The window was resized.
    Resized,
    /// The window was scrolled.
    Scrolled,
    /// A `next` control was clicked.
    NextClicked,
    /// A `back` control was clicked.
    BackClicked,
    /// A `close` control was clicked.
    CloseClicked,
}

/// Host page capability.
///
/// Element handles are cheap clones compared by identity.
pub trait Page {
    /// Element handle.
    type Element: Clone + PartialEq + core::fmt::Debug;

    /// The document body, the default lookup scope.
    fn body(&self) -> Self::Element;

    /// Every element matching `selector`, in document order.
    fn select(&self, selector: &str) -> Vec<Self::Element>;

    /// Descendants of `root` carrying attribute `attr`, restricted to those
    /// whose value equals `value` when given. Document order.
    fn find_tagged(
        &self,
        root: &Self::Element,
        attr: &str,
        value: Option<&str>,
    ) -> Vec<Self::Element>;

    /// Attribute value of `el`.
    fn attribute(&self, el: &Self::Element, name: &str) -> Option<String>;

    /// Page offset plus inner (padding box) size. Measures hidden elements
    /// as if displayed.
    fn element_rect(&self, el: &Self::Element) -> Rect;

    /// Current scroll offsets and inner window size.
    fn viewport(&self) -> Viewport;

    /// Apply style properties to `el`.
    fn apply_style(&mut self, el: &Self::Element, style: &StyleMap);

    /// Drop inline style properties from `el`, reverting them to the
    /// stylesheet's values.
    fn clear_style(&mut self, el: &Self::Element, properties: &[&str]);

    /// Create the mask element, appended as the last child of `parent`.
    fn create_mask(&mut self, parent: &Self::Element) -> Self::Element;

    /// Detach `el` from the document.
    fn remove(&mut self, el: &Self::Element);

    /// Register a listener; the host delivers `event` whenever `trigger`
    /// fires.
    fn listen(&mut self, trigger: Trigger<Self::Element>, event: GuideEvent) -> ListenerId;

    /// Remove a listener previously returned by [`Page::listen`].
    fn unlisten(&mut self, id: ListenerId);

    /// Show an element (`display: block`).
    fn show(&mut self, el: &Self::Element) {
        self.apply_style(el, &StyleMap::new().with("display", "block"));
    }

    /// Hide an element (`display: none`).
    fn hide(&mut self, el: &Self::Element) {
        self.apply_style(el, &StyleMap::new().with("display", "none"));
    }
}
