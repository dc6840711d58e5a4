#![forbid(unsafe_code)]

//! [`Page`] over the browser DOM.
//!
//! Only compiled on `wasm32` targets. Listeners wrap a delivery callback in a
//! `Closure`. A click handler may dispose the guide, and so unlisten itself,
//! while it runs; removed closures are therefore retired and only dropped
//! once no listener is executing.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use guide_core::{GuideEvent, ListenerId, Page, Rect, StyleMap, Trigger, Viewport};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CssStyleDeclaration, Document, Element, EventTarget, HtmlElement, Window};

/// Callback receiving events raised by registered listeners.
pub type Deliver = Rc<dyn Fn(GuideEvent)>;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// Live document page.
pub struct DomPage {
    window: Window,
    document: Document,
    body: Element,
    deliver: Deliver,
    listeners: BTreeMap<ListenerId, Listener>,
    retired: Vec<Closure<dyn FnMut(web_sys::Event)>>,
    /// Listener bodies currently on the stack.
    running: Rc<Cell<usize>>,
    next_listener: u64,
}

impl core::fmt::Debug for DomPage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomPage")
            .field("listeners", &self.listeners.len())
            .field("retired", &self.retired.len())
            .finish_non_exhaustive()
    }
}

impl DomPage {
    /// Page over the global window. Fails outside a browsing context.
    pub fn new(deliver: Deliver) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        let body: Element = match document.body() {
            Some(body) => body.into(),
            None => document
                .document_element()
                .ok_or_else(|| JsValue::from_str("document has no root element"))?,
        };
        Ok(Self {
            window,
            document,
            body,
            deliver,
            listeners: BTreeMap::new(),
            retired: Vec::new(),
            running: Rc::new(Cell::new(0)),
            next_listener: 0,
        })
    }

    fn window_number(value: Result<JsValue, JsValue>) -> f64 {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    }

    fn computed_style(&self, el: &Element) -> Option<CssStyleDeclaration> {
        self.window.get_computed_style(el).ok().flatten()
    }

    /// Page offset plus padding-box size of a rendered element.
    ///
    /// Sizes come from the border box less the computed border widths, which
    /// also holds for inline boxes (their client size is always zero).
    fn measure(&self, el: &Element) -> Rect {
        let bounds = el.get_bounding_client_rect();
        let (border_x, border_y) = match self.computed_style(el) {
            Some(style) => (
                pixels(&style, "border-left-width") + pixels(&style, "border-right-width"),
                pixels(&style, "border-top-width") + pixels(&style, "border-bottom-width"),
            ),
            None => (0.0, 0.0),
        };
        Rect::new(
            bounds.left() + self.window.scroll_x().unwrap_or(0.0),
            bounds.top() + self.window.scroll_y().unwrap_or(0.0),
            (bounds.width() - border_x).max(0.0),
            (bounds.height() - border_y).max(0.0),
        )
    }

    fn is_display_none(&self, el: &Element) -> bool {
        self.computed_style(el)
            .and_then(|style| style.get_property_value("display").ok())
            .is_some_and(|display| display == "none")
    }

    fn drop_retired(&mut self) {
        if self.running.get() == 0 {
            self.retired.clear();
        }
    }
}

/// A computed length in pixels; anything unparsable counts as zero.
fn pixels(style: &CssStyleDeclaration, property: &str) -> f64 {
    style
        .get_property_value(property)
        .ok()
        .and_then(|v| v.trim().trim_end_matches("px").parse().ok())
        .unwrap_or(0.0)
}

fn collect_elements(list: &web_sys::NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl Page for DomPage {
    type Element = Element;

    fn body(&self) -> Element {
        self.body.clone()
    }

    fn select(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => collect_elements(&list),
            Err(_) => {
                tracing::warn!(selector, "invalid selector");
                Vec::new()
            }
        }
    }

    fn find_tagged(&self, root: &Element, attr: &str, value: Option<&str>) -> Vec<Element> {
        let Ok(list) = root.query_selector_all(&format!("[{attr}]")) else {
            tracing::warn!(attr, "invalid attribute name");
            return Vec::new();
        };
        let mut found = collect_elements(&list);
        if let Some(value) = value {
            found.retain(|el| el.get_attribute(attr).as_deref() == Some(value));
        }
        found
    }

    fn attribute(&self, el: &Element, name: &str) -> Option<String> {
        el.get_attribute(name)
    }

    fn element_rect(&self, el: &Element) -> Rect {
        if !self.is_display_none(el) {
            return self.measure(el);
        }
        let Some(html) = el.dyn_ref::<HtmlElement>() else {
            return self.measure(el);
        };
        // Hidden elements measure as zero; lay them out invisibly for a moment.
        let style = html.style();
        let saved: Vec<(&str, String)> = ["display", "visibility"]
            .into_iter()
            .map(|p| (p, style.get_property_value(p).unwrap_or_default()))
            .collect();
        let _ = style.set_property("display", "block");
        let _ = style.set_property("visibility", "hidden");
        let measured = self.measure(el);
        for (property, value) in saved {
            if value.is_empty() {
                let _ = style.remove_property(property);
            } else {
                let _ = style.set_property(property, &value);
            }
        }
        measured
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(
            self.window.scroll_x().unwrap_or(0.0),
            self.window.scroll_y().unwrap_or(0.0),
            Self::window_number(self.window.inner_width()),
            Self::window_number(self.window.inner_height()),
        )
    }

    fn apply_style(&mut self, el: &Element, style: &StyleMap) {
        let Some(html) = el.dyn_ref::<HtmlElement>() else {
            tracing::debug!("style skipped on non-html element");
            return;
        };
        let declaration = html.style();
        for (property, value) in style.css_pairs() {
            if declaration.set_property(property, &value).is_err() {
                tracing::debug!(property, value = %value, "style property rejected");
            }
        }
    }

    fn clear_style(&mut self, el: &Element, properties: &[&str]) {
        let Some(html) = el.dyn_ref::<HtmlElement>() else {
            return;
        };
        let declaration = html.style();
        for property in properties {
            let _ = declaration.remove_property(property);
        }
    }

    fn create_mask(&mut self, parent: &Element) -> Element {
        let mask = match self.document.create_element("div") {
            Ok(mask) => mask,
            Err(_) => {
                tracing::warn!("mask creation failed; using parent");
                return parent.clone();
            }
        };
        mask.set_class_name("guide-mask");
        if parent.append_child(&mask).is_err() {
            tracing::warn!("mask could not be attached");
        }
        mask
    }

    fn remove(&mut self, el: &Element) {
        el.remove();
    }

    fn listen(&mut self, trigger: Trigger<Element>, event: GuideEvent) -> ListenerId {
        let (target, kind): (EventTarget, &'static str) = match trigger {
            Trigger::WindowResize => (self.window.clone().into(), "resize"),
            Trigger::WindowScroll => (self.window.clone().into(), "scroll"),
            Trigger::Click(el) => (el.into(), "click"),
        };
        self.drop_retired();
        let deliver = Rc::clone(&self.deliver);
        let running = Rc::clone(&self.running);
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
            running.set(running.get() + 1);
            deliver(event);
            running.set(running.get() - 1);
        });
        if target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::warn!(kind, "listener registration failed");
        }

        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(
            id,
            Listener {
                target,
                kind,
                closure,
            },
        );
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        let Some(listener) = self.listeners.remove(&id) else {
            return;
        };
        let _ = listener.target.remove_event_listener_with_callback(
            listener.kind,
            listener.closure.as_ref().unchecked_ref(),
        );
        self.drop_retired();
        self.retired.push(listener.closure);
    }
}
