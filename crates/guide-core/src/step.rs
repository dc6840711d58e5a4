#![forbid(unsafe_code)]

//! Tour steps and their resolution from raw descriptors.

use std::rc::Rc;

use crate::geometry::{Offset, Sides};
use crate::hooks::{GuideCx, StepCallback};
use crate::merge::FillDefaults;
use crate::options::AttrNameMap;
use crate::page::{GuideEvent, Page};
use crate::style::StyleValue;

/// Navigation control inside a step's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Back,
    Next,
    Close,
}

impl Control {
    /// Every control, in lookup order.
    pub const ALL: [Control; 3] = [Control::Back, Control::Next, Control::Close];

    /// Role attribute value identifying the control in markup.
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::Back => "back",
            Self::Next => "next",
            Self::Close => "close",
        }
    }

    /// Event delivered when the control is clicked.
    #[must_use]
    pub const fn event(self) -> GuideEvent {
        match self {
            Self::Back => GuideEvent::BackClicked,
            Self::Next => GuideEvent::NextClicked,
            Self::Close => GuideEvent::CloseClicked,
        }
    }
}

/// Padding with some sides left unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartialSides {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl FillDefaults for PartialSides {
    type Output = Sides;

    fn fill(self, defaults: &Sides) -> Sides {
        Sides {
            top: self.top.unwrap_or(defaults.top),
            right: self.right.unwrap_or(defaults.right),
            bottom: self.bottom.unwrap_or(defaults.bottom),
            left: self.left.unwrap_or(defaults.left),
        }
    }
}

impl From<Sides> for PartialSides {
    fn from(s: Sides) -> Self {
        Self {
            top: Some(s.top),
            right: Some(s.right),
            bottom: Some(s.bottom),
            left: Some(s.left),
        }
    }
}

impl From<f64> for PartialSides {
    fn from(v: f64) -> Self {
        Sides::all(v).into()
    }
}

/// Offset with an axis possibly unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartialOffset {
    pub left: Option<f64>,
    pub top: Option<f64>,
}

impl FillDefaults for PartialOffset {
    type Output = Offset;

    fn fill(self, defaults: &Offset) -> Offset {
        Offset {
            left: self.left.unwrap_or(defaults.left),
            top: self.top.unwrap_or(defaults.top),
        }
    }
}

impl From<Offset> for PartialOffset {
    fn from(o: Offset) -> Self {
        Self {
            left: Some(o.left),
            top: Some(o.top),
        }
    }
}

impl From<f64> for PartialOffset {
    fn from(v: f64) -> Self {
        Offset::all(v).into()
    }
}

/// A step descriptor before defaults are applied.
pub struct RawStep<E> {
    pub name: Option<String>,
    pub target: Option<E>,
    pub content: E,
    pub offset: Option<PartialOffset>,
    pub padding: Option<PartialSides>,
    pub on_enter: Option<StepCallback<E>>,
    pub on_leave: Option<StepCallback<E>>,
    pub back: Option<E>,
    pub next: Option<E>,
    pub close: Option<E>,
}

impl<E> RawStep<E> {
    /// Raw step showing `content`; everything else is resolved later.
    #[must_use]
    pub fn new(content: E) -> Self {
        Self {
            name: None,
            target: None,
            content,
            offset: None,
            padding: None,
            on_enter: None,
            on_leave: None,
            back: None,
            next: None,
            close: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: E) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: impl Into<PartialOffset>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    #[must_use]
    pub fn padding(mut self, padding: impl Into<PartialSides>) -> Self {
        self.padding = Some(padding.into());
        self
    }

    #[must_use]
    pub fn control(mut self, control: Control, el: E) -> Self {
        match control {
            Control::Back => self.back = Some(el),
            Control::Next => self.next = Some(el),
            Control::Close => self.close = Some(el),
        }
        self
    }

    #[must_use]
    pub fn on_enter(mut self, f: impl Fn(&Step<E>, &mut GuideCx) + 'static) -> Self {
        self.on_enter = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_leave(mut self, f: impl Fn(&Step<E>, &mut GuideCx) + 'static) -> Self {
        self.on_leave = Some(Rc::new(f));
        self
    }
}

impl<E: core::fmt::Debug> core::fmt::Debug for RawStep<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawStep")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("content", &self.content)
            .field("offset", &self.offset)
            .field("padding", &self.padding)
            .finish_non_exhaustive()
    }
}

/// A resolved tour step.
pub struct Step<E> {
    /// Unique name within the registry.
    pub name: String,
    /// Element to highlight; `None` centers the content on screen.
    pub target: Option<E>,
    /// Overlay content element.
    pub content: E,
    /// Content placement relative to the highlighted region.
    pub offset: Offset,
    /// Expansion of the highlighted region around the target.
    pub padding: Sides,
    pub on_enter: Option<StepCallback<E>>,
    pub on_leave: Option<StepCallback<E>>,
    pub back: Option<E>,
    pub next: Option<E>,
    pub close: Option<E>,
}

impl<E> Step<E> {
    /// Control element for `control`, if present.
    #[must_use]
    pub fn control(&self, control: Control) -> Option<&E> {
        match control {
            Control::Back => self.back.as_ref(),
            Control::Next => self.next.as_ref(),
            Control::Close => self.close.as_ref(),
        }
    }

    /// Whether the step highlights a target (otherwise it is centered).
    #[must_use]
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Replace the enter callback.
    pub fn set_on_enter(&mut self, f: impl Fn(&Step<E>, &mut GuideCx) + 'static) {
        self.on_enter = Some(Rc::new(f));
    }

    /// Replace the leave callback.
    pub fn set_on_leave(&mut self, f: impl Fn(&Step<E>, &mut GuideCx) + 'static) {
        self.on_leave = Some(Rc::new(f));
    }
}

impl<E: core::fmt::Debug> core::fmt::Debug for Step<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("content", &self.content)
            .field("offset", &self.offset)
            .field("padding", &self.padding)
            .field("back", &self.back)
            .field("next", &self.next)
            .field("close", &self.close)
            .finish_non_exhaustive()
    }
}

/// Everything a raw step falls back on.
#[derive(Debug, Clone)]
pub struct StepDefaults<'a, E> {
    /// Roots searched for a target tagged with the step name.
    pub scope: &'a [E],
    /// Global content offset.
    pub offset: Offset,
    /// Global padding.
    pub padding: Sides,
    /// Markup attribute names.
    pub attrs: &'a AttrNameMap,
}

fn numeric_attr<P: Page>(page: &P, el: &P::Element, name: &str) -> Option<f64> {
    page.attribute(el, name)
        .and_then(|raw| StyleValue::Text(raw).as_number())
}

/// Resolve `raw` into a complete step named `name`.
///
/// Missing values are filled, never overwritten:
/// - target: first element under `defaults.scope` tagged with the name;
/// - offset: `data-offset-left|top` on the content, else the global offset;
/// - padding: `data-padding-*` on the target, else the global padding;
/// - controls: first element under the content with a matching role.
pub fn resolve_step<P: Page>(
    page: &P,
    raw: RawStep<P::Element>,
    name: String,
    defaults: &StepDefaults<'_, P::Element>,
) -> Step<P::Element> {
    let target_attr = defaults.attrs.target_attr();
    let target = raw.target.or_else(|| {
        defaults
            .scope
            .iter()
            .find_map(|root| {
                page.find_tagged(root, &target_attr, Some(name.as_str()))
                    .into_iter()
                    .next()
            })
    });

    let content = raw.content;
    let offset_defaults = Offset {
        left: numeric_attr(page, &content, "data-offset-left").unwrap_or(defaults.offset.left),
        top: numeric_attr(page, &content, "data-offset-top").unwrap_or(defaults.offset.top),
    };
    let offset = raw.offset.unwrap_or_default().fill(&offset_defaults);

    let padding_attr = |side: &str, fallback: f64| {
        target
            .as_ref()
            .and_then(|t| numeric_attr(page, t, &format!("data-padding-{side}")))
            .unwrap_or(fallback)
    };
    let padding_defaults = Sides {
        top: padding_attr("top", defaults.padding.top),
        right: padding_attr("right", defaults.padding.right),
        bottom: padding_attr("bottom", defaults.padding.bottom),
        left: padding_attr("left", defaults.padding.left),
    };
    let padding = raw.padding.unwrap_or_default().fill(&padding_defaults);

    let role_attr = defaults.attrs.role_attr();
    let find_control = |control: Control| {
        page.find_tagged(&content, &role_attr, Some(control.role()))
            .into_iter()
            .next()
    };
    let back = raw.back.or_else(|| find_control(Control::Back));
    let next = raw.next.or_else(|| find_control(Control::Next));
    let close = raw.close.or_else(|| find_control(Control::Close));

    Step {
        name,
        target,
        content,
        offset,
        padding,
        on_enter: raw.on_enter,
        on_leave: raw.on_leave,
        back,
        next,
        close,
    }
}
