#![forbid(unsafe_code)]

//! Tour controller: step state machine, repaint and event wiring.
//!
//! # State
//!
//! `current` is `None` before the first step is entered, otherwise an index
//! into the registry. `visible` is independent of `current`: hiding keeps the
//! position, showing resumes it.
//!
//! # Ordering
//!
//! Every navigation runs, in order: before-hook, outgoing `on_leave`, index
//! change, repaint, incoming `on_enter`, after-hook. Commands requested from
//! inside any hook through [`GuideCx`] run after the active operation has
//! finished, so a hook can never interleave a second transition with the one
//! that invoked it.
//!
//! # Failure modes
//!
//! Navigating past either end, removing an unknown step and any call after
//! [`Guide::dispose`] are no-ops.

use std::collections::VecDeque;

use crate::error::GuideError;
use crate::hooks::{Command, GuideCx, Hooks, TransitionHook};
use crate::layout::{self, LayoutInput, Paint};
use crate::options::GuideOptions;
use crate::page::{GuideEvent, ListenerId, Page, Trigger};
use crate::registry::StepRegistry;
use crate::step::{Control, RawStep, Step, StepDefaults};
use crate::style::StyleMap;

/// Mask properties that user styles can never override.
fn structural_mask_style() -> StyleMap {
    StyleMap::new()
        .with("position", "fixed")
        .with("border-style", "solid")
        .with("border-top-width", 0)
        .with("border-left-width", 0)
        .with("border-right-width", 0)
        .with("border-bottom-width", 0)
        .with("top", 0)
        .with("left", 0)
        .with("right", 0)
        .with("bottom", 0)
}

/// Properties of the base style every registered content element gets.
const CONTENT_BASE_PROPERTIES: [&str; 3] = ["display", "position", "z-index"];

/// Everything needed to build a [`Guide`].
pub struct GuideConfig<E> {
    pub options: GuideOptions,
    /// Explicit steps, appended after markup-discovered ones.
    pub steps: Vec<RawStep<E>>,
    pub hooks: Hooks<E>,
}

impl<E> Default for GuideConfig<E> {
    fn default() -> Self {
        Self {
            options: GuideOptions::default(),
            steps: Vec::new(),
            hooks: Hooks::default(),
        }
    }
}

impl<E> GuideConfig<E> {
    /// Config with the given options, no explicit steps and no hooks.
    #[must_use]
    pub fn new(options: GuideOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Append an explicit step.
    #[must_use]
    pub fn step(mut self, raw: RawStep<E>) -> Self {
        self.steps.push(raw);
        self
    }

    /// Replace the hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: Hooks<E>) -> Self {
        self.hooks = hooks;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[cfg(feature = "tracing")]
    const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "next",
            Self::Backward => "back",
        }
    }
}

/// Guided tour attached to a root element.
pub struct Guide<P: Page> {
    page: P,
    root: P::Element,
    mask: P::Element,
    options: GuideOptions,
    hooks: Hooks<P::Element>,
    registry: StepRegistry<P::Element>,
    scope: Vec<P::Element>,
    current: Option<usize>,
    visible: bool,
    disposed: bool,
    events_bound: bool,
    window_listeners: Vec<ListenerId>,
    control_listeners: Vec<(String, ListenerId)>,
    pending: VecDeque<Command>,
    repaints: u64,
}

impl<P: Page> core::fmt::Debug for Guide<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Guide")
            .field("root", &self.root)
            .field("steps", &self.registry.names().collect::<Vec<_>>())
            .field("current", &self.current)
            .field("visible", &self.visible)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<P: Page> Guide<P> {
    /// Build a guide on `root`.
    ///
    /// Creates the mask, hides the root, registers markup steps then
    /// configured steps, binds listeners, enters the first step (if any),
    /// shows the guide when `show_after_inited` is set and fires `on_init`.
    pub fn new(
        mut page: P,
        root: P::Element,
        config: GuideConfig<P::Element>,
    ) -> Result<Self, GuideError> {
        let GuideConfig {
            options,
            steps,
            hooks,
        } = config;

        let mut mask_style = options.mask_style.clone();
        mask_style.extend(&structural_mask_style());
        let mask = page.create_mask(&root);
        page.apply_style(&mask, &mask_style);

        let scope = match options.scope.as_deref() {
            Some(selector) => page.select(selector),
            None => vec![page.body()],
        };

        let mut guide = Self {
            page,
            root,
            mask,
            options,
            hooks,
            registry: StepRegistry::new(),
            scope,
            current: None,
            visible: false,
            disposed: false,
            events_bound: false,
            window_listeners: Vec::new(),
            control_listeners: Vec::new(),
            pending: VecDeque::new(),
            repaints: 0,
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("guide.init", root = ?guide.root).entered();

        guide.page.hide(&guide.root);
        if let Err(err) = guide.populate(steps) {
            guide.unwind_construction();
            return Err(err);
        }
        guide.bind_events();

        guide.next();
        if guide.options.show_after_inited {
            guide.show();
        }
        guide.notify(|g, cx| {
            if let Some(hook) = &g.hooks.on_init {
                hook(cx);
            }
        });
        guide.drain();

        #[cfg(feature = "tracing")]
        tracing::debug!(steps = guide.registry.len(), "guide ready");

        Ok(guide)
    }

    /// Undo what a failed construction applied to the page: the mask, the
    /// hidden root and the content base style of registered steps.
    fn unwind_construction(&mut self) {
        self.page.remove(&self.mask);
        self.page.clear_style(&self.root, &["display"]);
        let contents: Vec<P::Element> = self.registry.iter().map(|s| s.content.clone()).collect();
        for content in &contents {
            self.page.clear_style(content, &CONTENT_BASE_PROPERTIES);
        }
    }

    fn populate(&mut self, explicit: Vec<RawStep<P::Element>>) -> Result<(), GuideError> {
        let content_attr = self.options.attr_name_map.content_attr();
        let discovered: Vec<(String, P::Element)> = self
            .page
            .find_tagged(&self.root, &content_attr, None)
            .into_iter()
            .filter_map(|el| {
                let name = self.page.attribute(&el, &content_attr)?;
                (!name.is_empty()).then_some((name, el))
            })
            .collect();

        for (name, content) in discovered {
            self.register(RawStep::new(content).name(name))?;
        }
        for raw in explicit {
            self.register(raw)?;
        }
        Ok(())
    }

    fn register(&mut self, raw: RawStep<P::Element>) -> Result<usize, GuideError> {
        let defaults = StepDefaults {
            scope: &self.scope,
            offset: self.options.offset,
            padding: self.options.padding,
            attrs: &self.options.attr_name_map,
        };
        let mut step = self.registry.resolve(&self.page, raw, &defaults);
        if self.registry.position(&step.name).is_some() {
            return Err(GuideError::DuplicateStep(step.name));
        }

        let mut cx = self.cx();
        if let Some(hook) = &self.hooks.on_add_step {
            hook(&mut step, &mut cx);
        }
        self.pending.extend(cx.take_deferred());

        let mut content_style = StyleMap::new()
            .with("display", "none")
            .with("position", "absolute");
        if let Some(z) = self.options.mask_z_index() {
            content_style.set("z-index", z + 1.0);
        }
        self.page.apply_style(&step.content, &content_style);

        let index = self.registry.insert(step)?;
        if self.events_bound {
            self.bind_controls(index);
        }

        #[cfg(feature = "tracing")]
        if let Some(step) = self.registry.get_index(index) {
            tracing::debug!(
                name = %step.name,
                index,
                centered = !step.has_target(),
                "step added"
            );
        }

        Ok(index)
    }

    fn bind_events(&mut self) {
        for (trigger, event) in [
            (Trigger::WindowResize, GuideEvent::Resized),
            (Trigger::WindowScroll, GuideEvent::Scrolled),
        ] {
            let id = self.page.listen(trigger, event);
            self.window_listeners.push(id);
        }
        for index in 0..self.registry.len() {
            self.bind_controls(index);
        }
        self.events_bound = true;
    }

    fn bind_controls(&mut self, index: usize) {
        let Some(step) = self.registry.get_index(index) else {
            return;
        };
        for control in Control::ALL {
            if let Some(el) = step.control(control) {
                let id = self.page.listen(Trigger::Click(el.clone()), control.event());
                self.control_listeners.push((step.name.clone(), id));
            }
        }
    }

    fn unbind_controls(&mut self, name: &str) {
        let page = &mut self.page;
        self.control_listeners.retain(|(owner, id)| {
            if owner == name {
                page.unlisten(*id);
                false
            } else {
                true
            }
        });
    }

    fn cx(&self) -> GuideCx {
        GuideCx::new(self.current, self.visible, self.registry.len())
    }

    /// Run a hook invocation with a fresh context and keep its requests.
    fn notify(&mut self, f: impl FnOnce(&Self, &mut GuideCx)) {
        let mut cx = self.cx();
        f(self, &mut cx);
        self.pending.extend(cx.take_deferred());
    }

    fn drain(&mut self) {
        while let Some(command) = self.pending.pop_front() {
            if self.disposed {
                self.pending.clear();
                return;
            }
            self.apply(command);
        }
    }

    fn run(&mut self, command: Command) {
        if self.disposed {
            return;
        }
        self.pending.push_back(command);
        self.drain();
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Next => self.step_forward(),
            Command::Back => self.step_backward(),
            Command::Show => self.set_visible(true),
            Command::Hide => self.set_visible(false),
            Command::Repaint => self.paint(),
        }
    }

    fn step_forward(&mut self) {
        let to = self.current.map_or(0, |i| i + 1);
        if to >= self.registry.len() {
            return;
        }
        self.transition(to, Direction::Forward);
    }

    fn step_backward(&mut self) {
        let Some(from) = self.current else {
            return;
        };
        if from == 0 {
            return;
        }
        self.transition(from - 1, Direction::Backward);
    }

    fn transition(&mut self, to: usize, direction: Direction) {
        let from = self.current;

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "guide.transition",
            direction = direction.as_str(),
            from = ?from,
            to
        )
        .entered();

        let (before, after) = match direction {
            Direction::Forward => (
                self.hooks.before_next.clone(),
                self.hooks.after_next.clone(),
            ),
            Direction::Backward => (
                self.hooks.before_back.clone(),
                self.hooks.after_back.clone(),
            ),
        };

        let fire = |g: &Self, cx: &mut GuideCx, hook: &Option<TransitionHook<P::Element>>| {
            let outgoing = from.and_then(|i| g.registry.get_index(i));
            if let (Some(hook), Some(incoming)) = (hook, g.registry.get_index(to)) {
                hook(outgoing, incoming, cx);
            }
        };

        self.notify(|g, cx| fire(g, cx, &before));
        self.notify(|g, cx| {
            if let Some(step) = from.and_then(|i| g.registry.get_index(i)) {
                if let Some(on_leave) = &step.on_leave {
                    on_leave(step, cx);
                }
            }
        });
        self.current = Some(to);
        self.paint();
        self.notify(|g, cx| {
            if let Some(step) = g.registry.get_index(to) {
                if let Some(on_enter) = &step.on_enter {
                    on_enter(step, cx);
                }
            }
        });
        self.notify(|g, cx| fire(g, cx, &after));
    }

    fn set_visible(&mut self, visible: bool) {
        if visible {
            self.page.show(&self.root);
        } else {
            self.page.hide(&self.root);
        }
        self.visible = visible;

        #[cfg(feature = "tracing")]
        tracing::debug!(visible, "guide visibility changed");

        self.notify(|g, cx| {
            let hook = if visible {
                &g.hooks.on_show
            } else {
                &g.hooks.on_hide
            };
            if let Some(hook) = hook {
                hook(cx);
            }
        });
    }

    /// Paint plan for the current step without applying it.
    #[must_use]
    pub fn layout(&self) -> Option<Paint> {
        let step = self.current_step()?;
        let target = step.target.as_ref().map(|t| self.page.element_rect(t));
        let input = LayoutInput {
            target,
            padding: step.padding,
            offset: step.offset,
            content: self.page.element_rect(&step.content).size(),
            viewport: self.page.viewport(),
        };
        Some(layout::compute(&input))
    }

    fn paint(&mut self) {
        let Some(paint) = self.layout() else {
            return;
        };
        let Some(content) = self.current_step().map(|s| s.content.clone()) else {
            return;
        };

        for step in self.registry.iter() {
            self.page.hide(&step.content);
        }
        self.page.apply_style(&content, &paint.content_style());
        self.page.apply_style(&self.mask, &paint.mask_style());
        self.repaints += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            current = ?self.current,
            mask_width = paint.mask.width,
            mask_height = paint.mask.height,
            "guide repainted"
        );
    }

    /// Advance to the next step; no-op on the last step.
    pub fn next(&mut self) {
        self.run(Command::Next);
    }

    /// Return to the previous step; no-op on the first step.
    pub fn back(&mut self) {
        self.run(Command::Back);
    }

    /// Reveal the guide.
    pub fn show(&mut self) {
        self.run(Command::Show);
    }

    /// Conceal the guide, keeping the current step.
    pub fn hide(&mut self) {
        self.run(Command::Hide);
    }

    /// Recompute and reapply the layout of the current step.
    pub fn repaint(&mut self) {
        self.run(Command::Repaint);
    }

    /// Deliver an event raised by a listener registered on the page.
    pub fn handle_event(&mut self, event: GuideEvent) {
        let command = match event {
            GuideEvent::Resized | GuideEvent::Scrolled => Command::Repaint,
            GuideEvent::NextClicked => Command::Next,
            GuideEvent::BackClicked => Command::Back,
            GuideEvent::CloseClicked => Command::Hide,
        };
        self.run(command);
    }

    /// Resolve and append a step. Its controls are wired immediately.
    pub fn add_step(&mut self, raw: RawStep<P::Element>) -> Result<(), GuideError> {
        if self.disposed {
            return Err(GuideError::Disposed);
        }
        self.register(raw)?;
        self.drain();
        Ok(())
    }

    /// Remove the first step called `name`; unknown names are ignored.
    ///
    /// Removing a step before the current one keeps the same step current.
    /// Removing the current step makes its successor current (or its
    /// predecessor when it was last) and repaints.
    pub fn remove_step(&mut self, name: &str) {
        if self.disposed {
            return;
        }
        let Some(index) = self.registry.position(name) else {
            return;
        };
        self.notify(|g, cx| {
            let step = g.registry.get_index(index);
            if let (Some(hook), Some(step)) = (&g.hooks.on_remove_step, step) {
                hook(step, cx);
            }
        });
        let Some((_, step)) = self.registry.remove(name) else {
            return;
        };
        self.unbind_controls(name);
        self.page.hide(&step.content);

        #[cfg(feature = "tracing")]
        tracing::debug!(name, index, "step removed");

        match self.current {
            Some(current) if index < current => self.current = Some(current - 1),
            Some(current) if index == current => {
                if self.registry.is_empty() {
                    self.current = None;
                } else {
                    self.current = Some(current.min(self.registry.len() - 1));
                    self.paint();
                }
            }
            _ => {}
        }
        self.drain();
    }

    /// Detach every listener, remove the root from the page and fire
    /// `on_dispose`. Terminal.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for id in self.window_listeners.drain(..) {
            self.page.unlisten(id);
        }
        for (_, id) in self.control_listeners.drain(..) {
            self.page.unlisten(id);
        }
        self.page.remove(&self.root);
        self.pending.clear();

        self.notify(|g, cx| {
            if let Some(hook) = &g.hooks.on_dispose {
                hook(cx);
            }
        });
        self.disposed = true;
        self.pending.clear();

        #[cfg(feature = "tracing")]
        tracing::debug!(root = ?self.root, "guide disposed");
    }

    /// Whether the guide is shown.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether [`Guide::dispose`] has run.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Index of the current step.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The current step.
    #[must_use]
    pub fn current_step(&self) -> Option<&Step<P::Element>> {
        self.current.and_then(|i| self.registry.get_index(i))
    }

    /// Step called `name`.
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&Step<P::Element>> {
        self.registry.get(name)
    }

    /// Steps in order.
    pub fn steps(&self) -> impl Iterator<Item = &Step<P::Element>> {
        self.registry.iter()
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of repaints applied so far.
    #[must_use]
    pub const fn repaint_count(&self) -> u64 {
        self.repaints
    }

    #[must_use]
    pub const fn options(&self) -> &GuideOptions {
        &self.options
    }

    #[must_use]
    pub const fn root(&self) -> &P::Element {
        &self.root
    }

    #[must_use]
    pub const fn mask(&self) -> &P::Element {
        &self.mask
    }

    #[must_use]
    pub const fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }
}
