#![forbid(unsafe_code)]

//! Lifecycle hooks and the context they run with.
//!
//! Hooks are synchronous notifications; their return values are ignored.
//! They cannot borrow the controller while it is mid-transition, so they get a
//! [`GuideCx`] instead: a snapshot of the tour state plus a queue of commands
//! that the controller runs once the active operation has finished.

use std::rc::Rc;

use crate::step::Step;

/// Deferred request issued from inside a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Back,
    Show,
    Hide,
    Repaint,
}

/// Context passed to every hook.
#[derive(Debug, Clone, Default)]
pub struct GuideCx {
    current: Option<usize>,
    visible: bool,
    step_count: usize,
    deferred: Vec<Command>,
}

impl GuideCx {
    pub(crate) fn new(current: Option<usize>, visible: bool, step_count: usize) -> Self {
        Self {
            current,
            visible,
            step_count,
            deferred: Vec::new(),
        }
    }

    /// Index of the current step when the hook fired.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Whether the guide was visible when the hook fired.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of registered steps when the hook fired.
    #[must_use]
    pub const fn step_count(&self) -> usize {
        self.step_count
    }

    /// Request `next()` after the current operation.
    pub fn next(&mut self) {
        self.deferred.push(Command::Next);
    }

    /// Request `back()` after the current operation.
    pub fn back(&mut self) {
        self.deferred.push(Command::Back);
    }

    /// Request `show()` after the current operation.
    pub fn show(&mut self) {
        self.deferred.push(Command::Show);
    }

    /// Request `hide()` after the current operation.
    pub fn hide(&mut self) {
        self.deferred.push(Command::Hide);
    }

    /// Request a repaint after the current operation.
    pub fn repaint(&mut self) {
        self.deferred.push(Command::Repaint);
    }

    /// Commands queued so far.
    #[must_use]
    pub fn deferred(&self) -> &[Command] {
        &self.deferred
    }

    pub(crate) fn take_deferred(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.deferred)
    }
}

/// Per-step callback (`on_enter`, `on_leave`, `on_remove_step`).
pub type StepCallback<E> = Rc<dyn Fn(&Step<E>, &mut GuideCx)>;

/// Hook that may edit a freshly resolved step before it is registered.
pub type StepHook<E> = Rc<dyn Fn(&mut Step<E>, &mut GuideCx)>;

/// Navigation hook: `(outgoing, incoming, cx)`. There is no outgoing step on
/// the very first transition.
pub type TransitionHook<E> = Rc<dyn Fn(Option<&Step<E>>, &Step<E>, &mut GuideCx)>;

/// Guide-level hook (`on_init`, `on_show`, `on_hide`, `on_dispose`).
pub type GuideHook = Rc<dyn Fn(&mut GuideCx)>;

/// Optional lifecycle hooks; unset hooks are no-ops.
pub struct Hooks<E> {
    pub on_init: Option<GuideHook>,
    pub on_add_step: Option<StepHook<E>>,
    pub on_remove_step: Option<StepCallback<E>>,
    pub before_next: Option<TransitionHook<E>>,
    pub after_next: Option<TransitionHook<E>>,
    pub before_back: Option<TransitionHook<E>>,
    pub after_back: Option<TransitionHook<E>>,
    pub on_show: Option<GuideHook>,
    pub on_hide: Option<GuideHook>,
    pub on_dispose: Option<GuideHook>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            on_init: None,
            on_add_step: None,
            on_remove_step: None,
            before_next: None,
            after_next: None,
            before_back: None,
            after_back: None,
            on_show: None,
            on_hide: None,
            on_dispose: None,
        }
    }
}

impl<E> Clone for Hooks<E> {
    fn clone(&self) -> Self {
        Self {
            on_init: self.on_init.clone(),
            on_add_step: self.on_add_step.clone(),
            on_remove_step: self.on_remove_step.clone(),
            before_next: self.before_next.clone(),
            after_next: self.after_next.clone(),
            before_back: self.before_back.clone(),
            after_back: self.after_back.clone(),
            on_show: self.on_show.clone(),
            on_hide: self.on_hide.clone(),
            on_dispose: self.on_dispose.clone(),
        }
    }
}

impl<E> core::fmt::Debug for Hooks<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let set = |hook: bool| if hook { "<fn>" } else { "-" };
        f.debug_struct("Hooks")
            .field("on_init", &set(self.on_init.is_some()))
            .field("on_add_step", &set(self.on_add_step.is_some()))
            .field("on_remove_step", &set(self.on_remove_step.is_some()))
            .field("before_next", &set(self.before_next.is_some()))
            .field("after_next", &set(self.after_next.is_some()))
            .field("before_back", &set(self.before_back.is_some()))
            .field("after_back", &set(self.after_back.is_some()))
            .field("on_show", &set(self.on_show.is_some()))
            .field("on_hide", &set(self.on_hide.is_some()))
            .field("on_dispose", &set(self.on_dispose.is_some()))
            .finish()
    }
}

impl<E> Hooks<E> {
    #[must_use]
    pub fn on_init(mut self, f: impl Fn(&mut GuideCx) + 'static) -> Self {
        self.on_init = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_add_step(mut self, f: impl Fn(&mut Step<E>, &mut GuideCx) + 'static) -> Self {
        self.on_add_step = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_remove_step(mut self, f: impl Fn(&Step<E>, &mut GuideCx) + 'static) -> Self {
        self.on_remove_step = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn before_next(
        mut self,
        f: impl Fn(Option<&Step<E>>, &Step<E>, &mut GuideCx) + 'static,
    ) -> Self {
        self.before_next = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn after_next(
        mut self,
        f: impl Fn(Option<&Step<E>>, &Step<E>, &mut GuideCx) + 'static,
    ) -> Self {
        self.after_next = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn before_back(
        mut self,
        f: impl Fn(Option<&Step<E>>, &Step<E>, &mut GuideCx) + 'static,
    ) -> Self {
        self.before_back = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn after_back(
        mut self,
        f: impl Fn(Option<&Step<E>>, &Step<E>, &mut GuideCx) + 'static,
    ) -> Self {
        self.after_back = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_show(mut self, f: impl Fn(&mut GuideCx) + 'static) -> Self {
        self.on_show = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_hide(mut self, f: impl Fn(&mut GuideCx) + 'static) -> Self {
        self.on_hide = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_dispose(mut self, f: impl Fn(&mut GuideCx) + 'static) -> Self {
        self.on_dispose = Some(Rc::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, GuideCx, Hooks};

    #[test]
    fn cx_queues_commands_in_order() {
        let mut cx = GuideCx::new(Some(1), true, 3);
        cx.next();
        cx.hide();
        cx.back();
        assert_eq!(cx.current_index(), Some(1));
        assert!(cx.is_visible());
        assert_eq!(cx.step_count(), 3);
        assert_eq!(cx.deferred(), &[Command::Next, Command::Hide, Command::Back]);
        assert_eq!(cx.take_deferred().len(), 3);
        assert!(cx.deferred().is_empty());
    }

    #[test]
    fn hooks_debug_lists_installed() {
        let hooks: Hooks<u32> = Hooks::default().on_show(|_| {});
        let text = format!("{hooks:?}");
        assert!(text.contains("on_show: \"<fn>\""));
        assert!(text.contains("on_hide: \"-\""));
    }
}
