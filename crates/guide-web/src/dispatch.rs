#![forbid(unsafe_code)]

//! Reentrancy-safe call routing to a shared guide.
//!
//! Script handles and DOM listeners reach the guide through a [`Dispatcher`].
//! When the guide is free the call runs at once. When it is already borrowed
//! (a script hook calling back into its own handle, or a handle used before
//! construction has finished) the call is queued and replayed, in order, by
//! the outer call once it completes.
//!
//! # Invariants
//!
//! 1. Queued calls run in arrival order, after the call that was active.
//! 2. [`Dispatcher::snapshot`] never borrows the guide while it is busy; it
//!    reports the state as of the last completed call.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use guide_core::{Guide, GuideError, GuideEvent, Page, RawStep, SharedGuide};

/// A request to the guide.
pub enum HandleCall<E> {
    Next,
    Back,
    Show,
    Hide,
    Repaint,
    Event(GuideEvent),
    AddStep(RawStep<E>),
    RemoveStep(String),
    Dispose,
}

impl<E> HandleCall<E> {
    const fn label(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Back => "back",
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Repaint => "repaint",
            Self::Event(_) => "event",
            Self::AddStep(_) => "add_step",
            Self::RemoveStep(_) => "remove_step",
            Self::Dispose => "dispose",
        }
    }
}

impl<E> core::fmt::Debug for HandleCall<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Self::RemoveStep(name) => f.debug_tuple("RemoveStep").field(name).finish(),
            other => f.write_str(other.label()),
        }
    }
}

/// Guide state as of the last completed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub current: Option<usize>,
    pub visible: bool,
    pub step_count: usize,
    pub disposed: bool,
}

impl Snapshot {
    fn of<P: Page>(guide: &Guide<P>) -> Self {
        Self {
            current: guide.current_index(),
            visible: guide.is_visible(),
            step_count: guide.step_count(),
            disposed: guide.is_disposed(),
        }
    }
}

/// Shared, cloneable route to one guide.
pub struct Dispatcher<P: Page> {
    guide: Rc<OnceCell<SharedGuide<P>>>,
    queue: Rc<RefCell<VecDeque<HandleCall<P::Element>>>>,
    snapshot: Rc<Cell<Snapshot>>,
}

impl<P: Page> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            guide: Rc::clone(&self.guide),
            queue: Rc::clone(&self.queue),
            snapshot: Rc::clone(&self.snapshot),
        }
    }
}

impl<P: Page> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Page> core::fmt::Debug for Dispatcher<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bound", &self.guide.get().is_some())
            .field("queued", &self.queue.try_borrow().map(|q| q.len()).ok())
            .field("snapshot", &self.snapshot.get())
            .finish()
    }
}

/// Non-owning route to a guide, for callbacks the guide itself stores.
///
/// Listeners and script hooks live inside the guide; holding a strong
/// [`Dispatcher`] there would keep the guide alive through itself.
pub struct WeakDispatcher<P: Page> {
    guide: Weak<OnceCell<SharedGuide<P>>>,
    queue: Weak<RefCell<VecDeque<HandleCall<P::Element>>>>,
    snapshot: Weak<Cell<Snapshot>>,
}

impl<P: Page> Clone for WeakDispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            guide: Weak::clone(&self.guide),
            queue: Weak::clone(&self.queue),
            snapshot: Weak::clone(&self.snapshot),
        }
    }
}

impl<P: Page> WeakDispatcher<P> {
    /// The dispatcher, while some strong handle to it is still held.
    #[must_use]
    pub fn upgrade(&self) -> Option<Dispatcher<P>> {
        Some(Dispatcher {
            guide: self.guide.upgrade()?,
            queue: self.queue.upgrade()?,
            snapshot: self.snapshot.upgrade()?,
        })
    }
}

impl<P: Page> Dispatcher<P> {
    /// Unbound dispatcher; calls queue until [`Dispatcher::bind`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            guide: Rc::new(OnceCell::new()),
            queue: Rc::new(RefCell::new(VecDeque::new())),
            snapshot: Rc::new(Cell::new(Snapshot::default())),
        }
    }

    /// Bind to `guide` and replay anything queued so far. Later binds are
    /// ignored.
    pub fn bind(&self, guide: SharedGuide<P>) {
        if self.guide.set(guide).is_err() {
            tracing::warn!("dispatcher already bound");
            return;
        }
        if let Some(guide) = self.guide.get() {
            if let Ok(mut guide) = guide.try_borrow_mut() {
                self.drain(&mut guide);
            }
        }
    }

    /// The bound guide.
    #[must_use]
    pub fn guide(&self) -> Option<&SharedGuide<P>> {
        self.guide.get()
    }

    /// Whether this dispatcher routes to `guide`.
    #[must_use]
    pub fn routes_to(&self, guide: &SharedGuide<P>) -> bool {
        self.guide.get().is_some_and(|g| Rc::ptr_eq(g, guide))
    }

    /// A route that does not keep this dispatcher alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakDispatcher<P> {
        WeakDispatcher {
            guide: Rc::downgrade(&self.guide),
            queue: Rc::downgrade(&self.queue),
            snapshot: Rc::downgrade(&self.snapshot),
        }
    }

    /// Run `call` now, or queue it if the guide is busy or not yet bound.
    ///
    /// Errors are only reported for calls that ran immediately; failures of
    /// replayed calls are logged.
    pub fn call(&self, call: HandleCall<P::Element>) -> Result<(), GuideError> {
        let Some(shared) = self.guide.get() else {
            self.defer(call);
            return Ok(());
        };
        let Ok(mut guide) = shared.try_borrow_mut() else {
            self.defer(call);
            return Ok(());
        };
        let result = apply(&mut guide, call);
        self.drain(&mut guide);
        result
    }

    /// State as of the last completed call.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.get()
    }

    /// Number of calls waiting to be replayed.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    fn defer(&self, call: HandleCall<P::Element>) {
        tracing::trace!(call = call.label(), "guide busy; call queued");
        self.queue.borrow_mut().push_back(call);
    }

    fn drain(&self, guide: &mut Guide<P>) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(call) = next else {
                break;
            };
            let label = call.label();
            if let Err(err) = apply(guide, call) {
                tracing::warn!(call = label, error = %err, "queued guide call failed");
            }
        }
        self.snapshot.set(Snapshot::of(guide));
    }
}

fn apply<P: Page>(guide: &mut Guide<P>, call: HandleCall<P::Element>) -> Result<(), GuideError> {
    match call {
        HandleCall::Next => guide.next(),
        HandleCall::Back => guide.back(),
        HandleCall::Show => guide.show(),
        HandleCall::Hide => guide.hide(),
        HandleCall::Repaint => guide.repaint(),
        HandleCall::Event(event) => guide.handle_event(event),
        HandleCall::AddStep(raw) => return guide.add_step(raw),
        HandleCall::RemoveStep(name) => guide.remove_step(&name),
        HandleCall::Dispose => guide.dispose(),
    }
    Ok(())
}
