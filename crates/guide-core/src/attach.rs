#![forbid(unsafe_code)]

//! One guide per root element.
//!
//! [`Attachments`] is the table behind the host-facing `attach` call. Hosts
//! keep one per page; attaching to a root that already carries a live guide
//! returns the existing handle instead of building a second one.

use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::{Guide, GuideConfig};
use crate::error::GuideError;
use crate::page::Page;

/// Shared handle to an attached guide.
pub type SharedGuide<P> = Rc<RefCell<Guide<P>>>;

/// Root element → guide table.
pub struct Attachments<P: Page> {
    entries: Vec<(P::Element, SharedGuide<P>)>,
}

impl<P: Page> Default for Attachments<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Page> core::fmt::Debug for Attachments<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(root, _)| root))
            .finish()
    }
}

impl<P: Page> Attachments<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Attach a guide to `root`, or return the one already attached.
    ///
    /// `page` and `config` are dropped unused when a live guide exists.
    pub fn attach(
        &mut self,
        page: P,
        root: P::Element,
        config: GuideConfig<P::Element>,
    ) -> Result<SharedGuide<P>, GuideError> {
        self.prune();
        if let Some(existing) = self.get(&root) {
            #[cfg(feature = "tracing")]
            tracing::debug!(root = ?root, "guide already attached");
            return Ok(existing);
        }
        let guide = Rc::new(RefCell::new(Guide::new(page, root.clone(), config)?));
        self.entries.push((root, Rc::clone(&guide)));
        Ok(guide)
    }

    /// Guide attached to `root`.
    #[must_use]
    pub fn get(&self, root: &P::Element) -> Option<SharedGuide<P>> {
        self.entries
            .iter()
            .find(|(r, _)| r == root)
            .map(|(_, g)| Rc::clone(g))
    }

    /// Forget the guide attached to `root` without disposing it.
    pub fn detach(&mut self, root: &P::Element) -> Option<SharedGuide<P>> {
        let index = self.entries.iter().position(|(r, _)| r == root)?;
        Some(self.entries.remove(index).1)
    }

    /// Drop entries whose guide has been disposed.
    pub fn prune(&mut self) {
        self.entries.retain(|(_, guide)| {
            guide
                .try_borrow()
                .map(|g| !g.is_disposed())
                .unwrap_or(true)
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
