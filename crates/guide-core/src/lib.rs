#![forbid(unsafe_code)]

//! Core: guided-tour state machine, step resolution and mask layout.
//!
//! # Role
//! `guide-core` owns everything about a tour that does not need a browser:
//! option parsing, step discovery and resolution, the navigation state
//! machine with its hooks, and the geometry that frames a target with a
//! four-border mask. The host document is reached only through the [`Page`]
//! trait.
//!
//! # Primary responsibilities
//! - **Guide**: attach to a root, step forward and back, show, hide, repaint,
//!   add and remove steps, dispose.
//! - **Step resolution**: fill a step's target, offset, padding and controls
//!   from markup attributes and global options.
//! - **Layout**: pure mask and content placement from measured rectangles.
//! - **Options**: typed builder plus JSON input merged over defaults.
//!
//! # How it fits in the system
//! `guide-web` implements [`Page`] over the browser DOM and exposes
//! [`Guide`] to scripts. [`MemoryPage`] implements it in memory for native
//! hosts and tests.

pub mod attach;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod hooks;
pub mod layout;
pub mod memory;
pub mod merge;
pub mod options;
pub mod page;
pub mod registry;
pub mod step;
pub mod style;

pub use attach::{Attachments, SharedGuide};
pub use controller::{Guide, GuideConfig};
pub use error::GuideError;
pub use geometry::{Offset, Rect, Sides, Size, Viewport};
pub use hooks::{Command, GuideCx, Hooks};
pub use layout::{Paint, Positioning};
pub use memory::{MemoryPage, NodeId};
pub use options::{AttrNameMap, GuideOptions};
pub use page::{GuideEvent, ListenerId, Page, Trigger};
pub use step::{Control, PartialOffset, PartialSides, RawStep, Step};
pub use style::{StyleMap, StyleValue};
