#![forbid(unsafe_code)]

//! Browser frontend for `guide-core`.
//!
//! This crate implements [`guide_core::Page`] over the DOM and exports an
//! `attach(root, options)` entry point to JavaScript via `wasm-bindgen`.
//! The returned `GuideHandle` drives the tour; its methods may be called from
//! inside the tour's own hooks, in which case they are queued and replayed
//! once the active call finishes (see [`dispatch`]).
//!
//! Only the DOM and binding layers are wasm-specific. Descriptor parsing and
//! call dispatch compile everywhere and are tested natively.

pub mod descriptor;
pub mod dispatch;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use dom::DomPage;
#[cfg(target_arch = "wasm32")]
pub use wasm::{GuideHandle, attach};
