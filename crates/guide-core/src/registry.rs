#![forbid(unsafe_code)]

//! Ordered registry of resolved steps.
//!
//! # Invariants
//!
//! 1. Step order is insertion order.
//! 2. Names are unique; [`StepRegistry::insert`] rejects duplicates.
//! 3. Generated names (`guide_<n>`) come from a per-registry counter and skip
//!    names already taken, so two guides on one page never interfere.

use crate::error::GuideError;
use crate::page::Page;
use crate::step::{RawStep, Step, StepDefaults, resolve_step};

/// Prefix for generated step names.
pub const GENERATED_NAME_PREFIX: &str = "guide";

/// Ordered collection of steps.
#[derive(Debug)]
pub struct StepRegistry<E> {
    steps: Vec<Step<E>>,
    name_counter: u64,
}

impl<E> Default for StepRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> StepRegistry<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name_counter: 0,
        }
    }

    /// Produce a fresh name not used by any registered step.
    pub fn generate_name(&mut self) -> String {
        loop {
            let name = format!("{GENERATED_NAME_PREFIX}_{}", self.name_counter);
            self.name_counter += 1;
            if self.position(&name).is_none() {
                return name;
            }
        }
    }

    /// Resolve `raw` against `defaults`, naming it if needed.
    ///
    /// The step is not registered; see [`StepRegistry::insert`].
    pub fn resolve<P>(
        &mut self,
        page: &P,
        raw: RawStep<E>,
        defaults: &StepDefaults<'_, E>,
    ) -> Step<E>
    where
        P: Page<Element = E>,
    {
        let name = match raw.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => self.generate_name(),
        };
        resolve_step(page, raw, name, defaults)
    }

    /// Append a resolved step. Returns its index.
    pub fn insert(&mut self, step: Step<E>) -> Result<usize, GuideError> {
        if self.position(&step.name).is_some() {
            return Err(GuideError::DuplicateStep(step.name));
        }
        self.steps.push(step);
        Ok(self.steps.len() - 1)
    }

    /// Remove the step called `name`, returning its former index.
    pub fn remove(&mut self, name: &str) -> Option<(usize, Step<E>)> {
        let index = self.position(name)?;
        Some((index, self.steps.remove(index)))
    }

    /// Index of the step called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    /// Step called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Step<E>> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Step at `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Step<E>> {
        self.steps.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in order.
    pub fn iter(&self) -> impl Iterator<Item = &Step<E>> {
        self.steps.iter()
    }

    /// Step names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }
}
