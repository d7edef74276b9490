// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Override-source identity.
//!
//! Every layer in a [`ValueOverrider`](crate::overrider::ValueOverrider)
//! belongs to a *source*: an opaque identity distinguishing which caller
//! contributed it. Sources are compared by id, never by name, so two
//! distinct logical writers can never collide the way hashed string keys
//! can.
//!
//! [`SourceRegistry`] interns human-readable names (typically effect-config
//! asset names) to ids. It is an explicit object owned by the embedder, not
//! process-wide state; one registry per effect world is the intended shape.

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;

/// An opaque identity for one override contributor.
///
/// Ids are assigned by a [`SourceRegistry`], except for [`SourceId::BASE`],
/// which is reserved for store-seeded base layers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u32);

impl SourceId {
    /// Reserved id for the base layer a property store seeds into each
    /// overrider before any effect writes to it. Never handed out by a
    /// registry.
    pub const BASE: Self = Self(u32::MAX);
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::BASE {
            write!(f, "SourceId(BASE)")
        } else {
            write!(f, "SourceId({})", self.0)
        }
    }
}

/// Interns source names to [`SourceId`]s.
///
/// Interning the same name twice returns the same id, so an effect config
/// replayed from the same asset always lands on its own layer.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    ids: BTreeMap<String, SourceId>,
    next: u32,
}

impl SourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, allocating one if it has not been seen.
    pub fn intern(&mut self, name: &str) -> SourceId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        assert!(
            self.next != SourceId::BASE.0,
            "source id space exhausted (the top id is reserved for base layers)"
        );
        let id = SourceId(self.next);
        self.next += 1;
        self.ids.insert(String::from(name), id);
        id
    }

    /// Returns the id for `name` if it has been interned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SourceId> {
        self.ids.get(name).copied()
    }

    /// Number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no names have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let mut registry = SourceRegistry::new();
        let a = registry.intern("burn");
        let b = registry.intern("freeze");
        assert_ne!(a, b);
        assert_eq!(registry.intern("burn"), a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn get_does_not_allocate() {
        let mut registry = SourceRegistry::new();
        assert_eq!(registry.get("burn"), None);
        let id = registry.intern("burn");
        assert_eq!(registry.get("burn"), Some(id));
    }

    #[test]
    fn base_is_never_assigned() {
        let mut registry = SourceRegistry::new();
        let id = registry.intern("anything");
        assert_ne!(id, SourceId::BASE);
    }
}
