// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered value overrides.
//!
//! A [`ValueOverrider`] resolves multiple competing writers to one logical
//! property into a single deterministic value. Each writer contributes a
//! *layer* — its value, a priority, and a reference count — keyed by
//! [`SourceId`]. The stack keeps layers in ascending priority order with
//! stable ties, so the resolved value is always the last element: the
//! highest-priority layer, and among equal priorities the most recently
//! pushed.
//!
//! # Reference counting
//!
//! A source that pushes twice does not get two layers; its single layer's
//! refcount climbs, and a matching number of pops (or one forced pop) is
//! needed before the layer disappears. This is what lets one effect re-play
//! against a property another instance of itself already holds, and still
//! tear down cleanly.
//!
//! # Dirty flag
//!
//! The overrider tracks whether the *resolved* value may have changed since
//! the consumer last looked: any mutation that touches the top layer —
//! a push that lands on top, a set of the top layer, a pop that removes it —
//! marks dirty. Consumers read once per frame, re-apply if dirty, then
//! [`clear_dirty`](ValueOverrider::clear_dirty).
//!
//! # Priority updates
//!
//! Re-pushing an existing source with a different priority updates the
//! stored priority but not the layer's position. The priority in effect is
//! always the most recent call's value; there is no per-source priority
//! history.

use alloc::vec::Vec;

use crate::source::SourceId;

/// One source's contribution to a [`ValueOverrider`].
#[derive(Clone, Debug)]
struct Layer<T> {
    source: SourceId,
    priority: i32,
    value: T,
    refcount: u32,
}

/// A priority-ordered stack of reference-counted value layers.
///
/// An in-use overrider always carries at least one layer — by convention a
/// base layer holding the property's unmodified value at a priority below
/// any effect's — so that popping every effect layer restores the original
/// value instead of leaving nothing to resolve.
#[derive(Clone, Debug, Default)]
pub struct ValueOverrider<T> {
    layers: Vec<Layer<T>>,
    dirty: bool,
}

impl<T> ValueOverrider<T> {
    /// Creates an empty overrider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            dirty: false,
        }
    }

    /// Whether the resolved value may have changed since the last
    /// [`clear_dirty`](Self::clear_dirty).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of layers currently held.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layers are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns the resolved value: the top layer's.
    ///
    /// # Panics
    ///
    /// Panics if no layers exist. An in-use overrider always carries a base
    /// layer; reading an empty one means some writer leaked a forced pop or
    /// the consumer outlived teardown, and silently defaulting here would
    /// mask exactly that bug.
    #[must_use]
    pub fn value(&self) -> &T {
        let Some(layer) = self.layers.last() else {
            panic!("overrider read with no layers; an in-use overrider always holds a base layer");
        };
        &layer.value
    }

    /// Contributes (or re-contributes) `source`'s layer.
    ///
    /// If `source` already holds a layer, its value and priority are
    /// updated in place and its refcount incremented; ordering is
    /// untouched. Otherwise a new layer is inserted after the last layer of
    /// priority `<=` `priority`, keeping the stack sorted with stable ties
    /// so the newest equal-priority layer wins.
    pub fn push(&mut self, source: SourceId, value: T, priority: i32) {
        let top = self.layers.len().wrapping_sub(1);
        if let Some(index) = self.layers.iter().position(|layer| layer.source == source) {
            let layer = &mut self.layers[index];
            layer.value = value;
            layer.priority = priority;
            layer.refcount += 1;
            if index == top {
                self.dirty = true;
            }
            return;
        }

        let index = self
            .layers
            .partition_point(|layer| layer.priority <= priority);
        self.layers.insert(
            index,
            Layer {
                source,
                priority,
                value,
                refcount: 1,
            },
        );
        if index + 1 == self.layers.len() {
            self.dirty = true;
        }
    }

    /// Releases one push from `source`.
    ///
    /// Decrements the layer's refcount and removes it when the count
    /// reaches zero — or immediately when `force` is set, regardless of how
    /// many pushes are outstanding (the full-teardown path). Returns
    /// whether a layer for `source` was found.
    pub fn pop(&mut self, source: SourceId, force: bool) -> bool {
        let Some(index) = self.layers.iter().position(|layer| layer.source == source) else {
            return false;
        };
        let layer = &mut self.layers[index];
        layer.refcount -= 1;
        if layer.refcount == 0 || force {
            let was_top = index + 1 == self.layers.len();
            self.layers.remove(index);
            if was_top {
                self.dirty = true;
            }
        }
        true
    }

    /// Updates `source`'s value without touching its refcount.
    ///
    /// This is the per-frame path: a modifier pushes once when it starts
    /// driving a property and sets every frame after. Returns whether the
    /// source was found.
    pub fn set(&mut self, source: SourceId, value: T) -> bool {
        let top = self.layers.len().wrapping_sub(1);
        for (index, layer) in self.layers.iter_mut().enumerate() {
            if layer.source == source {
                layer.value = value;
                if index == top {
                    self.dirty = true;
                }
                return true;
            }
        }
        false
    }

    /// Clears the dirty flag after the consumer re-applied the value.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Drops all layers and the dirty flag, for pooled reuse.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: SourceId = SourceId::BASE;
    const A: SourceId = SourceId(1);
    const B: SourceId = SourceId(2);
    const C: SourceId = SourceId(3);

    fn with_base() -> ValueOverrider<f32> {
        let mut overrider = ValueOverrider::new();
        overrider.push(BASE, 1.0, -1);
        overrider.clear_dirty();
        overrider
    }

    #[test]
    fn highest_priority_wins() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 0);
        assert_eq!(*overrider.value(), 2.0);
        assert!(overrider.is_dirty());
        overrider.clear_dirty();

        overrider.push(B, 3.0, 5);
        assert_eq!(*overrider.value(), 3.0);

        assert!(overrider.pop(B, false), "B should be present");
        assert_eq!(*overrider.value(), 2.0);
        assert!(overrider.is_dirty());

        assert!(overrider.pop(A, false), "A should be present");
        assert_eq!(*overrider.value(), 1.0);
    }

    #[test]
    fn equal_priority_ties_break_to_newest() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 3);
        overrider.push(B, 4.0, 3);
        assert_eq!(*overrider.value(), 4.0);

        // Removing the newer equal-priority layer falls back to the older.
        overrider.pop(B, false);
        assert_eq!(*overrider.value(), 2.0);
    }

    #[test]
    fn lower_priority_push_does_not_mark_dirty() {
        let mut overrider = with_base();
        overrider.push(A, 9.0, 10);
        overrider.clear_dirty();

        overrider.push(B, 5.0, 0);
        assert_eq!(*overrider.value(), 9.0);
        assert!(!overrider.is_dirty(), "non-top insert must not mark dirty");
    }

    #[test]
    fn repeated_push_refcounts_instead_of_duplicating() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 0);
        overrider.push(A, 2.5, 0);
        assert_eq!(overrider.layer_count(), 2);
        assert_eq!(*overrider.value(), 2.5);

        // One pop is not enough; the layer survives.
        assert!(overrider.pop(A, false), "first pop finds the layer");
        assert_eq!(overrider.layer_count(), 2);
        assert_eq!(*overrider.value(), 2.5);

        assert!(overrider.pop(A, false), "second pop finds the layer");
        assert_eq!(overrider.layer_count(), 1);
        assert_eq!(*overrider.value(), 1.0);
    }

    #[test]
    fn repush_updates_priority_without_reordering() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 0);
        overrider.push(B, 3.0, 5);
        assert_eq!(*overrider.value(), 3.0);

        // A's priority now nominally exceeds B's, but its layer stays put;
        // the most-recent call's priority is recorded, nothing re-sorts.
        overrider.push(A, 2.5, 10);
        assert_eq!(*overrider.value(), 3.0);

        // A forced pop still needs only one call despite two pushes.
        assert!(overrider.pop(A, true), "forced pop finds the layer");
        assert_eq!(overrider.layer_count(), 2);
    }

    #[test]
    fn forced_pop_removes_regardless_of_refcount() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 0);
        overrider.push(A, 2.0, 0);
        overrider.push(A, 2.0, 0);
        assert!(overrider.pop(A, true), "forced pop finds the layer");
        assert_eq!(*overrider.value(), 1.0);
    }

    #[test]
    fn full_teardown_leaves_no_layers() {
        let mut overrider = ValueOverrider::new();
        overrider.push(BASE, 1.0, -1);
        overrider.push(A, 2.0, 0);
        overrider.push(B, 3.0, 5);
        overrider.push(C, 4.0, 5);
        overrider.push(B, 3.5, 5);

        for source in [A, B, C, BASE] {
            assert!(overrider.pop(source, true), "every source pops once");
        }
        assert!(overrider.is_empty(), "forced pops must not leak layers");
    }

    #[test]
    fn pop_of_unknown_source_reports_not_found() {
        let mut overrider = with_base();
        assert!(!overrider.pop(A, false));
        assert!(!overrider.pop(A, true));
        assert_eq!(overrider.layer_count(), 1);
    }

    #[test]
    fn set_marks_dirty_only_on_top() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 0);
        overrider.push(B, 3.0, 5);
        overrider.clear_dirty();

        assert!(overrider.set(A, 2.5), "A is present");
        assert!(!overrider.is_dirty(), "buried layer set must not mark dirty");
        assert_eq!(*overrider.value(), 3.0);

        assert!(overrider.set(B, 3.5), "B is present");
        assert!(overrider.is_dirty());
        assert_eq!(*overrider.value(), 3.5);

        assert!(!overrider.set(C, 1.0), "C was never pushed");
    }

    #[test]
    fn pop_of_buried_layer_does_not_mark_dirty() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 0);
        overrider.push(B, 3.0, 5);
        overrider.clear_dirty();

        overrider.pop(A, false);
        assert!(!overrider.is_dirty(), "buried removal keeps resolved value");
        assert_eq!(*overrider.value(), 3.0);
    }

    #[test]
    #[should_panic(expected = "no layers")]
    fn reading_empty_overrider_panics() {
        let overrider: ValueOverrider<f32> = ValueOverrider::new();
        let _ = overrider.value();
    }

    #[test]
    fn clear_drops_everything() {
        let mut overrider = with_base();
        overrider.push(A, 2.0, 0);
        overrider.clear();
        assert!(overrider.is_empty());
        assert!(!overrider.is_dirty());
    }
}
