// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Material storage with per-property override resolution.
//!
//! Materials are addressed by [`MaterialId`] handles. Internally each
//! material occupies a slot holding its base property table and one
//! [`ValueOverrider`] per property that some effect has touched. Destroyed
//! materials are recycled via a free list, and generation counters prevent
//! stale handle access.
//!
//! # Override lifecycle
//!
//! The first time an effect pushes to a property, the store seeds that
//! property's overrider with a base layer — the material's unmodified
//! value at a priority below any effect's — then applies the push on top.
//! Every mutation marks the material's per-kind dirty channel. The
//! once-per-frame [`apply`](MaterialStore::apply) pass drains the
//! channels, writes each dirty overrider's resolved value through the
//! [`PropertySink`], and evicts overriders that have fallen back to
//! base-only, so a property nobody drives anymore reverts to its original
//! value and stops costing anything.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use afterglow_core::overrider::ValueOverrider;
use afterglow_core::source::SourceId;
use understory_dirty::{CycleHandling, DirtyTracker};

use crate::dirty;
use crate::property::{PropertyId, PropertyValue, Rgba, TextureId, Vec4};

/// Priority of store-seeded base layers, below any effect's.
pub const BASE_PRIORITY: i32 = -1;

/// A handle to a material in a [`MaterialStore`].
///
/// Contains both a slot index and a generation counter so that stale
/// handles can be detected after a material is destroyed and the slot is
/// reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl MaterialId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaterialId({}@gen{})", self.idx, self.generation)
    }
}

/// Applies resolved property values to renderer-owned materials.
///
/// Both real renderer bindings and test doubles implement this trait; the
/// store calls it once per dirty property per frame, never more.
pub trait PropertySink {
    /// Writes a resolved float property.
    fn set_float(&mut self, material: MaterialId, property: PropertyId, value: f32);
    /// Writes a resolved vector property.
    fn set_vector(&mut self, material: MaterialId, property: PropertyId, value: Vec4);
    /// Writes a resolved color property.
    fn set_color(&mut self, material: MaterialId, property: PropertyId, value: Rgba);
    /// Enables or disables a shader keyword / pass.
    fn set_flag(&mut self, material: MaterialId, property: PropertyId, enabled: bool);
    /// Rebinds a texture property.
    fn set_texture(&mut self, material: MaterialId, property: PropertyId, value: TextureId);
}

/// Association list of per-property overriders for one value kind.
///
/// A plain list beats a map here: the apply pass iterates far more often
/// than effects add or remove entries, and the list rarely exceeds a
/// handful of properties.
type PropertyTable<T> = Vec<(PropertyId, ValueOverrider<T>)>;

#[derive(Debug, Default)]
struct MaterialSlot {
    base: BTreeMap<PropertyId, PropertyValue>,
    floats: PropertyTable<f32>,
    vectors: PropertyTable<Vec4>,
    colors: PropertyTable<Rgba>,
    flags: PropertyTable<bool>,
    textures: PropertyTable<TextureId>,
}

impl MaterialSlot {
    fn clear(&mut self) {
        self.base.clear();
        self.floats.clear();
        self.vectors.clear();
        self.colors.clear();
        self.flags.clear();
        self.textures.clear();
    }
}

/// Slot storage for all materials of one target, with dirty tracking.
#[derive(Debug)]
pub struct MaterialStore {
    slots: Vec<MaterialSlot>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    dirty: DirtyTracker<u32>,
}

impl Default for MaterialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API --

    /// Creates a material from its base property table and returns its
    /// handle.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot count is bounded by live materials, far below u32::MAX"
    )]
    pub fn create_material<I>(&mut self, base: I) -> MaterialId
    where
        I: IntoIterator<Item = (PropertyId, PropertyValue)>,
    {
        let base: BTreeMap<PropertyId, PropertyValue> = base.into_iter().collect();
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            let slot = &mut self.slots[idx as usize];
            slot.clear();
            slot.base = base;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.slots.len() as u32;
            self.slots.push(MaterialSlot {
                base,
                ..MaterialSlot::default()
            });
            self.generation.push(0);
            idx
        };

        MaterialId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a material, freeing its slot for reuse.
    ///
    /// Any overriders it still held are dropped with it; effects that were
    /// driving them must have been removed first or their reverts will hit
    /// a stale handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_material(&mut self, id: MaterialId) {
        self.validate(id);
        let idx = id.idx;
        self.slots[idx as usize].clear();

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live material.
    #[must_use]
    pub fn is_alive(&self, id: MaterialId) -> bool {
        ((id.idx as usize) < self.slots.len())
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Whether no materials are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a material's base value for a property, if it has one.
    #[must_use]
    pub fn base_value(&self, id: MaterialId, property: PropertyId) -> Option<PropertyValue> {
        self.validate(id);
        self.slots[id.idx as usize].base.get(&property).copied()
    }

    // -- Float properties --

    /// Contributes `source`'s float override, seeding the base layer on
    /// first touch.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the material has no float base
    /// value for `property` — driving a property the material does not
    /// carry is an authoring error.
    pub fn push_float(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: f32,
        priority: i32,
    ) {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let base = base_float(&slot.base, property);
        push_in(&mut slot.floats, property, base, source, value, priority);
        self.dirty.mark(id.idx, dirty::FLOAT);
    }

    /// Updates `source`'s float override without touching its refcount.
    /// Returns whether the source currently holds a layer.
    pub fn set_float(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: f32,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = set_in(&mut slot.floats, property, source, value);
        if found {
            self.dirty.mark(id.idx, dirty::FLOAT);
        }
        found
    }

    /// Releases `source`'s float override. Returns whether a layer was
    /// found.
    pub fn pop_float(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        force: bool,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = pop_in(&mut slot.floats, property, source, force);
        if found {
            self.dirty.mark(id.idx, dirty::FLOAT);
        }
        found
    }

    /// The value a float property currently resolves to.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the material has no float base
    /// value for `property`.
    #[must_use]
    pub fn resolved_float(&self, id: MaterialId, property: PropertyId) -> f32 {
        self.validate(id);
        let slot = &self.slots[id.idx as usize];
        resolved_in(&slot.floats, property).unwrap_or_else(|| base_float(&slot.base, property))
    }

    // -- Vector properties --

    /// Contributes `source`'s vector override. See
    /// [`push_float`](Self::push_float).
    pub fn push_vector(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: Vec4,
        priority: i32,
    ) {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let base = base_vector(&slot.base, property);
        push_in(&mut slot.vectors, property, base, source, value, priority);
        self.dirty.mark(id.idx, dirty::VECTOR);
    }

    /// Updates `source`'s vector override. See [`set_float`](Self::set_float).
    pub fn set_vector(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: Vec4,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = set_in(&mut slot.vectors, property, source, value);
        if found {
            self.dirty.mark(id.idx, dirty::VECTOR);
        }
        found
    }

    /// Releases `source`'s vector override. See [`pop_float`](Self::pop_float).
    pub fn pop_vector(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        force: bool,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = pop_in(&mut slot.vectors, property, source, force);
        if found {
            self.dirty.mark(id.idx, dirty::VECTOR);
        }
        found
    }

    /// The value a vector property currently resolves to.
    #[must_use]
    pub fn resolved_vector(&self, id: MaterialId, property: PropertyId) -> Vec4 {
        self.validate(id);
        let slot = &self.slots[id.idx as usize];
        resolved_in(&slot.vectors, property).unwrap_or_else(|| base_vector(&slot.base, property))
    }

    // -- Color properties --

    /// Contributes `source`'s color override. See
    /// [`push_float`](Self::push_float).
    pub fn push_color(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: Rgba,
        priority: i32,
    ) {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let base = base_color(&slot.base, property);
        push_in(&mut slot.colors, property, base, source, value, priority);
        self.dirty.mark(id.idx, dirty::COLOR);
    }

    /// Updates `source`'s color override. See [`set_float`](Self::set_float).
    pub fn set_color(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: Rgba,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = set_in(&mut slot.colors, property, source, value);
        if found {
            self.dirty.mark(id.idx, dirty::COLOR);
        }
        found
    }

    /// Releases `source`'s color override. See [`pop_float`](Self::pop_float).
    pub fn pop_color(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        force: bool,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = pop_in(&mut slot.colors, property, source, force);
        if found {
            self.dirty.mark(id.idx, dirty::COLOR);
        }
        found
    }

    /// The value a color property currently resolves to.
    #[must_use]
    pub fn resolved_color(&self, id: MaterialId, property: PropertyId) -> Rgba {
        self.validate(id);
        let slot = &self.slots[id.idx as usize];
        resolved_in(&slot.colors, property).unwrap_or_else(|| base_color(&slot.base, property))
    }

    // -- Flag properties (shader keywords / pass toggles) --

    /// Contributes `source`'s flag override. See
    /// [`push_float`](Self::push_float).
    pub fn push_flag(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        enabled: bool,
        priority: i32,
    ) {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let base = base_flag(&slot.base, property);
        push_in(&mut slot.flags, property, base, source, enabled, priority);
        self.dirty.mark(id.idx, dirty::FLAG);
    }

    /// Updates `source`'s flag override. See [`set_float`](Self::set_float).
    pub fn set_flag(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        enabled: bool,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = set_in(&mut slot.flags, property, source, enabled);
        if found {
            self.dirty.mark(id.idx, dirty::FLAG);
        }
        found
    }

    /// Releases `source`'s flag override. See [`pop_float`](Self::pop_float).
    pub fn pop_flag(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        force: bool,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = pop_in(&mut slot.flags, property, source, force);
        if found {
            self.dirty.mark(id.idx, dirty::FLAG);
        }
        found
    }

    /// The state a flag property currently resolves to.
    #[must_use]
    pub fn resolved_flag(&self, id: MaterialId, property: PropertyId) -> bool {
        self.validate(id);
        let slot = &self.slots[id.idx as usize];
        resolved_in(&slot.flags, property).unwrap_or_else(|| base_flag(&slot.base, property))
    }

    // -- Texture properties --

    /// Contributes `source`'s texture override. See
    /// [`push_float`](Self::push_float).
    pub fn push_texture(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: TextureId,
        priority: i32,
    ) {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let base = base_texture(&slot.base, property);
        push_in(&mut slot.textures, property, base, source, value, priority);
        self.dirty.mark(id.idx, dirty::TEXTURE);
    }

    /// Updates `source`'s texture override. See [`set_float`](Self::set_float).
    pub fn set_texture(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        value: TextureId,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = set_in(&mut slot.textures, property, source, value);
        if found {
            self.dirty.mark(id.idx, dirty::TEXTURE);
        }
        found
    }

    /// Releases `source`'s texture override. See [`pop_float`](Self::pop_float).
    pub fn pop_texture(
        &mut self,
        id: MaterialId,
        property: PropertyId,
        source: SourceId,
        force: bool,
    ) -> bool {
        self.validate(id);
        let slot = &mut self.slots[id.idx as usize];
        let found = pop_in(&mut slot.textures, property, source, force);
        if found {
            self.dirty.mark(id.idx, dirty::TEXTURE);
        }
        found
    }

    /// The texture a property currently resolves to.
    #[must_use]
    pub fn resolved_texture(&self, id: MaterialId, property: PropertyId) -> TextureId {
        self.validate(id);
        let slot = &self.slots[id.idx as usize];
        resolved_in(&slot.textures, property).unwrap_or_else(|| base_texture(&slot.base, property))
    }

    // -- Apply pass --

    /// Writes every dirty resolved value through `sink` and returns the
    /// number of writes.
    ///
    /// Called once per frame, after all effect systems have updated.
    /// Drains the per-kind dirty channels, clears each written overrider's
    /// dirty flag, and evicts overriders reduced to their base layer.
    pub fn apply(&mut self, sink: &mut dyn PropertySink) -> u32 {
        let mut writes = 0;

        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::FLOAT)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in drained {
            if self.free_list.contains(&idx) {
                continue;
            }
            let id = MaterialId {
                idx,
                generation: self.generation[idx as usize],
            };
            apply_in(&mut self.slots[idx as usize].floats, id, &mut writes, &mut |m, p, v| {
                sink.set_float(m, p, v);
            });
        }

        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::VECTOR)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in drained {
            if self.free_list.contains(&idx) {
                continue;
            }
            let id = MaterialId {
                idx,
                generation: self.generation[idx as usize],
            };
            apply_in(&mut self.slots[idx as usize].vectors, id, &mut writes, &mut |m, p, v| {
                sink.set_vector(m, p, v);
            });
        }

        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::COLOR)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in drained {
            if self.free_list.contains(&idx) {
                continue;
            }
            let id = MaterialId {
                idx,
                generation: self.generation[idx as usize],
            };
            apply_in(&mut self.slots[idx as usize].colors, id, &mut writes, &mut |m, p, v| {
                sink.set_color(m, p, v);
            });
        }

        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::FLAG)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in drained {
            if self.free_list.contains(&idx) {
                continue;
            }
            let id = MaterialId {
                idx,
                generation: self.generation[idx as usize],
            };
            apply_in(&mut self.slots[idx as usize].flags, id, &mut writes, &mut |m, p, v| {
                sink.set_flag(m, p, v);
            });
        }

        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::TEXTURE)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in drained {
            if self.free_list.contains(&idx) {
                continue;
            }
            let id = MaterialId {
                idx,
                generation: self.generation[idx as usize],
            };
            apply_in(&mut self.slots[idx as usize].textures, id, &mut writes, &mut |m, p, v| {
                sink.set_texture(m, p, v);
            });
        }

        writes
    }

    /// Number of live overriders on a material, across all kinds. Zero
    /// once every effect driving it has reverted and one apply has run.
    #[must_use]
    pub fn overrider_count(&self, id: MaterialId) -> usize {
        self.validate(id);
        let slot = &self.slots[id.idx as usize];
        slot.floats.len()
            + slot.vectors.len()
            + slot.colors.len()
            + slot.flags.len()
            + slot.textures.len()
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: MaterialId) {
        assert!(
            (id.idx as usize) < self.slots.len()
                && self.generation[id.idx as usize] == id.generation,
            "stale MaterialId: {id:?} (current gen: {})",
            if (id.idx as usize) < self.slots.len() {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}

// -- Kind-generic table operations --

fn push_in<T: Copy>(
    table: &mut PropertyTable<T>,
    property: PropertyId,
    base: T,
    source: SourceId,
    value: T,
    priority: i32,
) {
    if let Some((_, overrider)) = table.iter_mut().find(|(p, _)| *p == property) {
        overrider.push(source, value, priority);
        return;
    }
    let mut overrider = ValueOverrider::new();
    overrider.push(SourceId::BASE, base, BASE_PRIORITY);
    overrider.push(source, value, priority);
    table.push((property, overrider));
}

fn set_in<T>(table: &mut PropertyTable<T>, property: PropertyId, source: SourceId, value: T) -> bool {
    match table.iter_mut().find(|(p, _)| *p == property) {
        Some((_, overrider)) => overrider.set(source, value),
        None => false,
    }
}

fn pop_in<T>(table: &mut PropertyTable<T>, property: PropertyId, source: SourceId, force: bool) -> bool {
    match table.iter_mut().find(|(p, _)| *p == property) {
        Some((_, overrider)) => overrider.pop(source, force),
        None => false,
    }
}

fn resolved_in<T: Copy>(table: &PropertyTable<T>, property: PropertyId) -> Option<T> {
    table
        .iter()
        .find(|(p, _)| *p == property)
        .map(|(_, overrider)| *overrider.value())
}

fn apply_in<T: Copy>(
    table: &mut PropertyTable<T>,
    id: MaterialId,
    writes: &mut u32,
    write: &mut dyn FnMut(MaterialId, PropertyId, T),
) {
    for (property, overrider) in table.iter_mut() {
        if overrider.is_dirty() {
            write(id, *property, *overrider.value());
            overrider.clear_dirty();
            *writes += 1;
        }
    }
    // An overrider at base-only refcount was popped back down, which
    // marked it dirty, so its base value was just written; drop it.
    table.retain(|(_, overrider)| overrider.layer_count() > 1);
}

// -- Base-table extraction (panic on kind mismatch: authoring error) --

fn base_float(base: &BTreeMap<PropertyId, PropertyValue>, property: PropertyId) -> f32 {
    match base.get(&property) {
        Some(PropertyValue::Float(v)) => *v,
        Some(other) => panic!("{property:?} base is {other:?}, not a float"),
        None => panic!("material has no base value for {property:?}"),
    }
}

fn base_vector(base: &BTreeMap<PropertyId, PropertyValue>, property: PropertyId) -> Vec4 {
    match base.get(&property) {
        Some(PropertyValue::Vector(v)) => *v,
        Some(other) => panic!("{property:?} base is {other:?}, not a vector"),
        None => panic!("material has no base value for {property:?}"),
    }
}

fn base_color(base: &BTreeMap<PropertyId, PropertyValue>, property: PropertyId) -> Rgba {
    match base.get(&property) {
        Some(PropertyValue::Color(v)) => *v,
        Some(other) => panic!("{property:?} base is {other:?}, not a color"),
        None => panic!("material has no base value for {property:?}"),
    }
}

fn base_flag(base: &BTreeMap<PropertyId, PropertyValue>, property: PropertyId) -> bool {
    match base.get(&property) {
        Some(PropertyValue::Flag(v)) => *v,
        Some(other) => panic!("{property:?} base is {other:?}, not a flag"),
        None => panic!("material has no base value for {property:?}"),
    }
}

fn base_texture(base: &BTreeMap<PropertyId, PropertyValue>, property: PropertyId) -> TextureId {
    match base.get(&property) {
        Some(PropertyValue::Texture(v)) => *v,
        Some(other) => panic!("{property:?} base is {other:?}, not a texture"),
        None => panic!("material has no base value for {property:?}"),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    const EMISSION: PropertyId = PropertyId(0);
    const TINT: PropertyId = PropertyId(1);
    const BURN: SourceId = SourceId(1);
    const FREEZE: SourceId = SourceId(2);

    /// Records every write so tests can assert exactly what reached the
    /// renderer.
    #[derive(Default)]
    struct RecordingSink {
        floats: Vec<(MaterialId, PropertyId, f32)>,
        colors: Vec<(MaterialId, PropertyId, Rgba)>,
        flags: Vec<(MaterialId, PropertyId, bool)>,
        vectors: Vec<(MaterialId, PropertyId, Vec4)>,
        textures: Vec<(MaterialId, PropertyId, TextureId)>,
    }

    impl PropertySink for RecordingSink {
        fn set_float(&mut self, material: MaterialId, property: PropertyId, value: f32) {
            self.floats.push((material, property, value));
        }

        fn set_vector(&mut self, material: MaterialId, property: PropertyId, value: Vec4) {
            self.vectors.push((material, property, value));
        }

        fn set_color(&mut self, material: MaterialId, property: PropertyId, value: Rgba) {
            self.colors.push((material, property, value));
        }

        fn set_flag(&mut self, material: MaterialId, property: PropertyId, enabled: bool) {
            self.flags.push((material, property, enabled));
        }

        fn set_texture(&mut self, material: MaterialId, property: PropertyId, value: TextureId) {
            self.textures.push((material, property, value));
        }
    }

    fn store_with_material() -> (MaterialStore, MaterialId) {
        let mut store = MaterialStore::new();
        let id = store.create_material(vec![
            (EMISSION, PropertyValue::Float(1.0)),
            (TINT, PropertyValue::Color(Rgba::WHITE)),
        ]);
        (store, id)
    }

    #[test]
    fn untouched_property_resolves_to_base() {
        let (store, id) = store_with_material();
        assert_eq!(store.resolved_float(id, EMISSION), 1.0);
        assert_eq!(store.overrider_count(id), 0);
    }

    #[test]
    fn push_resolves_and_apply_writes_once() {
        let (mut store, id) = store_with_material();
        store.push_float(id, EMISSION, BURN, 2.0, 0);
        assert_eq!(store.resolved_float(id, EMISSION), 2.0);

        let mut sink = RecordingSink::default();
        assert_eq!(store.apply(&mut sink), 1);
        assert_eq!(sink.floats, vec![(id, EMISSION, 2.0)]);

        // Nothing changed since; a second apply writes nothing.
        let mut sink = RecordingSink::default();
        assert_eq!(store.apply(&mut sink), 0);
        assert!(sink.floats.is_empty());
    }

    #[test]
    fn competing_sources_compose_by_priority() {
        let (mut store, id) = store_with_material();
        store.push_float(id, EMISSION, BURN, 2.0, 0);
        store.push_float(id, EMISSION, FREEZE, 3.0, 5);
        assert_eq!(store.resolved_float(id, EMISSION), 3.0);

        store.pop_float(id, EMISSION, FREEZE, false);
        assert_eq!(store.resolved_float(id, EMISSION), 2.0);

        store.pop_float(id, EMISSION, BURN, false);
        assert_eq!(store.resolved_float(id, EMISSION), 1.0);
    }

    #[test]
    fn revert_writes_base_and_evicts_the_overrider() {
        let (mut store, id) = store_with_material();
        store.push_float(id, EMISSION, BURN, 2.0, 0);
        let mut sink = RecordingSink::default();
        store.apply(&mut sink);
        assert_eq!(store.overrider_count(id), 1);

        store.pop_float(id, EMISSION, BURN, true);
        let mut sink = RecordingSink::default();
        store.apply(&mut sink);
        assert_eq!(sink.floats, vec![(id, EMISSION, 1.0)], "base value restored");
        assert_eq!(store.overrider_count(id), 0, "base-only overrider evicted");
    }

    #[test]
    fn buried_set_does_not_reach_the_sink() {
        let (mut store, id) = store_with_material();
        store.push_float(id, EMISSION, BURN, 2.0, 0);
        store.push_float(id, EMISSION, FREEZE, 3.0, 5);
        let mut sink = RecordingSink::default();
        store.apply(&mut sink);

        // BURN is buried under FREEZE; its update must not cause a write.
        store.set_float(id, EMISSION, BURN, 2.5);
        let mut sink = RecordingSink::default();
        assert_eq!(store.apply(&mut sink), 0);
    }

    #[test]
    fn kinds_track_dirtiness_independently() {
        let (mut store, id) = store_with_material();
        store.push_float(id, EMISSION, BURN, 2.0, 0);
        store.push_color(id, TINT, BURN, Rgba::BLACK, 0);

        let mut sink = RecordingSink::default();
        assert_eq!(store.apply(&mut sink), 2);

        store.set_color(id, TINT, BURN, Rgba::WHITE);
        let mut sink = RecordingSink::default();
        assert_eq!(store.apply(&mut sink), 1);
        assert!(sink.floats.is_empty());
        assert_eq!(sink.colors.len(), 1);
    }

    #[test]
    fn set_without_push_reports_missing() {
        let (mut store, id) = store_with_material();
        assert!(!store.set_float(id, EMISSION, BURN, 2.0));
        assert!(!store.pop_float(id, EMISSION, BURN, true));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let (mut store, id) = store_with_material();
        store.destroy_material(id);
        let reused = store.create_material(vec![(EMISSION, PropertyValue::Float(4.0))]);
        assert!(!store.is_alive(id));
        assert!(store.is_alive(reused));
        assert_eq!(id.index(), reused.index());
        assert_ne!(id.generation(), reused.generation());
    }

    #[test]
    #[should_panic(expected = "stale MaterialId")]
    fn stale_handle_panics_on_push() {
        let (mut store, id) = store_with_material();
        store.destroy_material(id);
        store.push_float(id, EMISSION, BURN, 2.0, 0);
    }

    #[test]
    #[should_panic(expected = "not a float")]
    fn kind_mismatch_panics() {
        let (mut store, id) = store_with_material();
        store.push_float(id, TINT, BURN, 2.0, 0);
    }

    #[test]
    #[should_panic(expected = "no base value")]
    fn unknown_property_panics() {
        let (mut store, id) = store_with_material();
        store.push_float(id, PropertyId(99), BURN, 2.0, 0);
    }

    #[test]
    fn destroyed_slot_is_skipped_by_apply() {
        let (mut store, id) = store_with_material();
        store.push_float(id, EMISSION, BURN, 2.0, 0);
        store.destroy_material(id);

        let mut sink = RecordingSink::default();
        assert_eq!(store.apply(&mut sink), 0);
    }
}
