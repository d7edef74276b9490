// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage-driven property modifiers.
//!
//! A [`Modifier`] is one property's animation recipe within an effect
//! config: for each lifecycle stage (fade-in, loop, fade-out) it holds
//! either a fixed value or a keyframe curve sampled at normalized stage
//! progress.
//!
//! Application follows the overrider's push/set split: the first frame a
//! modifier drives a material it *pushes* (claiming a layer at the
//! config's priority), every later frame it *sets* (updating the value in
//! place), and on teardown it *pops* with force so no layer outlives the
//! instance.

use afterglow_core::curve::{Curve, Lerp};
use afterglow_core::source::SourceId;
use afterglow_core::state::{ACTIVE_STAGE_COUNT, Stage};

use crate::property::{PropertyId, Rgba, TextureId, Vec4};
use crate::store::{MaterialId, MaterialStore};

/// Per-stage values: fixed or curve-driven.
///
/// Indexed by [`Stage::index`], so each active stage gets its own entry.
#[derive(Clone, Debug)]
pub enum StagedValues<T> {
    /// One constant value per stage.
    Fixed([T; ACTIVE_STAGE_COUNT]),
    /// One curve per stage, sampled at normalized stage progress.
    Curve([Curve<T>; ACTIVE_STAGE_COUNT]),
}

impl<T: Lerp> StagedValues<T> {
    /// The same constant in every stage.
    #[must_use]
    pub fn uniform(value: T) -> Self {
        Self::Fixed([value; ACTIVE_STAGE_COUNT])
    }

    /// Evaluates the value for `stage` at normalized `progress`.
    #[must_use]
    pub fn evaluate(&self, stage: Stage, progress: f32) -> T {
        match self {
            Self::Fixed(values) => values[stage.index()],
            Self::Curve(curves) => curves[stage.index()].sample(progress),
        }
    }
}

/// The value kind a modifier drives, with its per-stage data.
///
/// Flags evaluate a scalar recipe and enable the flag while it is
/// positive, which lets a curve toggle a keyword partway through a stage.
/// Textures are fixed per stage; there is nothing to interpolate between
/// two texture bindings.
#[derive(Clone, Debug)]
pub enum ModifierChannel {
    /// Drives a float property.
    Float(StagedValues<f32>),
    /// Drives a vector property.
    Vector(StagedValues<Vec4>),
    /// Drives a color property.
    Color(StagedValues<Rgba>),
    /// Drives a shader keyword / pass toggle.
    Flag(StagedValues<f32>),
    /// Drives a texture binding, one per stage.
    Texture([TextureId; ACTIVE_STAGE_COUNT]),
}

/// One property's animation recipe within an effect config.
#[derive(Clone, Debug)]
pub struct Modifier {
    /// The property this modifier drives.
    pub property: PropertyId,
    /// Value kind and per-stage data.
    pub channel: ModifierChannel,
}

impl Modifier {
    /// Evaluates and applies this modifier to every bound material.
    ///
    /// `first` selects the push path (claim a layer at `priority`) over
    /// the set path (update the claimed layer in place).
    pub fn apply(
        &self,
        store: &mut MaterialStore,
        materials: &[MaterialId],
        source: SourceId,
        priority: i32,
        stage: Stage,
        progress: f32,
        first: bool,
    ) {
        match &self.channel {
            ModifierChannel::Float(values) => {
                let value = values.evaluate(stage, progress);
                for &material in materials {
                    if first {
                        store.push_float(material, self.property, source, value, priority);
                    } else {
                        store.set_float(material, self.property, source, value);
                    }
                }
            }
            ModifierChannel::Vector(values) => {
                let value = values.evaluate(stage, progress);
                for &material in materials {
                    if first {
                        store.push_vector(material, self.property, source, value, priority);
                    } else {
                        store.set_vector(material, self.property, source, value);
                    }
                }
            }
            ModifierChannel::Color(values) => {
                let value = values.evaluate(stage, progress);
                for &material in materials {
                    if first {
                        store.push_color(material, self.property, source, value, priority);
                    } else {
                        store.set_color(material, self.property, source, value);
                    }
                }
            }
            ModifierChannel::Flag(values) => {
                let enabled = values.evaluate(stage, progress) > 0.0;
                for &material in materials {
                    if first {
                        store.push_flag(material, self.property, source, enabled, priority);
                    } else {
                        store.set_flag(material, self.property, source, enabled);
                    }
                }
            }
            ModifierChannel::Texture(values) => {
                let value = values[stage.index()];
                for &material in materials {
                    if first {
                        store.push_texture(material, self.property, source, value, priority);
                    } else {
                        store.set_texture(material, self.property, source, value);
                    }
                }
            }
        }
    }

    /// Pops this modifier's layer from every bound material, regardless of
    /// outstanding pushes.
    pub fn revert(&self, store: &mut MaterialStore, materials: &[MaterialId], source: SourceId) {
        for &material in materials {
            match &self.channel {
                ModifierChannel::Float(_) => {
                    store.pop_float(material, self.property, source, true);
                }
                ModifierChannel::Vector(_) => {
                    store.pop_vector(material, self.property, source, true);
                }
                ModifierChannel::Color(_) => {
                    store.pop_color(material, self.property, source, true);
                }
                ModifierChannel::Flag(_) => {
                    store.pop_flag(material, self.property, source, true);
                }
                ModifierChannel::Texture(_) => {
                    store.pop_texture(material, self.property, source, true);
                }
            }
        }
    }
}

/// Convenience constructors for the common recipes.
impl Modifier {
    /// A float modifier with per-stage curves.
    #[must_use]
    pub fn float_curves(property: PropertyId, curves: [Curve<f32>; ACTIVE_STAGE_COUNT]) -> Self {
        Self {
            property,
            channel: ModifierChannel::Float(StagedValues::Curve(curves)),
        }
    }

    /// A float modifier with fixed per-stage values.
    #[must_use]
    pub fn float_fixed(property: PropertyId, values: [f32; ACTIVE_STAGE_COUNT]) -> Self {
        Self {
            property,
            channel: ModifierChannel::Float(StagedValues::Fixed(values)),
        }
    }

    /// A color modifier with per-stage curves.
    #[must_use]
    pub fn color_curves(property: PropertyId, curves: [Curve<Rgba>; ACTIVE_STAGE_COUNT]) -> Self {
        Self {
            property,
            channel: ModifierChannel::Color(StagedValues::Curve(curves)),
        }
    }

    /// A flag modifier that is on for the whole lifetime.
    #[must_use]
    pub fn flag_on(property: PropertyId) -> Self {
        Self {
            property,
            channel: ModifierChannel::Flag(StagedValues::uniform(1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use afterglow_core::curve::Curve;

    use super::*;
    use crate::property::PropertyValue;

    const GLOW: PropertyId = PropertyId(0);
    const RIM: PropertyId = PropertyId(1);
    const SRC: SourceId = SourceId(1);

    fn store_with_material() -> (MaterialStore, MaterialId) {
        let mut store = MaterialStore::new();
        let id = store.create_material(vec![
            (GLOW, PropertyValue::Float(0.0)),
            (RIM, PropertyValue::Flag(false)),
        ]);
        (store, id)
    }

    #[test]
    fn staged_values_pick_the_stage_entry() {
        let values = StagedValues::Fixed([1.0_f32, 2.0, 3.0]);
        assert_eq!(values.evaluate(Stage::FadingIn, 0.5), 1.0);
        assert_eq!(values.evaluate(Stage::Looping, 0.5), 2.0);
        assert_eq!(values.evaluate(Stage::FadingOut, 0.5), 3.0);
    }

    #[test]
    fn curve_values_follow_progress() {
        let values = StagedValues::Curve([
            Curve::linear(0.0_f32, 1.0),
            Curve::constant(1.0),
            Curve::linear(1.0, 0.0),
        ]);
        assert!((values.evaluate(Stage::FadingIn, 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(values.evaluate(Stage::Looping, 0.7), 1.0);
        assert!((values.evaluate(Stage::FadingOut, 0.75) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn first_apply_pushes_then_sets() {
        let (mut store, id) = store_with_material();
        let modifier = Modifier::float_fixed(GLOW, [1.0, 2.0, 3.0]);
        let materials = [id];

        modifier.apply(&mut store, &materials, SRC, 0, Stage::FadingIn, 0.0, true);
        assert_eq!(store.resolved_float(id, GLOW), 1.0);
        assert_eq!(store.overrider_count(id), 1);

        // Re-applying sets in place; no second layer, no extra refcount.
        modifier.apply(&mut store, &materials, SRC, 0, Stage::Looping, 0.5, false);
        assert_eq!(store.resolved_float(id, GLOW), 2.0);
        assert_eq!(store.overrider_count(id), 1);

        // One forced pop suffices for teardown.
        modifier.revert(&mut store, &materials, SRC);
        assert_eq!(store.resolved_float(id, GLOW), 0.0);
    }

    #[test]
    fn flag_modifier_thresholds_its_recipe() {
        let (mut store, id) = store_with_material();
        let modifier = Modifier {
            property: RIM,
            channel: ModifierChannel::Flag(StagedValues::Fixed([1.0, 1.0, 0.0])),
        };
        let materials = [id];

        modifier.apply(&mut store, &materials, SRC, 0, Stage::FadingIn, 0.0, true);
        assert!(store.resolved_flag(id, RIM));

        modifier.apply(&mut store, &materials, SRC, 0, Stage::FadingOut, 0.5, false);
        assert!(!store.resolved_flag(id, RIM));
    }
}
