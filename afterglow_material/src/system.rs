// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The concrete material effect system.
//!
//! [`MaterialDriver`] supplies the lifecycle hooks that connect the staged
//! scheduler to the [`MaterialStore`]: init snapshots the target's
//! materials and modifier flags into the instance payload, perform
//! evaluates the config's modifiers at normalized stage progress, and
//! clear force-pops every claimed layer so nothing leaks into overriders
//! that other instances still share.
//!
//! One driver exists per target; it owns the target's store outright, and
//! the embedder reaches through it once per frame to run the apply pass.

use alloc::vec;
use alloc::vec::Vec;

use afterglow_core::config::{EffectConfig, Features, Playback};
use afterglow_core::source::SourceId;
use afterglow_core::state::EffectState;
use afterglow_core::system::EffectDriver;

use crate::modifier::Modifier;
use crate::store::{MaterialId, MaterialStore};

/// An authored material effect: shared playback timing plus the modifier
/// recipes it drives.
///
/// The `source` identifies this config in every overrider it touches; all
/// modifiers of one config share it, which is safe because they target
/// distinct properties.
#[derive(Clone, Debug)]
pub struct MaterialEffectConfig {
    /// Overrider source identity for this config.
    pub source: SourceId,
    /// Shared timing block.
    pub playback: Playback,
    /// The properties this effect drives.
    pub modifiers: Vec<Modifier>,
}

impl MaterialEffectConfig {
    /// Creates a config from its parts.
    #[must_use]
    pub fn new(source: SourceId, playback: Playback, modifiers: Vec<Modifier>) -> Self {
        Self {
            source,
            playback,
            modifiers,
        }
    }
}

impl EffectConfig for MaterialEffectConfig {
    fn features(&self) -> Features {
        Features {
            staging: true,
            requires_target: true,
        }
    }

    fn playback(&self) -> &Playback {
        &self.playback
    }

    fn is_valid(&self) -> bool {
        !self.modifiers.is_empty()
    }
}

/// Per-instance payload: the materials the instance drives and, per
/// modifier, whether its first apply has happened (push vs set).
#[derive(Debug, Default)]
pub struct MaterialPlayback {
    /// Materials snapshotted from the driver at init.
    pub materials: Vec<MaterialId>,
    /// One flag per config modifier.
    pub applied: Vec<bool>,
}

/// Hook implementation for material effects, bound to one target.
#[derive(Debug)]
pub struct MaterialDriver {
    store: MaterialStore,
    materials: Vec<MaterialId>,
}

impl MaterialDriver {
    /// Creates a driver owning `store`, driving the given materials.
    #[must_use]
    pub fn new(store: MaterialStore, materials: Vec<MaterialId>) -> Self {
        Self { store, materials }
    }

    /// The target's material store.
    #[must_use]
    pub fn store(&self) -> &MaterialStore {
        &self.store
    }

    /// Mutable access to the store, e.g. for the per-frame apply pass.
    pub fn store_mut(&mut self) -> &mut MaterialStore {
        &mut self.store
    }

    /// The materials new instances will drive.
    #[must_use]
    pub fn materials(&self) -> &[MaterialId] {
        &self.materials
    }
}

impl EffectDriver for MaterialDriver {
    type Config = MaterialEffectConfig;
    type Payload = MaterialPlayback;

    fn on_state_init(
        &mut self,
        config: &MaterialEffectConfig,
        state: &mut EffectState<MaterialPlayback>,
    ) {
        state.payload.materials = self.materials.clone();
        state.payload.applied = vec![false; config.modifiers.len()];
    }

    fn on_perform(
        &mut self,
        config: &MaterialEffectConfig,
        state: &mut EffectState<MaterialPlayback>,
    ) {
        let progress = state.progress(&config.playback);
        let stage = state.stage;
        for (index, modifier) in config.modifiers.iter().enumerate() {
            let first = !state.payload.applied[index];
            modifier.apply(
                &mut self.store,
                &state.payload.materials,
                config.source,
                config.playback.priority,
                stage,
                progress,
                first,
            );
            state.payload.applied[index] = true;
        }
    }

    fn on_clear(
        &mut self,
        config: &MaterialEffectConfig,
        state: &mut EffectState<MaterialPlayback>,
    ) {
        for (index, modifier) in config.modifiers.iter().enumerate() {
            if state.payload.applied[index] {
                modifier.revert(&mut self.store, &state.payload.materials, config.source);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use afterglow_core::config::ConfigSet;
    use afterglow_core::curve::Curve;
    use afterglow_core::handle::SystemKind;
    use afterglow_core::system::EffectSystem;
    use afterglow_core::tick::FrameDelta;

    use super::*;
    use crate::property::{PropertyId, PropertyValue};

    const EMISSION: PropertyId = PropertyId(0);
    const BURN: SourceId = SourceId(1);
    const FLASH: SourceId = SourceId(2);

    fn staged(priority: i32) -> Playback {
        Playback {
            priority,
            fade_in: 1.0,
            loop_duration: 2.0,
            loop_times: 2,
            fade_out: 0.5,
            ..Playback::default()
        }
    }

    fn material_system() -> (EffectSystem<MaterialDriver>, MaterialId) {
        let mut store = MaterialStore::new();
        let material = store.create_material([(EMISSION, PropertyValue::Float(1.0))]);
        let driver = MaterialDriver::new(store, vec![material]);
        (EffectSystem::new(SystemKind(0), None, driver), material)
    }

    fn emission_ramp(source: SourceId, priority: i32) -> MaterialEffectConfig {
        MaterialEffectConfig::new(
            source,
            staged(priority),
            vec![Modifier::float_curves(
                EMISSION,
                [
                    Curve::linear(0.0, 1.0),
                    Curve::constant(1.0),
                    Curve::linear(1.0, 0.0),
                ],
            )],
        )
    }

    #[test]
    fn perform_drives_the_property_through_its_stages() {
        let mut configs = ConfigSet::new();
        let config = configs.register(emission_ramp(BURN, 0));
        let (mut sys, material) = material_system();

        sys.add(&configs, config);

        // Halfway through the fade-in the ramp reads 0.5.
        sys.update(&configs, FrameDelta::uniform(0.5));
        let resolved = sys.driver().store().resolved_float(material, EMISSION);
        assert!((resolved - 0.5).abs() < 1e-6);

        // Into the loop: held at full strength.
        sys.update(&configs, FrameDelta::uniform(1.0));
        let resolved = sys.driver().store().resolved_float(material, EMISSION);
        assert_eq!(resolved, 1.0);
    }

    #[test]
    fn completion_reverts_to_base() {
        let mut configs = ConfigSet::new();
        let config = configs.register(emission_ramp(BURN, 0));
        let (mut sys, material) = material_system();

        sys.add(&configs, config);
        // Run well past the full lifetime (1.0 + 2*2.0 + 0.5 = 5.5s).
        for _ in 0..80 {
            sys.update(&configs, FrameDelta::uniform(0.1));
        }
        assert!(sys.is_empty(), "instance completed");

        let driver = sys.driver_mut();
        assert_eq!(driver.store().resolved_float(material, EMISSION), 1.0);

        // After one apply pass the base-only overrider is gone entirely.
        let mut sink = CountingSink::default();
        driver.store_mut().apply(&mut sink);
        assert!(sink.writes >= 1, "the revert must write the base value");
        assert_eq!(driver.store().overrider_count(material), 0);
    }

    #[test]
    fn early_removal_reverts_to_base() {
        let mut configs = ConfigSet::new();
        let config = configs.register(emission_ramp(BURN, 0));
        let (mut sys, material) = material_system();

        let handle = sys.add(&configs, config);
        sys.update(&configs, FrameDelta::uniform(0.5));
        assert_ne!(sys.driver().store().resolved_float(material, EMISSION), 1.0);

        assert!(sys.remove(&configs, handle.instance));
        assert_eq!(sys.driver().store().resolved_float(material, EMISSION), 1.0);
    }

    #[test]
    fn higher_priority_config_wins_the_property() {
        let mut configs = ConfigSet::new();
        let ramp = configs.register(emission_ramp(BURN, 0));
        let flash = configs.register(MaterialEffectConfig::new(
            FLASH,
            staged(5),
            vec![Modifier::float_fixed(EMISSION, [9.0, 9.0, 9.0])],
        ));
        let (mut sys, material) = material_system();

        sys.add(&configs, ramp);
        let flash_handle = sys.add(&configs, flash);
        sys.update(&configs, FrameDelta::uniform(0.5));

        // The priority-5 flash performs after the ramp and owns the top
        // layer.
        assert_eq!(sys.driver().store().resolved_float(material, EMISSION), 9.0);

        // Removing it hands the property back to the still-playing ramp.
        sys.remove(&configs, flash_handle.instance);
        let resolved = sys.driver().store().resolved_float(material, EMISSION);
        assert!((resolved - 0.5).abs() < 1e-6);
    }

    #[test]
    fn removal_before_first_perform_is_clean() {
        let mut configs = ConfigSet::new();
        let config = configs.register(emission_ramp(BURN, 0));
        let (mut sys, material) = material_system();

        let handle = sys.add(&configs, config);
        // No update ran; no modifier ever pushed. Removal must not pop
        // layers that were never claimed.
        assert!(sys.remove(&configs, handle.instance));
        assert_eq!(sys.driver().store().overrider_count(material), 0);
    }

    /// Sink that only counts writes; these tests assert through
    /// `resolved_float` instead.
    #[derive(Default)]
    struct CountingSink {
        writes: u32,
    }

    impl crate::store::PropertySink for CountingSink {
        fn set_float(&mut self, _m: MaterialId, _p: PropertyId, _v: f32) {
            self.writes += 1;
        }

        fn set_vector(&mut self, _m: MaterialId, _p: PropertyId, _v: crate::property::Vec4) {
            self.writes += 1;
        }

        fn set_color(&mut self, _m: MaterialId, _p: PropertyId, _v: crate::property::Rgba) {
            self.writes += 1;
        }

        fn set_flag(&mut self, _m: MaterialId, _p: PropertyId, _v: bool) {
            self.writes += 1;
        }

        fn set_texture(&mut self, _m: MaterialId, _p: PropertyId, _v: crate::property::TextureId) {
            self.writes += 1;
        }
    }
}
