// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-target system instances for one effect kind.
//!
//! Material-style effects need one [`EffectSystem`] per target (each
//! entity's materials are its own); screen-style effects run one global
//! instance. [`SystemMap`] owns both shapes behind one key: systems are
//! created lazily per `Option<TargetId>` by a factory the embedder
//! supplies, and configs for the kind live in one shared
//! [`ConfigSet`].
//!
//! This is deliberately explicit state — the embedder owns one map per
//! effect kind and wires them into its frame loop — rather than a
//! process-wide manager singleton.
//!
//! # Removal races
//!
//! `remove` tolerates handles whose target or instance is already gone: a
//! trigger tearing down after its target was destroyed, or after the
//! instance completed its fade-out, is an expected race and resolves to
//! `false` without logging. Passing a handle minted by a *different kind's*
//! map, by contrast, is a dispatch bug and panics.

use alloc::collections::BTreeMap;
use core::error::Error;
use core::fmt;

use crate::config::{ConfigId, ConfigSet, EffectConfig};
use crate::handle::{EffectHandle, SystemKind, TargetId};
use crate::system::{EffectDriver, EffectSystem, UpdateChanges};
use crate::tick::FrameDelta;

/// Why an `add` was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddError {
    /// The config requires a live target and none was supplied.
    TargetRequired,
}

impl fmt::Display for AddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetRequired => {
                write!(f, "config requires a target but none was supplied")
            }
        }
    }
}

impl Error for AddError {}

/// All systems of one effect kind, keyed by target.
pub struct SystemMap<D, F>
where
    D: EffectDriver,
    F: FnMut(Option<TargetId>) -> D,
{
    kind: SystemKind,
    configs: ConfigSet<D::Config>,
    systems: BTreeMap<Option<TargetId>, EffectSystem<D>>,
    factory: F,
}

impl<D, F> fmt::Debug for SystemMap<D, F>
where
    D: EffectDriver,
    F: FnMut(Option<TargetId>) -> D,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemMap")
            .field("kind", &self.kind)
            .field("configs", &self.configs.len())
            .field("systems", &self.systems.len())
            .finish_non_exhaustive()
    }
}

impl<D, F> SystemMap<D, F>
where
    D: EffectDriver,
    F: FnMut(Option<TargetId>) -> D,
{
    /// Creates an empty map for `kind`. The factory builds a driver for
    /// each target the map first sees (binding the target's materials,
    /// resolving its camera, ...).
    #[must_use]
    pub fn new(kind: SystemKind, factory: F) -> Self {
        Self {
            kind,
            configs: ConfigSet::new(),
            systems: BTreeMap::new(),
            factory,
        }
    }

    /// The kind this map dispatches.
    #[must_use]
    pub fn kind(&self) -> SystemKind {
        self.kind
    }

    /// Registers a config for this kind. See [`ConfigSet::register`].
    pub fn register_config(&mut self, config: D::Config) -> ConfigId {
        self.configs.register(config)
    }

    /// Returns a registered config.
    #[must_use]
    pub fn config(&self, id: ConfigId) -> &D::Config {
        self.configs.get(id)
    }

    /// Starts an instance of `config` against `target`.
    ///
    /// Fails fast when the config demands a target and none is given —
    /// proceeding would bind the instance to nothing and leak it.
    pub fn add(
        &mut self,
        config: ConfigId,
        target: Option<TargetId>,
    ) -> Result<EffectHandle, AddError> {
        if self.configs.get(config).features().requires_target && target.is_none() {
            return Err(AddError::TargetRequired);
        }

        let kind = self.kind;
        let factory = &mut self.factory;
        let system = self
            .systems
            .entry(target)
            .or_insert_with(|| EffectSystem::new(kind, target, factory(target)));
        Ok(system.add(&self.configs, config))
    }

    /// Removes the instance a handle refers to, returning whether it was
    /// still running. Unknown targets and instances are benign (see module
    /// docs).
    ///
    /// # Panics
    ///
    /// Panics if the handle was minted by a different kind's map.
    pub fn remove(&mut self, handle: EffectHandle) -> bool {
        assert!(
            handle.system == self.kind,
            "handle for {:?} passed to a {:?} map",
            handle.system,
            self.kind
        );
        let Some(system) = self.systems.get_mut(&handle.target) else {
            return false;
        };
        system.remove(&self.configs, handle.instance)
    }

    /// Advances every system by `delta`, accumulating all changes into
    /// `changes` (cleared first). Systems tick in target order; instances
    /// within each system tick in priority order.
    pub fn update_all(&mut self, delta: FrameDelta, changes: &mut UpdateChanges) {
        changes.clear();
        let mut scratch = UpdateChanges::default();
        for system in self.systems.values_mut() {
            system.update_into(&self.configs, delta, &mut scratch);
            changes.performed += scratch.performed;
            changes.transitions.append(&mut scratch.transitions);
            changes.completed.append(&mut scratch.completed);
        }
    }

    /// The system bound to `target`, if one has been created.
    #[must_use]
    pub fn system(&self, target: Option<TargetId>) -> Option<&EffectSystem<D>> {
        self.systems.get(&target)
    }

    /// Mutable access to the system bound to `target`.
    pub fn system_mut(&mut self, target: Option<TargetId>) -> Option<&mut EffectSystem<D>> {
        self.systems.get_mut(&target)
    }

    /// Number of per-target systems created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems have been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Total active instances across all systems.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.systems.values().map(EffectSystem::active_len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Features, Playback};
    use crate::handle::InstanceId;

    struct BoundConfig {
        playback: Playback,
        requires_target: bool,
    }

    impl EffectConfig for BoundConfig {
        fn features(&self) -> Features {
            Features {
                staging: true,
                requires_target: self.requires_target,
            }
        }

        fn playback(&self) -> &Playback {
            &self.playback
        }
    }

    /// Driver that remembers which target it was built for.
    struct BoundDriver {
        target: Option<TargetId>,
    }

    impl EffectDriver for BoundDriver {
        type Config = BoundConfig;
        type Payload = ();
    }

    fn map() -> SystemMap<BoundDriver, impl FnMut(Option<TargetId>) -> BoundDriver> {
        SystemMap::new(SystemKind(1), |target| BoundDriver { target })
    }

    fn bound_config() -> BoundConfig {
        BoundConfig {
            playback: Playback::default(),
            requires_target: true,
        }
    }

    #[test]
    fn add_requires_target_when_config_demands_one() {
        let mut map = map();
        let config = map.register_config(bound_config());

        assert_eq!(map.add(config, None), Err(AddError::TargetRequired));
        assert!(map.is_empty(), "failed add must not create a system");

        let handle = map
            .add(config, Some(TargetId(7)))
            .expect("targeted add succeeds");
        assert_eq!(handle.target, Some(TargetId(7)));
        assert_eq!(handle.system, SystemKind(1));
    }

    #[test]
    fn untargeted_configs_share_the_global_system() {
        let mut map = map();
        let config = map.register_config(BoundConfig {
            playback: Playback::default(),
            requires_target: false,
        });

        map.add(config, None).expect("global add succeeds");
        map.add(config, None).expect("global add succeeds");
        assert_eq!(map.len(), 1);
        assert_eq!(map.active_len(), 2);
    }

    #[test]
    fn systems_are_created_lazily_per_target() {
        let mut map = map();
        let config = map.register_config(bound_config());

        map.add(config, Some(TargetId(1))).expect("add succeeds");
        map.add(config, Some(TargetId(2))).expect("add succeeds");
        map.add(config, Some(TargetId(1))).expect("add succeeds");

        assert_eq!(map.len(), 2);
        let system = map.system(Some(TargetId(1))).expect("system exists");
        assert_eq!(system.driver().target, Some(TargetId(1)));
        assert_eq!(system.active_len(), 2);
    }

    #[test]
    fn remove_tolerates_gone_targets_and_instances() {
        let mut map = map();
        let config = map.register_config(bound_config());
        let handle = map.add(config, Some(TargetId(1))).expect("add succeeds");

        // A handle whose target never spawned a system.
        let phantom = EffectHandle {
            system: SystemKind(1),
            instance: InstanceId(99),
            target: Some(TargetId(42)),
        };
        assert!(!map.remove(phantom));

        assert!(map.remove(handle));
        assert!(!map.remove(handle), "second removal is benign");
    }

    #[test]
    #[should_panic(expected = "passed to a")]
    fn remove_rejects_foreign_kind() {
        let mut map = map();
        let config = map.register_config(bound_config());
        let mut handle = map.add(config, Some(TargetId(1))).expect("add succeeds");
        handle.system = SystemKind(9);
        let _ = map.remove(handle);
    }

    #[test]
    fn update_all_aggregates_changes() {
        let mut map = map();
        let config = map.register_config(BoundConfig {
            playback: Playback {
                fade_in: 0.1,
                loop_duration: 0.1,
                loop_times: 1,
                fade_out: 0.1,
                ..Playback::default()
            },
            requires_target: true,
        });
        map.add(config, Some(TargetId(1))).expect("add succeeds");
        map.add(config, Some(TargetId(2))).expect("add succeeds");

        let mut changes = UpdateChanges::default();
        map.update_all(FrameDelta::uniform(1.0), &mut changes);
        assert_eq!(changes.completed.len(), 2);
        assert_eq!(map.active_len(), 0);
    }
}
