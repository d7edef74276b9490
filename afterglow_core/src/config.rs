// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect configuration: feature flags, playback timing, and registration.
//!
//! A config is an authoring-time definition — durations, priority, flags —
//! that is read-only once registered. States reference configs by
//! [`ConfigId`]; a config is never mutated by the instances playing it.

use alloc::vec::Vec;
use core::fmt;

/// Per-config capability flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Features {
    /// Whether the instance walks fade-in → loop → fade-out by duration.
    /// Without it the instance is driven in fade-in until explicitly
    /// removed.
    pub staging: bool,
    /// Whether `add` must be given a live target. Global effects (scene
    /// fades, screen flashes) leave this unset.
    pub requires_target: bool,
}

/// Immutable per-play timing block shared by every effect kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playback {
    /// Update-order priority. Higher-priority instances perform later so
    /// their overrides win last-writer tie-breaks in the overrider.
    pub priority: i32,
    /// Fade-in duration in seconds.
    pub fade_in: f32,
    /// Duration of one loop iteration in seconds.
    pub loop_duration: f32,
    /// Number of loop iterations before fading out.
    pub loop_times: u32,
    /// Fade-out duration in seconds.
    pub fade_out: f32,
    /// Whether the instance advances on scaled game time (`true`) or on
    /// unscaled wall time (`false`).
    pub time_scaled: bool,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            priority: 0,
            fade_in: 1.0,
            loop_duration: 1.0,
            loop_times: 1,
            fade_out: 1.0,
            time_scaled: true,
        }
    }
}

/// Implemented by concrete config types (material, screen, ...).
pub trait EffectConfig {
    /// Capability flags for instances of this config.
    fn features(&self) -> Features;

    /// The shared timing block.
    fn playback(&self) -> &Playback;

    /// Whether the config is complete enough to play. Checked once at
    /// registration, not per play.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Handle to a registered config within one [`ConfigSet`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigId(pub u32);

impl ConfigId {
    /// Sentinel for "no config", used by pooled states between plays.
    pub const INVALID: Self = Self(u32::MAX);
}

impl fmt::Debug for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "ConfigId(INVALID)")
        } else {
            write!(f, "ConfigId({})", self.0)
        }
    }
}

/// Registered configs for one effect kind.
///
/// Configs are appended once, up front, and addressed by [`ConfigId`]
/// thereafter; nothing is ever removed, so ids stay stable for the life of
/// the set.
#[derive(Debug, Default)]
pub struct ConfigSet<C: EffectConfig> {
    configs: Vec<C>,
}

impl<C: EffectConfig> ConfigSet<C> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            configs: Vec::new(),
        }
    }

    /// Registers a config and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the config reports itself invalid — an incomplete config
    /// is an authoring error, caught here rather than on every play.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "config sets are authored content, far below u32::MAX entries"
    )]
    pub fn register(&mut self, config: C) -> ConfigId {
        assert!(config.is_valid(), "refusing to register an invalid config");
        let id = ConfigId(self.configs.len() as u32);
        self.configs.push(config);
        id
    }

    /// Returns the config for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this set.
    #[must_use]
    pub fn get(&self, id: ConfigId) -> &C {
        assert!(
            (id.0 as usize) < self.configs.len(),
            "unknown ConfigId: {id:?}"
        );
        &self.configs[id.0 as usize]
    }

    /// Number of registered configs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        playback: Playback,
        valid: bool,
    }

    impl EffectConfig for Dummy {
        fn features(&self) -> Features {
            Features::default()
        }

        fn playback(&self) -> &Playback {
            &self.playback
        }

        fn is_valid(&self) -> bool {
            self.valid
        }
    }

    #[test]
    fn register_and_get() {
        let mut set = ConfigSet::new();
        let id = set.register(Dummy {
            playback: Playback::default(),
            valid: true,
        });
        assert_eq!(set.get(id).playback().loop_times, 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    #[should_panic(expected = "invalid config")]
    fn register_rejects_invalid() {
        let mut set = ConfigSet::new();
        let _ = set.register(Dummy {
            playback: Playback::default(),
            valid: false,
        });
    }

    #[test]
    #[should_panic(expected = "unknown ConfigId")]
    fn get_rejects_foreign_id() {
        let set: ConfigSet<Dummy> = ConfigSet::new();
        let _ = set.get(ConfigId(0));
    }
}
