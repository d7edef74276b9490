// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The staged effect scheduler.
//!
//! [`EffectSystem`] advances every active effect instance through its timed
//! lifecycle each frame and drives the four lifecycle hooks a concrete
//! system supplies through [`EffectDriver`]:
//!
//! ```text
//!   Inactive ──add──► FadingIn ──fade_in elapsed──► Looping ─┐
//!                        ▲                            │  ▲   │ loop_duration
//!                        │ (staging feature off:      │  └───┘ elapsed,
//!                        │  held here until removed)  │        looped_times
//!                                                     ▼        < loop_times
//!                              removed ◄──fade_out── FadingOut
//!                                        elapsed
//! ```
//!
//! Transitions are evaluated sequentially — fade-in check, then loop
//! check, then fade-out check — and each carries the *remaining* time into
//! the next stage by subtraction rather than resetting to zero, so timing
//! drift never accumulates across stage boundaries. A large enough delta
//! cascades through several transitions in a single tick.
//!
//! Instances that cross past fade-out are queued and released only after
//! the full pass completes (mutate-then-remove), so the active list is
//! never mutated while it is being iterated.
//!
//! # Ordering
//!
//! The active list is kept in ascending config priority with stable ties
//! (insertion order among equals). Higher-priority instances therefore
//! `on_perform` later, which lets their overrides win the overrider's
//! last-writer tie-breaks. This ordering is load-bearing; see
//! [`ValueOverrider`](crate::overrider::ValueOverrider).

use alloc::vec::Vec;

use crate::config::{ConfigId, ConfigSet, EffectConfig};
use crate::handle::{EffectHandle, InstanceId, SystemKind, TargetId};
use crate::state::{EffectState, Stage};
use crate::tick::FrameDelta;

/// Lifecycle hooks a concrete effect system supplies.
///
/// The scheduler is the template; drivers fill in what an instance *does*:
/// snapshotting target materials, spawning a screen object, pushing and
/// updating override layers. All hooks default to no-ops so a driver
/// implements only the ones it needs.
pub trait EffectDriver {
    /// The concrete config type instances of this driver play.
    type Config: EffectConfig;
    /// Per-instance data, reset via [`Default`] when a state is pooled.
    type Payload: Default;

    /// One-time setup right after a state is allocated and bound, e.g.
    /// snapshotting the target's materials into the payload.
    fn on_state_init(&mut self, config: &Self::Config, state: &mut EffectState<Self::Payload>) {
        let _ = (config, state);
    }

    /// Called once after init, before the first perform.
    fn on_play_start(&mut self, config: &Self::Config, state: &mut EffectState<Self::Payload>) {
        let _ = (config, state);
    }

    /// Called every frame the instance is alive, after stage transitions
    /// for that frame have been applied.
    fn on_perform(&mut self, config: &Self::Config, state: &mut EffectState<Self::Payload>) {
        let _ = (config, state);
    }

    /// Called once before teardown. Drivers must revert every override they
    /// pushed (forced pops), or layers leak into shared overriders.
    fn on_clear(&mut self, config: &Self::Config, state: &mut EffectState<Self::Payload>) {
        let _ = (config, state);
    }
}

/// One stage transition observed during an update pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageTransition {
    /// The instance that transitioned.
    pub instance: InstanceId,
    /// Stage before the transition.
    pub from: Stage,
    /// Stage after the transition.
    pub to: Stage,
}

/// The set of changes produced by a single [`EffectSystem::update`] call.
///
/// The embedder consumes this for instrumentation and bookkeeping; the
/// scheduler itself has already acted on everything in here.
#[derive(Clone, Debug, Default)]
pub struct UpdateChanges {
    /// Number of instances that performed this tick.
    pub performed: u32,
    /// Stage transitions, in update order.
    pub transitions: Vec<StageTransition>,
    /// Instances that completed their fade-out and were released.
    pub completed: Vec<InstanceId>,
}

impl UpdateChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.performed = 0;
        self.transitions.clear();
        self.completed.clear();
    }
}

/// Pool traffic counters for one system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// States newly allocated because the pool was empty.
    pub allocated: u64,
    /// States served from the pool.
    pub reused: u64,
}

/// A staged scheduler for one effect kind bound to one target.
///
/// Owns the active states and a reuse pool; configs live in a
/// [`ConfigSet`] shared across all systems of the kind and are passed into
/// each call.
pub struct EffectSystem<D: EffectDriver> {
    driver: D,
    kind: SystemKind,
    target: Option<TargetId>,
    states: Vec<EffectState<D::Payload>>,
    pool: Vec<EffectState<D::Payload>>,
    pending_removal: Vec<usize>,
    next_instance: u64,
    pool_stats: PoolStats,
}

impl<D: EffectDriver> core::fmt::Debug for EffectSystem<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EffectSystem")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("active", &self.states.len())
            .field("pooled", &self.pool.len())
            .finish_non_exhaustive()
    }
}

impl<D: EffectDriver> EffectSystem<D> {
    /// Creates an empty system of the given kind, bound to `target`.
    #[must_use]
    pub fn new(kind: SystemKind, target: Option<TargetId>, driver: D) -> Self {
        Self {
            driver,
            kind,
            target,
            states: Vec::new(),
            pool: Vec::new(),
            pending_removal: Vec::new(),
            next_instance: 0,
            pool_stats: PoolStats::default(),
        }
    }

    /// The driver supplying this system's hooks.
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the driver (e.g. to reach its property store).
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The target this system is bound to, if any.
    #[must_use]
    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    /// Number of active instances.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.states.len()
    }

    /// Whether no instances are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Pool traffic counters.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool_stats
    }

    /// Returns the active state for `instance`, if it is still playing.
    #[must_use]
    pub fn find(&self, instance: InstanceId) -> Option<&EffectState<D::Payload>> {
        self.states.iter().find(|state| state.id == instance)
    }

    /// Starts a new instance of `config`.
    ///
    /// Allocates a state (from the pool when possible), assigns the next
    /// instance id, runs the init and play-start hooks, moves the state to
    /// fade-in, and inserts it into the active list at its priority
    /// position.
    ///
    /// # Panics
    ///
    /// Panics if `config` was not registered with `configs`.
    pub fn add(&mut self, configs: &ConfigSet<D::Config>, config: ConfigId) -> EffectHandle {
        let config_ref = configs.get(config);

        let mut state = match self.pool.pop() {
            Some(state) => {
                self.pool_stats.reused += 1;
                state
            }
            None => {
                self.pool_stats.allocated += 1;
                EffectState::default()
            }
        };

        let instance = InstanceId(self.next_instance);
        self.next_instance += 1;
        state.id = instance;
        state.config = config;

        self.driver.on_state_init(config_ref, &mut state);
        self.driver.on_play_start(config_ref, &mut state);
        state.stage = Stage::FadingIn;

        // Stable upper-bound insert: equal priorities keep addition order.
        let priority = config_ref.playback().priority;
        let index = self
            .states
            .partition_point(|other| configs.get(other.config).playback().priority <= priority);
        self.states.insert(index, state);

        EffectHandle {
            system: self.kind,
            instance,
            target: self.target,
        }
    }

    /// Removes a running instance, returning whether it was found.
    ///
    /// An unknown id is not an error: the instance may have completed its
    /// fade-out on an earlier tick, or its target may already be torn
    /// down. Such races are expected and resolve to `false` silently.
    pub fn remove(&mut self, configs: &ConfigSet<D::Config>, instance: InstanceId) -> bool {
        let Some(index) = self.states.iter().position(|state| state.id == instance) else {
            return false;
        };
        self.release_at(configs, index);
        true
    }

    /// Advances every active instance by `delta` and returns the changes.
    pub fn update(&mut self, configs: &ConfigSet<D::Config>, delta: FrameDelta) -> UpdateChanges {
        let mut changes = UpdateChanges::default();
        self.update_into(configs, delta, &mut changes);
        changes
    }

    /// Like [`update`](Self::update), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn update_into(
        &mut self,
        configs: &ConfigSet<D::Config>,
        delta: FrameDelta,
        changes: &mut UpdateChanges,
    ) {
        changes.clear();
        debug_assert!(
            self.pending_removal.is_empty(),
            "removal queue must drain within each update"
        );

        for (index, state) in self.states.iter_mut().enumerate() {
            let config = configs.get(state.config);
            let playback = config.playback();

            state.time_in_stage += if playback.time_scaled {
                delta.scaled
            } else {
                delta.unscaled
            };

            let mut finished = false;
            if config.features().staging {
                if state.stage == Stage::FadingIn && state.time_in_stage >= playback.fade_in {
                    state.time_in_stage -= playback.fade_in;
                    state.stage = Stage::Looping;
                    changes.transitions.push(StageTransition {
                        instance: state.id,
                        from: Stage::FadingIn,
                        to: Stage::Looping,
                    });
                }

                if state.stage == Stage::Looping && state.time_in_stage >= playback.loop_duration {
                    state.time_in_stage -= playback.loop_duration;
                    state.looped_times += 1;
                    if state.looped_times >= playback.loop_times {
                        state.stage = Stage::FadingOut;
                        changes.transitions.push(StageTransition {
                            instance: state.id,
                            from: Stage::Looping,
                            to: Stage::FadingOut,
                        });
                    }
                }

                if state.stage == Stage::FadingOut && state.time_in_stage >= playback.fade_out {
                    state.time_in_stage -= playback.fade_out;
                    finished = true;
                }
            }

            if finished {
                self.pending_removal.push(index);
                changes.completed.push(state.id);
            } else {
                self.driver.on_perform(config, state);
                changes.performed += 1;
            }
        }

        // Two-phase removal: indices were recorded ascending, so popping
        // releases them descending and earlier indices stay valid.
        while let Some(index) = self.pending_removal.pop() {
            self.release_at(configs, index);
        }
    }

    fn release_at(&mut self, configs: &ConfigSet<D::Config>, index: usize) {
        let mut state = self.states.remove(index);
        self.driver.on_clear(configs.get(state.config), &mut state);
        state.reset();
        self.pool.push(state);
    }
}
