// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance playback state.
//!
//! One [`EffectState`] exists per playing effect instance. It is owned
//! exclusively by its [`EffectSystem`](crate::system::EffectSystem),
//! allocated from a reuse pool on `add`, and reset and returned to the pool
//! when the instance completes its fade-out or is removed.

use crate::config::{ConfigId, Playback};
use crate::handle::InstanceId;

/// Number of stages an active instance can occupy (fade-in, loop,
/// fade-out). Stage-indexed tables (per-stage curves, per-stage fixed
/// values) have this many entries.
pub const ACTIVE_STAGE_COUNT: usize = 3;

/// One phase of an effect instance's lifecycle.
///
/// Systems without the staging feature drive their instances in
/// [`FadingIn`](Self::FadingIn) for as long as they play.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Not playing; the state is pooled or mid-teardown.
    #[default]
    Inactive,
    /// Ramping in.
    FadingIn,
    /// Holding, possibly for several iterations.
    Looping,
    /// Ramping out; removal follows once the duration elapses.
    FadingOut,
}

impl Stage {
    /// Index into stage-keyed tables.
    ///
    /// # Panics
    ///
    /// Panics for [`Inactive`](Self::Inactive) — an inactive state has no
    /// stage-keyed data, and asking for it means a scheduler bug.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Inactive => panic!("stage index queried while inactive"),
            Self::FadingIn => 0,
            Self::Looping => 1,
            Self::FadingOut => 2,
        }
    }
}

/// Playback state for one effect instance, plus a driver-defined payload.
///
/// The payload carries whatever the concrete system needs per instance
/// (bound materials and modifier flags, a spawned object handle, ...). It
/// is reset via [`Default`] when the state returns to the pool.
#[derive(Debug)]
pub struct EffectState<P> {
    /// Unique id, assigned at `add`, never reused within a system.
    pub id: InstanceId,
    /// The config this instance plays.
    pub config: ConfigId,
    /// Current lifecycle stage.
    pub stage: Stage,
    /// Seconds spent in the current stage. Carries the remainder across
    /// stage transitions, so threshold overshoot never accumulates drift.
    pub time_in_stage: f32,
    /// Completed loop iterations.
    pub looped_times: u32,
    /// Driver-defined per-instance data.
    pub payload: P,
}

impl<P: Default> Default for EffectState<P> {
    fn default() -> Self {
        Self {
            id: InstanceId(0),
            config: ConfigId::INVALID,
            stage: Stage::Inactive,
            time_in_stage: 0.0,
            looped_times: 0,
            payload: P::default(),
        }
    }
}

impl<P: Default> EffectState<P> {
    /// Resets every field for pooled reuse.
    pub fn reset(&mut self) {
        self.id = InstanceId(0);
        self.config = ConfigId::INVALID;
        self.stage = Stage::Inactive;
        self.time_in_stage = 0.0;
        self.looped_times = 0;
        self.payload = P::default();
    }
}

impl<P> EffectState<P> {
    /// Duration of the current stage under `playback`.
    ///
    /// # Panics
    ///
    /// Panics while [`Stage::Inactive`] — the state machine never
    /// legitimately queries a duration before `add` activates the state,
    /// so this surfaces an integration bug instead of defaulting.
    #[must_use]
    pub fn stage_duration(&self, playback: &Playback) -> f32 {
        match self.stage {
            Stage::Inactive => panic!("stage duration queried while inactive"),
            Stage::FadingIn => playback.fade_in,
            Stage::Looping => playback.loop_duration,
            Stage::FadingOut => playback.fade_out,
        }
    }

    /// Normalized progress through the current stage, in `[0, 1]`.
    ///
    /// A zero-duration stage reads as complete; the scheduler transitions
    /// out of it on the same tick, so drivers only ever see `1.0` there.
    ///
    /// # Panics
    ///
    /// Panics while [`Stage::Inactive`], as [`stage_duration`]
    /// (Self::stage_duration) does.
    #[must_use]
    pub fn progress(&self, playback: &Playback) -> f32 {
        let duration = self.stage_duration(playback);
        if duration <= 0.0 {
            1.0
        } else {
            self.time_in_stage / duration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback() -> Playback {
        Playback {
            fade_in: 2.0,
            loop_duration: 4.0,
            fade_out: 0.5,
            ..Playback::default()
        }
    }

    #[test]
    fn duration_follows_stage() {
        let mut state: EffectState<()> = EffectState::default();
        state.stage = Stage::FadingIn;
        assert_eq!(state.stage_duration(&playback()), 2.0);
        state.stage = Stage::Looping;
        assert_eq!(state.stage_duration(&playback()), 4.0);
        state.stage = Stage::FadingOut;
        assert_eq!(state.stage_duration(&playback()), 0.5);
    }

    #[test]
    #[should_panic(expected = "while inactive")]
    fn inactive_duration_panics() {
        let state: EffectState<()> = EffectState::default();
        let _ = state.stage_duration(&playback());
    }

    #[test]
    fn progress_is_normalized() {
        let mut state: EffectState<()> = EffectState::default();
        state.stage = Stage::FadingIn;
        state.time_in_stage = 0.5;
        assert_eq!(state.progress(&playback()), 0.25);
    }

    #[test]
    fn zero_duration_stage_reads_complete() {
        let mut state: EffectState<()> = EffectState::default();
        state.stage = Stage::FadingOut;
        let zero = Playback {
            fade_out: 0.0,
            ..playback()
        };
        assert_eq!(state.progress(&zero), 1.0);
    }

    #[test]
    fn reset_clears_playback_fields() {
        let mut state: EffectState<u32> = EffectState::default();
        state.id = InstanceId(7);
        state.config = ConfigId(3);
        state.stage = Stage::Looping;
        state.time_in_stage = 1.5;
        state.looped_times = 2;
        state.payload = 9;

        state.reset();
        assert_eq!(state.stage, Stage::Inactive);
        assert_eq!(state.config, ConfigId::INVALID);
        assert_eq!(state.time_in_stage, 0.0);
        assert_eq!(state.looped_times, 0);
        assert_eq!(state.payload, 0);
    }
}
