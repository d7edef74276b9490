// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered value overrides and staged effect playback for frame-driven
//! runtimes.
//!
//! `afterglow_core` provides the engine underneath a visual-effects trigger
//! framework: many concurrently playing effects compete to drive the same
//! logical properties, and each effect walks a timed fade-in → loop →
//! fade-out lifecycle. It is `no_std` compatible (with `alloc`) and uses
//! index handles throughout.
//!
//! # Architecture
//!
//! The crate is organized around a frame loop that turns per-frame deltas
//! into state-machine steps and resolved property values:
//!
//! ```text
//!   Trigger (host)
//!       │  add(config, target)
//!       ▼
//!   SystemMap ──► EffectSystem::update(FrameDelta) ──► UpdateChanges
//!                      │                                     │
//!                      ▼ on_perform (EffectDriver)           ▼
//!                 ValueOverrider::push/set          TraceSink (app-driven)
//!                      │
//!                      ▼  once per frame
//!                 consumer reads resolved values, applies to host objects
//! ```
//!
//! **[`overrider`]** — [`ValueOverrider`](overrider::ValueOverrider), a
//! priority-ordered stack of reference-counted value layers with a dirty
//! flag. The reason this exists: several live effects may target one
//! property, and they must compose deterministically and revert cleanly
//! when any one of them ends.
//!
//! **[`state`]** / **[`config`]** — The per-instance playback state machine
//! ([`Stage`](state::Stage)) and the immutable per-play timing block
//! ([`Playback`](config::Playback)).
//!
//! **[`system`]** — [`EffectSystem`](system::EffectSystem), the generic
//! staged scheduler. Concrete systems supply the four lifecycle hooks via
//! [`EffectDriver`](system::EffectDriver).
//!
//! **[`map`]** — [`SystemMap`](map::SystemMap), per-target system
//! instances for one effect kind, with target validation and tolerant
//! removal.
//!
//! **[`curve`]** — Keyframe curves with cubic-Bézier easing, used by
//! drivers to evaluate time-driven modifier values.
//!
//! **[`tick`]** — [`FrameDelta`](tick::FrameDelta), the scaled/unscaled
//! frame-time pair consumed by `update`.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types
//! for playback instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-write
//!   property events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod curve;
pub mod handle;
pub mod map;
pub mod overrider;
pub mod source;
pub mod state;
pub mod system;
pub mod tick;
pub mod trace;
