// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for effect playback.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the embedder's frame loop calls as it drives the effect systems. All
//! method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! The scheduler itself does not emit events; it returns
//! [`UpdateChanges`](crate::system::UpdateChanges) and the embedder decides
//! what to surface, so instrumented and bare frame loops run the same core
//! code.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates per-write property events plus
//!   the corresponding `TraceSink` method.

use crate::handle::{InstanceId, SystemKind, TargetId};
use crate::state::Stage;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a trigger starts a new effect instance.
#[derive(Clone, Copy, Debug)]
pub struct EffectAddedEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Kind of the system the instance joined.
    pub system: SystemKind,
    /// The new instance.
    pub instance: InstanceId,
    /// Target the instance plays against, if any.
    pub target: Option<TargetId>,
}

/// Emitted when an instance crosses a stage boundary.
#[derive(Clone, Copy, Debug)]
pub struct StageChangedEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Kind of the owning system.
    pub system: SystemKind,
    /// The instance that transitioned.
    pub instance: InstanceId,
    /// Stage before the transition.
    pub from: Stage,
    /// Stage after the transition.
    pub to: Stage,
}

/// Emitted when an instance stops playing.
#[derive(Clone, Copy, Debug)]
pub struct EffectRemovedEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Kind of the owning system.
    pub system: SystemKind,
    /// The instance that was released.
    pub instance: InstanceId,
    /// Whether the instance completed its fade-out (`true`) or was
    /// removed early by a caller (`false`).
    pub completed: bool,
}

/// Per-kind summary for one update pass.
#[derive(Clone, Copy, Debug)]
pub struct UpdateSummaryEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Kind of the system map that updated.
    pub system: SystemKind,
    /// Instances still active after the pass.
    pub active: u32,
    /// Instances that performed this pass.
    pub performed: u32,
    /// Instances that completed this pass.
    pub completed: u32,
}

/// One resolved property write (requires the `trace-rich` feature).
///
/// Carries raw slot indices rather than generational handles so sinks can
/// log without paying for validation; the indices are only meaningful for
/// the frame they were emitted in.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct PropertyWrite {
    /// Raw material slot index.
    pub material: u32,
    /// Raw property id.
    pub property: u32,
}

// ---------------------------------------------------------------------------
// TraceSink
// ---------------------------------------------------------------------------

/// Receives playback events from an instrumented frame loop.
///
/// All methods default to no-ops.
pub trait TraceSink {
    /// Called when an effect instance is added.
    fn on_effect_added(&mut self, e: &EffectAddedEvent) {
        _ = e;
    }

    /// Called for each stage transition.
    fn on_stage_changed(&mut self, e: &StageChangedEvent) {
        _ = e;
    }

    /// Called when an effect instance is released.
    fn on_effect_removed(&mut self, e: &EffectRemovedEvent) {
        _ = e;
    }

    /// Called with a per-kind summary after each update pass.
    fn on_update_summary(&mut self, e: &UpdateSummaryEvent) {
        _ = e;
    }

    /// Called with the frame's resolved property writes (requires the
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_property_writes(&mut self, frame_index: u64, writes: &[PropertyWrite]) {
        _ = (frame_index, writes);
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`EffectAddedEvent`].
    #[inline]
    pub fn effect_added(&mut self, e: &EffectAddedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_effect_added(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StageChangedEvent`].
    #[inline]
    pub fn stage_changed(&mut self, e: &StageChangedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_stage_changed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EffectRemovedEvent`].
    #[inline]
    pub fn effect_removed(&mut self, e: &EffectRemovedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_effect_removed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`UpdateSummaryEvent`].
    #[inline]
    pub fn update_summary(&mut self, e: &UpdateSummaryEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_update_summary(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits resolved property writes (requires the `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn property_writes(&mut self, frame_index: u64, writes: &[PropertyWrite]) {
        if let Some(s) = &mut self.sink {
            s.on_property_writes(frame_index, writes);
        }
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct CountingSink {
        added: Vec<InstanceId>,
        summaries: u32,
    }

    impl TraceSink for CountingSink {
        fn on_effect_added(&mut self, e: &EffectAddedEvent) {
            self.added.push(e.instance);
        }

        fn on_update_summary(&mut self, _e: &UpdateSummaryEvent) {
            self.summaries += 1;
        }
    }

    #[test]
    fn tracer_dispatches_to_sink() {
        let mut sink = CountingSink::default();
        let mut tracer = Tracer::new(&mut sink);
        tracer.effect_added(&EffectAddedEvent {
            frame_index: 0,
            system: SystemKind(0),
            instance: InstanceId(1),
            target: None,
        });
        tracer.update_summary(&UpdateSummaryEvent {
            frame_index: 0,
            system: SystemKind(0),
            active: 1,
            performed: 1,
            completed: 0,
        });
        drop(tracer);
        assert_eq!(sink.added, [InstanceId(1)]);
        assert_eq!(sink.summaries, 1);
    }

    #[test]
    fn none_tracer_discards() {
        let mut tracer = Tracer::none();
        tracer.effect_added(&EffectAddedEvent {
            frame_index: 0,
            system: SystemKind(0),
            instance: InstanceId(1),
            target: None,
        });
    }
}
