// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use afterglow_core::state::Stage;
use afterglow_core::trace::{
    EffectAddedEvent, EffectRemovedEvent, PropertyWrite, StageChangedEvent, TraceSink,
    UpdateSummaryEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Inactive => "inactive",
        Stage::FadingIn => "fade-in",
        Stage::Looping => "loop",
        Stage::FadingOut => "fade-out",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_effect_added(&mut self, e: &EffectAddedEvent) {
        let _ = writeln!(
            self.writer,
            "[add]    frame={} system={} instance={} target={:?}",
            e.frame_index, e.system.0, e.instance.0, e.target,
        );
    }

    fn on_stage_changed(&mut self, e: &StageChangedEvent) {
        let _ = writeln!(
            self.writer,
            "[stage]  frame={} system={} instance={} {} -> {}",
            e.frame_index,
            e.system.0,
            e.instance.0,
            stage_name(e.from),
            stage_name(e.to),
        );
    }

    fn on_effect_removed(&mut self, e: &EffectRemovedEvent) {
        let _ = writeln!(
            self.writer,
            "[remove] frame={} system={} instance={} {}",
            e.frame_index,
            e.system.0,
            e.instance.0,
            if e.completed { "completed" } else { "cancelled" },
        );
    }

    fn on_update_summary(&mut self, e: &UpdateSummaryEvent) {
        let _ = writeln!(
            self.writer,
            "[update] frame={} system={} active={} performed={} completed={}",
            e.frame_index, e.system.0, e.active, e.performed, e.completed,
        );
    }

    fn on_property_writes(&mut self, frame_index: u64, writes: &[PropertyWrite]) {
        let _ = writeln!(
            self.writer,
            "[props]  frame={} writes={}",
            frame_index,
            writes.len(),
        );
    }
}
