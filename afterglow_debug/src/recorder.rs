// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them
//! back as an iterator of [`RecordedEvent`].
//!
//! Rich events ([`on_property_writes`](TraceSink::on_property_writes))
//! store only the count.

use afterglow_core::handle::{InstanceId, SystemKind, TargetId};
use afterglow_core::state::Stage;
use afterglow_core::trace::{
    EffectAddedEvent, EffectRemovedEvent, PropertyWrite, StageChangedEvent, TraceSink,
    UpdateSummaryEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_EFFECT_ADDED: u8 = 1;
const TAG_STAGE_CHANGED: u8 = 2;
const TAG_EFFECT_REMOVED: u8 = 3;
const TAG_UPDATE_SUMMARY: u8 = 4;
const TAG_PROPERTY_WRITES_COUNT: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u32(val);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_stage(&mut self, stage: Stage) {
        self.write_u8(match stage {
            Stage::Inactive => 0,
            Stage::FadingIn => 1,
            Stage::Looping => 2,
            Stage::FadingOut => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_effect_added(&mut self, e: &EffectAddedEvent) {
        self.write_u8(TAG_EFFECT_ADDED);
        self.write_u64(e.frame_index);
        self.write_u32(e.system.0);
        self.write_u64(e.instance.0);
        self.write_option_u32(e.target.map(|t| t.0));
    }

    fn on_stage_changed(&mut self, e: &StageChangedEvent) {
        self.write_u8(TAG_STAGE_CHANGED);
        self.write_u64(e.frame_index);
        self.write_u32(e.system.0);
        self.write_u64(e.instance.0);
        self.write_stage(e.from);
        self.write_stage(e.to);
    }

    fn on_effect_removed(&mut self, e: &EffectRemovedEvent) {
        self.write_u8(TAG_EFFECT_REMOVED);
        self.write_u64(e.frame_index);
        self.write_u32(e.system.0);
        self.write_u64(e.instance.0);
        self.write_u8(u8::from(e.completed));
    }

    fn on_update_summary(&mut self, e: &UpdateSummaryEvent) {
        self.write_u8(TAG_UPDATE_SUMMARY);
        self.write_u64(e.frame_index);
        self.write_u32(e.system.0);
        self.write_u32(e.active);
        self.write_u32(e.performed);
        self.write_u32(e.completed);
    }

    fn on_property_writes(&mut self, frame_index: u64, writes: &[PropertyWrite]) {
        self.write_u8(TAG_PROPERTY_WRITES_COUNT);
        self.write_u64(frame_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "per-frame write counts are far below u32::MAX"
        )]
        self.write_u32(writes.len() as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A decoded trace event.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// An effect instance was added.
    EffectAdded(EffectAddedEvent),
    /// An instance crossed a stage boundary.
    StageChanged(StageChangedEvent),
    /// An instance stopped playing.
    EffectRemoved(EffectRemovedEvent),
    /// Per-kind update-pass summary.
    UpdateSummary(UpdateSummaryEvent),
    /// Property-write count for a frame.
    PropertyWritesCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of resolved property writes.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
#[must_use]
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_stage(&mut self) -> Option<Stage> {
        Some(match self.read_u8()? {
            0 => Stage::Inactive,
            1 => Stage::FadingIn,
            2 => Stage::Looping,
            _ => Stage::FadingOut,
        })
    }

    fn decode_effect_added(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EffectAdded(EffectAddedEvent {
            frame_index: self.read_u64()?,
            system: SystemKind(self.read_u32()?),
            instance: InstanceId(self.read_u64()?),
            target: self.read_option_u32()?.map(TargetId),
        }))
    }

    fn decode_stage_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StageChanged(StageChangedEvent {
            frame_index: self.read_u64()?,
            system: SystemKind(self.read_u32()?),
            instance: InstanceId(self.read_u64()?),
            from: self.read_stage()?,
            to: self.read_stage()?,
        }))
    }

    fn decode_effect_removed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EffectRemoved(EffectRemovedEvent {
            frame_index: self.read_u64()?,
            system: SystemKind(self.read_u32()?),
            instance: InstanceId(self.read_u64()?),
            completed: self.read_u8()? != 0,
        }))
    }

    fn decode_update_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UpdateSummary(UpdateSummaryEvent {
            frame_index: self.read_u64()?,
            system: SystemKind(self.read_u32()?),
            active: self.read_u32()?,
            performed: self.read_u32()?,
            completed: self.read_u32()?,
        }))
    }

    fn decode_property_writes_count(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PropertyWritesCount {
            frame_index: self.read_u64()?,
            count: self.read_u32()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<RecordedEvent> {
        match self.read_u8()? {
            TAG_EFFECT_ADDED => self.decode_effect_added(),
            TAG_STAGE_CHANGED => self.decode_stage_changed(),
            TAG_EFFECT_REMOVED => self.decode_effect_removed(),
            TAG_UPDATE_SUMMARY => self.decode_update_summary(),
            TAG_PROPERTY_WRITES_COUNT => self.decode_property_writes_count(),
            // Unknown tag: the stream is corrupt; stop rather than guess.
            _ => None,
        }
    }
}
