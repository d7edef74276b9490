// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes
//! [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Frames are mapped onto the timeline with a fixed interval: event
//! timestamps are `frame_index * frame_interval_ms`, converted to
//! microseconds. Update summaries additionally emit a counter track of
//! active instances, so the playback load is visible as a graph in
//! `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects.
pub fn export(bytes: &[u8], frame_interval_ms: f64, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::EffectAdded(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "EffectAdded",
                    "cat": "Playback",
                    "ts": frame_us(e.frame_index, frame_interval_ms),
                    "pid": e.system.0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "instance": e.instance.0,
                        "target": e.target.map(|t| t.0),
                    }
                }));
            }
            RecordedEvent::StageChanged(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "StageChanged",
                    "cat": "Playback",
                    "ts": frame_us(e.frame_index, frame_interval_ms),
                    "pid": e.system.0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "instance": e.instance.0,
                        "from": format!("{:?}", e.from),
                        "to": format!("{:?}", e.to),
                    }
                }));
            }
            RecordedEvent::EffectRemoved(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "EffectRemoved",
                    "cat": "Playback",
                    "ts": frame_us(e.frame_index, frame_interval_ms),
                    "pid": e.system.0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "instance": e.instance.0,
                        "completed": e.completed,
                    }
                }));
            }
            RecordedEvent::UpdateSummary(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "active_effects",
                    "cat": "Playback",
                    "ts": frame_us(e.frame_index, frame_interval_ms),
                    "pid": e.system.0,
                    "tid": 0,
                    "args": {
                        "active": e.active,
                    }
                }));
            }
            RecordedEvent::PropertyWritesCount { frame_index, count } => {
                events.push(json!({
                    "ph": "C",
                    "name": "property_writes",
                    "cat": "Apply",
                    "ts": frame_us(frame_index, frame_interval_ms),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "writes": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(&mut *writer, &events).map_err(io::Error::other)?;
    writeln!(writer)
}

fn frame_us(frame_index: u64, frame_interval_ms: f64) -> f64 {
    // Frame indices stay far below f64's exact-integer range.
    frame_index as f64 * frame_interval_ms * 1000.0
}

#[cfg(test)]
mod tests {
    use afterglow_core::handle::{InstanceId, SystemKind};
    use afterglow_core::state::Stage;
    use afterglow_core::trace::{StageChangedEvent, TraceSink, UpdateSummaryEvent};

    use super::*;
    use crate::recorder::RecorderSink;

    #[test]
    fn exports_valid_json_with_counter_track() {
        let mut recorder = RecorderSink::new();
        recorder.on_stage_changed(&StageChangedEvent {
            frame_index: 10,
            system: SystemKind(0),
            instance: InstanceId(1),
            from: Stage::FadingIn,
            to: Stage::Looping,
        });
        recorder.on_update_summary(&UpdateSummaryEvent {
            frame_index: 10,
            system: SystemKind(0),
            active: 3,
            performed: 3,
            completed: 0,
        });

        let mut out: Vec<u8> = Vec::new();
        export(recorder.as_bytes(), 16.0, &mut out).expect("export succeeds");

        let parsed: Vec<Value> =
            serde_json::from_slice(&out).expect("exporter emits valid JSON");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["name"], "StageChanged");
        assert_eq!(parsed[1]["ph"], "C");
        assert_eq!(parsed[1]["args"]["active"], 3);
        // 10 frames at 16ms → 160_000µs.
        assert_eq!(parsed[0]["ts"], 160_000.0);
    }
}
