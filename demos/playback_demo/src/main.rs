// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises the playback and diagnostics
//! pipeline.
//!
//! Runs 120 synthetic frames at 60 Hz: a looping emission ramp and a
//! short high-priority flash compete for one material property (showing
//! override composition and clean revert), while a vignette plays as a
//! global screen effect and is cancelled mid-fade. Events are recorded to
//! both a [`PrettyPrintSink`](afterglow_debug::pretty::PrettyPrintSink)
//! and a [`RecorderSink`](afterglow_debug::recorder::RecorderSink), then
//! exported as a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use afterglow_core::config::Playback;
use afterglow_core::curve::{Curve, Easing};
use afterglow_core::handle::{EffectHandle, SystemKind, TargetId};
use afterglow_core::map::SystemMap;
use afterglow_core::source::SourceRegistry;
use afterglow_core::system::UpdateChanges;
use afterglow_core::tick::FrameDelta;
use afterglow_core::trace::{
    EffectAddedEvent, EffectRemovedEvent, PropertyWrite, StageChangedEvent, TraceSink, Tracer,
    UpdateSummaryEvent,
};

use afterglow_material::{
    MaterialDriver, MaterialEffectConfig, MaterialId, MaterialStore, Modifier, PropertyId,
    PropertyRegistry, PropertySink, PropertyValue, Rgba, TextureId, Vec4,
};
use afterglow_screen::{
    CameraState, FollowMode, PrefabId, Placement, ScreenDriver, ScreenEffectConfig, ScreenSpawner,
    SpawnId, StretchMode,
};
use afterglow_stress_harness::{ChurnSample, ChurnTracker};

use afterglow_debug::chrome;
use afterglow_debug::pretty::PrettyPrintSink;
use afterglow_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 120;
const FRAME_DT: f32 = 1.0 / 60.0;
const FRAME_MS: f64 = 1000.0 / 60.0;

const MATERIAL_KIND: SystemKind = SystemKind(0);
const SCREEN_KIND: SystemKind = SystemKind(1);

const HERO: TargetId = TargetId(1);

/// Collects resolved writes so the demo can emit rich property events.
#[derive(Default)]
struct CollectingSink {
    writes: Vec<PropertyWrite>,
}

impl PropertySink for CollectingSink {
    fn set_float(&mut self, material: MaterialId, property: PropertyId, _value: f32) {
        self.writes.push(PropertyWrite {
            material: material.index(),
            property: property.0,
        });
    }

    fn set_vector(&mut self, material: MaterialId, property: PropertyId, _value: Vec4) {
        self.writes.push(PropertyWrite {
            material: material.index(),
            property: property.0,
        });
    }

    fn set_color(&mut self, material: MaterialId, property: PropertyId, _value: Rgba) {
        self.writes.push(PropertyWrite {
            material: material.index(),
            property: property.0,
        });
    }

    fn set_flag(&mut self, material: MaterialId, property: PropertyId, _enabled: bool) {
        self.writes.push(PropertyWrite {
            material: material.index(),
            property: property.0,
        });
    }

    fn set_texture(&mut self, material: MaterialId, property: PropertyId, _value: TextureId) {
        self.writes.push(PropertyWrite {
            material: material.index(),
            property: property.0,
        });
    }
}

/// Stand-in host spawner that just allocates ids.
#[derive(Debug, Default)]
struct DemoSpawner {
    next: u64,
    alive: u32,
}

impl ScreenSpawner for DemoSpawner {
    fn spawn(&mut self, _prefab: PrefabId, _under_camera: bool) -> SpawnId {
        let id = SpawnId(self.next);
        self.next += 1;
        self.alive += 1;
        id
    }

    fn despawn(&mut self, _id: SpawnId) {
        self.alive -= 1;
    }

    fn set_placement(&mut self, _id: SpawnId, _placement: &Placement) {}
}

fn main() {
    // -- registries --------------------------------------------------------
    let mut sources = SourceRegistry::new();
    let mut properties = PropertyRegistry::new();
    let emission = properties.intern("_EmissionStrength");
    let tint = properties.intern("_Tint");

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    // -- material system ---------------------------------------------------
    let mut materials = SystemMap::new(MATERIAL_KIND, move |_target| {
        let mut store = MaterialStore::new();
        let body = store.create_material([
            (emission, PropertyValue::Float(1.0)),
            (tint, PropertyValue::Color(Rgba::WHITE)),
        ]);
        MaterialDriver::new(store, vec![body])
    });

    let burn = materials.register_config(MaterialEffectConfig::new(
        sources.intern("burn"),
        Playback {
            fade_in: 0.5,
            loop_duration: 1.0,
            loop_times: 2,
            fade_out: 0.5,
            ..Playback::default()
        },
        vec![
            Modifier::float_curves(
                emission,
                [
                    Curve::eased(1.0, 4.0, Easing::EASE_IN_OUT),
                    Curve::constant(4.0),
                    Curve::eased(4.0, 1.0, Easing::EASE_IN_OUT),
                ],
            ),
            Modifier::color_curves(
                tint,
                [
                    Curve::linear(Rgba::WHITE, Rgba::new(1.0, 0.4, 0.1, 1.0)),
                    Curve::constant(Rgba::new(1.0, 0.4, 0.1, 1.0)),
                    Curve::linear(Rgba::new(1.0, 0.4, 0.1, 1.0), Rgba::WHITE),
                ],
            ),
        ],
    ));

    let flash = materials.register_config(MaterialEffectConfig::new(
        sources.intern("flash"),
        Playback {
            priority: 10,
            fade_in: 0.1,
            loop_duration: 0.2,
            loop_times: 1,
            fade_out: 0.1,
            time_scaled: false,
        },
        vec![Modifier::float_fixed(emission, [8.0, 8.0, 8.0])],
    ));

    // -- screen system -----------------------------------------------------
    let mut screens = SystemMap::new(SCREEN_KIND, |_target| {
        ScreenDriver::new(DemoSpawner::default(), CameraState::default())
    });

    let vignette = screens.register_config(ScreenEffectConfig {
        playback: Playback {
            fade_in: 0.3,
            loop_duration: 1.0,
            loop_times: 3,
            fade_out: 0.3,
            ..Playback::default()
        },
        prefab: PrefabId(1),
        stretch: StretchMode::Stretch,
        follow: FollowMode::FollowTransform,
    });

    // -- simulated loop ----------------------------------------------------
    let mut tracker: ChurnTracker<64> = ChurnTracker::new();
    let mut material_changes = UpdateChanges::default();
    let mut screen_changes = UpdateChanges::default();
    let mut vignette_handle: Option<EffectHandle> = None;

    for frame_index in 0..FRAME_COUNT {
        let mut adds = 0;
        let mut cancelled = 0;

        // 1. Triggers
        if frame_index == 5 || frame_index == 70 {
            let handle = materials.add(burn, Some(HERO)).expect("hero target is live");
            emit_added(&mut pretty, &mut recorder, frame_index, handle);
            adds += 1;
        }
        if frame_index == 20 {
            let handle = materials
                .add(flash, Some(HERO))
                .expect("hero target is live");
            emit_added(&mut pretty, &mut recorder, frame_index, handle);
            adds += 1;
        }
        if frame_index == 40 {
            let handle = screens.add(vignette, None).expect("vignette is global");
            emit_added(&mut pretty, &mut recorder, frame_index, handle);
            vignette_handle = Some(handle);
            adds += 1;
        }
        if frame_index == 80
            && let Some(handle) = vignette_handle.take()
            && screens.remove(handle)
        {
            let event = EffectRemovedEvent {
                frame_index,
                system: handle.system,
                instance: handle.instance,
                completed: false,
            };
            pretty.on_effect_removed(&event);
            recorder.on_effect_removed(&event);
            cancelled += 1;
        }

        // 2. Update
        let delta = FrameDelta::uniform(FRAME_DT);
        materials.update_all(delta, &mut material_changes);
        screens.update_all(delta, &mut screen_changes);

        for (kind, changes) in [
            (MATERIAL_KIND, &material_changes),
            (SCREEN_KIND, &screen_changes),
        ] {
            for transition in &changes.transitions {
                let event = StageChangedEvent {
                    frame_index,
                    system: kind,
                    instance: transition.instance,
                    from: transition.from,
                    to: transition.to,
                };
                pretty.on_stage_changed(&event);
                recorder.on_stage_changed(&event);
            }
            for &instance in &changes.completed {
                let event = EffectRemovedEvent {
                    frame_index,
                    system: kind,
                    instance,
                    completed: true,
                };
                pretty.on_effect_removed(&event);
                recorder.on_effect_removed(&event);
            }
        }

        // 3. Apply resolved values
        let mut sink = CollectingSink::default();
        if let Some(system) = materials.system_mut(Some(HERO)) {
            system.driver_mut().store_mut().apply(&mut sink);
        }
        if !sink.writes.is_empty() {
            recorder.on_property_writes(frame_index, &sink.writes);
        }

        // 4. Summaries + metrics
        let summary = UpdateSummaryEvent {
            frame_index,
            system: MATERIAL_KIND,
            active: materials.active_len().try_into().unwrap_or(u32::MAX),
            performed: material_changes.performed,
            completed: material_changes.completed.len().try_into().unwrap_or(u32::MAX),
        };
        pretty.on_update_summary(&summary);
        recorder.on_update_summary(&summary);

        let removals = cancelled
            + material_changes.completed.len()
            + screen_changes.completed.len();
        let pool = materials
            .system(Some(HERO))
            .map(|system| system.pool_stats())
            .unwrap_or_default();
        let report = tracker.observe(
            ChurnSample {
                adds,
                removals: removals.try_into().unwrap_or(u32::MAX),
                active: (materials.active_len() + screens.active_len())
                    .try_into()
                    .unwrap_or(u32::MAX),
            },
            pool,
        );

        if frame_index == FRAME_COUNT - 1 {
            println!(
                "[churn]  grade={} reuse={:.2} avg_active={:.2} peak={} spawned={}",
                report.grade.as_str(),
                report.reuse_rate,
                report.avg_active,
                report.peak_active,
                report.total_spawned,
            );
        }

        // Exercise the Tracer wrapper once, to keep the zero-overhead path
        // honest in a real build.
        if frame_index == 0 {
            let mut tracer = Tracer::new(&mut pretty);
            tracer.update_summary(&summary);
        }
    }

    // -- final state -------------------------------------------------------
    let hero_system = materials
        .system(Some(HERO))
        .expect("hero system was created");
    let body = hero_system.driver().materials()[0];
    let screen_objects = screens
        .system(None)
        .map(|system| system.driver().spawner().alive)
        .unwrap_or(0);
    println!(
        "[final]  emission={} overriders={} screen_objects={}",
        hero_system.driver().store().resolved_float(body, emission),
        hero_system.driver().store().overrider_count(body),
        screen_objects,
    );

    // -- chrome export -----------------------------------------------------
    let file = File::create("playback_trace.json").expect("create trace file");
    let mut writer = BufWriter::new(file);
    chrome::export(recorder.as_bytes(), FRAME_MS, &mut writer).expect("write trace file");
    println!("[trace]  wrote playback_trace.json");
}

fn emit_added(
    pretty: &mut PrettyPrintSink,
    recorder: &mut RecorderSink,
    frame_index: u64,
    handle: EffectHandle,
) {
    let event = EffectAddedEvent {
        frame_index,
        system: handle.system,
        instance: handle.instance,
        target: handle.target,
    };
    pretty.on_effect_added(&event);
    recorder.on_effect_added(&event);
}
