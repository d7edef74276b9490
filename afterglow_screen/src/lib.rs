// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screen-space effect spawning and camera-relative placement.
//!
//! The screen system plays full-screen and camera-attached effects:
//! vignettes, damage flashes, weather planes. Each instance spawns a
//! pooled effect object through the host's [`ScreenSpawner`] and, in
//! follow mode, re-places it whenever the camera reports a relevant
//! change — position and rotation track the camera, and the object's
//! scale is derived from the camera frustum so the plane keeps covering
//! the screen.
//!
//! Screen effects are global: their configs require no target, and one
//! system instance serves the whole scene per camera.

use afterglow_core::config::{EffectConfig, Features, Playback};
use afterglow_core::state::EffectState;
use afterglow_core::system::EffectDriver;

use core::fmt;

/// A reference to an authored effect prefab the spawner can instantiate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrefabId(pub u32);

impl PrefabId {
    /// Sentinel for an unassigned prefab; configs carrying it are invalid.
    pub const INVALID: Self = Self(u32::MAX);
}

impl fmt::Debug for PrefabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "PrefabId(INVALID)")
        } else {
            write!(f, "PrefabId({})", self.0)
        }
    }
}

/// A handle to a spawned effect object, minted by the host's spawner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpawnId(pub u64);

impl fmt::Debug for SpawnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpawnId({})", self.0)
    }
}

/// How the effect plane sizes itself against the camera frustum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StretchMode {
    /// Scale each axis to the frustum plane: always exactly full-screen.
    #[default]
    Stretch,
    /// Scale uniformly by the frustum height; width may crop or letterbox.
    AlignHeight,
    /// Scale uniformly by the frustum width.
    AlignWidth,
}

/// How the effect object tracks the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FollowMode {
    /// Parent the object under the camera at spawn; the host keeps it
    /// attached and no per-frame placement is needed.
    #[default]
    UnderCamera,
    /// Keep the object free-standing and copy the camera transform each
    /// time it changes. Costs a placement write per dirty frame.
    FollowTransform,
}

/// A placement write for a spawned object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// World position.
    pub position: [f32; 3],
    /// World rotation quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    /// Per-axis scale.
    pub scale: [f32; 3],
}

/// Per-field change flags for the camera, set by the host as its camera
/// moves and cleared after each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CameraChanges {
    /// Position moved.
    pub position: bool,
    /// Rotation changed.
    pub rotation: bool,
    /// Vertical field of view changed.
    pub fov: bool,
    /// Aspect ratio changed.
    pub aspect: bool,
    /// Camera rig scale changed.
    pub scale: bool,
}

impl CameraChanges {
    /// All fields changed — the state right after a camera is first seen.
    pub const ALL: Self = Self {
        position: true,
        rotation: true,
        fov: true,
        aspect: true,
        scale: true,
    };

    /// Whether any transform-relevant field changed.
    #[must_use]
    pub fn any_transform(self) -> bool {
        self.position || self.rotation || self.fov || self.aspect || self.scale
    }

    /// Whether any scale-relevant field changed.
    #[must_use]
    pub fn any_scale(self) -> bool {
        self.fov || self.aspect || self.scale
    }

    /// Clears all flags; the host calls this once per frame after all
    /// systems updated.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The camera a screen system places its effects against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// World position.
    pub position: [f32; 3],
    /// World rotation quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
    /// Distance from the camera at which effect planes sit.
    pub plane_distance: f32,
    /// What changed since last frame.
    pub changes: CameraChanges,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            fov_y: core::f32::consts::FRAC_PI_3,
            aspect: 16.0 / 9.0,
            plane_distance: 1.0,
            changes: CameraChanges::ALL,
        }
    }
}

/// Spawns, places, and reclaims effect objects on behalf of the screen
/// system. Implemented by the host engine; test doubles record calls.
pub trait ScreenSpawner {
    /// Instantiates `prefab`, optionally parented under the camera.
    fn spawn(&mut self, prefab: PrefabId, under_camera: bool) -> SpawnId;

    /// Returns a spawned object to the host's pool.
    fn despawn(&mut self, id: SpawnId);

    /// Writes a placement for a free-standing object.
    fn set_placement(&mut self, id: SpawnId, placement: &Placement);
}

/// An authored screen effect.
#[derive(Clone, Copy, Debug)]
pub struct ScreenEffectConfig {
    /// Shared timing block.
    pub playback: Playback,
    /// The prefab to spawn per instance.
    pub prefab: PrefabId,
    /// Frustum sizing mode.
    pub stretch: StretchMode,
    /// Camera tracking mode.
    pub follow: FollowMode,
}

impl EffectConfig for ScreenEffectConfig {
    fn features(&self) -> Features {
        Features {
            staging: true,
            requires_target: false,
        }
    }

    fn playback(&self) -> &Playback {
        &self.playback
    }

    fn is_valid(&self) -> bool {
        self.prefab != PrefabId::INVALID
    }
}

/// Per-instance payload: the spawned object, if init has run.
#[derive(Debug, Default)]
pub struct ScreenPlayback {
    /// Handle of the spawned effect object.
    pub spawned: Option<SpawnId>,
}

/// Hook implementation for screen effects, bound to one camera.
#[derive(Debug)]
pub struct ScreenDriver<S: ScreenSpawner> {
    spawner: S,
    camera: CameraState,
}

impl<S: ScreenSpawner> ScreenDriver<S> {
    /// Creates a driver over the host's spawner and an initial camera.
    #[must_use]
    pub fn new(spawner: S, camera: CameraState) -> Self {
        Self { spawner, camera }
    }

    /// The host's spawner.
    #[must_use]
    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Updates the camera ahead of this frame's system update.
    pub fn set_camera(&mut self, camera: CameraState) {
        self.camera = camera;
    }

    /// The current camera.
    #[must_use]
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }
}

impl<S: ScreenSpawner> EffectDriver for ScreenDriver<S> {
    type Config = ScreenEffectConfig;
    type Payload = ScreenPlayback;

    fn on_state_init(
        &mut self,
        config: &ScreenEffectConfig,
        state: &mut EffectState<ScreenPlayback>,
    ) {
        let under_camera = config.follow == FollowMode::UnderCamera;
        let id = self.spawner.spawn(config.prefab, under_camera);
        state.payload.spawned = Some(id);

        if !under_camera {
            // Free-standing objects need an initial placement; the
            // per-frame path only re-places on camera changes.
            let placement = placement_for(&self.camera, config.stretch);
            self.spawner.set_placement(id, &placement);
        }
    }

    fn on_perform(
        &mut self,
        config: &ScreenEffectConfig,
        state: &mut EffectState<ScreenPlayback>,
    ) {
        if config.follow != FollowMode::FollowTransform {
            return;
        }
        if !self.camera.changes.any_transform() {
            return;
        }
        let Some(id) = state.payload.spawned else {
            return;
        };
        let placement = placement_for(&self.camera, config.stretch);
        self.spawner.set_placement(id, &placement);
    }

    fn on_clear(
        &mut self,
        _config: &ScreenEffectConfig,
        state: &mut EffectState<ScreenPlayback>,
    ) {
        if let Some(id) = state.payload.spawned.take() {
            self.spawner.despawn(id);
        }
    }
}

/// Computes the placement that keeps an effect plane on the camera's
/// frustum plane.
#[must_use]
pub fn placement_for(camera: &CameraState, stretch: StretchMode) -> Placement {
    Placement {
        position: camera.position,
        rotation: camera.rotation,
        scale: stretch_scale(stretch, camera.fov_y, camera.aspect, camera.plane_distance),
    }
}

/// Scale for a unit quad at `distance` filling a frustum with vertical
/// field of view `fov_y` and the given aspect ratio.
///
/// The frustum plane at `distance` is `2·d·tan(fov_y/2)` tall and
/// `height·aspect` wide.
#[must_use]
pub fn stretch_scale(stretch: StretchMode, fov_y: f32, aspect: f32, distance: f32) -> [f32; 3] {
    let height = 2.0 * distance * (fov_y * 0.5).tan();
    let width = height * aspect;
    match stretch {
        StretchMode::Stretch => [width, height, 1.0],
        StretchMode::AlignHeight => [height, height, 1.0],
        StretchMode::AlignWidth => [width, width, 1.0],
    }
}
