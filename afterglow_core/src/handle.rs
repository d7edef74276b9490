// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect, target, and system identity types.

use core::fmt;

/// Identifies one effect kind (material, screen, ...).
///
/// Embedders assign kind ids when constructing their system maps; core code
/// passes them through without interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SystemKind(pub u32);

impl fmt::Debug for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemKind({})", self.0)
    }
}

/// Identifies the host object an effect plays against.
///
/// Targets are owned by the embedder (an entity id, a camera id, ...);
/// core treats them as opaque. Untargeted effects (global screen effects)
/// carry no target at all.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(pub u32);

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetId({})", self.0)
    }
}

/// Identifies one playing effect instance.
///
/// Instance ids increase monotonically per system and are never reused, so
/// a stale handle can never accidentally remove a newer instance that
/// recycled the same pooled state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

/// Opaque correlation token returned by `add`, used to request removal.
///
/// A handle records which system kind spawned the instance, the instance
/// id, and the target the system was bound to, which together locate the
/// running state without the caller holding any reference into the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    /// Kind of the system that owns the instance.
    pub system: SystemKind,
    /// The running instance.
    pub instance: InstanceId,
    /// Target the owning system is bound to, if any.
    pub target: Option<TargetId>,
}
