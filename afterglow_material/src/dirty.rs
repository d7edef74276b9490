// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The [`MaterialStore`](crate::store::MaterialStore) uses multi-channel
//! dirty tracking (via [`understory_dirty`]) keyed by material slot. Each
//! channel covers one property kind, so the once-per-frame
//! [`apply`](crate::store::MaterialStore::apply) pass only walks the
//! overrider tables that actually changed.
//!
//! All channels are local-only: a mutation marks the touched material slot
//! and nothing propagates, since material slots have no inheritance
//! between them.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Every store mutation
//! (`push_*` / `set_*` / `pop_*`) marks the right channel, and `apply`
//! drains them all, writing resolved values through the
//! [`PropertySink`](crate::store::PropertySink).

use understory_dirty::Channel;

/// A float property changed on some material.
pub const FLOAT: Channel = Channel::new(0);

/// A vector property changed on some material.
pub const VECTOR: Channel = Channel::new(1);

/// A color property changed on some material.
pub const COLOR: Channel = Channel::new(2);

/// A flag (shader keyword / pass toggle) changed on some material.
pub const FLAG: Channel = Channel::new(3);

/// A texture binding changed on some material.
pub const TEXTURE: Channel = Channel::new(4);
