// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Material property overrides and stage-driven modifiers.
//!
//! `afterglow_material` is the concrete material system on top of
//! [`afterglow_core`]: effect configs carry *modifiers* that drive shader
//! properties over an instance's staged lifetime, and a [`MaterialStore`]
//! resolves all concurrent writers per property through one
//! [`ValueOverrider`](afterglow_core::overrider::ValueOverrider) each.
//!
//! # Data flow
//!
//! ```text
//!   MaterialDriver::on_perform (per instance, per frame)
//!       │  evaluate modifiers at stage progress
//!       ▼
//!   MaterialStore::push_* / set_*   (marks per-kind dirty channels)
//!       │
//!       ▼  once per frame, after all systems updated
//!   MaterialStore::apply(&mut PropertySink)
//!       │  drain dirty channels, write resolved top values
//!       ▼
//!   renderer-owned materials
//! ```
//!
//! The store seeds each property's overrider with a base layer (the
//! material's unmodified value, below any effect's priority) the first
//! time an effect touches it, and evicts overriders that fall back to
//! base-only after the final write — so a property that no effect drives
//! anymore costs nothing and reads its original value.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod modifier;
pub mod property;
pub mod store;
pub mod system;

pub use modifier::{Modifier, ModifierChannel, StagedValues};
pub use property::{PropertyId, PropertyRegistry, PropertyValue, Rgba, TextureId, Vec4};
pub use store::{MaterialId, MaterialStore, PropertySink};
pub use system::{MaterialDriver, MaterialEffectConfig, MaterialPlayback};
