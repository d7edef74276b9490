// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyframe curves with cubic-Bézier easing.
//!
//! Drivers evaluate time-driven modifier values through [`Curve`]: a
//! non-empty, time-sorted keyframe list where each keyframe carries the
//! [`Easing`] applied on the way to the next one. Sampling clamps outside
//! the keyed range, so a curve keyed over `[0, 1]` behaves well when fed
//! normalized stage progress.
//!
//! Easing uses the CSS-style unit Bézier: a cubic through `(0,0)` and
//! `(1,1)` with two free control points, evaluated by bisecting for the
//! parameter whose x matches the input time. Control-point x values are
//! confined to `[0, 1]`, which keeps x(t) monotone and the bisection
//! well-defined.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{CubicBez, ParamCurve, Point};

/// Linear interpolation between two values of a type.
///
/// Implemented for every value kind a curve can animate; composite types
/// (vectors, colors) interpolate per component.
pub trait Lerp: Copy {
    /// Interpolates from `self` toward `other` by `t` in `[0, 1]`.
    #[must_use]
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// How one keyframe segment progresses to the next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    /// Constant-rate interpolation.
    Linear,
    /// CSS-style cubic Bézier through `(0,0)` and `(1,1)`.
    CubicBezier {
        /// First control point x, in `[0, 1]`.
        x1: f32,
        /// First control point y.
        y1: f32,
        /// Second control point x, in `[0, 1]`.
        x2: f32,
        /// Second control point y.
        y2: f32,
    },
}

impl Easing {
    /// The standard ease-in-out curve.
    pub const EASE_IN_OUT: Self = Self::CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };

    /// Maps segment time `t` in `[0, 1]` to an interpolation factor.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "kurbo evaluates in f64; the result is a unit-range factor"
    )]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::CubicBezier { x1, y1, x2, y2 } => {
                let t = t.clamp(0.0, 1.0);
                let bez = CubicBez::new(
                    Point::new(0.0, 0.0),
                    Point::new(f64::from(x1.clamp(0.0, 1.0)), f64::from(y1)),
                    Point::new(f64::from(x2.clamp(0.0, 1.0)), f64::from(y2)),
                    Point::new(1.0, 1.0),
                );
                // Bisect for the parameter whose x matches t; x(t) is
                // monotone because both control x values sit in [0, 1].
                let target = f64::from(t);
                let mut lo = 0.0_f64;
                let mut hi = 1.0_f64;
                for _ in 0..32 {
                    let mid = 0.5 * (lo + hi);
                    if bez.eval(mid).x < target {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                bez.eval(0.5 * (lo + hi)).y as f32
            }
        }
    }
}

/// One keyframe: a time, a value, and the easing toward the next keyframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    /// Sample time.
    pub t: f32,
    /// Value at `t`.
    pub value: T,
    /// Easing applied between this keyframe and the next. Ignored on the
    /// last keyframe.
    pub easing: Easing,
}

impl<T> Keyframe<T> {
    /// A keyframe with linear easing toward the next.
    #[must_use]
    pub const fn linear(t: f32, value: T) -> Self {
        Self {
            t,
            value,
            easing: Easing::Linear,
        }
    }
}

/// A non-empty, time-sorted keyframe curve.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T: Lerp> Curve<T> {
    /// Creates a curve from keyframes.
    ///
    /// # Panics
    ///
    /// Panics if `keys` is empty or not sorted by time — both are
    /// authoring errors.
    #[must_use]
    pub fn new(keys: Vec<Keyframe<T>>) -> Self {
        assert!(!keys.is_empty(), "a curve needs at least one keyframe");
        assert!(
            keys.windows(2).all(|pair| pair[0].t <= pair[1].t),
            "curve keyframes must be sorted by time"
        );
        Self { keys }
    }

    /// A curve that holds `value` everywhere.
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe::linear(0.0, value)],
        }
    }

    /// A straight ramp from `from` at time 0 to `to` at time 1.
    #[must_use]
    pub fn linear(from: T, to: T) -> Self {
        Self {
            keys: vec![Keyframe::linear(0.0, from), Keyframe::linear(1.0, to)],
        }
    }

    /// A ramp from `from` to `to` over `[0, 1]` with the given easing.
    #[must_use]
    pub fn eased(from: T, to: T, easing: Easing) -> Self {
        Self {
            keys: vec![
                Keyframe {
                    t: 0.0,
                    value: from,
                    easing,
                },
                Keyframe::linear(1.0, to),
            ],
        }
    }

    /// Samples the curve at `t`, clamping outside the keyed range.
    #[must_use]
    pub fn sample(&self, t: f32) -> T {
        let first = &self.keys[0];
        if t <= first.t {
            return first.value;
        }
        let last = &self.keys[self.keys.len() - 1];
        if t >= last.t {
            return last.value;
        }

        // Index of the first keyframe strictly past t; the segment starts
        // one before it. Both exist because of the clamps above.
        let upper = self.keys.partition_point(|key| key.t <= t);
        let k0 = &self.keys[upper - 1];
        let k1 = &self.keys[upper];

        let span = k1.t - k0.t;
        if span <= 0.0 {
            return k1.value;
        }
        let local = (t - k0.t) / span;
        k0.value.lerp(k1.value, k0.easing.apply(local))
    }

    /// Number of keyframes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Curves are never empty; this exists to pair with [`len`](Self::len).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_holds_everywhere() {
        let curve = Curve::constant(3.0_f32);
        assert_eq!(curve.sample(-1.0), 3.0);
        assert_eq!(curve.sample(0.5), 3.0);
        assert_eq!(curve.sample(10.0), 3.0);
    }

    #[test]
    fn linear_ramp_endpoints_and_midpoint() {
        let curve = Curve::linear(0.0_f32, 2.0);
        assert_eq!(curve.sample(0.0), 0.0);
        assert_eq!(curve.sample(1.0), 2.0);
        assert!((curve.sample(0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sampling_clamps_outside_keyed_range() {
        let curve = Curve::linear(1.0_f32, 5.0);
        assert_eq!(curve.sample(-0.5), 1.0);
        assert_eq!(curve.sample(1.5), 5.0);
    }

    #[test]
    fn multi_segment_selects_the_right_span() {
        let curve = Curve::new(vec![
            Keyframe::linear(0.0, 0.0_f32),
            Keyframe::linear(0.5, 1.0),
            Keyframe::linear(1.0, 0.0),
        ]);
        assert!((curve.sample(0.25) - 0.5).abs() < 1e-6);
        assert!((curve.sample(0.75) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bezier_easing_hits_endpoints_exactly() {
        let easing = Easing::EASE_IN_OUT;
        assert!((easing.apply(0.0)).abs() < 1e-4);
        assert!((easing.apply(1.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn ease_in_out_is_slow_at_the_edges() {
        let easing = Easing::EASE_IN_OUT;
        assert!(easing.apply(0.1) < 0.1, "eases in below linear");
        assert!(easing.apply(0.9) > 0.9, "eases out above linear");
        let mid = easing.apply(0.5);
        assert!((mid - 0.5).abs() < 1e-3, "symmetric curve crosses midpoint");
    }

    #[test]
    fn eased_curve_uses_the_easing() {
        let eased = Curve::eased(0.0_f32, 1.0, Easing::EASE_IN_OUT);
        let linear = Curve::linear(0.0_f32, 1.0);
        assert!(eased.sample(0.1) < linear.sample(0.1));
    }

    #[test]
    #[should_panic(expected = "at least one keyframe")]
    fn empty_curve_is_rejected() {
        let _ = Curve::<f32>::new(vec![]);
    }

    #[test]
    #[should_panic(expected = "sorted by time")]
    fn unsorted_keyframes_are_rejected() {
        let _ = Curve::new(vec![Keyframe::linear(1.0, 0.0_f32), Keyframe::linear(0.0, 1.0)]);
    }
}
