// Copyright 2026 the Afterglow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable churn metrics and grading for demo harnesses.
//!
//! Effect playback is an allocation-churn workload: triggers add
//! instances every frame and completed fades hand their states back to
//! the pool. [`ChurnTracker`] aggregates per-frame [`ChurnSample`]s plus
//! the owning system's [`PoolStats`] into a [`ChurnReport`] with a letter
//! grade, so demos and stress tests can surface at a glance whether the
//! reuse pool is absorbing the churn or the hot path is allocating.

#![no_std]

use afterglow_core::system::PoolStats;

/// Runtime pathology toggles for stress tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathologyToggles {
    /// Add a burst of instances every frame instead of a steady trickle.
    pub burst_add: bool,
    /// Cancel instances early instead of letting fades complete.
    pub early_cancel: bool,
    /// Drive oversized frame deltas so stages cascade within one tick.
    pub delta_spikes: bool,
}

/// Per-frame metrics sample fed into [`ChurnTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct ChurnSample {
    /// Instances added this frame.
    pub adds: u32,
    /// Instances removed this frame (completions plus cancellations).
    pub removals: u32,
    /// Instances active after the frame's update.
    pub active: u32,
}

/// Letter grade for pool-reuse quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnGrade {
    /// The pool absorbs nearly all churn.
    A,
    /// Mostly reusing, with some allocation.
    B,
    /// Allocating on a large share of adds.
    C,
    /// The pool is not absorbing the workload.
    D,
}

impl ChurnGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`ChurnTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct ChurnReport {
    /// Current grade.
    pub grade: ChurnGrade,
    /// Share of adds served from the pool, `0.0..=1.0`.
    pub reuse_rate: f64,
    /// Mean active instances over the sample window.
    pub avg_active: f64,
    /// Highest active count observed.
    pub peak_active: u32,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total instances spawned.
    pub total_spawned: u64,
}

/// Rolling churn tracker with fixed-size active-count history.
#[derive(Debug)]
pub struct ChurnTracker<const N: usize> {
    active: [u32; N],
    cursor: usize,
    total_frames: u64,
    total_spawned: u64,
    peak_active: u32,
}

impl<const N: usize> Default for ChurnTracker<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChurnTracker<N> {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: [0; N],
            cursor: 0,
            total_frames: 0,
            total_spawned: 0,
            peak_active: 0,
        }
    }

    /// Observes one frame and returns an updated report.
    #[must_use]
    pub fn observe(&mut self, sample: ChurnSample, pool: PoolStats) -> ChurnReport {
        self.total_frames = self.total_frames.saturating_add(1);
        self.total_spawned = self.total_spawned.saturating_add(u64::from(sample.adds));
        self.active[self.cursor % N] = sample.active;
        self.cursor = (self.cursor + 1) % N;
        self.peak_active = self.peak_active.max(sample.active);

        let served = pool.allocated + pool.reused;
        let reuse_rate = if served == 0 {
            1.0
        } else {
            pool.reused as f64 / served as f64
        };

        let window = if self.total_frames < N as u64 {
            self.cursor.max(1)
        } else {
            N
        };
        let sum: u64 = self.active[..window].iter().map(|&a| u64::from(a)).sum();
        let avg_active = sum as f64 / window as f64;

        ChurnReport {
            grade: grade(reuse_rate),
            reuse_rate,
            avg_active,
            peak_active: self.peak_active,
            total_frames: self.total_frames,
            total_spawned: self.total_spawned,
        }
    }
}

fn grade(reuse_rate: f64) -> ChurnGrade {
    if reuse_rate >= 0.9 {
        ChurnGrade::A
    } else if reuse_rate >= 0.7 {
        ChurnGrade::B
    } else if reuse_rate >= 0.4 {
        ChurnGrade::C
    } else {
        ChurnGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(active: u32) -> ChurnSample {
        ChurnSample {
            adds: 1,
            removals: 1,
            active,
        }
    }

    #[test]
    fn steady_reuse_grades_a() {
        let mut tracker: ChurnTracker<16> = ChurnTracker::new();
        let pool = PoolStats {
            allocated: 2,
            reused: 98,
        };
        let report = tracker.observe(sample(4), pool);
        assert_eq!(report.grade, ChurnGrade::A);
        assert!(report.reuse_rate > 0.9);
    }

    #[test]
    fn cold_start_grades_low() {
        let mut tracker: ChurnTracker<16> = ChurnTracker::new();
        let pool = PoolStats {
            allocated: 10,
            reused: 0,
        };
        let report = tracker.observe(sample(10), pool);
        assert_eq!(report.grade, ChurnGrade::D);
    }

    #[test]
    fn no_traffic_is_a_clean_slate() {
        let mut tracker: ChurnTracker<16> = ChurnTracker::new();
        let report = tracker.observe(sample(0), PoolStats::default());
        assert_eq!(report.grade, ChurnGrade::A);
        assert_eq!(report.reuse_rate, 1.0);
    }

    #[test]
    fn peak_and_average_track_the_window() {
        let mut tracker: ChurnTracker<4> = ChurnTracker::new();
        let pool = PoolStats {
            allocated: 1,
            reused: 9,
        };
        let _ = tracker.observe(sample(2), pool);
        let _ = tracker.observe(sample(6), pool);
        let report = tracker.observe(sample(4), pool);
        assert_eq!(report.peak_active, 6);
        assert!((report.avg_active - 4.0).abs() < 1e-9);
        assert_eq!(report.total_frames, 3);
        assert_eq!(report.total_spawned, 3);
    }
}
