//! Frame timing for animated sprites, skins and alias-model frame groups.
//!
//! A group stores *cumulative* end-times: `[0.1, 0.3, 0.6]` means frame 0
//! lasts 0.1 s, frame 1 lasts 0.2 s, frame 2 lasts 0.3 s and the whole cycle
//! repeats every 0.6 s.

use thiserror::Error;

/// Things that can be wrong with an interval table at load time.
#[derive(Debug, Error, PartialEq)]
pub enum IntervalError {
    #[error("interval table is empty")]
    Empty,

    #[error("interval {index} is not positive ({value})")]
    NonPositive { index: usize, value: f32 },

    #[error("interval {index} ({value}) does not exceed the previous breakpoint")]
    NotIncreasing { index: usize, value: f32 },

    #[error("{frames} frames but {intervals} intervals")]
    LengthMismatch { frames: usize, intervals: usize },
}

/// Pick the frame that applies at `time`.
///
/// `intervals` must be non-empty, positive and strictly increasing; the loader
/// guarantees that through [`IntervalTable::new`], so nothing is re-checked
/// here.  `time` is wrapped into one cycle by truncation toward zero.
#[inline]
pub fn find_interval(intervals: &[f32], time: f32) -> usize {
    debug_assert!(!intervals.is_empty(), "empty interval table");

    let last = intervals.len() - 1;
    let full = intervals[last];
    let target = time - (time / full).trunc() * full;

    intervals[..last]
        .iter()
        .position(|&end| end > target)
        .unwrap_or(last)
}

/// Validated, read-only breakpoint table owned by an animated asset.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalTable {
    ends: Vec<f32>,
}

impl IntervalTable {
    /// Accept a table of cumulative end-times.
    pub fn new(ends: Vec<f32>) -> Result<Self, IntervalError> {
        if ends.is_empty() {
            return Err(IntervalError::Empty);
        }
        let mut prev = 0.0_f32;
        for (index, &value) in ends.iter().enumerate() {
            if value <= 0.0 {
                return Err(IntervalError::NonPositive { index, value });
            }
            if index > 0 && value <= prev {
                return Err(IntervalError::NotIncreasing { index, value });
            }
            prev = value;
        }
        Ok(Self { ends })
    }

    /// Build cumulative breakpoints from per-frame durations.
    pub fn from_durations(durations: &[f32]) -> Result<Self, IntervalError> {
        if let Some((index, &value)) = durations.iter().enumerate().find(|(_, d)| **d <= 0.0) {
            return Err(IntervalError::NonPositive { index, value });
        }
        let ends = durations
            .iter()
            .scan(0.0_f32, |acc, d| {
                *acc += d;
                Some(*acc)
            })
            .collect();
        Self::new(ends)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Length of one full cycle.
    #[inline]
    pub fn cycle(&self) -> f32 {
        self.ends[self.ends.len() - 1]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.ends
    }

    #[inline]
    pub fn find(&self, time: f32) -> usize {
        find_interval(&self.ends, time)
    }
}

/// A set of frames paired with their timing.
///
/// `sync` shifts this group's clock so copies of one asset placed in a scene
/// need not animate in lockstep.
#[derive(Clone, Debug)]
pub struct FrameGroup<T> {
    frames: Vec<T>,
    intervals: IntervalTable,
    sync: f64,
}

impl<T> FrameGroup<T> {
    pub fn new(frames: Vec<T>, intervals: IntervalTable) -> Result<Self, IntervalError> {
        if frames.len() != intervals.len() {
            return Err(IntervalError::LengthMismatch {
                frames: frames.len(),
                intervals: intervals.len(),
            });
        }
        Ok(Self {
            frames,
            intervals,
            sync: 0.0,
        })
    }

    /// Group with a single frame that never changes.
    pub fn single(frame: T) -> Self {
        Self {
            frames: vec![frame],
            intervals: IntervalTable { ends: vec![1.0] },
            sync: 0.0,
        }
    }

    /// Offset added to the clock before the lookup.
    pub fn with_sync(mut self, sync: f64) -> Self {
        self.sync = sync;
        self
    }

    #[inline]
    pub fn sync(&self) -> f64 {
        self.sync
    }

    /// Frame index at an absolute clock.
    ///
    /// The clock is wrapped into one cycle in `f64` first, so long sessions
    /// keep sub-frame resolution once narrowed to `f32`.
    #[inline]
    pub fn frame_index(&self, time: f64) -> usize {
        let full = self.intervals.cycle() as f64;
        let time = time + self.sync;
        let local = time - (time / full).trunc() * full;
        self.intervals.find(local as f32)
    }

    #[inline]
    pub fn frame_at(&self, time: f64) -> &T {
        &self.frames[self.frame_index(time)]
    }

    #[inline]
    pub fn intervals(&self) -> &IntervalTable {
        &self.intervals
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_segment_containing_time() {
        let t = [0.1, 0.3, 0.6];
        assert_eq!(find_interval(&t, 0.0), 0);
        assert_eq!(find_interval(&t, 0.25), 1);
        assert_eq!(find_interval(&t, 0.45), 2);
    }

    #[test]
    fn wraps_past_cycle_end() {
        let t = [0.1, 0.3, 0.6];
        // 0.65 wraps to ~0.05
        assert_eq!(find_interval(&t, 0.65), 0);
        assert_eq!(find_interval(&t, 0.95), 2);
    }

    #[test]
    fn periodic_over_whole_cycles() {
        // binary fractions keep the float maths exact
        let t = [0.25, 0.5, 1.0];
        for &time in &[0.0_f32, 0.125, 0.375, 0.625, 0.875] {
            let base = find_interval(&t, time);
            for k in 1..20 {
                assert_eq!(find_interval(&t, time + k as f32), base, "time {time} k {k}");
            }
        }
    }

    #[test]
    fn boundary_belongs_to_next_frame() {
        let t = [0.25, 0.5, 1.0];
        assert_eq!(find_interval(&t, 0.25), 1);
        assert_eq!(find_interval(&t, 0.5), 2);
        // exactly one cycle wraps to zero
        assert_eq!(find_interval(&t, 1.0), 0);
    }

    #[test]
    fn single_interval_is_always_zero() {
        let t = [0.7];
        for &time in &[0.0_f32, 0.3, 0.69, 0.7, 5.2, 1234.5] {
            assert_eq!(find_interval(&t, time), 0);
        }
    }

    #[test]
    fn table_rejects_bad_input() {
        assert_eq!(IntervalTable::new(vec![]).unwrap_err(), IntervalError::Empty);
        assert_eq!(
            IntervalTable::new(vec![0.0, 1.0]).unwrap_err(),
            IntervalError::NonPositive { index: 0, value: 0.0 }
        );
        assert_eq!(
            IntervalTable::new(vec![0.5, 0.5]).unwrap_err(),
            IntervalError::NotIncreasing { index: 1, value: 0.5 }
        );
    }

    #[test]
    fn durations_accumulate() {
        let table = IntervalTable::from_durations(&[0.25, 0.25, 0.5]).unwrap();
        assert_eq!(table.as_slice(), &[0.25, 0.5, 1.0]);
        assert_eq!(table.cycle(), 1.0);
        assert!(IntervalTable::from_durations(&[0.1, -0.1]).is_err());
    }

    #[test]
    fn frame_group_follows_clock() {
        let table = IntervalTable::new(vec![0.25, 0.5, 1.0]).unwrap();
        let group = FrameGroup::new(vec!['a', 'b', 'c'], table).unwrap();
        assert_eq!(*group.frame_at(0.1), 'a');
        assert_eq!(*group.frame_at(0.3), 'b');
        assert_eq!(*group.frame_at(1.75), 'c');

        let still = FrameGroup::single(7u16);
        assert_eq!(*still.frame_at(99.0), 7);
    }

    #[test]
    fn frame_group_rejects_count_mismatch() {
        let table = IntervalTable::new(vec![0.5, 1.0]).unwrap();
        let err = FrameGroup::new(vec![1, 2, 3], table).unwrap_err();
        assert_eq!(err, IntervalError::LengthMismatch { frames: 3, intervals: 2 });
        assert_eq!(err.to_string(), "3 frames but 2 intervals");
    }

    #[test]
    fn sync_offset_desynchronises_copies() {
        let table = IntervalTable::new(vec![0.25, 0.5, 1.0]).unwrap();
        let a = FrameGroup::new(vec!['a', 'b', 'c'], table.clone()).unwrap();
        let b = FrameGroup::new(vec!['a', 'b', 'c'], table).unwrap().with_sync(0.25);
        assert_eq!(*a.frame_at(0.1), 'a');
        assert_eq!(*b.frame_at(0.1), 'b');
        // a whole cycle of offset is no offset at all
        let c = a.clone().with_sync(1.0);
        assert_eq!(c.frame_index(0.3), a.frame_index(0.3));
    }

    #[test]
    fn day_long_clock_keeps_frame_resolution() {
        // one day in, where an f32 clock only moves in ~8 ms steps
        let table = IntervalTable::new(vec![0.5, 1.0]).unwrap();
        let group = FrameGroup::new(vec![0, 1], table).unwrap();
        let day = 86_400.0_f64;
        assert_eq!(*group.frame_at(day + 0.1), 0);
        assert_eq!(*group.frame_at(day + 0.6), 1);
        assert_eq!(*group.frame_at(day + 1.1), 0);
    }
}
