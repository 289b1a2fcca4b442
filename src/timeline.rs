//! Demo time, input snapshot and section sequencing
//!
//! All time values are in music beats (1.0 = one beat). Effects receive a
//! `FrameContext` each frame and never read clocks or devices themselves.

use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

use crate::dither::fade_bias;
use crate::math3d::invlerp;

/// Beats over which a section fades in and out
pub const FADE_BEATS: f32 = 1.0;

/// Reference frame rate for beat detection
const BEAT_FRAME_RATE: f32 = 30.0;

// ============================================================================
// Buttons
// ============================================================================

/// Handheld button bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons(u8);

impl Buttons {
    pub const LEFT: Self = Self(1 << 0);
    pub const RIGHT: Self = Self(1 << 1);
    pub const UP: Self = Self(1 << 2);
    pub const DOWN: Self = Self(1 << 3);
    pub const B: Self = Self(1 << 4);
    pub const A: Self = Self(1 << 5);

    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn set(&mut self, other: Self, down: bool) {
        if down {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for Buttons {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Buttons {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Buttons {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Held buttons and crank, turned into per-frame edges
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub down: Buttons,
    prev_down: Buttons,
    /// Crank angle in radians, kept in [0, 2pi)
    pub crank: f32,
}

impl InputState {
    /// Rotate the crank by `degrees`
    pub fn turn_crank(&mut self, degrees: f32) {
        self.crank = (self.crank + degrees.to_radians()).rem_euclid(std::f32::consts::TAU);
    }

    /// Buttons that went down since the previous call
    pub fn take_pressed(&mut self) -> Buttons {
        let pressed = self.down & !self.prev_down;
        self.prev_down = self.down;
        pressed
    }
}

// ============================================================================
// Frame context
// ============================================================================

/// Everything an effect may read for one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    /// Global time in beats
    pub time: f32,
    pub prev_time: f32,
    /// True on the frame during which the integer beat advances
    pub beat: bool,
    pub frame: u64,
    pub buttons_down: Buttons,
    pub buttons_pressed: Buttons,
    /// Crank angle in radians
    pub crank: f32,
    /// Progress through the current section, 0..=1
    pub alpha: f32,
    /// Section fade bias (never positive)
    pub fade_bias: i32,
}

// ============================================================================
// Clock
// ============================================================================

/// Converts wall time to beats and flags beat frames
#[derive(Debug, Clone)]
pub struct Clock {
    beat_seconds: f32,
    /// Beats added to wall time (start offset and seeks)
    offset: f32,
    time: f32,
    prev_time: f32,
    frame: u64,
    beat_done: i32,
}

impl Clock {
    pub fn new(beat_seconds: f32, start_beat: f32) -> Self {
        Self {
            beat_seconds,
            offset: start_beat,
            time: start_beat,
            prev_time: start_beat,
            frame: 0,
            beat_done: -1,
        }
    }

    /// Advance to `elapsed` seconds since start. Returns true on a beat frame:
    /// the integer beat reached by the end of a 30 fps frame is new.
    pub fn advance(&mut self, elapsed: f32) -> bool {
        self.frame += 1;
        self.prev_time = self.time;
        self.time = (elapsed / self.beat_seconds + self.offset).max(0.0);
        if self.prev_time > self.time {
            self.prev_time = self.time;
        }

        let frame_beats = 1.0 / (self.beat_seconds * BEAT_FRAME_RATE);
        let beat_at_end = (self.time + frame_beats) as i32;
        let beat = self.beat_done < beat_at_end;
        self.beat_done = beat_at_end;
        beat
    }

    /// Jump by `seconds` (negative seeks back)
    pub fn seek(&mut self, seconds: f32) {
        self.offset += seconds / self.beat_seconds;
        self.beat_done = -1;
    }

    /// Rewind to beat zero at wall time `elapsed`
    pub fn restart(&mut self, elapsed: f32) {
        self.offset = -elapsed / self.beat_seconds;
        self.beat_done = -1;
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn prev_time(&self) -> f32 {
        self.prev_time
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

// ============================================================================
// Timeline
// ============================================================================

/// One effect over a range of beats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Index into the effect registry
    pub effect: usize,
    pub start: f32,
    pub end: f32,
}

impl Section {
    pub const fn new(effect: usize, start: f32, end: f32) -> Self {
        Self { effect, start, end }
    }

    /// Built-in running order: starfield, plasma, planes, temporal test
    pub fn default_timeline() -> Vec<Self> {
        vec![
            Self::new(0, 0.0, 32.0),
            Self::new(1, 32.0, 48.0),
            Self::new(2, 48.0, 80.0),
            Self::new(3, 80.0, 112.0),
        ]
    }
}

/// Resolved position within the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionState {
    pub index: usize,
    pub effect: usize,
    pub alpha: f32,
    pub fade_bias: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    sections: Vec<Section>,
}

impl Timeline {
    /// Sections are ordered by start; empty or reversed ranges are dropped
    pub fn new(mut sections: Vec<Section>) -> Self {
        sections.retain(|s| {
            let keep = s.end > s.start;
            if !keep {
                log::warn!("dropping empty timeline section {:?}", s);
            }
            keep
        });
        sections.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Last beat of the demo
    pub fn end(&self) -> f32 {
        self.sections.iter().map(|s| s.end).fold(0.0, f32::max)
    }

    /// Section playing at `time`, if any
    pub fn at(&self, time: f32) -> Option<SectionState> {
        self.sections
            .iter()
            .enumerate()
            .find(|(_, s)| time >= s.start && time < s.end)
            .map(|(index, s)| SectionState {
                index,
                effect: s.effect,
                alpha: invlerp(s.start, s.end, time),
                fade_bias: fade_bias(time, s.start, s.end, FADE_BEATS),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_edges() {
        let mut input = InputState::default();
        input.down.set(Buttons::LEFT, true);
        assert_eq!(input.take_pressed(), Buttons::LEFT);
        // Still held: no new press
        assert_eq!(input.take_pressed(), Buttons::empty());
        input.down.set(Buttons::A, true);
        let pressed = input.take_pressed();
        assert!(pressed.contains(Buttons::A));
        assert!(!pressed.contains(Buttons::LEFT));
        assert!(input.down.contains(Buttons::LEFT | Buttons::A));
    }

    #[test]
    fn test_crank_wraps() {
        let mut input = InputState::default();
        input.turn_crank(-90.0);
        assert!((input.crank - 270f32.to_radians()).abs() < 1e-4);
        input.turn_crank(180.0);
        assert!((input.crank - 90f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_clock_converts_to_beats() {
        let mut clock = Clock::new(0.5, 0.0);
        clock.advance(1.0);
        assert!((clock.time() - 2.0).abs() < 1e-6);
        clock.advance(1.25);
        assert!((clock.prev_time() - 2.0).abs() < 1e-6);
        assert!((clock.time() - 2.5).abs() < 1e-6);
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn test_beat_fires_once_per_beat() {
        let mut clock = Clock::new(0.46875, 0.0);
        let mut beats = 0;
        let frames = 600;
        for i in 0..frames {
            if clock.advance(i as f32 / 60.0) {
                beats += 1;
            }
        }
        // 10 seconds at 0.46875 s/beat: beat 0 plus 21 boundaries
        assert_eq!(beats, 22);
    }

    #[test]
    fn test_seek_back_clamps_prev_time() {
        let mut clock = Clock::new(1.0, 10.0);
        clock.advance(0.0);
        clock.seek(-5.0);
        assert!(clock.advance(0.0));
        assert!((clock.time() - 5.0).abs() < 1e-6);
        assert!(clock.prev_time() <= clock.time());
        clock.seek(-100.0);
        clock.advance(0.0);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn test_restart_rewinds() {
        let mut clock = Clock::new(1.0, 0.0);
        clock.advance(50.0);
        clock.restart(50.0);
        clock.advance(51.0);
        assert!((clock.time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_timeline_lookup() {
        let timeline = Timeline::new(Section::default_timeline());
        let state = timeline.at(40.0).expect("inside plasma");
        assert_eq!(state.effect, 1);
        assert!((state.alpha - 0.5).abs() < 1e-6);
        assert_eq!(state.fade_bias, 0);

        let start = timeline.at(48.0).expect("planes start");
        assert_eq!(start.effect, 2);
        assert_eq!(start.fade_bias, -250);

        assert!(timeline.at(112.0).is_none());
        assert_eq!(timeline.end(), 112.0);
    }

    #[test]
    fn test_timeline_sorts_and_drops_empty() {
        let timeline = Timeline::new(vec![
            Section::new(1, 8.0, 16.0),
            Section::new(2, 4.0, 4.0),
            Section::new(0, 0.0, 8.0),
        ]);
        assert_eq!(timeline.sections().len(), 2);
        assert_eq!(timeline.sections()[0].effect, 0);
        assert_eq!(timeline.at(9.0).map(|s| s.index), Some(1));
    }
}
