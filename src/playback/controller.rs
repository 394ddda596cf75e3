//! Record and Playback Controller
//!
//! Wraps a `Recordable` model and routes the clock through one of three
//! modes:
//!
//! | Mode     | Physics | History                                  |
//! |----------|---------|------------------------------------------|
//! | Live     | runs    | untouched                                |
//! | Record   | runs    | one `DataPoint` appended per step        |
//! | Playback | frozen  | nearest point to the playback time shown |
//!
//! History is bounded by `RecordingConfig::max_record_points`. What happens
//! at the bound and at the end of playback is set by the config's
//! `OverflowPolicy` and `EndOfPlaybackPolicy`.
//!
//! Recorded times are strictly increasing, which lets lookups binary search.

use super::Recordable;
use crate::config::{EndOfPlaybackPolicy, OverflowPolicy, RecordingConfig};
use crate::error::{NeuronError, Result};
use std::collections::VecDeque;

/// Controller mode
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    Live,
    Record,
    /// Time advances `speed` times the clock; negative plays backward
    Playback { speed: f64 },
}

/// One recorded moment
#[derive(Clone, Debug, PartialEq)]
pub struct DataPoint<S> {
    time: f64,
    state: S,
}

impl<S> DataPoint<S> {
    pub fn new(time: f64, state: S) -> Self {
        Self { time, state }
    }

    /// Simulation time of the snapshot (s)
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Record/playback controller
pub struct RecordAndPlayback<M: Recordable> {
    model: M,
    history: VecDeque<DataPoint<M::State>>,
    mode: Mode,
    /// Live time in Live/Record, playback cursor in Playback (s)
    time: f64,
    paused: bool,
    config: RecordingConfig,
    full_reported: bool,
}

impl<M: Recordable> RecordAndPlayback<M> {
    pub fn new(model: M, config: RecordingConfig) -> Self {
        Self {
            model,
            history: VecDeque::new(),
            mode: Mode::Live,
            time: 0.0,
            paused: false,
            config,
            full_reported: false,
        }
    }

    /// Advance by one clock tick of `dt` seconds
    ///
    /// Nothing happens while paused. Live and Record ignore non-positive
    /// `dt`, and every mode ignores non-finite `dt`.
    pub fn step(&mut self, dt: f64) {
        if self.paused || !dt.is_finite() {
            return;
        }
        match self.mode {
            Mode::Live => {
                if dt > 0.0 {
                    self.time += dt;
                    self.model.step_in_time(dt);
                }
            }
            Mode::Record => {
                if dt > 0.0 {
                    self.time += dt;
                    self.model.step_in_time(dt);
                    self.record_point();
                }
            }
            Mode::Playback { speed } => self.step_playback(dt * speed),
        }
    }

    fn record_point(&mut self) {
        if self.history.len() >= self.config.max_record_points {
            match self.config.overflow_policy {
                OverflowPolicy::StopRecording => {
                    if !self.full_reported {
                        log::warn!(
                            "Recording full at {} points, further steps are not recorded",
                            self.config.max_record_points
                        );
                        self.full_reported = true;
                    }
                    return;
                }
                OverflowPolicy::EvictOldest => {
                    self.history.pop_front();
                }
            }
        }
        self.history
            .push_back(DataPoint::new(self.time, self.model.capture_state()));
    }

    fn step_playback(&mut self, delta: f64) {
        let (min, max) = (self.min_recorded_time(), self.max_recorded_time());
        if delta > 0.0 {
            if self.time < max {
                self.seek((self.time + delta).min(max));
            } else {
                match self.config.end_of_playback {
                    EndOfPlaybackPolicy::Pause => {
                        log::debug!("Playback reached end of history, pausing");
                        self.paused = true;
                    }
                    EndOfPlaybackPolicy::Record => {
                        log::debug!("Playback reached end of history, resuming recording");
                        self.set_mode_record();
                    }
                }
            }
        } else if delta < 0.0 && self.time > min {
            self.seek((self.time + delta).max(min));
        }
    }

    /// Move the cursor to `time` and show the nearest point
    fn seek(&mut self, time: f64) {
        self.time = time;
        if let Some(index) = self.nearest_index(time) {
            self.model.apply_playback_state(&self.history[index].state);
        }
    }

    /// Index of the point closest to `time`; ties go to the earlier point
    fn nearest_index(&self, time: f64) -> Option<usize> {
        if self.history.is_empty() {
            return None;
        }
        let after = self.history.partition_point(|p| p.time < time);
        if after == 0 {
            return Some(0);
        }
        if after == self.history.len() {
            return Some(after - 1);
        }
        let before = after - 1;
        if time - self.history[before].time <= self.history[after].time - time {
            Some(before)
        } else {
            Some(after)
        }
    }

    // === Mode transitions ===

    /// Resume live physics from the shown point
    ///
    /// History after that point is discarded so later recording appends
    /// in time order.
    fn leave_playback(&mut self) {
        if let Some(index) = self.nearest_index(self.time) {
            self.time = self.history[index].time;
            self.history.truncate(index + 1);
        }
        self.full_reported = false;
        self.model.exit_playback();
    }

    /// Run physics without recording
    ///
    /// From playback, history after the shown point is discarded and the
    /// clock continues from it.
    pub fn set_mode_live(&mut self) {
        if self.is_playback() {
            self.leave_playback();
        }
        self.mode = Mode::Live;
        log::debug!("Mode: live at t={:.6}s", self.time);
    }

    /// Start recording
    ///
    /// From playback, history after the shown point is discarded and
    /// recording continues from it.
    pub fn set_mode_record(&mut self) {
        if self.is_playback() {
            self.leave_playback();
        }
        self.mode = Mode::Record;
        log::debug!("Mode: record at t={:.6}s", self.time);
    }

    /// Start playback at `speed`, showing the point nearest the current time
    pub fn set_playback(&mut self, speed: f64) -> Result<()> {
        if self.history.is_empty() {
            return Err(NeuronError::EmptyHistory);
        }
        let time = self
            .time
            .clamp(self.min_recorded_time(), self.max_recorded_time());
        self.mode = Mode::Playback { speed };
        self.seek(time);
        log::debug!("Mode: playback x{} at t={:.6}s", speed, self.time);
        Ok(())
    }

    /// Jump the playback cursor, clamped to the recorded range
    pub fn set_time(&mut self, time: f64) -> Result<()> {
        if !self.is_playback() {
            return Err(NeuronError::NotInPlayback);
        }
        if self.history.is_empty() {
            return Err(NeuronError::EmptyHistory);
        }
        self.seek(time.clamp(self.min_recorded_time(), self.max_recorded_time()));
        Ok(())
    }

    /// Enter playback (keeping the current speed, else 1x) at the oldest point
    pub fn rewind(&mut self) -> Result<()> {
        let speed = self.playback_speed().unwrap_or(1.0);
        self.set_playback(speed)?;
        self.seek(self.min_recorded_time());
        Ok(())
    }

    /// Drop all history; playback falls back to live
    pub fn clear_history(&mut self) {
        if self.is_playback() {
            self.leave_playback();
            self.mode = Mode::Live;
        }
        self.history.clear();
        self.full_reported = false;
    }

    /// Model back to initial conditions, history cleared, time zero, live
    pub fn reset(&mut self) {
        if self.is_playback() {
            self.model.exit_playback();
        }
        self.model.reset();
        self.history.clear();
        self.full_reported = false;
        self.time = 0.0;
        self.mode = Mode::Live;
        self.paused = false;
    }

    // === Queries ===

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == Mode::Live
    }

    pub fn is_record(&self) -> bool {
        self.mode == Mode::Record
    }

    pub fn is_playback(&self) -> bool {
        matches!(self.mode, Mode::Playback { .. })
    }

    pub fn playback_speed(&self) -> Option<f64> {
        match self.mode {
            Mode::Playback { speed } => Some(speed),
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Current time (s)
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Oldest recorded time, 0 when empty
    pub fn min_recorded_time(&self) -> f64 {
        self.history.front().map_or(0.0, |p| p.time)
    }

    /// Newest recorded time, 0 when empty
    pub fn max_recorded_time(&self) -> f64 {
        self.history.back().map_or(0.0, |p| p.time)
    }

    /// True once recording has stopped at capacity
    ///
    /// Always false under `OverflowPolicy::EvictOldest`, which keeps
    /// recording by dropping the oldest points.
    pub fn is_recording_full(&self) -> bool {
        self.config.overflow_policy == OverflowPolicy::StopRecording
            && self.history.len() >= self.config.max_record_points
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn data_point(&self, index: usize) -> Result<&DataPoint<M::State>> {
        self.history.get(index).ok_or(NeuronError::IndexOutOfRange {
            index,
            len: self.history.len(),
        })
    }

    pub fn history(&self) -> impl Iterator<Item = &DataPoint<M::State>> {
        self.history.iter()
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }
}
