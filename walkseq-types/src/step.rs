//! Step pattern types.

use serde::{Deserialize, Serialize};

/// Number of steps in a pattern. Fixed for the lifetime of the engine.
pub const NUM_STEPS: usize = 16;

pub const PITCH_MIN: i8 = -12;
pub const PITCH_MAX: i8 = 12;

/// A single step: semitone offset from the root plus an enabled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub pitch_offset: i8, // -12..=12
    pub enabled: bool,    // only consulted in manual mode
}

impl Default for SequenceStep {
    fn default() -> Self {
        Self {
            pitch_offset: 0,
            enabled: true,
        }
    }
}

impl SequenceStep {
    pub fn new(pitch_offset: i32, enabled: bool) -> Self {
        Self {
            pitch_offset: clamp_pitch(pitch_offset),
            enabled,
        }
    }

    /// Write a pitch offset, clamping it to the one-octave range.
    pub fn set_pitch(&mut self, value: i32) {
        self.pitch_offset = clamp_pitch(value);
    }
}

fn clamp_pitch(value: i32) -> i8 {
    value.clamp(PITCH_MIN as i32, PITCH_MAX as i32) as i8
}

/// The fixed 16-step pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepPattern {
    pub steps: [SequenceStep; NUM_STEPS],
}

impl StepPattern {
    pub fn get(&self, index: usize) -> Option<&SequenceStep> {
        self.steps.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SequenceStep> {
        self.steps.get_mut(index)
    }

    pub fn pitches(&self) -> [i8; NUM_STEPS] {
        let mut out = [0; NUM_STEPS];
        for (slot, step) in out.iter_mut().zip(self.steps.iter()) {
            *slot = step.pitch_offset;
        }
        out
    }

    /// Overwrite every pitch offset, leaving enabled flags alone.
    pub fn set_pitches(&mut self, pitches: &[i32; NUM_STEPS]) {
        for (step, &p) in self.steps.iter_mut().zip(pitches.iter()) {
            step.set_pitch(p);
        }
    }

    pub fn enable_all(&mut self) {
        for step in &mut self.steps {
            step.enabled = true;
        }
    }

    pub fn zero_pitches(&mut self) {
        for step in &mut self.steps {
            step.pitch_offset = 0;
        }
    }
}
