//! Sequencer parameter types.

use serde::{Deserialize, Serialize};

use crate::step::NUM_STEPS;
use crate::{BPM_MAX, BPM_MIN, DENSITY_MAX, DENSITY_MIN, GATE_MAX, GATE_MIN, ROOT_MAX, ROOT_MIN};

/// Step length, expressed as a note value.
///
/// Labels are fractions of a whole note: `Quarter` ("1/4") lasts one beat,
/// `Whole` ("1") lasts four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RateIndex {
    ThirtySecond,
    Sixteenth,
    Eighth,
    #[default]
    Quarter,
    Third,
    Half,
    Whole,
    TwoWhole,
    ThreeWhole,
    FourWhole,
}

impl RateIndex {
    pub const ALL: [RateIndex; 10] = [
        Self::ThirtySecond,
        Self::Sixteenth,
        Self::Eighth,
        Self::Quarter,
        Self::Third,
        Self::Half,
        Self::Whole,
        Self::TwoWhole,
        Self::ThreeWhole,
        Self::FourWhole,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::ThirtySecond => 0,
            Self::Sixteenth => 1,
            Self::Eighth => 2,
            Self::Quarter => 3,
            Self::Third => 4,
            Self::Half => 5,
            Self::Whole => 6,
            Self::TwoWhole => 7,
            Self::ThreeWhole => 8,
            Self::FourWhole => 9,
        }
    }

    /// Map a table index to a rate, clamping out-of-range values to the ends.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.clamp(0, Self::ALL.len() as i64 - 1) as usize]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ThirtySecond => "1/32",
            Self::Sixteenth => "1/16",
            Self::Eighth => "1/8",
            Self::Quarter => "1/4",
            Self::Third => "1/3",
            Self::Half => "1/2",
            Self::Whole => "1",
            Self::TwoWhole => "2",
            Self::ThreeWhole => "3",
            Self::FourWhole => "4",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.label() == label.trim())
    }

    /// Length of one step as a fraction of a whole note.
    pub fn note_value(self) -> f64 {
        match self {
            Self::ThirtySecond => 1.0 / 32.0,
            Self::Sixteenth => 1.0 / 16.0,
            Self::Eighth => 1.0 / 8.0,
            Self::Quarter => 1.0 / 4.0,
            Self::Third => 1.0 / 3.0,
            Self::Half => 1.0 / 2.0,
            Self::Whole => 1.0,
            Self::TwoWhole => 2.0,
            Self::ThreeWhole => 3.0,
            Self::FourWhole => 4.0,
        }
    }

    /// Length of one step in beats (quarter notes).
    pub fn beats(self) -> f64 {
        self.note_value() * 4.0
    }
}

impl std::fmt::Display for RateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Pattern generation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PatternKind {
    #[default]
    RandomWalk,
    Ascending,
    Descending,
    Arpeggio,
}

impl PatternKind {
    pub const ALL: [PatternKind; 4] = [
        Self::RandomWalk,
        Self::Ascending,
        Self::Descending,
        Self::Arpeggio,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RandomWalk => "Random Walk",
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
            Self::Arpeggio => "Arpeggio",
        }
    }

    /// Selector index as shown in an editor combo box. Unknown indices fall
    /// back to the random walk.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(Self::RandomWalk)
    }

    /// Parse a config/CLI spelling ("random_walk", "random-walk", "Random Walk", "arp", ...).
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "randomwalk" | "random" | "walk" => Some(Self::RandomWalk),
            "ascending" | "up" => Some(Self::Ascending),
            "descending" | "down" => Some(Self::Descending),
            "arpeggio" | "arp" => Some(Self::Arpeggio),
            _ => None,
        }
    }
}

/// All user-facing sequencer parameters. Every setter clamps; nothing here
/// can be put into an invalid state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerParams {
    pub rate: RateIndex,
    /// Loop length in density mode (1-16)
    pub density: u8,
    /// Rotation into the step array (0-15)
    pub offset: u8,
    /// Fraction of the step the note is held (0.01-1.0)
    pub gate: f32,
    /// MIDI root note (12-120)
    pub root: u8,
    pub manual_step_mode: bool,
    pub sync_to_host: bool,
    /// Tempo used when not following the host (30-300)
    pub internal_bpm: f64,
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            rate: RateIndex::Quarter,
            density: 8,
            offset: 0,
            gate: 0.5,
            root: 72,
            manual_step_mode: false,
            sync_to_host: false,
            internal_bpm: 120.0,
        }
    }
}

impl SequencerParams {
    pub fn set_rate_index(&mut self, index: i64) {
        self.rate = RateIndex::from_index(index);
    }

    pub fn set_density(&mut self, value: i64) {
        self.density = value.clamp(DENSITY_MIN as i64, DENSITY_MAX as i64) as u8;
    }

    pub fn set_offset(&mut self, value: i64) {
        self.offset = value.clamp(0, NUM_STEPS as i64 - 1) as u8;
    }

    pub fn set_gate(&mut self, value: f32) {
        self.gate = if value.is_nan() {
            GATE_MAX
        } else {
            value.clamp(GATE_MIN, GATE_MAX)
        };
    }

    pub fn set_root(&mut self, value: i64) {
        self.root = value.clamp(ROOT_MIN as i64, ROOT_MAX as i64) as u8;
    }

    pub fn set_internal_bpm(&mut self, value: f64) {
        self.internal_bpm = if value.is_nan() {
            BPM_MIN
        } else {
            value.clamp(BPM_MIN, BPM_MAX)
        };
    }
}
