//! # walkseq-types
//!
//! Shared type definitions for the walkseq step sequencer.
//! Plain data only: the engine, the persistence layer and the shell all
//! exchange these structures.

mod feedback;
mod midi;
mod params;
mod step;
mod transport;

pub use feedback::SequencerFeedback;
pub use midi::{midi_note_name, MidiEvent, MidiMessage, MIDI_CHANNEL};
pub use params::{PatternKind, RateIndex, SequencerParams};
pub use step::{SequenceStep, StepPattern, NUM_STEPS, PITCH_MAX, PITCH_MIN};
pub use transport::TransportSnapshot;

/// Lowest root note reachable through setters and octave transpose (C0).
pub const ROOT_MIN: u8 = 12;
/// Highest root note reachable through setters and octave transpose (C9).
pub const ROOT_MAX: u8 = 120;

pub const BPM_MIN: f64 = 30.0;
pub const BPM_MAX: f64 = 300.0;

pub const DENSITY_MIN: u8 = 1;
pub const DENSITY_MAX: u8 = NUM_STEPS as u8;

pub const GATE_MIN: f32 = 0.01;
pub const GATE_MAX: f32 = 1.0;
