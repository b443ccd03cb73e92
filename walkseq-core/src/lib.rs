//! # walkseq-core
//!
//! Everything around the real-time engine that touches the outside world:
//! state persistence, configuration and MIDI devices.

pub mod config;
pub mod error;
pub mod midi;
pub mod persistence;

pub use config::Config;
pub use error::StateError;
pub use walkseq_engine::StepSequencer;
