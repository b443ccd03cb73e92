//! Host transport snapshot.

use serde::{Deserialize, Serialize};

/// What the host reported about its transport for the current block.
///
/// Every field is optional: hosts differ in what they expose, and a missing
/// field means "keep what we had".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportSnapshot {
    pub bpm: Option<f64>,
    pub is_playing: Option<bool>,
}

impl TransportSnapshot {
    pub fn playing_at(bpm: f64) -> Self {
        Self {
            bpm: Some(bpm),
            is_playing: Some(true),
        }
    }

    pub fn stopped_at(bpm: f64) -> Self {
        Self {
            bpm: Some(bpm),
            is_playing: Some(false),
        }
    }

    /// Host tempo, if reported and usable.
    pub fn tempo(&self) -> Option<f64> {
        self.bpm.filter(|b| b.is_finite() && *b > 0.0)
    }
}
