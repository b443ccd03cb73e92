//! Timing engine: tempo source selection and step length in samples.

use walkseq_types::{RateIndex, SequencerParams, TransportSnapshot};

/// Tempo changes smaller than this are treated as jitter.
pub const TEMPO_EPSILON: f64 = 0.01;

pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;

/// Derived timing, recomputed every block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingState {
    pub sample_rate: f64,
    pub bpm: f64,
    pub samples_per_beat: f64,
    pub step_duration_samples: f64,
}

impl TimingState {
    pub fn new(sample_rate: f64, bpm: f64, rate: RateIndex) -> Self {
        let mut timing = Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bpm: 120.0,
            samples_per_beat: 0.0,
            step_duration_samples: 0.0,
        };
        timing.set_sample_rate(sample_rate);
        timing.update(bpm, rate);
        timing
    }

    /// Returns false (and keeps the previous rate) for non-positive input.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> bool {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
            true
        } else {
            log::warn!(target: "timing", "ignoring invalid sample rate {}", sample_rate);
            false
        }
    }

    /// Adopt `bpm` and recompute the derived values. Returns true when the
    /// tempo moved by more than [`TEMPO_EPSILON`].
    pub fn update(&mut self, bpm: f64, rate: RateIndex) -> bool {
        let mut changed = false;
        if bpm.is_finite() && bpm > 0.0 {
            changed = (self.bpm - bpm).abs() > TEMPO_EPSILON;
            if changed {
                log::debug!(target: "timing", "tempo changed from {:.2} to {:.2}", self.bpm, bpm);
            }
            self.bpm = bpm;
        }
        self.samples_per_beat = (60.0 / self.bpm) * self.sample_rate;
        self.step_duration_samples = self.samples_per_beat * rate.beats();
        changed
    }

    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0.0 && self.step_duration_samples > 0.0
    }

    pub fn gate_samples(&self, gate: f32) -> f64 {
        self.step_duration_samples * gate as f64
    }
}

impl Default for TimingState {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, 120.0, RateIndex::default())
    }
}

/// The tempo that is authoritative for this block.
///
/// Host-synced: the host's tempo when it reports one, otherwise the current
/// tempo is kept. Free-running: the internal tempo.
pub fn resolve_tempo(
    transport: Option<&TransportSnapshot>,
    params: &SequencerParams,
    current_bpm: f64,
) -> f64 {
    if params.sync_to_host {
        transport
            .and_then(|t| t.tempo())
            .unwrap_or(current_bpm)
    } else {
        params.internal_bpm
    }
}

/// Play/stop transition requested by the host, if any.
///
/// Only consulted when following the host; returns the new playing state
/// when it differs from `is_playing`.
pub fn host_transition(
    transport: Option<&TransportSnapshot>,
    params: &SequencerParams,
    is_playing: bool,
) -> Option<bool> {
    if !params.sync_to_host {
        return None;
    }
    let host_playing = transport?.is_playing?;
    (host_playing != is_playing).then_some(host_playing)
}
