//! The step sequencer engine: lifecycle, per-block processing and the
//! accessor contract used by editors and hosts.

use std::sync::mpsc::Sender;

use walkseq_types::{
    MidiEvent, PatternKind, SequenceStep, SequencerFeedback, SequencerParams, StepPattern,
    TransportSnapshot, ROOT_MAX, ROOT_MIN,
};

use super::pattern;
use super::play_state::PlaybackCursor;
use super::rng::PatternRng;
use super::step_tick::tick_steps;
use super::timing::{self, TimingState, DEFAULT_SAMPLE_RATE};

/// Monophonic 16-step MIDI sequencer.
///
/// Owns its parameters, pattern and playback cursor exclusively. Setters
/// clamp and never fail; nothing here panics across the host boundary.
pub struct StepSequencer {
    params: SequencerParams,
    pattern: StepPattern,
    timing: TimingState,
    cursor: PlaybackCursor,
    /// Note released outside the audio callback, sent at the start of the next block
    pending_note_off: Option<u8>,
    rng: PatternRng,
    feedback_tx: Option<Sender<SequencerFeedback>>,
    /// Events generated this block, merged into the output
    scratch: Vec<MidiEvent>,
}

impl StepSequencer {
    pub fn new() -> Self {
        Self::with_rng(SequencerParams::default(), PatternRng::from_clock())
    }

    /// Deterministic pattern generation, for tests and reproducible renders.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SequencerParams::default(), PatternRng::new(seed))
    }

    pub fn with_params(params: SequencerParams) -> Self {
        Self::with_rng(params, PatternRng::from_clock())
    }

    fn with_rng(params: SequencerParams, mut rng: PatternRng) -> Self {
        let timing = TimingState::new(DEFAULT_SAMPLE_RATE, params.internal_bpm, params.rate);
        let mut pattern = StepPattern::default();
        pattern::generate(PatternKind::RandomWalk, &mut pattern, &mut rng);
        let mut cursor = PlaybackCursor::default();
        cursor.rewind();
        Self {
            params,
            pattern,
            timing,
            cursor,
            pending_note_off: None,
            rng,
            feedback_tx: None,
            scratch: Vec::with_capacity(64),
        }
    }

    // ---- lifecycle ----

    /// Reset the playback cursor and recompute timing for a new stream.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.timing.set_sample_rate(sample_rate);
        self.release_active_note();
        self.cursor.rewind();
        let bpm = if self.params.sync_to_host {
            self.timing.bpm
        } else {
            self.params.internal_bpm
        };
        self.timing.update(bpm, self.params.rate);
        // Two events per step boundary at most, plus slack for the gate note-off
        let wanted = max_block_size.min(4096) / 8 + 8;
        if self.scratch.capacity() < wanted {
            self.scratch.reserve(wanted - self.scratch.len());
        }
        log::info!(
            target: "engine",
            "prepared at {} Hz, block {}, step {:.1} samples",
            self.timing.sample_rate,
            max_block_size,
            self.timing.step_duration_samples
        );
    }

    /// Stop playback. Returns the note-off for any sounding note so the
    /// shell can flush it; the engine will not send it again.
    pub fn release_resources(&mut self) -> Option<MidiEvent> {
        self.stop_playback();
        self.pending_note_off
            .take()
            .map(|note| MidiEvent::note_off(0, note))
    }

    /// Process one block.
    ///
    /// `output` is cleared and refilled with the incoming events (passed
    /// through unchanged) merged with the generated notes, ordered by
    /// sample offset.
    pub fn process_block(
        &mut self,
        input: &[MidiEvent],
        num_samples: usize,
        transport: Option<&TransportSnapshot>,
        output: &mut Vec<MidiEvent>,
    ) {
        self.update_timing(transport);

        output.clear();
        output.extend_from_slice(input);

        // No sample offset exists in an empty block: the held note, the
        // cursor and any pending note-off wait for the next real block
        if num_samples == 0 {
            return;
        }

        self.scratch.clear();
        if let Some(note) = self.pending_note_off.take() {
            self.scratch.push(MidiEvent::note_off(0, note));
        }

        if self.cursor.playing && self.timing.is_valid() {
            let feedback_tx = self.feedback_tx.as_ref();
            tick_steps(
                &self.params,
                &self.pattern,
                &self.timing,
                &mut self.cursor,
                num_samples,
                &mut self.scratch,
                |step| notify(feedback_tx, SequencerFeedback::StepAdvanced { step }),
            );
        } else if let Some(active) = self.cursor.active_note.take() {
            self.scratch.push(MidiEvent::note_off(0, active.note));
        }

        output.extend_from_slice(&self.scratch);
        // Stable: input first, generated events in emission order
        output.sort_by_key(|e| e.sample_offset);
    }

    /// Convenience wrapper around [`process_block`](Self::process_block) that allocates.
    pub fn process(
        &mut self,
        input: &[MidiEvent],
        num_samples: usize,
        transport: Option<&TransportSnapshot>,
    ) -> Vec<MidiEvent> {
        let mut out = Vec::with_capacity(input.len() + 8);
        self.process_block(input, num_samples, transport, &mut out);
        out
    }

    fn update_timing(&mut self, transport: Option<&TransportSnapshot>) {
        if let Some(playing) = timing::host_transition(transport, &self.params, self.cursor.playing)
        {
            if playing {
                log::info!(target: "engine", "host transport started");
                self.start_playback();
            } else {
                log::info!(target: "engine", "host transport stopped");
                self.stop_playback();
            }
        }
        let bpm = timing::resolve_tempo(transport, &self.params, self.timing.bpm);
        self.recompute_timing(bpm);
    }

    fn recompute_timing(&mut self, bpm: f64) {
        let previous_step = self.timing.step_duration_samples;
        if self.timing.update(bpm, self.params.rate) {
            self.cursor.sample_accumulator = 0.0;
            return;
        }
        // Rate shortened the step: keep the phase inside the new step
        let step_len = self.timing.step_duration_samples;
        if step_len > 0.0
            && step_len < previous_step
            && self.cursor.sample_accumulator >= step_len
        {
            self.cursor.sample_accumulator %= step_len;
        }
    }

    fn start_playback(&mut self) {
        self.release_active_note();
        self.cursor.playing = true;
        self.cursor.rewind();
        self.notify(SequencerFeedback::PlaybackChanged { playing: true });
    }

    fn stop_playback(&mut self) {
        self.release_active_note();
        if self.cursor.playing {
            self.cursor.playing = false;
            self.notify(SequencerFeedback::PlaybackChanged { playing: false });
        }
    }

    fn release_active_note(&mut self) {
        if let Some(active) = self.cursor.active_note.take() {
            self.pending_note_off = Some(active.note);
        }
    }

    // ---- notifications ----

    /// Register the editor's feedback channel, replacing any previous one.
    pub fn subscribe(&mut self, tx: Sender<SequencerFeedback>) {
        self.feedback_tx = Some(tx);
    }

    pub fn unsubscribe(&mut self) {
        self.feedback_tx = None;
    }

    fn notify(&self, event: SequencerFeedback) {
        notify(self.feedback_tx.as_ref(), event);
    }

    // ---- transport ----

    pub fn set_playing(&mut self, should_play: bool) {
        if should_play == self.cursor.playing {
            if !should_play {
                self.release_active_note();
            }
            return;
        }
        if should_play {
            log::debug!(target: "engine", "playback started");
            self.start_playback();
        } else {
            log::debug!(target: "engine", "playback stopped");
            self.stop_playback();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.playing
    }

    /// Pattern index of the last step that fired, `None` before the first step.
    pub fn current_step(&self) -> Option<usize> {
        self.cursor.last_sounding
    }

    pub fn timing(&self) -> &TimingState {
        &self.timing
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    // ---- parameters ----

    pub fn params(&self) -> &SequencerParams {
        &self.params
    }

    pub fn rate_index(&self) -> usize {
        self.params.rate.index()
    }

    pub fn set_rate_index(&mut self, index: i64) {
        self.params.set_rate_index(index);
        self.recompute_timing(self.timing.bpm);
    }

    pub fn density(&self) -> u8 {
        self.params.density
    }

    /// A loop position outside the new length wraps to 0 at the next step.
    pub fn set_density(&mut self, value: i64) {
        self.params.set_density(value);
    }

    pub fn offset(&self) -> u8 {
        self.params.offset
    }

    pub fn set_offset(&mut self, value: i64) {
        self.params.set_offset(value);
    }

    pub fn gate(&self) -> f32 {
        self.params.gate
    }

    pub fn set_gate(&mut self, value: f32) {
        self.params.set_gate(value);
    }

    pub fn root(&self) -> u8 {
        self.params.root
    }

    pub fn set_root(&mut self, value: i64) {
        self.params.set_root(value);
    }

    pub fn internal_bpm(&self) -> f64 {
        self.params.internal_bpm
    }

    pub fn set_internal_bpm(&mut self, bpm: f64) {
        self.params.set_internal_bpm(bpm);
        if !self.params.sync_to_host {
            self.recompute_timing(self.params.internal_bpm);
        }
    }

    pub fn sync_to_host(&self) -> bool {
        self.params.sync_to_host
    }

    pub fn set_sync_to_host(&mut self, sync: bool) {
        self.params.sync_to_host = sync;
    }

    pub fn manual_step_mode(&self) -> bool {
        self.params.manual_step_mode
    }

    /// Leaving manual mode re-enables every step.
    pub fn set_manual_step_mode(&mut self, manual: bool) {
        self.params.manual_step_mode = manual;
        if !manual {
            self.reset_enabled_steps();
        }
    }

    pub fn transpose_octave_up(&mut self) {
        self.transpose_octave(12);
    }

    pub fn transpose_octave_down(&mut self) {
        self.transpose_octave(-12);
    }

    fn transpose_octave(&mut self, delta: i16) {
        let target = self.params.root as i16 + delta;
        if (ROOT_MIN as i16..=ROOT_MAX as i16).contains(&target) {
            self.params.root = target as u8;
            log::debug!(target: "engine", "root transposed to {}", target);
        } else {
            log::debug!(target: "engine", "transpose to {} out of range, root stays {}", target, self.params.root);
        }
    }

    // ---- pattern ----

    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    pub fn step(&self, index: usize) -> Option<&SequenceStep> {
        self.pattern.get(index)
    }

    pub fn step_pitch(&self, index: usize) -> Option<i8> {
        self.pattern.get(index).map(|s| s.pitch_offset)
    }

    pub fn set_step_pitch(&mut self, index: usize, value: i32) {
        if let Some(step) = self.pattern.get_mut(index) {
            step.set_pitch(value);
            self.notify(SequencerFeedback::PatternChanged);
        }
    }

    pub fn is_step_enabled(&self, index: usize) -> bool {
        self.pattern.get(index).is_some_and(|s| s.enabled)
    }

    pub fn set_step_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(step) = self.pattern.get_mut(index) {
            step.enabled = enabled;
            self.notify(SequencerFeedback::PatternChanged);
        }
    }

    pub fn toggle_step_enabled(&mut self, index: usize) {
        if let Some(step) = self.pattern.get_mut(index) {
            step.enabled = !step.enabled;
            self.notify(SequencerFeedback::PatternChanged);
        }
    }

    pub fn reset_enabled_steps(&mut self) {
        self.pattern.enable_all();
        self.notify(SequencerFeedback::PatternChanged);
    }

    /// Regenerate pitches. Enabled flags are kept as they are.
    pub fn randomize(&mut self, kind: PatternKind) {
        pattern::generate(kind, &mut self.pattern, &mut self.rng);
        self.notify(SequencerFeedback::PatternChanged);
    }

    /// Every step plays the root note.
    pub fn set_mono_mode(&mut self) {
        self.pattern.zero_pitches();
        log::debug!(target: "engine", "mono mode: all steps on root");
        self.notify(SequencerFeedback::PatternChanged);
    }

    /// Replace parameters and pattern wholesale (state restore). Playback
    /// state is left alone; timing is recomputed for the new rate/tempo.
    pub fn restore(&mut self, params: SequencerParams, pattern: StepPattern) {
        self.params = params;
        self.pattern = pattern;
        if self.params.sync_to_host {
            self.recompute_timing(self.timing.bpm);
        } else {
            self.recompute_timing(self.params.internal_bpm);
        }
        self.notify(SequencerFeedback::PatternChanged);
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

fn notify(tx: Option<&Sender<SequencerFeedback>>, event: SequencerFeedback) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}
