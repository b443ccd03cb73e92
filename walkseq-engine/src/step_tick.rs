use walkseq_types::{MidiEvent, SequencerParams, StepPattern, NUM_STEPS};

use super::play_state::{ActiveNote, PlaybackCursor};
use super::timing::TimingState;

/// Walk one block of `num_samples` frames, appending note-on/note-off events
/// at their sample offsets. `on_step` receives the sounding index of every
/// step boundary crossed.
///
/// Caller guarantees the cursor is playing; does nothing while timing is invalid.
pub fn tick_steps(
    params: &SequencerParams,
    pattern: &StepPattern,
    timing: &TimingState,
    cursor: &mut PlaybackCursor,
    num_samples: usize,
    out: &mut Vec<MidiEvent>,
    mut on_step: impl FnMut(usize),
) {
    let step_len = timing.step_duration_samples;
    if !timing.is_valid() || !step_len.is_finite() {
        return;
    }
    let gate_len = timing.gate_samples(params.gate);

    let mut position = 0usize;
    while position < num_samples {
        if cursor.first_step_pending || cursor.sample_accumulator >= step_len {
            if cursor.first_step_pending {
                cursor.first_step_pending = false;
            } else {
                // Keep the overrun so long runs don't drift
                cursor.sample_accumulator -= step_len;
            }

            if let Some(active) = cursor.active_note.take() {
                out.push(MidiEvent::note_off(position, active.note));
            }

            let loop_len = if params.manual_step_mode {
                NUM_STEPS
            } else {
                params.density as usize
            };
            let counter = cursor.advance(loop_len);
            let index = sounding_index(counter, params.offset);
            cursor.last_sounding = Some(index);
            on_step(index);

            let step = pattern.steps[index];
            if !params.manual_step_mode || step.enabled {
                let note = note_for_step(params.root, step.pitch_offset);
                let velocity = velocity_for_offset(step.pitch_offset);
                out.push(MidiEvent::note_on(position, note, velocity));
                cursor.active_note = Some(ActiveNote {
                    note,
                    velocity,
                    held_samples: 0.0,
                });
                log::trace!(target: "engine", "note {} vel {} at step {} (+{})", note, velocity, index, position);
            }
        }

        // Samples until the next boundary or the end of the block; at least one
        let until_boundary = (step_len - cursor.sample_accumulator).max(0.0) as usize;
        let run = (num_samples - position).min(until_boundary).max(1);

        if let Some(active) = cursor.active_note.as_mut() {
            let gate_remaining = gate_len - active.held_samples;
            if gate_remaining <= run as f64 {
                let off = (position + gate_remaining.max(0.0) as usize).min(num_samples - 1);
                out.push(MidiEvent::note_off(off, active.note));
                cursor.active_note = None;
            } else {
                active.held_samples += run as f64;
            }
        }

        cursor.sample_accumulator += run as f64;
        position += run;
    }
}

/// Pattern index for a loop position: `(counter + offset) mod 16`.
pub fn sounding_index(counter: usize, offset: u8) -> usize {
    (counter + offset as usize) % NUM_STEPS
}

pub fn note_for_step(root: u8, pitch_offset: i8) -> u8 {
    (root as i16 + pitch_offset as i16).clamp(0, 127) as u8
}

/// 80 at the root, rising to 110 an octave away.
pub fn velocity_for_offset(pitch_offset: i8) -> u8 {
    80 + (30.0 * (pitch_offset as f64).abs() / 12.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkseq_types::RateIndex;

    fn playing_cursor() -> PlaybackCursor {
        let mut cursor = PlaybackCursor {
            playing: true,
            ..Default::default()
        };
        cursor.rewind();
        cursor
    }

    #[test]
    fn velocity_curve() {
        assert_eq!(velocity_for_offset(0), 80);
        assert_eq!(velocity_for_offset(12), 110);
        assert_eq!(velocity_for_offset(-12), 110);
        assert_eq!(velocity_for_offset(6), 95);
        assert_eq!(velocity_for_offset(1), 83); // 2.5 rounds up
    }

    #[test]
    fn note_is_clamped_to_midi_range() {
        assert_eq!(note_for_step(120, 12), 127);
        assert_eq!(note_for_step(12, -12), 0);
        assert_eq!(note_for_step(72, -5), 67);
    }

    #[test]
    fn sounding_index_rotates() {
        assert_eq!(sounding_index(0, 3), 3);
        assert_eq!(sounding_index(14, 5), 3);
    }

    #[test]
    fn gate_ends_note_inside_step() {
        let params = SequencerParams {
            gate: 0.25,
            density: 4,
            ..Default::default()
        };
        let timing = TimingState::new(48_000.0, 120.0, RateIndex::Quarter);
        let pattern = StepPattern::default();
        let mut cursor = playing_cursor();
        let mut out = Vec::new();

        tick_steps(&params, &pattern, &timing, &mut cursor, 24_000, &mut out, |_| {});

        assert_eq!(out.len(), 2);
        assert!(out[0].message.is_note_on());
        assert_eq!(out[0].sample_offset, 0);
        assert!(out[1].message.is_note_off());
        assert_eq!(out[1].sample_offset, 6_000);
        assert!(cursor.active_note.is_none());
    }

    #[test]
    fn note_spanning_block_edge_ends_on_gate() {
        let params = SequencerParams {
            gate: 0.5,
            ..Default::default()
        };
        let timing = TimingState::new(48_000.0, 120.0, RateIndex::Quarter);
        let pattern = StepPattern::default();
        let mut cursor = playing_cursor();
        let mut out = Vec::new();

        // 24000-sample step, 12000-sample gate, processed in 5000-sample blocks
        tick_steps(&params, &pattern, &timing, &mut cursor, 5_000, &mut out, |_| {});
        assert_eq!(out.len(), 1);
        tick_steps(&params, &pattern, &timing, &mut cursor, 5_000, &mut out, |_| {});
        assert_eq!(out.len(), 1);
        tick_steps(&params, &pattern, &timing, &mut cursor, 5_000, &mut out, |_| {});
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], MidiEvent::note_off(2_000, 72));
    }

    #[test]
    fn fractional_step_lengths_do_not_drift() {
        let params = SequencerParams::default();
        // 1/16 at 120 bpm, 44.1k: 5512.5 samples per step
        let timing = TimingState::new(44_100.0, 120.0, RateIndex::Sixteenth);
        let pattern = StepPattern::default();
        let mut cursor = playing_cursor();
        let mut steps = 0usize;
        let mut out = Vec::new();
        for _ in 0..441 {
            tick_steps(&params, &pattern, &timing, &mut cursor, 500, &mut out, |_| steps += 1);
        }
        // 220500 samples = exactly 40 steps; the 41st boundary falls on the
        // first sample after the last block
        assert_eq!(steps, 40);
        assert_eq!(cursor.sample_accumulator, 5_512.5);
    }
}
