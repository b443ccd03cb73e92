//! End-to-end block processing scenarios.

use std::sync::mpsc;

use walkseq_engine::StepSequencer;
use walkseq_types::{MidiEvent, MidiMessage, SequencerFeedback, TransportSnapshot, NUM_STEPS};

const SR: f64 = 48_000.0;
/// Quarter note at 120 bpm, 48 kHz
const QUARTER: usize = 24_000;

fn engine() -> StepSequencer {
    let mut seq = StepSequencer::with_seed(7);
    seq.prepare(SR, 1024);
    seq.set_internal_bpm(120.0);
    seq.set_rate_index(3);
    // Distinct pitch per step so notes identify their step: note = 72 + i - 6
    for i in 0..NUM_STEPS {
        seq.set_step_pitch(i, i as i32 - 6);
    }
    seq
}

fn step_of(note: u8) -> usize {
    (note as i32 - 72 + 6) as usize
}

fn note_ons(events: &[MidiEvent]) -> Vec<(usize, u8)> {
    events
        .iter()
        .filter_map(|e| match e.message {
            MidiMessage::NoteOn { note, .. } => Some((e.sample_offset, note)),
            _ => None,
        })
        .collect()
}

#[test]
fn density_four_cycles_one_note_per_quarter_block() {
    let mut seq = engine();
    seq.set_density(4);
    seq.set_offset(0);
    assert_eq!(seq.timing().step_duration_samples, QUARTER as f64);

    seq.set_playing(true);
    let mut steps = Vec::new();
    for _ in 0..4 {
        let out = seq.process(&[], QUARTER, None);
        let ons = note_ons(&out);
        assert_eq!(ons.len(), 1, "{:?}", out);
        assert_eq!(ons[0].0, 0);
        steps.push(step_of(ons[0].1));
    }
    assert_eq!(steps, vec![0, 1, 2, 3]);

    // Loop wraps after density steps
    let out = seq.process(&[], QUARTER, None);
    assert_eq!(step_of(note_ons(&out)[0].1), 0);
}

#[test]
fn manual_mode_skips_disabled_steps_but_keeps_counting() {
    let (tx, rx) = mpsc::channel();
    let mut seq = engine();
    seq.set_manual_step_mode(true);
    seq.set_step_enabled(1, false);
    seq.subscribe(tx);
    seq.set_playing(true);

    let first = seq.process(&[], QUARTER, None);
    let second = seq.process(&[], QUARTER, None);
    let third = seq.process(&[], QUARTER, None);

    assert_eq!(step_of(note_ons(&first)[0].1), 0);
    assert!(note_ons(&second).is_empty());
    assert_eq!(step_of(note_ons(&third)[0].1), 2);
    assert_eq!(seq.current_step(), Some(2));

    let advanced: Vec<usize> = rx
        .try_iter()
        .filter_map(|e| match e {
            SequencerFeedback::StepAdvanced { step } => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(advanced, vec![0, 1, 2]);
}

#[test]
fn manual_mode_walks_all_sixteen_steps() {
    let mut seq = engine();
    seq.set_density(3);
    seq.set_manual_step_mode(true);
    seq.set_playing(true);
    let steps: Vec<usize> = (0..18)
        .map(|_| step_of(note_ons(&seq.process(&[], QUARTER, None))[0].1))
        .collect();
    let expected: Vec<usize> = (0..18).map(|n| n % NUM_STEPS).collect();
    assert_eq!(steps, expected);
}

#[test]
fn tempo_change_resets_accumulator() {
    let mut seq = engine();
    seq.set_density(16);
    seq.set_playing(true);

    let out = seq.process(&[], QUARTER, None);
    assert_eq!(note_ons(&out).len(), 1);
    assert_eq!(seq.cursor().sample_accumulator, QUARTER as f64);

    // 120 -> 90 bpm: a quarter is now 32000 samples, counted from zero
    seq.set_internal_bpm(90.0);
    assert_eq!(seq.cursor().sample_accumulator, 0.0);
    assert_eq!(seq.timing().step_duration_samples, 32_000.0);

    let out = seq.process(&[], 40_000, None);
    let ons = note_ons(&out);
    assert_eq!(ons.len(), 1);
    assert_eq!(ons[0].0, 32_000);
}

#[test]
fn host_tempo_change_resets_accumulator() {
    let mut seq = engine();
    seq.set_sync_to_host(true);
    let host = TransportSnapshot::playing_at(120.0);

    let out = seq.process(&[], 10_000, Some(&host));
    assert!(seq.is_playing());
    assert_eq!(note_ons(&out), vec![(0, 66)]);

    let slower = TransportSnapshot::playing_at(90.0);
    let out = seq.process(&[], 40_000, Some(&slower));
    // Without the reset the next step would land at 14000
    assert_eq!(note_ons(&out).len(), 1);
    assert_eq!(note_ons(&out)[0].0, 32_000);
}

#[test]
fn host_start_and_stop_drive_playback() {
    let mut seq = engine();
    seq.set_sync_to_host(true);
    seq.set_gate(1.0);

    let stopped = TransportSnapshot::stopped_at(120.0);
    assert!(seq.process(&[], 512, Some(&stopped)).is_empty());
    assert!(!seq.is_playing());

    let playing = TransportSnapshot::playing_at(120.0);
    let out = seq.process(&[], 512, Some(&playing));
    assert!(seq.is_playing());
    assert_eq!(note_ons(&out), vec![(0, 66)]);

    // Host stops while the note is held: note-off at the top of the block
    let out = seq.process(&[], 512, Some(&stopped));
    assert!(!seq.is_playing());
    assert_eq!(out, vec![MidiEvent::note_off(0, 66)]);
}

#[test]
fn host_state_is_ignored_when_not_synced() {
    let mut seq = engine();
    let playing = TransportSnapshot::playing_at(60.0);
    assert!(seq.process(&[], 512, Some(&playing)).is_empty());
    assert!(!seq.is_playing());
    assert_eq!(seq.timing().bpm, 120.0);
}

#[test]
fn sounding_index_is_rotated_and_periodic() {
    for density in 1..=16i64 {
        for offset in 0..16i64 {
            let (tx, rx) = mpsc::channel();
            let mut seq = engine();
            seq.set_density(density);
            seq.set_offset(offset);
            seq.subscribe(tx);
            seq.set_playing(true);
            let n = 2 * density as usize + 1;
            for _ in 0..n {
                seq.process(&[], QUARTER, None);
            }
            let steps: Vec<usize> = rx
                .try_iter()
                .filter_map(|e| match e {
                    SequencerFeedback::StepAdvanced { step } => Some(step),
                    _ => None,
                })
                .collect();
            let expected: Vec<usize> = (0..n)
                .map(|i| (i % density as usize + offset as usize) % NUM_STEPS)
                .collect();
            assert_eq!(steps, expected, "density {} offset {}", density, offset);
        }
    }
}

#[test]
fn monophonic_and_gated_for_all_gate_ratios() {
    for &gate in &[0.01f32, 0.1, 0.33, 0.5, 0.75, 0.99, 1.0] {
        for &rate in &[0i64, 1, 3, 4] {
            let mut seq = engine();
            seq.set_gate(gate);
            seq.set_rate_index(rate);
            seq.set_density(5);
            seq.set_playing(true);
            let step_len = seq.timing().step_duration_samples;

            let mut open: Option<(usize, u8)> = None;
            let mut block_start = 0usize;
            let sizes = [64usize, 511, 1024, 4096, 333, 17];
            for i in 0..200 {
                let size = sizes[i % sizes.len()];
                for e in seq.process(&[], size, None) {
                    let t = block_start + e.sample_offset;
                    match e.message {
                        MidiMessage::NoteOn { note, .. } => {
                            assert!(open.is_none(), "overlapping notes at {}", t);
                            open = Some((t, note));
                        }
                        MidiMessage::NoteOff { note, .. } => {
                            let (on_t, on_note) = open.take().expect("note-off without note-on");
                            assert_eq!(note, on_note);
                            assert!(t >= on_t);
                            assert!(
                                (t - on_t) as f64 <= step_len.ceil(),
                                "gate {} rate {}: held {} > step {}",
                                gate,
                                rate,
                                t - on_t,
                                step_len
                            );
                        }
                        _ => {}
                    }
                }
                block_start += size;
            }
        }
    }
}

#[test]
fn input_events_pass_through_and_output_is_ordered() {
    let mut seq = engine();
    seq.set_rate_index(0); // 1/32: 3000 samples
    seq.set_playing(true);

    let cc = MidiEvent::new(
        4_500,
        MidiMessage::ControlChange {
            channel: 2,
            controller: 7,
            value: 100,
        },
    );
    let key = MidiEvent::note_on(100, 40, 90);
    let input = vec![cc, key];

    let out = seq.process(&input, 8_000, None);
    assert!(out.contains(&cc));
    assert!(out.contains(&key));
    assert!(out
        .windows(2)
        .all(|w| w[0].sample_offset <= w[1].sample_offset));
    // 1/32 steps at 0, 3000, 6000
    assert_eq!(note_ons(&out).iter().filter(|(_, n)| *n != 40).count(), 3);
}

#[test]
fn passthrough_while_stopped() {
    let mut seq = engine();
    let input = vec![MidiEvent::note_on(10, 60, 100), MidiEvent::note_off(20, 60)];
    assert_eq!(seq.process(&input, 64, None), input);
}

#[test]
fn shrinking_density_snaps_counter_to_zero() {
    let mut seq = engine();
    seq.set_density(16);
    seq.set_playing(true);
    for _ in 0..11 {
        seq.process(&[], QUARTER, None);
    }
    assert_eq!(seq.current_step(), Some(10));

    seq.set_density(4);
    let out = seq.process(&[], QUARTER, None);
    assert_eq!(step_of(note_ons(&out)[0].1), 0);
    let out = seq.process(&[], QUARTER, None);
    assert_eq!(step_of(note_ons(&out)[0].1), 1);
}

#[test]
fn restart_begins_at_first_step() {
    let mut seq = engine();
    seq.set_density(16);
    seq.set_playing(true);
    for _ in 0..5 {
        seq.process(&[], QUARTER, None);
    }
    seq.set_playing(false);
    seq.process(&[], 128, None);
    seq.set_playing(true);
    let out = seq.process(&[], 128, None);
    assert_eq!(note_ons(&out), vec![(0, 66)]);
    assert_eq!(seq.current_step(), Some(0));
}

#[test]
fn offset_change_applies_at_next_step() {
    let mut seq = engine();
    seq.set_density(16);
    seq.set_playing(true);
    seq.process(&[], QUARTER, None); // step 0
    seq.set_offset(8);
    let out = seq.process(&[], QUARTER, None); // counter 1 + 8
    assert_eq!(step_of(note_ons(&out)[0].1), 9);
}

#[test]
fn root_change_moves_every_note() {
    let mut seq = engine();
    seq.set_mono_mode();
    seq.set_root(48);
    seq.set_playing(true);
    let out = seq.process(&[], QUARTER, None);
    assert_eq!(note_ons(&out), vec![(0, 48)]);
    match out[0].message {
        MidiMessage::NoteOn { velocity, channel, .. } => {
            assert_eq!(velocity, 80);
            assert_eq!(channel, 1);
        }
        _ => unreachable!(),
    }
}

#[test]
fn shorter_rate_wraps_accumulator_into_new_step() {
    let mut seq = engine();
    seq.set_density(16);
    seq.set_playing(true);

    let out = seq.process(&[], 20_000, None);
    assert_eq!(note_ons(&out).len(), 1);

    // 1/4 -> 1/32: 3000-sample steps, 20000 samples in means 2000 into a step
    seq.set_rate_index(0);
    assert_eq!(seq.timing().step_duration_samples, 3_000.0);
    assert_eq!(seq.cursor().sample_accumulator, 2_000.0);

    let out = seq.process(&[], 3_000, None);
    let offsets: Vec<usize> = note_ons(&out).iter().map(|(o, _)| *o).collect();
    assert_eq!(offsets, vec![1_000]);

    let out = seq.process(&[], 6_000, None);
    let offsets: Vec<usize> = note_ons(&out).iter().map(|(o, _)| *o).collect();
    assert_eq!(offsets, vec![1_000, 4_000]);
    assert!(seq.cursor().sample_accumulator <= seq.timing().step_duration_samples);
}

#[test]
fn longer_rate_keeps_accumulator() {
    let mut seq = engine();
    seq.set_density(16);
    seq.set_playing(true);
    seq.process(&[], 20_000, None);

    // 1/4 -> 1/2: the current step simply runs longer
    seq.set_rate_index(5);
    assert_eq!(seq.cursor().sample_accumulator, 20_000.0);

    let out = seq.process(&[], 30_000, None);
    let offsets: Vec<usize> = note_ons(&out).iter().map(|(o, _)| *o).collect();
    assert_eq!(offsets, vec![28_000]);
}

#[test]
fn active_note_carries_emitted_velocity() {
    let mut seq = engine();
    seq.set_playing(true);
    let out = seq.process(&[], 512, None);
    let velocity = out.iter().find_map(|e| match e.message {
        MidiMessage::NoteOn { velocity, .. } => Some(velocity),
        _ => None,
    });
    let active = seq.cursor().active_note.expect("note sounding");
    assert_eq!(Some(active.velocity), velocity);
    // Step 0 sits 6 semitones below the root
    assert_eq!(active.velocity, 95);
}
