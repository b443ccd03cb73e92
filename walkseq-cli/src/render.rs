use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant};

use walkseq_core::midi::MidiOutputDevice;
use walkseq_engine::StepSequencer;
use walkseq_types::{midi_note_name, MidiEvent, MidiMessage, SequencerFeedback};

/// Render `seconds` of playback block by block, writing one line per event.
/// Returns the number of events written.
pub fn render_offline<W: Write>(
    seq: &mut StepSequencer,
    sample_rate: f64,
    block_size: usize,
    seconds: f64,
    out: &mut W,
) -> io::Result<usize> {
    let total = (seconds * sample_rate).round() as usize;
    let mut events = Vec::with_capacity(16);
    let mut position = 0usize;
    let mut written = 0usize;

    while position < total {
        let n = block_size.min(total - position);
        seq.process_block(&[], n, None, &mut events);
        for event in &events {
            writeln!(out, "{}", format_event(position, event))?;
            written += 1;
        }
        position += n;
    }

    // Flush whatever is still sounding
    seq.set_playing(false);
    seq.process_block(&[], block_size.max(1), None, &mut events);
    for event in &events {
        writeln!(out, "{}", format_event(position, event))?;
        written += 1;
    }

    Ok(written)
}

/// One output line: absolute sample, kind, note with name, velocity.
pub fn format_event(block_start: usize, event: &MidiEvent) -> String {
    let sample = block_start + event.sample_offset;
    match event.message {
        MidiMessage::NoteOn { note, velocity, .. } => format!(
            "{:>10}  on   {:>3}({:<4})  {:>3}",
            sample,
            note,
            midi_note_name(note),
            velocity
        ),
        MidiMessage::NoteOff { note, .. } => format!(
            "{:>10}  off  {:>3}({:<4})    0",
            sample,
            note,
            midi_note_name(note)
        ),
        other => format!("{:>10}  {:?}", sample, other),
    }
}

/// Play through a MIDI output in real time. `seconds == 0` runs forever.
pub fn play_live(
    seq: &mut StepSequencer,
    device: &mut MidiOutputDevice,
    feedback: &Receiver<SequencerFeedback>,
    sample_rate: f64,
    block_size: usize,
    seconds: f64,
) -> Result<(), String> {
    let block_duration = Duration::from_secs_f64(block_size as f64 / sample_rate);
    let deadline = (seconds > 0.0).then(|| Instant::now() + Duration::from_secs_f64(seconds));
    let mut events = Vec::with_capacity(16);
    let mut block_start = Instant::now();

    while deadline.map_or(true, |d| block_start < d) {
        seq.process_block(&[], block_size, None, &mut events);
        for event in &events {
            let at = block_start + Duration::from_secs_f64(event.sample_offset as f64 / sample_rate);
            sleep_until(at);
            device.send(&event.message)?;
        }
        for event in feedback.try_iter() {
            if let SequencerFeedback::StepAdvanced { step } = event {
                log::debug!(target: "live", "step {}", step);
            }
        }
        block_start += block_duration;
        sleep_until(block_start);
    }

    seq.set_playing(false);
    if let Some(event) = seq.release_resources() {
        device.send(&event.message)?;
    }
    device.all_notes_off()
}

fn sleep_until(at: Instant) {
    let now = Instant::now();
    if at > now {
        thread::sleep(at - now);
    }
}
