//! Pattern generator.
//!
//! Produces 16 pitch offsets in [-12, 12] with one of four algorithms.
//! Only pitches are written; enabled flags belong to the caller.

use walkseq_types::{PatternKind, StepPattern, NUM_STEPS, PITCH_MAX, PITCH_MIN};

use crate::rng::PatternRng;

const MAX_RANGE: i32 = PITCH_MAX as i32;
const MAX_JUMP: i32 = 7;

const RESET_PROB: f32 = 0.05;
const PATTERN_BREAK_PROB: f32 = 0.10;
const STAY_PROB: f32 = 0.05;
const REFLECT_PROB: f32 = 0.7;

/// Consecutive same-direction moves after which a break jump is forced.
const MAX_CONSECUTIVE: u32 = 3;

/// Major triad plus octave.
const ARP_INTERVALS: [i32; 4] = [0, 4, 7, 12];

/// Regenerate the pitches of `pattern` in place.
pub fn generate(kind: PatternKind, pattern: &mut StepPattern, rng: &mut PatternRng) {
    let pitches = match kind {
        PatternKind::RandomWalk => random_walk(rng),
        PatternKind::Ascending => directional(-6, 1, rng),
        PatternKind::Descending => directional(6, -1, rng),
        PatternKind::Arpeggio => arpeggio(rng),
    };
    pattern.set_pitches(&pitches);
    log::debug!(target: "pattern", "generated {} pattern: {:?}", kind.name(), pitches);
}

/// Directional random walk with phrase resets, pattern breaks and soft boundaries,
/// followed by the melodic post-pass.
pub fn random_walk(rng: &mut PatternRng) -> [i32; NUM_STEPS] {
    let mut seq = [0i32; NUM_STEPS];

    let mut value = random_point(rng);
    seq[0] = value;

    let mut prev_direction = 0i32;
    let mut consecutive = 0u32;

    for slot in seq.iter_mut().skip(1) {
        match choose_move(consecutive, rng) {
            WalkMove::Reset => {
                value = random_point(rng);
                consecutive = 0;
                prev_direction = 0;
            }
            WalkMove::Break => {
                prev_direction = if prev_direction == 0 {
                    rng.next_sign()
                } else {
                    -prev_direction
                };
                let jump = 3 + rng.next_int(10); // 3..=12
                value += prev_direction * jump;
                consecutive = 0;
            }
            WalkMove::Hold => consecutive = 0,
            WalkMove::Step => {
                let direction = if prev_direction == 0 {
                    rng.next_sign()
                } else if consecutive >= 2 && rng.next_float() < 0.7 {
                    -prev_direction
                } else if rng.next_float() < 0.4 {
                    -prev_direction
                } else {
                    prev_direction
                };

                value += direction * step_size(rng);

                if direction == prev_direction {
                    consecutive += 1;
                } else {
                    prev_direction = direction;
                    consecutive = 1;
                }
            }
        }

        if value > MAX_RANGE {
            if rng.next_float() < REFLECT_PROB {
                value = MAX_RANGE - (value - MAX_RANGE);
                prev_direction = -prev_direction;
            } else {
                value = MAX_RANGE;
            }
        } else if value < -MAX_RANGE {
            if rng.next_float() < REFLECT_PROB {
                value = -MAX_RANGE + (-MAX_RANGE - value);
                prev_direction = -prev_direction;
            } else {
                value = -MAX_RANGE;
            }
        }
        value = clamp_pitch(value);

        *slot = value;
    }

    break_arithmetic_runs(&mut seq, rng);
    add_octave_accents(&mut seq, rng);
    seq
}

/// What the random walk does on one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMove {
    /// Start a new phrase at a random point
    Reset,
    /// Reverse direction with a 3..=12 semitone jump
    Break,
    Hold,
    Step,
}

/// A break is forced once the walk has kept one direction for too long.
fn choose_move(consecutive: u32, rng: &mut PatternRng) -> WalkMove {
    if rng.next_float() < RESET_PROB {
        WalkMove::Reset
    } else if rng.next_float() < PATTERN_BREAK_PROB || consecutive > MAX_CONSECUTIVE {
        WalkMove::Break
    } else if rng.next_float() < STAY_PROB {
        WalkMove::Hold
    } else {
        WalkMove::Step
    }
}

/// 50% one semitone, 30% two, otherwise 3..=MAX_JUMP.
fn step_size(rng: &mut PatternRng) -> i32 {
    let r = rng.next_float();
    if r < 0.5 {
        1
    } else if r < 0.8 {
        2
    } else {
        3 + rng.next_int(MAX_JUMP - 2)
    }
}

fn random_point(rng: &mut PatternRng) -> i32 {
    rng.next_int(MAX_RANGE * 2 + 1) - MAX_RANGE
}

/// Find three consecutive notes moving by the same non-zero interval and
/// break the run on the following note, either by stepping back or by a
/// jump of three semitones.
pub fn break_arithmetic_runs(seq: &mut [i32; NUM_STEPS], rng: &mut PatternRng) {
    let mut i = 2;
    while i < NUM_STEPS - 1 {
        let diff1 = seq[i] - seq[i - 1];
        let diff2 = seq[i - 1] - seq[i - 2];
        if diff1 == diff2 && diff1 != 0 {
            seq[i + 1] = if rng.next_bool() {
                seq[i] - diff1
            } else {
                seq[i] + 3 * rng.next_sign()
            };
            seq[i + 1] = clamp_pitch(seq[i + 1]);
            // The fixed note cannot start a new run
            i += 1;
        }
        i += 1;
    }
}

/// One or two octave jumps away from the pattern edges. An accent that would
/// leave the pitch range is dropped.
pub fn add_octave_accents(seq: &mut [i32; NUM_STEPS], rng: &mut PatternRng) {
    let accents = 1 + rng.next_int(2);
    for _ in 0..accents {
        let pos = 2 + rng.next_int(NUM_STEPS as i32 - 3) as usize;
        let candidate = seq[pos] + 12 * rng.next_sign();
        if (-MAX_RANGE..=MAX_RANGE).contains(&candidate) {
            seq[pos] = candidate;
        }
    }
}

/// Single pass from `start`, moving in `direction` 80% of the time and
/// against it otherwise.
pub fn directional(start: i32, direction: i32, rng: &mut PatternRng) -> [i32; NUM_STEPS] {
    let mut seq = [0i32; NUM_STEPS];
    let mut value = start;
    for slot in seq.iter_mut() {
        if rng.next_float() < 0.2 {
            value -= direction;
        } else {
            value += direction;
        }
        value = clamp_pitch(value);
        *slot = value;
    }
    seq
}

/// Independent chord-tone draws, with non-root tones dropped an octave 30%
/// of the time.
pub fn arpeggio(rng: &mut PatternRng) -> [i32; NUM_STEPS] {
    let mut seq = [0i32; NUM_STEPS];
    for slot in seq.iter_mut() {
        let mut value = ARP_INTERVALS[rng.next_int(ARP_INTERVALS.len() as i32) as usize];
        if rng.next_float() < 0.3 && value > 0 {
            value -= 12;
        }
        *slot = value;
    }
    seq
}

fn clamp_pitch(value: i32) -> i32 {
    value.clamp(PITCH_MIN as i32, PITCH_MAX as i32)
}
