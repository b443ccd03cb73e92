/// The note currently sounding. Monophonic: at most one exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveNote {
    pub note: u8,
    pub velocity: u8,
    pub held_samples: f64, // Samples elapsed since the note-on
}

/// Playback cursor: runtime state owned by the audio thread.
#[derive(Debug, Clone, Default)]
pub struct PlaybackCursor {
    pub playing: bool,
    pub step_counter: Option<usize>, // Position in the active loop; None = before the first step
    pub sample_accumulator: f64,     // Samples since the last step boundary
    pub first_step_pending: bool,    // Fire the first step on the next processed sample
    pub active_note: Option<ActiveNote>,
    pub last_sounding: Option<usize>, // Pattern index of the last fired step
}

impl PlaybackCursor {
    /// Park the cursor one step before zero so the next step lands on index 0.
    pub fn rewind(&mut self) {
        self.step_counter = None;
        self.sample_accumulator = 0.0;
        self.first_step_pending = true;
        self.last_sounding = None;
    }

    /// Move to the next loop position. A counter at or past the end of the
    /// loop (density shrank under it) wraps to 0.
    pub fn advance(&mut self, loop_len: usize) -> usize {
        let next = match self.step_counter {
            Some(c) if c + 1 < loop_len => c + 1,
            _ => 0,
        };
        self.step_counter = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_advance_lands_on_zero_for_any_loop() {
        for len in 1..=16 {
            let mut cursor = PlaybackCursor::default();
            cursor.rewind();
            assert_eq!(cursor.advance(len), 0);
        }
    }

    #[test]
    fn advance_wraps() {
        let mut cursor = PlaybackCursor::default();
        let seq: Vec<usize> = (0..6).map(|_| cursor.advance(3)).collect();
        assert_eq!(seq, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn counter_outside_shrunk_loop_snaps_to_zero() {
        let mut cursor = PlaybackCursor {
            step_counter: Some(10),
            ..Default::default()
        };
        assert_eq!(cursor.advance(4), 0);
        assert_eq!(cursor.advance(4), 1);
    }
}
