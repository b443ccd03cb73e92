//! Notifications sent from the engine to a subscribed editor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerFeedback {
    /// Step pitches or enabled flags changed (randomize, mono, edit, restore)
    PatternChanged,
    /// A step boundary was crossed; `step` is the sounding index into the pattern
    StepAdvanced { step: usize },
    PlaybackChanged { playing: bool },
}
