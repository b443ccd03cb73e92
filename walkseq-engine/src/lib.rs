pub mod pattern;
pub mod play_state;
pub mod rng;
pub mod sequencer;
pub mod step_tick;
pub mod timing;

pub use play_state::{ActiveNote, PlaybackCursor};
pub use rng::PatternRng;
pub use sequencer::StepSequencer;
pub use timing::TimingState;
