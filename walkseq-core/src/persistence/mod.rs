//! Sequencer state persistence.
//!
//! State is a JSON attribute document: a tagged root, one scalar attribute
//! per parameter and a `sequence` collection holding the pitch and enabled
//! flag of each of the 16 steps, indexed by position.
//!
//! ```json
//! { "tag": "WalkseqState", "version": 1,
//!   "attributes": { "rate": 3, "density": 8, ... },
//!   "sequence": [ { "index": 0, "pitch": -3, "enabled": true }, ... ] }
//! ```

pub mod load;
pub mod save;

use std::path::Path;

use walkseq_engine::StepSequencer;
use walkseq_types::{SequencerParams, StepPattern};

use crate::error::StateError;

pub use load::decode_state;
pub use save::encode_state;

/// Root tag of a state document.
pub const STATE_TAG: &str = "WalkseqState";

/// Current document version. Older versions load through the same
/// field-by-field decoder.
pub const STATE_VERSION: u32 = 1;

/// Serialize the engine's parameters and pattern.
pub fn save_state(seq: &StepSequencer) -> Vec<u8> {
    encode_state(seq.params(), seq.pattern())
}

/// Restore parameters and pattern from a document.
///
/// On error the engine is left exactly as it was.
pub fn restore_state(seq: &mut StepSequencer, bytes: &[u8]) -> Result<(), StateError> {
    let (params, pattern) = decode_state(bytes)?;
    seq.restore(params, pattern);
    log::info!(target: "persistence", "state restored");
    Ok(())
}

/// Like [`restore_state`], but only logs failures. For host callbacks that
/// have nowhere to report an error.
pub fn restore_state_or_keep(seq: &mut StepSequencer, bytes: &[u8]) -> bool {
    match restore_state(seq, bytes) {
        Ok(()) => true,
        Err(e) => {
            log::warn!(target: "persistence", "ignoring saved state: {}", e);
            false
        }
    }
}

pub fn save_to_file(path: &Path, params: &SequencerParams, pattern: &StepPattern) -> Result<(), StateError> {
    let bytes = encode_state(params, pattern);
    std::fs::write(path, bytes)?;
    log::info!(target: "persistence", "saved state to {}", path.display());
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<(SequencerParams, StepPattern), StateError> {
    let bytes = std::fs::read(path)?;
    decode_state(&bytes)
}
