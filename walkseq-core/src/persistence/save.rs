use serde::Serialize;

use walkseq_types::{SequencerParams, StepPattern};

use super::{STATE_TAG, STATE_VERSION};

#[derive(Serialize)]
struct StateDocument<'a> {
    tag: &'a str,
    version: u32,
    attributes: Attributes,
    sequence: Vec<StepEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Attributes {
    rate: usize,
    density: u8,
    offset: u8,
    gate: f32,
    root: u8,
    manual_step_mode: bool,
    sync_to_host: bool,
    internal_bpm: f64,
}

#[derive(Serialize)]
struct StepEntry {
    index: usize,
    pitch: i8,
    enabled: bool,
}

/// Encode parameters and pattern as a state document.
pub fn encode_state(params: &SequencerParams, pattern: &StepPattern) -> Vec<u8> {
    let doc = StateDocument {
        tag: STATE_TAG,
        version: STATE_VERSION,
        attributes: Attributes {
            rate: params.rate.index(),
            density: params.density,
            offset: params.offset,
            gate: params.gate,
            root: params.root,
            manual_step_mode: params.manual_step_mode,
            sync_to_host: params.sync_to_host,
            internal_bpm: params.internal_bpm,
        },
        sequence: pattern
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepEntry {
                index,
                pitch: step.pitch_offset,
                enabled: step.enabled,
            })
            .collect(),
    };
    // Plain structs of numbers and bools always serialize
    serde_json::to_vec_pretty(&doc).unwrap_or_default()
}
