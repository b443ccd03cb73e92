use serde_json::{Map, Value};

use walkseq_types::{RateIndex, SequenceStep, SequencerParams, StepPattern, NUM_STEPS};

use super::{STATE_TAG, STATE_VERSION};
use crate::error::StateError;

/// Defaults for attributes missing from a saved document.
pub(crate) const DEFAULT_RATE: i64 = 1;
pub(crate) const DEFAULT_DENSITY: i64 = 16;
pub(crate) const DEFAULT_OFFSET: i64 = 0;
pub(crate) const DEFAULT_GATE: f64 = 0.5;
pub(crate) const DEFAULT_ROOT: i64 = 72;
pub(crate) const DEFAULT_BPM: f64 = 120.0;

/// Decode a state document.
///
/// Fails only when the document is unreadable or not ours (no root tag,
/// foreign tag). Inside a recognised document every attribute and step is
/// decoded on its own: missing or mistyped values fall back to their
/// defaults and out-of-range values are clamped.
pub fn decode_state(bytes: &[u8]) -> Result<(SequencerParams, StepPattern), StateError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let root = root.as_object().ok_or(StateError::MissingRoot)?;

    match root.get("tag").and_then(Value::as_str) {
        Some(STATE_TAG) => {}
        Some(other) => return Err(StateError::TagMismatch(other.to_string())),
        None => return Err(StateError::MissingRoot),
    }

    if let Some(version) = root.get("version").and_then(Value::as_u64) {
        if version > STATE_VERSION as u64 {
            log::warn!(
                target: "persistence",
                "state version {} is newer than supported ({}), loading known fields",
                version,
                STATE_VERSION
            );
        }
    }

    let empty = Map::new();
    let attrs = root
        .get("attributes")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let params = decode_params(attrs);
    let pattern = root
        .get("sequence")
        .and_then(Value::as_array)
        .map(|entries| decode_sequence(entries))
        .unwrap_or_default();

    Ok((params, pattern))
}

pub(crate) fn decode_params(attrs: &Map<String, Value>) -> SequencerParams {
    let mut params = SequencerParams::default();
    params.rate = RateIndex::from_index(int_attr(attrs, "rate", DEFAULT_RATE));
    params.set_density(int_attr(attrs, "density", DEFAULT_DENSITY));
    params.set_offset(int_attr(attrs, "offset", DEFAULT_OFFSET));
    params.set_gate(float_attr(attrs, "gate", DEFAULT_GATE) as f32);
    params.set_root(int_attr(attrs, "root", DEFAULT_ROOT));
    params.manual_step_mode = bool_attr(attrs, "manualStepMode", false);
    params.sync_to_host = bool_attr(attrs, "syncToHost", false);
    params.set_internal_bpm(float_attr(attrs, "internalBpm", DEFAULT_BPM));
    params
}

/// Entries carry their own index; entries without one are placed by
/// position. Steps with no entry keep the default (root pitch, enabled).
pub(crate) fn decode_sequence(entries: &[Value]) -> StepPattern {
    let mut pattern = StepPattern::default();
    for (position, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            log::warn!(target: "persistence", "skipping malformed step entry {}", position);
            continue;
        };
        let index = entry
            .get("index")
            .and_then(Value::as_u64)
            .map(|i| i as usize)
            .unwrap_or(position);
        if index >= NUM_STEPS {
            log::warn!(target: "persistence", "skipping step index {} out of range", index);
            continue;
        }
        let mut step = SequenceStep::default();
        if let Some(pitch) = entry.get("pitch").and_then(Value::as_i64) {
            step.set_pitch(pitch.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        }
        step.enabled = entry
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        pattern.steps[index] = step;
    }
    pattern
}

fn int_attr(attrs: &Map<String, Value>, key: &str, default: i64) -> i64 {
    match attrs.get(key) {
        None => default,
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f.round() as i64))
            .unwrap_or_else(|| {
                log::warn!(target: "persistence", "attribute '{}' is not a number, using {}", key, default);
                default
            }),
    }
}

fn float_attr(attrs: &Map<String, Value>, key: &str, default: f64) -> f64 {
    match attrs.get(key) {
        None => default,
        Some(v) => v.as_f64().unwrap_or_else(|| {
            log::warn!(target: "persistence", "attribute '{}' is not a number, using {}", key, default);
            default
        }),
    }
}

fn bool_attr(attrs: &Map<String, Value>, key: &str, default: bool) -> bool {
    match attrs.get(key) {
        None => default,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().map_or(default, |i| i != 0),
        Some(_) => {
            log::warn!(target: "persistence", "attribute '{}' is not a bool, using {}", key, default);
            default
        }
    }
}
