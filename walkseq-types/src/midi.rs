//! Timestamped MIDI events exchanged with the host.

use serde::{Deserialize, Serialize};

/// Channel used for every generated note (1-based, as shown to users).
pub const MIDI_CHANNEL: u8 = 1;

/// A MIDI message at a sample offset inside the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    /// Offset in samples from the start of the block
    pub sample_offset: usize,
    pub message: MidiMessage,
}

impl MidiEvent {
    pub fn new(sample_offset: usize, message: MidiMessage) -> Self {
        Self {
            sample_offset,
            message,
        }
    }

    pub fn note_on(sample_offset: usize, note: u8, velocity: u8) -> Self {
        Self::new(
            sample_offset,
            MidiMessage::NoteOn {
                channel: MIDI_CHANNEL,
                note,
                velocity,
            },
        )
    }

    pub fn note_off(sample_offset: usize, note: u8) -> Self {
        Self::new(
            sample_offset,
            MidiMessage::NoteOff {
                channel: MIDI_CHANNEL,
                note,
            },
        )
    }
}

/// Channel voice messages. Channels are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiMessage {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        channel: u8,
        program: u8,
    },
    PitchBend {
        channel: u8,
        /// -8192 (full down) to +8191 (full up), 0 = center
        value: i16,
    },
    Aftertouch {
        channel: u8,
        pressure: u8,
    },
    PolyAftertouch {
        channel: u8,
        note: u8,
        pressure: u8,
    },
}

impl MidiMessage {
    pub fn is_note_on(&self) -> bool {
        matches!(self, Self::NoteOn { .. })
    }

    pub fn is_note_off(&self) -> bool {
        matches!(self, Self::NoteOff { .. })
    }

    /// Note number for note-on/note-off messages.
    pub fn note(&self) -> Option<u8> {
        match self {
            Self::NoteOn { note, .. } | Self::NoteOff { note, .. } => Some(*note),
            _ => None,
        }
    }

    /// Encode as raw wire bytes. Returns the buffer and the number of bytes used.
    pub fn to_bytes(&self) -> ([u8; 3], usize) {
        let status = |kind: u8, channel: u8| kind | (channel.saturating_sub(1) & 0x0F);
        match *self {
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => ([status(0x90, channel), note & 0x7F, velocity & 0x7F], 3),
            Self::NoteOff { channel, note } => ([status(0x80, channel), note & 0x7F, 0], 3),
            Self::ControlChange {
                channel,
                controller,
                value,
            } => ([status(0xB0, channel), controller & 0x7F, value & 0x7F], 3),
            Self::ProgramChange { channel, program } => {
                ([status(0xC0, channel), program & 0x7F, 0], 2)
            }
            Self::PitchBend { channel, value } => {
                let raw = (value.clamp(-8192, 8191) + 8192) as u16;
                (
                    [status(0xE0, channel), (raw & 0x7F) as u8, (raw >> 7) as u8],
                    3,
                )
            }
            Self::Aftertouch { channel, pressure } => {
                ([status(0xD0, channel), pressure & 0x7F, 0], 2)
            }
            Self::PolyAftertouch {
                channel,
                note,
                pressure,
            } => ([status(0xA0, channel), note & 0x7F, pressure & 0x7F], 3),
        }
    }

    /// Decode a channel voice message. A note-on with velocity 0 is a note-off.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        let channel = (status & 0x0F) + 1;
        let data1 = bytes.get(1).copied().unwrap_or(0);
        let data2 = bytes.get(2).copied().unwrap_or(0);
        match status & 0xF0 {
            0x90 if data2 == 0 => Some(Self::NoteOff {
                channel,
                note: data1,
            }),
            0x90 => Some(Self::NoteOn {
                channel,
                note: data1,
                velocity: data2,
            }),
            0x80 => Some(Self::NoteOff {
                channel,
                note: data1,
            }),
            0xB0 => Some(Self::ControlChange {
                channel,
                controller: data1,
                value: data2,
            }),
            0xC0 => Some(Self::ProgramChange {
                channel,
                program: data1,
            }),
            0xE0 => {
                let raw = ((data2 as i16) << 7) | data1 as i16;
                Some(Self::PitchBend {
                    channel,
                    value: raw - 8192,
                })
            }
            0xD0 => Some(Self::Aftertouch {
                channel,
                pressure: data1,
            }),
            0xA0 => Some(Self::PolyAftertouch {
                channel,
                note: data1,
                pressure: data2,
            }),
            _ => None,
        }
    }
}

/// Note name with octave, middle C (60) is "C4".
pub fn midi_note_name(note: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", NAMES[(note % 12) as usize], octave)
}
