use midir::{MidiOutput, MidiOutputConnection};

use walkseq_types::{MidiMessage, MIDI_CHANNEL};

const CLIENT_NAME: &str = "walkseq";

/// Information about an available MIDI port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

/// MIDI output manager for live playback.
pub struct MidiOutputDevice {
    midi_out: Option<MidiOutput>,
    connection: Option<MidiOutputConnection>,
    connected_port_name: Option<String>,
    available_ports: Vec<MidiPortInfo>,
}

impl MidiOutputDevice {
    pub fn new() -> Self {
        let midi_out = match MidiOutput::new(CLIENT_NAME) {
            Ok(out) => Some(out),
            Err(e) => {
                log::warn!(target: "midi", "MIDI output unavailable: {}", e);
                None
            }
        };
        Self {
            midi_out,
            connection: None,
            connected_port_name: None,
            available_ports: Vec::new(),
        }
    }

    /// Refresh the list of available MIDI output ports
    pub fn refresh_ports(&mut self) {
        self.available_ports.clear();

        if let Some(ref midi_out) = self.midi_out {
            for (index, port) in midi_out.ports().iter().enumerate() {
                if let Ok(name) = midi_out.port_name(port) {
                    self.available_ports.push(MidiPortInfo { index, name });
                }
            }
        }
    }

    pub fn list_ports(&self) -> &[MidiPortInfo] {
        &self.available_ports
    }

    pub fn connected_port_name(&self) -> Option<&str> {
        self.connected_port_name.as_deref()
    }

    /// Connect to a MIDI output port by index
    pub fn connect(&mut self, port_index: usize) -> Result<(), String> {
        self.disconnect();

        // connect() consumes the MidiOutput, so open a fresh client
        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| format!("Invalid port index: {}", port_index))?;
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let connection = midi_out
            .connect(port, "walkseq-out")
            .map_err(|e| format!("Failed to connect: {}", e))?;

        log::info!(target: "midi", "connected to output port '{}'", port_name);
        self.connection = Some(connection);
        self.connected_port_name = Some(port_name);
        Ok(())
    }

    /// Send one message. A no-op while disconnected.
    pub fn send(&mut self, message: &MidiMessage) -> Result<(), String> {
        if let Some(ref mut conn) = self.connection {
            let (bytes, len) = message.to_bytes();
            conn.send(&bytes[..len])
                .map_err(|e| format!("Failed to send {:?}: {}", message, e))?;
        }
        Ok(())
    }

    /// Send All Notes Off (CC 123) on the sequencer channel.
    pub fn all_notes_off(&mut self) -> Result<(), String> {
        self.send(&MidiMessage::ControlChange {
            channel: MIDI_CHANNEL,
            controller: 123,
            value: 0,
        })
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            if let Some(name) = self.connected_port_name.take() {
                log::info!(target: "midi", "disconnected from '{}'", name);
            }
        }
    }
}

impl Default for MidiOutputDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MidiOutputDevice {
    fn drop(&mut self) {
        self.disconnect();
    }
}
